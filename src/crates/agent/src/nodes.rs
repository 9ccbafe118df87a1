//! Node implementations for the workflow engine.

use crate::engine::WorkflowEngine;
use crate::error::Result;
use crate::notebook::NotebookBuilder;
use crate::prompts;
use crate::signals::ActionSignal;
use crate::state::AgentState;
use crate::traits::{Heartbeat, LanguageModel, SandboxRuntime};
use crate::truncate::truncate_output;
use llm::{
    ArtifactDecision, ArtifactType, ClarificationResponse, CodePlanningDecision,
    CodePlanningSignal, ExecutionObserverDecision, GeneralAnswerResponse, PlanningDecision,
    PythonCode, ReflectionDecision, TaskAnswer,
};
use tracing::{error, info, warn};

const FALLBACK_NOTEBOOK_DESCRIPTION: &str =
    "Jupyter notebook documenting the task execution steps.";

impl<L, S, H> WorkflowEngine<L, S, H>
where
    L: LanguageModel,
    S: SandboxRuntime,
    H: Heartbeat,
{
    /// PLANNING: classify the request and record the rationale.
    pub(crate) async fn planning_node(&self, state: &mut AgentState) -> Result<()> {
        info!(task = %state.task_description, "Planning task");

        let (system, user) = prompts::planning(
            &state.task_description,
            &state.data_files_description,
            &state.uploaded_files,
        );
        let decision: PlanningDecision = self.models.planning.complete(&system, &user).await?;

        info!(signal = ?decision.signal, "Planning decision");
        state.task_rationale = decision.rationale;
        state.action_signal = decision.signal.into();
        Ok(())
    }

    /// CODE_PLANNING: decide the next step action, archiving the current
    /// step when it closes.
    pub(crate) async fn code_planning_node(&self, state: &mut AgentState) -> Result<()> {
        info!(
            step_number = state.step_number,
            step_attempts = state.step_attempts,
            completed = state.completed_steps.len(),
            "Planning next step action"
        );

        if state.step_attempts > self.config.max_step_retries {
            warn!("Exceeded maximum step attempts, marking task as failed");
            state.failure_reason = format!(
                "Exceeded maximum attempts for {}. Try simplifying the task or \
                 breaking it into smaller steps.",
                state.current_step_goal
            );
            state.action_signal = ActionSignal::TaskFailed;
            state.archive_current_step();
            state.observations.reset_current();
            state.reset_execution_context();
            return Ok(());
        }

        let (system, user) = prompts::code_planning(state);
        let decision: CodePlanningDecision =
            self.models.code_planning.complete(&system, &user).await?;

        info!(signal = ?decision.signal, reasoning = %decision.reasoning, "Code planning decision");

        let new_goal = if decision.current_step_goal.is_empty() {
            state.current_step_goal.clone()
        } else {
            decision.current_step_goal.clone()
        };

        match decision.signal {
            CodePlanningSignal::IterateCurrentStep => {
                let previous_goal = state.current_step_goal.clone();
                state.push_goal_history(&previous_goal);
                state.current_step_goal = new_goal;
                state.current_step_description = decision.current_step_description;
                state.step_attempts += 1;
            }
            CodePlanningSignal::ProceedToNextStep => {
                state.archive_current_step();
                state.observations.reset_current();
                state.step_number += 1;
                state.current_step_goal_history.clear();
                state.push_goal_history(&new_goal);
                state.current_step_goal = new_goal;
                state.current_step_description = decision.current_step_description;
                state.step_attempts = 0;
            }
            CodePlanningSignal::TaskCompleted | CodePlanningSignal::TaskFailed => {
                state.archive_current_step();
                state.observations.reset_current();
                if decision.signal == CodePlanningSignal::TaskFailed {
                    state.failure_reason = decision.reasoning;
                }
            }
        }

        state.action_signal = decision.signal.into();
        state.reset_execution_context();
        Ok(())
    }

    /// CODE_GENERATION: produce the code blob for the current step.
    pub(crate) async fn code_generation_node(&self, state: &mut AgentState) -> Result<()> {
        info!(goal = %state.current_step_goal, "Generating code for step");

        let (system, user) = prompts::code_generation(state);
        let result: PythonCode = self.models.code_generation.complete(&system, &user).await?;

        info!(
            attempt = state.code_generation_attempts + 1,
            chars = result.code.len(),
            "Code generated"
        );
        state.generated_code = result.code;
        state.code_generation_attempts += 1;
        state.action_signal = ActionSignal::ExecuteCode;
        Ok(())
    }

    /// CODE_EXECUTION: run the generated code in the sandbox.
    ///
    /// Never fails the run: gateway errors are captured into
    /// `last_execution_error` and routed through the observer path.
    pub(crate) async fn code_execution_node(&self, state: &mut AgentState) {
        info!(goal = %state.current_step_goal, "Executing code for step");

        match self
            .sandbox
            .execute_code(&state.sandbox_id, &state.generated_code)
            .await
        {
            Ok(execution) => {
                if execution.error.is_some() {
                    let error_msg = execution.error_text().unwrap_or_default();
                    warn!(error = %error_msg, "Code execution failed");

                    state.last_execution_error = self.truncate(&error_msg);
                    state.last_execution_output = self.truncate(&execution.stdout_text());
                    state.execution_result = Some(execution);
                    state.action_signal = ActionSignal::CodeExecutionFailed;
                    self.recover_context(state).await;
                    return;
                }

                let mut output = String::new();
                if !execution.stdout.is_empty() {
                    output.push_str("\n[stdout]\n");
                    output.push_str(&self.truncate(&execution.stdout_text()));
                }
                if !execution.results.is_empty() {
                    let results = execution
                        .results
                        .iter()
                        .map(|r| r.display_text())
                        .collect::<Vec<_>>()
                        .join("\n");
                    output.push_str("\n[results]\n");
                    output.push_str(&self.truncate(&results));
                }

                info!("Code execution succeeded");
                state.execution_result = Some(execution);
                state.last_execution_output = if output.is_empty() {
                    "(no output)".to_string()
                } else {
                    output
                };
                state.last_execution_error.clear();
                state.action_signal = ActionSignal::CodeExecutionSuccess;
            }
            Err(e) => {
                error!(error = %e, "Execution raised a gateway error");
                state.last_execution_error = self.truncate(&e.to_string());
                state.last_execution_output.clear();
                state.execution_result = None;
                state.action_signal = ActionSignal::CodeExecutionFailed;
                self.recover_context(state).await;
            }
        }
    }

    /// EXECUTION_OBSERVER: extract observations from the transcript.
    pub(crate) async fn execution_observer_node(&self, state: &mut AgentState) -> Result<()> {
        info!(goal = %state.current_step_goal, "Observing execution");

        let (system, user) = prompts::execution_observer(state);
        let decision: ExecutionObserverDecision =
            self.models.default_model.complete(&system, &user).await?;

        info!(
            success = decision.execution_success,
            observations = decision.observations.len(),
            "Observer verdict"
        );

        let mut observations = decision.observations;
        for obs in &mut observations {
            obs.step_number = state.step_number;
        }
        state.observations.append_current(observations);
        state.current_step_success = decision.execution_success;
        Ok(())
    }

    /// REFLECTION: consolidate observations into the world set.
    pub(crate) async fn reflection_node(&self, state: &mut AgentState) -> Result<()> {
        info!(
            current = state.observations.current().len(),
            world = state.observations.world().len(),
            "Reflecting on observations"
        );

        let (system, user) = prompts::reflection(
            state.observations.current(),
            state.observations.world(),
            state.step_number,
        );
        let decision: ReflectionDecision =
            self.models.default_model.complete(&system, &user).await?;

        state.observations.apply_reflection(decision.observations);
        info!(world = state.observations.world().len(), "World observations updated");
        Ok(())
    }

    /// ANSWERING: produce the final answer for the task.
    pub(crate) async fn answering_node(&self, state: &mut AgentState) -> Result<()> {
        let answer = match state.action_signal {
            ActionSignal::Clarification => {
                let (system, user) =
                    prompts::clarification(&state.task_description, &state.task_rationale);
                let response: ClarificationResponse =
                    self.models.answering.complete(&system, &user).await?;
                TaskAnswer {
                    notebook_description: String::new(),
                    answer: response.questions,
                    success: false,
                    artifacts: Vec::new(),
                }
            }
            ActionSignal::GeneralAnswer => {
                let (system, user) =
                    prompts::general_answer(&state.task_description, &state.task_rationale);
                let response: GeneralAnswerResponse =
                    self.models.answering.complete(&system, &user).await?;
                TaskAnswer {
                    notebook_description: String::new(),
                    answer: response.answer,
                    success: true,
                    artifacts: Vec::new(),
                }
            }
            ActionSignal::TaskCompleted | ActionSignal::TaskFailed => {
                self.synthesize_report(state).await?
            }
            signal => {
                error!(?signal, "Answering reached with an unexpected action signal");
                TaskAnswer {
                    notebook_description: String::new(),
                    answer: "Error: answering reached with an unexpected action signal."
                        .to_string(),
                    success: false,
                    artifacts: Vec::new(),
                }
            }
        };

        info!(success = answer.success, "Final answer produced");
        state.task_answer = Some(answer);
        state.action_signal = ActionSignal::FinalAnswer;
        Ok(())
    }

    /// Synthesize the completed/failed report: final markdown, resolved
    /// artifact paths, and the rendered notebook as an extra artifact.
    async fn synthesize_report(&self, state: &mut AgentState) -> Result<TaskAnswer> {
        info!(completed = state.completed_steps.len(), "Generating final report");

        let workdir_contents = match self
            .sandbox
            .list_tree(&state.sandbox_id, &self.config.working_directory)
            .await
        {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "Failed to list sandbox working directory");
                String::new()
            }
        };

        let (system, user) = prompts::task_answer(state, &workdir_contents);
        let mut answer: TaskAnswer = self.models.answering.complete(&system, &user).await?;

        for artifact in &mut answer.artifacts {
            artifact.full_path =
                resolve_path(&self.config.working_directory, &artifact.full_path);
        }

        let notebook = self.render_notebook(state);
        match self
            .sandbox
            .save_notebook(&state.sandbox_id, &notebook, &self.config.notebook_filename)
            .await
        {
            Ok(path) => {
                let description = if answer.notebook_description.is_empty() {
                    FALLBACK_NOTEBOOK_DESCRIPTION.to_string()
                } else {
                    answer.notebook_description.clone()
                };
                answer.artifacts.push(ArtifactDecision {
                    artifact_type: ArtifactType::File,
                    description,
                    full_path: path,
                });
            }
            Err(e) => {
                warn!(error = %e, "Failed to save notebook to sandbox");
            }
        }

        Ok(answer)
    }

    /// Render the task transcript as a notebook.
    fn render_notebook(&self, state: &AgentState) -> serde_json::Value {
        let mut builder = NotebookBuilder::new();

        let quoted_task = state
            .task_description
            .lines()
            .map(|line| format!("> {}", line))
            .collect::<Vec<_>>()
            .join("\n");
        builder.add_markdown(format!(
            "# Task\n\n{}\n\n## Rationale\n\n{}",
            quoted_task, state.task_rationale
        ));

        for step in &state.completed_steps {
            builder.add_markdown(format!("## Step {}: {}", step.step_number, step.goal));
            builder.add_markdown(step.description.clone());

            if !step.code.is_empty() {
                builder.add_code(step.code.clone());
            }
            if let Some(execution) = &step.execution_result {
                builder.add_execution(execution);
            }
        }

        builder.build()
    }

    /// Recreate the sandbox execution context after a failed run so the next
    /// attempt starts from a clean interpreter. Best-effort.
    async fn recover_context(&self, state: &AgentState) {
        if let Err(e) = self.sandbox.recreate_context(&state.sandbox_id).await {
            warn!(error = %e, "Failed to recreate execution context");
        }
    }

    fn truncate(&self, text: &str) -> String {
        truncate_output(text, self.config.max_output_chars, self.config.output_split_ratio)
    }
}

/// Resolve a possibly-relative artifact path against the working directory.
pub(crate) fn resolve_path(working_directory: &str, path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", working_directory.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path_relative() {
        assert_eq!(
            resolve_path("/home/user", "plots/out.png"),
            "/home/user/plots/out.png"
        );
    }

    #[test]
    fn test_resolve_path_absolute() {
        assert_eq!(resolve_path("/home/user", "/tmp/out.png"), "/tmp/out.png");
    }
}
