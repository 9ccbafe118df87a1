//! Prompt assembly for the workflow nodes.
//!
//! Each builder returns a `(system, user)` message pair. The wording here is
//! advisory; the contract with the model is carried by the structured output
//! schemas in the `llm` crate.

use crate::observations::ObservationStore;
use crate::state::{AgentState, CompletedStep};
use llm::StepObservation;

/// Prompt pair for the planning node.
pub fn planning(
    task_description: &str,
    data_files_description: &str,
    uploaded_files: &[String],
) -> (String, String) {
    let system = "You are the planning stage of a data analysis agent with access to a \
         Python sandbox. Classify the user request: CODE_PLANNING when it needs \
         code execution, GENERAL_ANSWER when you can answer directly, \
         CLARIFICATION when the request is too ambiguous to act on. \
         Provide your rationale."
        .to_string();

    let user = format!(
        "Task:\n{}\n\nData files description:\n{}\n\nUploaded files:\n{}",
        task_description,
        non_empty_or(data_files_description, "(none)"),
        render_files(uploaded_files),
    );

    (system, user)
}

/// Prompt pair for the code planning node.
pub fn code_planning(state: &AgentState) -> (String, String) {
    let system = "You are the step planner of a data analysis agent. Work in small, \
         verifiable steps. Decide the next action: ITERATE_CURRENT_STEP to retry \
         the current step with a new, distinct goal; PROCEED_TO_NEXT_STEP when \
         the current step succeeded; TASK_COMPLETED when the whole task is done; \
         TASK_FAILED when it cannot be completed. Rules in the observations are \
         binding: spec-sourced rules dominate user-sourced, which dominate \
         data-sourced."
        .to_string();

    let (rules, data) = ObservationStore::split_buckets(state.observations.world());

    let user = format!(
        "Task:\n{}\n\nData files description:\n{}\n\nUploaded files:\n{}\n\n\
         Current step goal: {}\nGoals already tried for this step:\n{}\n\n\
         Last execution output:\n{}\n\nLast execution error:\n{}\n\n\
         Completed steps:\n{}\n\nRules to obey:\n{}\n\nData observations:\n{}",
        state.task_description,
        non_empty_or(&state.data_files_description, "(none)"),
        render_files(&state.uploaded_files),
        non_empty_or(&state.current_step_goal, "(task not started yet)"),
        render_list(&state.current_step_goal_history),
        non_empty_or(&state.last_execution_output, "(none)"),
        non_empty_or(&state.last_execution_error, "(none)"),
        render_steps(&state.completed_steps),
        render_observations(&rules),
        render_observations(&data),
    );

    (system, user)
}

/// Prompt pair for the code generation node.
pub fn code_generation(state: &AgentState) -> (String, String) {
    let system = "You are the code generator of a data analysis agent. Produce one \
         Python code blob that accomplishes the current step goal inside a \
         Jupyter-style sandbox. The notebook state from previous steps is still \
         loaded. Executions should stay well under two minutes; prefer small, \
         observable steps. Print what you need to see."
        .to_string();

    let previous_attempt = if state.last_execution_error.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nYour previous attempt failed.\nPrevious code:\n{}\n\nError:\n{}\n\
             Output:\n{}",
            state.generated_code, state.last_execution_error, state.last_execution_output,
        )
    };

    let user = format!(
        "Step goal: {}\n\nStep description:\n{}\n\nData files description:\n{}\n\n\
         Uploaded files:\n{}\n\nNotebook so far:\n{}{}",
        state.current_step_goal,
        state.current_step_description,
        non_empty_or(&state.data_files_description, "(none)"),
        render_files(&state.uploaded_files),
        non_empty_or(&state.notebook_code(), "(empty)"),
        previous_attempt,
    );

    (system, user)
}

/// Prompt pair for the execution observer node.
pub fn execution_observer(state: &AgentState) -> (String, String) {
    let system = "You observe the execution transcript of one agent step. Judge whether \
         the execution achieved the step goal, and extract observations: facts \
         discovered in the data, and rules that later steps must obey. Use \
         raw_output to preserve values verbatim when the final answer will need \
         to quote them. Rate importance and relevance from 1 to 5."
        .to_string();

    let user = format!(
        "Step goal: {}\n\nStep description:\n{}\n\nExecuted code:\n{}\n\n\
         Execution output:\n{}\n\nExecution error:\n{}",
        state.current_step_goal,
        state.current_step_description,
        state.generated_code,
        non_empty_or(&state.last_execution_output, "(none)"),
        non_empty_or(&state.last_execution_error, "(none)"),
    );

    (system, user)
}

/// Prompt pair for the reflection node.
pub fn reflection(
    current: &[StepObservation],
    world: &[StepObservation],
    step_number: u32,
) -> (String, String) {
    let system = "You consolidate the observation memory of a data analysis agent. Merge \
         the new step observations into the existing world observations. Collapse \
         duplicate titles and summaries. Never drop or demote a rule. When two \
         items of the same kind and source conflict, keep the one with the higher \
         step_number. Observations with both importance <= 2 and relevance <= 2 \
         may be dropped. Return the full merged list."
        .to_string();

    let current_refs: Vec<&StepObservation> = current.iter().collect();
    let world_refs: Vec<&StepObservation> = world.iter().collect();

    let user = format!(
        "Current step number: {}\n\nNew observations from this step:\n{}\n\n\
         Existing world observations:\n{}",
        step_number,
        render_observations(&current_refs),
        render_observations(&world_refs),
    );

    (system, user)
}

/// Prompt pair for clarification questions.
pub fn clarification(task_description: &str, task_rationale: &str) -> (String, String) {
    let system = "The user request was too ambiguous to act on. Ask focused clarification \
         questions that would let a data analysis agent proceed."
        .to_string();

    let user = format!(
        "Task:\n{}\n\nWhy clarification is needed:\n{}",
        task_description, task_rationale,
    );

    (system, user)
}

/// Prompt pair for a direct answer without code execution.
pub fn general_answer(task_description: &str, task_rationale: &str) -> (String, String) {
    let system = "Answer the user's request directly in well-formatted markdown. No code \
         execution is available or needed."
        .to_string();

    let user = format!(
        "Task:\n{}\n\nRationale:\n{}",
        task_description, task_rationale,
    );

    (system, user)
}

/// Prompt pair for the final report.
pub fn task_answer(state: &AgentState, workdir_contents: &str) -> (String, String) {
    let system = "Write the final markdown report for a data analysis task. Structure it \
         with an overview, key findings, results and interpretation, and \
         conclusions. Quote verbatim values from raw_output observations exactly. \
         List as artifacts only files and folders that exist in the working \
         directory listing. Use paths relative to the working directory or \
         absolute paths."
        .to_string();

    let (rules, data) = ObservationStore::split_buckets(state.observations.world());

    let failure = if state.failure_reason.is_empty() {
        String::new()
    } else {
        format!("\n\nThe task FAILED. Reason:\n{}", state.failure_reason)
    };

    let user = format!(
        "Task:\n{}\n\nRationale:\n{}\n\nCompleted steps:\n{}\n\n\
         Rules observed:\n{}\n\nData observations:\n{}\n\n\
         Working directory contents:\n{}{}",
        state.task_description,
        state.task_rationale,
        render_steps(&state.completed_steps),
        render_observations(&rules),
        render_observations(&data),
        non_empty_or(workdir_contents, "(empty)"),
        failure,
    );

    (system, user)
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn render_files(files: &[String]) -> String {
    if files.is_empty() {
        "(none)".to_string()
    } else {
        files
            .iter()
            .map(|f| format!("- {}", f))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_list(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items
            .iter()
            .map(|i| format!("- {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_observations(observations: &[&StepObservation]) -> String {
    if observations.is_empty() {
        return "(none)".to_string();
    }
    serde_json::to_string_pretty(
        &observations.iter().map(|o| (*o).clone()).collect::<Vec<_>>(),
    )
    .unwrap_or_else(|_| "(unrenderable)".to_string())
}

fn render_steps(steps: &[CompletedStep]) -> String {
    if steps.is_empty() {
        return "(none)".to_string();
    }
    steps
        .iter()
        .map(|step| {
            format!(
                "### Step {} ({}): {}\n{}\nCode:\n{}\nOutcome: {}",
                step.step_number,
                if step.success { "succeeded" } else { "failed" },
                step.goal,
                step.description,
                step.code,
                summarize_outcome(step),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn summarize_outcome(step: &CompletedStep) -> String {
    match &step.execution_result {
        Some(result) => {
            let stdout = result.stdout_text();
            match result.error_text() {
                Some(err) => format!("error: {}", err),
                None if stdout.is_empty() => "(no output)".to_string(),
                None => stdout,
            }
        }
        None => "(never executed)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AgentState;

    #[test]
    fn test_planning_prompt_includes_task() {
        let (system, user) = planning("count the rows", "a csv file", &["data.csv".to_string()]);
        assert!(system.contains("CODE_PLANNING"));
        assert!(user.contains("count the rows"));
        assert!(user.contains("data.csv"));
    }

    #[test]
    fn test_code_planning_prompt_renders_history() {
        let mut state = AgentState::new("task", "", vec![], "sbx", "t1");
        state.current_step_goal = "load data".to_string();
        state.current_step_goal_history = vec!["load data".to_string()];
        let (_, user) = code_planning(&state);
        assert!(user.contains("- load data"));
    }

    #[test]
    fn test_code_generation_prompt_includes_error_context() {
        let mut state = AgentState::new("task", "", vec![], "sbx", "t1");
        state.current_step_goal = "plot".to_string();
        state.generated_code = "plt.plot(x)".to_string();
        state.last_execution_error = "NameError: x".to_string();

        let (_, user) = code_generation(&state);
        assert!(user.contains("previous attempt failed"));
        assert!(user.contains("NameError: x"));
    }

    #[test]
    fn test_code_generation_prompt_omits_error_on_fresh_step() {
        let state = AgentState::new("task", "", vec![], "sbx", "t1");
        let (_, user) = code_generation(&state);
        assert!(!user.contains("previous attempt failed"));
    }

    #[test]
    fn test_task_answer_prompt_mentions_failure() {
        let mut state = AgentState::new("task", "", vec![], "sbx", "t1");
        state.failure_reason = "Exceeded maximum attempts".to_string();
        let (_, user) = task_answer(&state, "");
        assert!(user.contains("FAILED"));
        assert!(user.contains("Exceeded maximum attempts"));
    }
}
