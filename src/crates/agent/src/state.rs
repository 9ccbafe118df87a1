//! Agent state: the working memory of one workflow execution.

use crate::observations::ObservationStore;
use crate::signals::ActionSignal;
use llm::{StepObservation, TaskAnswer};
use sandbox::ExecutionResult;

/// Per-task working memory, exclusively owned by the workflow engine for the
/// duration of one run and handed back to the coordinator at termination.
#[derive(Debug, Clone)]
pub struct AgentState {
    // Input data
    /// User's task description.
    pub task_description: String,
    /// Description of the provided data files.
    pub data_files_description: String,
    /// Sandbox paths of the uploaded data files.
    pub uploaded_files: Vec<String>,

    // Task execution environment
    /// Sandbox owned by this task.
    pub sandbox_id: String,
    /// Registry id of this task.
    pub task_id: String,

    // Agent control
    /// Signal directing the next transition.
    pub action_signal: ActionSignal,

    // Planning output
    /// Rationale about the task from the planning node.
    pub task_rationale: String,

    // Step management
    /// Goal of the step in flight.
    pub current_step_goal: String,
    /// Detailed description of the step in flight.
    pub current_step_description: String,
    /// Goals already tried for the step in flight, deduplicated by insertion.
    pub current_step_goal_history: Vec<String>,
    /// Current step number, 0-indexed, incremented only on proceed.
    pub step_number: u32,
    /// Attempts spent on the current step goal.
    pub step_attempts: u32,
    /// Archived steps, append-only.
    pub completed_steps: Vec<CompletedStep>,

    // Code generation
    /// Code generated for the step in flight.
    pub generated_code: String,
    /// Generation attempts within the step in flight.
    pub code_generation_attempts: u32,

    // Execution
    /// Structured result of the last execution.
    pub execution_result: Option<ExecutionResult>,
    /// Bounded text of the last execution's output.
    pub last_execution_output: String,
    /// Bounded text of the last execution's error, empty when none.
    pub last_execution_error: String,
    /// Verdict of the execution observer for the step in flight.
    pub current_step_success: bool,

    // Observations
    /// Current-step and consolidated world observations.
    pub observations: ObservationStore,

    // Outcome
    /// Reason for failure, when the task failed.
    pub failure_reason: String,
    /// Final answer, present once the answering node has run.
    pub task_answer: Option<TaskAnswer>,
}

impl AgentState {
    /// Create the initial state for a task.
    pub fn new(
        task_description: impl Into<String>,
        data_files_description: impl Into<String>,
        uploaded_files: Vec<String>,
        sandbox_id: impl Into<String>,
        task_id: impl Into<String>,
    ) -> Self {
        Self {
            task_description: task_description.into(),
            data_files_description: data_files_description.into(),
            uploaded_files,
            sandbox_id: sandbox_id.into(),
            task_id: task_id.into(),
            action_signal: ActionSignal::Start,
            task_rationale: String::new(),
            current_step_goal: String::new(),
            current_step_description: String::new(),
            current_step_goal_history: Vec::new(),
            step_number: 0,
            step_attempts: 0,
            completed_steps: Vec::new(),
            generated_code: String::new(),
            code_generation_attempts: 0,
            execution_result: None,
            last_execution_output: String::new(),
            last_execution_error: String::new(),
            current_step_success: false,
            observations: ObservationStore::new(),
            failure_reason: String::new(),
            task_answer: None,
        }
    }

    /// Record a tried goal in the history, keeping insertion order and
    /// skipping empties and duplicates.
    pub fn push_goal_history(&mut self, goal: &str) {
        if goal.is_empty() {
            return;
        }
        if !self.current_step_goal_history.iter().any(|g| g == goal) {
            self.current_step_goal_history.push(goal.to_string());
        }
    }

    /// Archive the step in flight as a completed step.
    ///
    /// The step is immutable once appended; observations are snapshotted by
    /// value, not aliased.
    pub fn archive_current_step(&mut self) {
        let step = CompletedStep {
            step_number: self.step_number,
            goal: self.current_step_goal.clone(),
            description: self.current_step_description.clone(),
            code: self.generated_code.clone(),
            execution_result: self.execution_result.clone(),
            success: self.last_execution_error.is_empty(),
            observations: self.observations.snapshot(),
        };
        self.completed_steps.push(step);
    }

    /// Reset the per-attempt execution context when the planner closes or
    /// re-opens a step.
    pub fn reset_execution_context(&mut self) {
        self.code_generation_attempts = 0;
        self.generated_code.clear();
        self.execution_result = None;
        self.last_execution_output.clear();
        self.last_execution_error.clear();
    }

    /// Notebook transcript of the completed steps' code, with step headers.
    pub fn notebook_code(&self) -> String {
        let mut transcript = String::new();
        for step in &self.completed_steps {
            transcript.push_str(&format!(
                "\n\n# Step {}: {}\n{}",
                step.step_number, step.goal, step.code
            ));
        }
        transcript
    }
}

/// Archived, immutable record of a closed step.
#[derive(Debug, Clone)]
pub struct CompletedStep {
    /// Step number at the time the step closed.
    pub step_number: u32,
    /// Goal the step pursued.
    pub goal: String,
    /// Description of what the step did.
    pub description: String,
    /// Code that was executed.
    pub code: String,
    /// Execution result, absent when the step never executed successfully.
    pub execution_result: Option<ExecutionResult>,
    /// Whether the step closed without an execution error.
    pub success: bool,
    /// Snapshot of the per-step observations at the moment the step closed.
    pub observations: Vec<StepObservation>,
}
