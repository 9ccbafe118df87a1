//! Error types for the workflow engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that abort a workflow run.
///
/// Sandbox execution failures are not represented here: the engine captures
/// them into the state and routes them through the observer path. Only LLM
/// gateway failures (and internal invariant violations) abort a task.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The LLM gateway failed; the run is aborted and the coordinator
    /// converts this into a FAILED task.
    #[error("LLM gateway error: {0}")]
    Llm(#[from] llm::LlmError),

    /// An engine invariant was violated.
    #[error("Engine error: {0}")]
    Internal(String),
}
