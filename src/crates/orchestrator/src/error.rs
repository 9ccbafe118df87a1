//! Error types for task coordination.

use thiserror::Error;

/// Result type for coordinator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors raised while coordinating a task.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Request input failed validation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// An uploaded file exceeds the configured size limit.
    #[error("File too large: {0}")]
    FileTooLarge(String),

    /// The workflow engine aborted (LLM gateway failure).
    #[error("Workflow aborted: {0}")]
    Agent(#[from] agent::AgentError),

    /// A sandbox operation outside the engine failed.
    #[error("Sandbox gateway error: {0}")]
    Sandbox(#[from] sandbox::SandboxError),

    /// The referenced task is unknown or was evicted.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Internal invariant violation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tooling::ToolingError> for OrchestratorError {
    fn from(err: tooling::ToolingError) -> Self {
        match err {
            tooling::ToolingError::Validation { .. } => Self::Validation(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}
