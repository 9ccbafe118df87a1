//! Request, response, and registry record models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Inputs supplied by the caller for one task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskRequest {
    /// What the agent should do. Required, non-empty after trimming.
    pub task_description: String,
    /// Description of the provided data files.
    #[serde(default)]
    pub data_files_description: String,
    /// Remote-store base path for inputs and artifacts.
    #[serde(default)]
    pub base_path: String,
    /// Remote-store paths to stage into the sandbox before the run.
    #[serde(default)]
    pub file_paths: Vec<String>,
    /// Sandbox folder remote files are staged into; defaults to the data
    /// directory.
    #[serde(default)]
    pub target_path: Option<String>,
}

impl TaskRequest {
    /// Validate and normalize the request. Trims the task description.
    pub fn validate(mut self) -> tooling::Result<Self> {
        self.task_description = tooling::validation::validate_non_empty_trimmed(
            &self.task_description,
            "task_description",
        )?;
        Ok(self)
    }
}

/// Lifecycle status of a registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// The task is queued or running.
    InProgress,
    /// The pipeline ran to completion and produced a response.
    Completed,
    /// The pipeline aborted; the response carries a diagnostic.
    Failed,
}

/// Registry record for one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskInfo {
    /// Opaque unique task id.
    pub task_id: String,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Final response, present once the task reached a terminal status.
    pub response: Option<TaskResponse>,
    /// When the task was registered.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every state mutation and on every node entry.
    pub updated_at: DateTime<Utc>,
}

impl TaskInfo {
    /// Create a fresh in-progress record.
    pub fn new(task_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            task_id: task_id.into(),
            status: TaskStatus::InProgress,
            response: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Caller-facing task result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Task id.
    pub id: String,
    /// Lifecycle status at response time.
    pub status: TaskStatus,
    /// Markdown answer or report.
    pub answer: String,
    /// Whether the task succeeded.
    pub success: bool,
    /// Artifacts referenced by the answer.
    #[serde(default)]
    pub artifacts: Vec<ArtifactResponse>,
}

impl TaskResponse {
    /// Response for a task still in flight.
    pub fn in_progress(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::InProgress,
            answer: "Task is still being processed.".to_string(),
            success: true,
            artifacts: Vec::new(),
        }
    }

    /// Standard failure response with a short diagnostic, never a stack trace.
    pub fn failure(id: impl Into<String>, diagnostic: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Failed,
            answer: format!(
                "Task processing failed: {}. Please check your task description \
                 and data files, then try again.",
                diagnostic.into()
            ),
            success: false,
            artifacts: Vec::new(),
        }
    }
}

/// One artifact attached to a task response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactResponse {
    /// Opaque stable artifact id.
    pub id: String,
    /// What the artifact contains.
    pub description: String,
    /// FILE or FOLDER.
    #[serde(rename = "type")]
    pub artifact_type: llm::ArtifactType,
    /// File or folder name, derived from the final path component.
    pub name: String,
    /// Remote-store key or sandbox-relative path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Base64 content in inline mode; absent in remote mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}
