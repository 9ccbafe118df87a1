//! The task coordinator.
//!
//! Owns the sandbox lifecycle around one workflow run: create, stage inputs,
//! drive the engine, materialize artifacts, destroy. Destruction happens on
//! every exit path before the outcome is inspected.

use crate::config::Settings;
use crate::error::{OrchestratorError, Result};
use crate::models::{ArtifactResponse, TaskRequest, TaskResponse, TaskStatus};
use crate::registry::{RegistryHeartbeat, TaskRegistry};
use agent::{AgentState, LanguageModel, NodeModels, SandboxRuntime, WorkflowEngine};
use base64::Engine as _;
use llm::TaskAnswer;
use sandbox::DataFile;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Coordinates task execution across the registry, sandbox, and engine.
#[derive(Clone)]
pub struct TaskService<L, S> {
    models: NodeModels<L>,
    sandbox: S,
    registry: Arc<TaskRegistry>,
    settings: Arc<Settings>,
}

impl<L, S> TaskService<L, S>
where
    L: LanguageModel + Clone + Send + Sync + 'static,
    S: SandboxRuntime + Clone + Send + Sync + 'static,
{
    /// Create a coordinator.
    pub fn new(
        models: NodeModels<L>,
        sandbox: S,
        registry: Arc<TaskRegistry>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            models,
            sandbox,
            registry,
            settings,
        }
    }

    /// The registry this coordinator reports into.
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Run a task to completion and return its response.
    pub async fn process_sync(&self, request: TaskRequest, files: Vec<DataFile>) -> TaskResponse {
        let info = self.registry.create();
        self.execute(info.task_id, request, files).await
    }

    /// Start a task on a background worker and return its id immediately.
    pub async fn process_async(&self, request: TaskRequest, files: Vec<DataFile>) -> String {
        let info = self.registry.create();
        let task_id = info.task_id.clone();

        let service = self.clone();
        let spawned_id = task_id.clone();
        tokio::spawn(async move {
            service.execute(spawned_id, request, files).await;
        });

        task_id
    }

    /// Run the pipeline and record the terminal status.
    async fn execute(
        &self,
        task_id: String,
        request: TaskRequest,
        files: Vec<DataFile>,
    ) -> TaskResponse {
        info!(task_id, task = %request.task_description, files = files.len(), "Processing task");

        match self.run_pipeline(&task_id, &request, files).await {
            Ok(response) => {
                self.registry
                    .update_status(&task_id, TaskStatus::Completed, Some(response.clone()));
                info!(task_id, success = response.success, "Task completed");
                response
            }
            Err(e) => {
                error!(task_id, error = %e, "Task processing failed");
                let response = TaskResponse::failure(&task_id, diagnostic(&e));
                self.registry
                    .update_status(&task_id, TaskStatus::Failed, Some(response.clone()));
                response
            }
        }
    }

    /// Sandbox-scoped section of the pipeline.
    ///
    /// The sandbox is destroyed exactly once, on every exit path, before the
    /// outcome is inspected; a destroy failure is logged and never masks the
    /// pipeline result.
    async fn run_pipeline(
        &self,
        task_id: &str,
        request: &TaskRequest,
        files: Vec<DataFile>,
    ) -> Result<TaskResponse> {
        let sandbox_id = self.sandbox.create_sandbox().await?;

        let outcome = self
            .run_in_sandbox(task_id, &sandbox_id, request, files)
            .await;

        if let Err(e) = self.sandbox.destroy_sandbox(&sandbox_id).await {
            warn!(sandbox_id, error = %e, "Failed to destroy sandbox");
        }

        outcome
    }

    async fn run_in_sandbox(
        &self,
        task_id: &str,
        sandbox_id: &str,
        request: &TaskRequest,
        files: Vec<DataFile>,
    ) -> Result<TaskResponse> {
        let mut uploaded = self
            .sandbox
            .upload_files(sandbox_id, &files, self.sandbox.data_directory())
            .await?;

        if !request.file_paths.is_empty() {
            if self.sandbox.remote_storage_enabled() {
                let keys: Vec<String> = request
                    .file_paths
                    .iter()
                    .map(|path| prefix_key(&request.base_path, path))
                    .collect();
                let target = request
                    .target_path
                    .clone()
                    .unwrap_or_else(|| self.sandbox.data_directory().to_string());
                let staged = self
                    .sandbox
                    .download_from_remote_store(sandbox_id, &keys, &target)
                    .await?;
                uploaded.extend(staged);
            } else {
                warn!("file_paths were provided but remote storage is disabled, ignoring");
            }
        }

        let mut state = AgentState::new(
            request.task_description.as_str(),
            request.data_files_description.as_str(),
            uploaded,
            sandbox_id,
            task_id,
        );

        let engine = WorkflowEngine::new(
            self.models.clone(),
            self.sandbox.clone(),
            RegistryHeartbeat::new(self.registry.clone(), task_id),
            self.settings.engine_config(),
        );
        engine.run(&mut state).await?;

        let answer = state.task_answer.take().ok_or_else(|| {
            OrchestratorError::Internal("engine finished without a task answer".to_string())
        })?;

        let artifacts = self
            .materialize_artifacts(task_id, sandbox_id, &request.base_path, &answer)
            .await;

        Ok(TaskResponse {
            id: task_id.to_string(),
            status: TaskStatus::Completed,
            answer: answer.answer,
            success: answer.success,
            artifacts,
        })
    }

    /// Resolve the answer's artifact decisions into caller-facing artifacts.
    ///
    /// Missing paths are skipped with a log line; a task never fails over an
    /// absent artifact. Inline and remote modes are mutually exclusive.
    async fn materialize_artifacts(
        &self,
        task_id: &str,
        sandbox_id: &str,
        base_path: &str,
        answer: &TaskAnswer,
    ) -> Vec<ArtifactResponse> {
        let remote_mode =
            self.settings.file_storage_enabled && self.sandbox.remote_storage_enabled();
        let working_directory = self.sandbox.working_directory().to_string();

        let mut artifacts = Vec::new();
        for decision in &answer.artifacts {
            match self.sandbox.path_exists(sandbox_id, &decision.full_path).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(path = %decision.full_path, "Artifact path does not exist, skipping");
                    continue;
                }
                Err(e) => {
                    warn!(path = %decision.full_path, error = %e, "Artifact check failed, skipping");
                    continue;
                }
            }

            let relative = sandbox_relative(&working_directory, &decision.full_path);
            let name = relative
                .rsplit('/')
                .next()
                .unwrap_or(relative.as_str())
                .to_string();

            if remote_mode {
                let base = if base_path.is_empty() {
                    self.settings.storage_base_path.as_str()
                } else {
                    base_path
                };
                let key = remote_key(base, task_id, &relative);
                match self
                    .sandbox
                    .upload_to_remote_store(sandbox_id, &decision.full_path, &key, true)
                    .await
                {
                    Ok(()) => artifacts.push(ArtifactResponse {
                        id: Uuid::new_v4().to_string(),
                        description: decision.description.clone(),
                        artifact_type: decision.artifact_type,
                        name,
                        path: Some(key),
                        content: None,
                    }),
                    Err(e) => {
                        warn!(path = %decision.full_path, error = %e, "Artifact upload failed, skipping");
                    }
                }
            } else {
                match self.sandbox.download_file(sandbox_id, &decision.full_path).await {
                    Ok(bytes) => artifacts.push(ArtifactResponse {
                        id: Uuid::new_v4().to_string(),
                        description: decision.description.clone(),
                        artifact_type: decision.artifact_type,
                        name,
                        path: Some(relative),
                        content: Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
                    }),
                    Err(e) => {
                        warn!(path = %decision.full_path, error = %e, "Artifact download failed, skipping");
                    }
                }
            }
        }

        artifacts
    }
}

/// Short, user-safe diagnostic for a pipeline failure.
fn diagnostic(error: &OrchestratorError) -> &'static str {
    match error {
        OrchestratorError::Agent(_) => "the language model backend failed",
        OrchestratorError::Sandbox(_) => "the execution sandbox was unavailable",
        OrchestratorError::Validation(_) => "the request was invalid",
        OrchestratorError::FileTooLarge(_) => "an uploaded file was too large",
        OrchestratorError::TaskNotFound(_) => "the task is unknown",
        OrchestratorError::Internal(_) => "an internal error occurred",
    }
}

/// Path of an artifact relative to the sandbox working directory.
fn sandbox_relative(working_directory: &str, full_path: &str) -> String {
    let prefix = format!("{}/", working_directory.trim_end_matches('/'));
    full_path
        .strip_prefix(&prefix)
        .unwrap_or(full_path.trim_start_matches('/'))
        .to_string()
}

/// Remote-store key for one task artifact.
fn remote_key(base_path: &str, task_id: &str, relative: &str) -> String {
    let base = base_path.trim_matches('/');
    if base.is_empty() {
        format!("task/{}/{}", task_id, relative)
    } else {
        format!("{}/task/{}/{}", base, task_id, relative)
    }
}

/// Prefix a caller-supplied remote path with the request base path.
fn prefix_key(base_path: &str, path: &str) -> String {
    let base = base_path.trim_matches('/');
    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}
