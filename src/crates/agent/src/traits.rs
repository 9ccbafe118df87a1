//! Seams between the engine and its collaborators.
//!
//! The engine talks to the LLM gateway, the sandbox gateway, and the task
//! registry only through these traits, so tests can drive the state machine
//! with scripted stand-ins.

use async_trait::async_trait;
use llm::StructuredOutput;
use sandbox::{DataFile, ExecutionResult};
use serde_json::Value;

/// A model endpoint that can produce structured outputs.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Request a structured output of type `T` for a system+user pair.
    async fn complete<T>(&self, system_prompt: &str, user_prompt: &str) -> llm::Result<T>
    where
        T: StructuredOutput + Send;
}

#[async_trait]
impl LanguageModel for llm::LlmClient {
    async fn complete<T>(&self, system_prompt: &str, user_prompt: &str) -> llm::Result<T>
    where
        T: StructuredOutput + Send,
    {
        llm::LlmClient::complete(self, system_prompt, user_prompt).await
    }
}

/// The sandbox operations the engine and coordinator depend on.
#[async_trait]
pub trait SandboxRuntime: Send + Sync {
    /// Create a fresh isolated environment and return its id.
    async fn create_sandbox(&self) -> sandbox::Result<String>;

    /// Destroy a sandbox. Idempotent.
    async fn destroy_sandbox(&self, sandbox_id: &str) -> sandbox::Result<()>;

    /// Upload data files and return their sandbox paths.
    async fn upload_files(
        &self,
        sandbox_id: &str,
        files: &[DataFile],
        target_folder: &str,
    ) -> sandbox::Result<Vec<String>>;

    /// Execute a code blob.
    async fn execute_code(&self, sandbox_id: &str, code: &str)
        -> sandbox::Result<ExecutionResult>;

    /// Reset the execution context to a clean interpreter.
    async fn recreate_context(&self, sandbox_id: &str) -> sandbox::Result<()>;

    /// Download a file, falling back to the working directory for relative
    /// paths.
    async fn download_file(&self, sandbox_id: &str, path: &str) -> sandbox::Result<Vec<u8>>;

    /// Check whether a path exists.
    async fn path_exists(&self, sandbox_id: &str, path: &str) -> sandbox::Result<bool>;

    /// Bounded recursive listing of a directory.
    async fn list_tree(&self, sandbox_id: &str, root: &str) -> sandbox::Result<String>;

    /// Save a rendered notebook and return its path.
    async fn save_notebook(
        &self,
        sandbox_id: &str,
        notebook: &Value,
        filename: &str,
    ) -> sandbox::Result<String>;

    /// Upload a sandbox path to the remote object store.
    async fn upload_to_remote_store(
        &self,
        sandbox_id: &str,
        source_path: &str,
        key: &str,
        delete_source: bool,
    ) -> sandbox::Result<()>;

    /// Download remote store objects into the sandbox.
    async fn download_from_remote_store(
        &self,
        sandbox_id: &str,
        keys: &[String],
        target_folder: &str,
    ) -> sandbox::Result<Vec<String>>;

    /// The configured sandbox working directory.
    fn working_directory(&self) -> &str;

    /// The configured data upload directory.
    fn data_directory(&self) -> &str;

    /// Whether remote object storage is configured.
    fn remote_storage_enabled(&self) -> bool;
}

#[async_trait]
impl SandboxRuntime for sandbox::SandboxClient {
    async fn create_sandbox(&self) -> sandbox::Result<String> {
        sandbox::SandboxClient::create_sandbox(self).await
    }

    async fn destroy_sandbox(&self, sandbox_id: &str) -> sandbox::Result<()> {
        sandbox::SandboxClient::destroy_sandbox(self, sandbox_id).await
    }

    async fn upload_files(
        &self,
        sandbox_id: &str,
        files: &[DataFile],
        target_folder: &str,
    ) -> sandbox::Result<Vec<String>> {
        sandbox::SandboxClient::upload_files(self, sandbox_id, files, target_folder).await
    }

    async fn execute_code(
        &self,
        sandbox_id: &str,
        code: &str,
    ) -> sandbox::Result<ExecutionResult> {
        sandbox::SandboxClient::execute_code(self, sandbox_id, code).await
    }

    async fn recreate_context(&self, sandbox_id: &str) -> sandbox::Result<()> {
        sandbox::SandboxClient::recreate_context(self, sandbox_id).await
    }

    async fn download_file(&self, sandbox_id: &str, path: &str) -> sandbox::Result<Vec<u8>> {
        sandbox::SandboxClient::download_file(self, sandbox_id, path).await
    }

    async fn path_exists(&self, sandbox_id: &str, path: &str) -> sandbox::Result<bool> {
        sandbox::SandboxClient::path_exists(self, sandbox_id, path).await
    }

    async fn list_tree(&self, sandbox_id: &str, root: &str) -> sandbox::Result<String> {
        sandbox::SandboxClient::list_tree(self, sandbox_id, root).await
    }

    async fn save_notebook(
        &self,
        sandbox_id: &str,
        notebook: &Value,
        filename: &str,
    ) -> sandbox::Result<String> {
        sandbox::SandboxClient::save_notebook(self, sandbox_id, notebook, filename).await
    }

    async fn upload_to_remote_store(
        &self,
        sandbox_id: &str,
        source_path: &str,
        key: &str,
        delete_source: bool,
    ) -> sandbox::Result<()> {
        sandbox::SandboxClient::upload_to_remote_store(
            self,
            sandbox_id,
            source_path,
            key,
            delete_source,
        )
        .await
    }

    async fn download_from_remote_store(
        &self,
        sandbox_id: &str,
        keys: &[String],
        target_folder: &str,
    ) -> sandbox::Result<Vec<String>> {
        sandbox::SandboxClient::download_from_remote_store(self, sandbox_id, keys, target_folder)
            .await
    }

    fn working_directory(&self) -> &str {
        sandbox::SandboxClient::working_directory(self)
    }

    fn data_directory(&self) -> &str {
        sandbox::SandboxClient::data_directory(self)
    }

    fn remote_storage_enabled(&self) -> bool {
        sandbox::SandboxClient::remote_storage_enabled(self)
    }
}

/// Liveness callback invoked on every node entry.
///
/// The coordinator wires this to the task registry so a long-running task
/// keeps refreshing its `updated_at` and is not evicted mid-flight.
pub trait Heartbeat: Send + Sync {
    /// Mark the task as alive.
    fn touch(&self);
}

/// No-op heartbeat for engine runs without a registry.
impl Heartbeat for () {
    fn touch(&self) {}
}
