//! HTTP client for the sandbox provider.

use crate::config::SandboxConfig;
use crate::error::{Result, SandboxError};
use crate::types::{DataFile, ExecutionResult};
use reqwest::{Client, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Gateway to the sandbox provider API.
///
/// Cheap to clone; the underlying HTTP client is shared.
#[derive(Clone)]
pub struct SandboxClient {
    config: SandboxConfig,
    client: Client,
}

impl SandboxClient {
    /// Create a new gateway with the given configuration.
    pub fn new(config: SandboxConfig) -> Result<Self> {
        let client = Client::builder().build().map_err(SandboxError::Http)?;
        Ok(Self { config, client })
    }

    /// The configured sandbox working directory.
    pub fn working_directory(&self) -> &str {
        &self.config.working_directory
    }

    /// The configured data upload directory.
    pub fn data_directory(&self) -> &str {
        &self.config.data_directory
    }

    /// Whether remote object storage is configured and complete.
    pub fn remote_storage_enabled(&self) -> bool {
        self.config
            .remote_storage
            .as_ref()
            .map(|s| s.is_complete())
            .unwrap_or(false)
    }

    /// Create a fresh isolated environment and return its id.
    pub async fn create_sandbox(&self) -> Result<String> {
        info!("Creating new sandbox");
        let response = self
            .client
            .post(self.url("/sandboxes"))
            .header("X-API-Key", &self.config.api_key)
            .json(&json!({
                "template": self.config.template,
                "timeout_seconds": self.config.timeout_seconds,
            }))
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;

        let sandbox_id = body["sandbox_id"]
            .as_str()
            .ok_or_else(|| SandboxError::InvalidResponse("missing sandbox_id".to_string()))?
            .to_string();

        info!(sandbox_id, "Sandbox created");
        Ok(sandbox_id)
    }

    /// Destroy a sandbox. Idempotent: destroying an unknown sandbox succeeds.
    pub async fn destroy_sandbox(&self, sandbox_id: &str) -> Result<()> {
        info!(sandbox_id, "Destroying sandbox");
        let response = self
            .client
            .delete(self.url(&format!("/sandboxes/{}", sandbox_id)))
            .header("X-API-Key", &self.config.api_key)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!(sandbox_id, "Sandbox already gone");
            return Ok(());
        }
        Self::check(response).await?;

        info!(sandbox_id, "Sandbox destroyed");
        Ok(())
    }

    /// Recreate the code execution context so the next execution starts from
    /// a clean interpreter.
    pub async fn recreate_context(&self, sandbox_id: &str) -> Result<()> {
        info!(sandbox_id, "Recreating execution context");
        let response = self
            .client
            .post(self.url(&format!("/sandboxes/{}/context", sandbox_id)))
            .header("X-API-Key", &self.config.api_key)
            .json(&json!({"cwd": self.config.working_directory}))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Execute a code blob and return the captured result.
    pub async fn execute_code(&self, sandbox_id: &str, code: &str) -> Result<ExecutionResult> {
        info!(sandbox_id, "Executing code in sandbox");
        let response = self
            .client
            .post(self.url(&format!("/sandboxes/{}/execute", sandbox_id)))
            .header("X-API-Key", &self.config.api_key)
            .json(&json!({"code": code}))
            .send()
            .await?;
        let result: ExecutionResult = Self::check(response).await?.json().await?;

        info!(sandbox_id, "Code execution completed");
        Ok(result)
    }

    /// Upload data files into the sandbox and return the uploaded paths.
    pub async fn upload_files(
        &self,
        sandbox_id: &str,
        files: &[DataFile],
        target_folder: &str,
    ) -> Result<Vec<String>> {
        info!(sandbox_id, count = files.len(), "Uploading files to sandbox");

        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            let target_path = join_path(target_folder, &file.filename);
            let response = self
                .client
                .put(self.url(&format!("/sandboxes/{}/files", sandbox_id)))
                .header("X-API-Key", &self.config.api_key)
                .query(&[("path", target_path.as_str())])
                .body(file.content.clone())
                .send()
                .await?;
            Self::check(response).await?;

            info!(
                sandbox_id,
                filename = %file.filename,
                size = file.size,
                "Uploaded file to {}", target_path
            );
            uploaded.push(target_path);
        }

        Ok(uploaded)
    }

    /// Download a file from the sandbox.
    ///
    /// Relative paths that don't resolve are retried against the configured
    /// working directory before giving up.
    pub async fn download_file(&self, sandbox_id: &str, path: &str) -> Result<Vec<u8>> {
        match self.try_download(sandbox_id, path).await? {
            Some(bytes) => Ok(bytes),
            None => {
                info!(sandbox_id, path, "Checking working directory for the file");
                let fallback = join_path(&self.config.working_directory, path);
                match self.try_download(sandbox_id, &fallback).await? {
                    Some(bytes) => Ok(bytes),
                    None => Err(SandboxError::file_not_found(path, sandbox_id)),
                }
            }
        }
    }

    async fn try_download(&self, sandbox_id: &str, path: &str) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get(self.url(&format!("/sandboxes/{}/files", sandbox_id)))
            .header("X-API-Key", &self.config.api_key)
            .query(&[("path", path)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(Some(bytes.to_vec()))
    }

    /// Check whether a path exists inside the sandbox.
    pub async fn path_exists(&self, sandbox_id: &str, path: &str) -> Result<bool> {
        let response = self
            .client
            .get(self.url(&format!("/sandboxes/{}/files/stat", sandbox_id)))
            .header("X-API-Key", &self.config.api_key)
            .query(&[("path", path)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response).await?;
        Ok(true)
    }

    /// Bounded recursive listing of a directory, rendered as text.
    pub async fn list_tree(&self, sandbox_id: &str, root: &str) -> Result<String> {
        info!(sandbox_id, root, "Listing sandbox directory tree");
        let response = self
            .client
            .get(self.url(&format!("/sandboxes/{}/tree", sandbox_id)))
            .header("X-API-Key", &self.config.api_key)
            .query(&[("root", root), ("max_depth", "4"), ("max_entries", "200")])
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;

        Ok(body["tree"].as_str().unwrap_or_default().to_string())
    }

    /// Save a rendered notebook into the sandbox working directory.
    ///
    /// Returns the path the notebook was written to.
    pub async fn save_notebook(
        &self,
        sandbox_id: &str,
        notebook: &Value,
        filename: &str,
    ) -> Result<String> {
        let path = join_path(&self.config.working_directory, filename);
        let content = serde_json::to_vec(notebook)
            .map_err(|e| SandboxError::InvalidResponse(e.to_string()))?;

        let response = self
            .client
            .put(self.url(&format!("/sandboxes/{}/files", sandbox_id)))
            .header("X-API-Key", &self.config.api_key)
            .query(&[("path", path.as_str())])
            .body(content)
            .send()
            .await?;
        Self::check(response).await?;

        info!(sandbox_id, path, "Notebook saved to sandbox");
        Ok(path)
    }

    /// Upload a sandbox file or folder to the remote object store.
    pub async fn upload_to_remote_store(
        &self,
        sandbox_id: &str,
        source_path: &str,
        key: &str,
        delete_source: bool,
    ) -> Result<()> {
        let storage = self.storage_config()?;

        info!(sandbox_id, source_path, key, "Uploading to remote store");
        let response = self
            .client
            .post(self.url(&format!("/sandboxes/{}/storage/upload", sandbox_id)))
            .header("X-API-Key", &self.config.api_key)
            .json(&json!({
                "source": source_path,
                "key": key,
                "delete_source": delete_source,
                "bucket": storage.bucket,
                "endpoint": storage.endpoint,
                "access_key_id": storage.access_key_id,
                "secret_access_key": storage.secret_access_key,
            }))
            .send()
            .await?;
        Self::check(response).await?;

        info!(sandbox_id, key, "Remote store upload finished");
        Ok(())
    }

    /// Download remote store objects into the sandbox and return their paths.
    pub async fn download_from_remote_store(
        &self,
        sandbox_id: &str,
        keys: &[String],
        target_folder: &str,
    ) -> Result<Vec<String>> {
        let storage = self.storage_config()?;

        info!(sandbox_id, count = keys.len(), "Downloading from remote store");
        let response = self
            .client
            .post(self.url(&format!("/sandboxes/{}/storage/download", sandbox_id)))
            .header("X-API-Key", &self.config.api_key)
            .json(&json!({
                "keys": keys,
                "target": target_folder,
                "bucket": storage.bucket,
                "endpoint": storage.endpoint,
                "access_key_id": storage.access_key_id,
                "secret_access_key": storage.secret_access_key,
            }))
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;

        let paths = body["paths"]
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|p| p.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Ok(paths)
    }

    fn storage_config(&self) -> Result<&crate::config::RemoteStorageConfig> {
        let storage = self
            .config
            .remote_storage
            .as_ref()
            .ok_or_else(|| SandboxError::Storage("remote storage is not enabled".to_string()))?;
        if !storage.is_complete() {
            return Err(SandboxError::Storage(
                "remote storage configuration is incomplete".to_string(),
            ));
        }
        Ok(storage)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => SandboxError::SandboxNotFound(body),
            _ => SandboxError::Provider(format!("{}: {}", status, body)),
        })
    }
}

/// Join a directory and a relative path, keeping already-absolute paths as-is.
pub fn join_path(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> SandboxClient {
        SandboxClient::new(SandboxConfig::new("https://sandbox.test/api/", "key")).unwrap()
    }

    #[test]
    fn test_url_strips_trailing_slash() {
        let client = test_client();
        assert_eq!(
            client.url("/sandboxes"),
            "https://sandbox.test/api/sandboxes"
        );
    }

    #[test]
    fn test_join_path_relative() {
        assert_eq!(join_path("/home/user", "out.csv"), "/home/user/out.csv");
        assert_eq!(join_path("/home/user/", "out.csv"), "/home/user/out.csv");
    }

    #[test]
    fn test_join_path_absolute_passthrough() {
        assert_eq!(join_path("/home/user", "/tmp/out.csv"), "/tmp/out.csv");
    }

    #[test]
    fn test_storage_disabled_by_default() {
        let client = test_client();
        assert!(!client.remote_storage_enabled());
        assert!(client.storage_config().is_err());
    }
}
