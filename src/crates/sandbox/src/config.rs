//! Sandbox provider configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the sandbox provider gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Base URL of the sandbox provider API.
    pub api_url: String,

    /// API key for the provider.
    pub api_key: String,

    /// Environment template to instantiate.
    pub template: String,

    /// Provider-level wall-clock timeout for a sandbox, in seconds.
    pub timeout_seconds: u64,

    /// Working directory inside a sandbox.
    pub working_directory: String,

    /// Directory where uploaded data files land.
    pub data_directory: String,

    /// Remote object storage, when enabled.
    pub remote_storage: Option<RemoteStorageConfig>,
}

impl SandboxConfig {
    /// Create a configuration with the given provider endpoint and key.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            template: "python-data-science".to_string(),
            timeout_seconds: 2400,
            working_directory: "/home/user".to_string(),
            data_directory: "/home/user/data".to_string(),
            remote_storage: None,
        }
    }

    /// Set the environment template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Set the provider wall-clock timeout.
    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Set the sandbox working directory.
    pub fn with_working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = dir.into();
        self
    }

    /// Set the data upload directory.
    pub fn with_data_directory(mut self, dir: impl Into<String>) -> Self {
        self.data_directory = dir.into();
        self
    }

    /// Enable remote object storage.
    pub fn with_remote_storage(mut self, storage: RemoteStorageConfig) -> Self {
        self.remote_storage = Some(storage);
        self
    }
}

/// Credentials and location of the remote object store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStorageConfig {
    /// Bucket name.
    pub bucket: String,
    /// Custom endpoint, when not using the default.
    pub endpoint: Option<String>,
    /// Access key id.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
}

impl RemoteStorageConfig {
    /// Check that all required fields are present.
    pub fn is_complete(&self) -> bool {
        !self.bucket.is_empty()
            && !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
    }
}
