//! Error types for sandbox gateway operations.

use thiserror::Error;

/// Result type for sandbox operations.
pub type Result<T> = std::result::Result<T, SandboxError>;

/// Errors that can occur when talking to the sandbox provider.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The referenced sandbox does not exist.
    #[error("Sandbox '{0}' does not exist")]
    SandboxNotFound(String),

    /// A file path does not exist inside the sandbox.
    #[error("File '{path}' does not exist in sandbox '{sandbox_id}'")]
    FileNotFound {
        /// Path that was requested
        path: String,
        /// Sandbox that was searched
        sandbox_id: String,
    },

    /// Provider rejected the request or returned a server error.
    #[error("Sandbox provider error: {0}")]
    Provider(String),

    /// Remote storage is disabled or misconfigured.
    #[error("Remote storage error: {0}")]
    Storage(String),

    /// Provider returned a malformed payload.
    #[error("Invalid response from sandbox provider: {0}")]
    InvalidResponse(String),
}

impl SandboxError {
    /// Create a file-not-found error.
    pub fn file_not_found(path: impl Into<String>, sandbox_id: impl Into<String>) -> Self {
        Self::FileNotFound {
            path: path.into(),
            sandbox_id: sandbox_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_display() {
        let err = SandboxError::file_not_found("/home/user/out.csv", "sbx-1");
        assert!(err.to_string().contains("/home/user/out.csv"));
        assert!(err.to_string().contains("sbx-1"));
    }
}
