//! Error types for the LLM gateway.

use thiserror::Error;

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when working with LLM providers.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// API authentication failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// API key not found in configuration.
    #[error("API key not found: {0}")]
    ApiKeyNotFound(String),

    /// Provider service unavailable or returned a server error.
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Request timed out.
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Reply did not conform to the requested output schema,
    /// even after the single recovery attempt.
    #[error("Structured output schema violation for '{schema}': {message}")]
    Schema {
        /// Name of the output schema that was requested
        schema: String,
        /// Decode failure detail
        message: String,
    },

    /// Provider returned a well-formed but unusable response.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Create a schema violation error.
    pub fn schema(schema: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            schema: schema.into(),
            message: message.into(),
        }
    }

    /// Check if this error is retryable at a higher level.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::Http(_)
                | LlmError::Unavailable(_)
                | LlmError::Timeout(_)
                | LlmError::RateLimited(_)
        )
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::InvalidResponse(err.to_string())
    }
}
