//! Shared tooling for the datalab workspace
//!
//! # Modules
//!
//! - `config` - Environment variable loading with typed parsing
//! - `logging` - Subscriber initialization and log sanitization
//! - `validation` - Request field validation helpers

pub mod config;
pub mod logging;
pub mod validation;

use thiserror::Error;

/// Errors that can occur in the tooling crate
#[derive(Debug, Error)]
pub enum ToolingError {
    /// General error with message
    #[error("Tooling error: {0}")]
    General(String),

    /// Validation failure with field context
    #[error("Validation failed for '{field}': {reason}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Why the value was rejected
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ToolingError {
    /// Create a validation error with field context
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for tooling operations
pub type Result<T> = std::result::Result<T, ToolingError>;

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
