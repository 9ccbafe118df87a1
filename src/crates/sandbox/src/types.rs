//! Wire types exchanged with the sandbox provider.

use serde::{Deserialize, Serialize};

/// A data file supplied by the caller for upload into a sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFile {
    /// File name as supplied by the caller.
    pub filename: String,
    /// Raw bytes content.
    pub content: Vec<u8>,
    /// Declared size in bytes.
    pub size: usize,
    /// MIME type, when known.
    pub content_type: Option<String>,
}

impl DataFile {
    /// Create a data file from its name and content.
    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        let size = content.len();
        Self {
            filename: filename.into(),
            content,
            size,
            content_type: None,
        }
    }
}

/// Result of executing a code blob inside a sandbox.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured stdout, one entry per line.
    #[serde(default)]
    pub stdout: Vec<String>,
    /// Captured stderr, one entry per line.
    #[serde(default)]
    pub stderr: Vec<String>,
    /// Rich display results (plots, tables, ...), in emission order.
    #[serde(default)]
    pub results: Vec<ExecutionArtifact>,
    /// Runtime error, when the execution raised.
    #[serde(default)]
    pub error: Option<ExecutionError>,
}

impl ExecutionResult {
    /// Joined stdout text.
    pub fn stdout_text(&self) -> String {
        self.stdout.join("\n")
    }

    /// Joined stderr text.
    pub fn stderr_text(&self) -> String {
        self.stderr.join("\n")
    }

    /// Error message preferring stderr detail over the error value.
    pub fn error_text(&self) -> Option<String> {
        self.error.as_ref().map(|err| {
            if self.stderr.is_empty() {
                format!("{}: {}", err.name, err.value)
            } else {
                self.stderr_text()
            }
        })
    }
}

/// One rich display result from an execution, as MIME parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionArtifact {
    /// text/plain representation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// text/html representation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    /// text/markdown representation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    /// image/png representation, base64 encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub png: Option<String>,
    /// image/svg+xml representation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
    /// application/json representation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<serde_json::Value>,
    /// Whether this is the cell's main result rather than display data.
    #[serde(default)]
    pub is_main_result: bool,
}

impl ExecutionArtifact {
    /// Best plain-text rendering of the artifact, for prompt transcripts.
    pub fn display_text(&self) -> String {
        if let Some(text) = &self.text {
            text.clone()
        } else if let Some(markdown) = &self.markdown {
            markdown.clone()
        } else if self.png.is_some() {
            "<image/png>".to_string()
        } else if self.svg.is_some() {
            "<image/svg+xml>".to_string()
        } else if let Some(json) = &self.json {
            json.to_string()
        } else if self.html.is_some() {
            "<text/html>".to_string()
        } else {
            String::new()
        }
    }
}

/// Runtime error raised by an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionError {
    /// Exception class name.
    pub name: String,
    /// Exception message.
    pub value: String,
    /// Full traceback text.
    #[serde(default)]
    pub traceback: String,
}
