//! Provider configuration for LLM clients.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI chat completions API.
    OpenAi,
    /// Anthropic messages API.
    Anthropic,
}

impl LlmProvider {
    /// Parse a provider name as it appears in configuration.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "openai" => Some(Self::OpenAi),
            "anthropic" => Some(Self::Anthropic),
            _ => None,
        }
    }

    /// Default API base URL for the provider.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com",
        }
    }
}

/// Configuration for one LLM client.
///
/// The orchestrator builds one of these per workflow node (planning,
/// code planning, code generation, answering) plus a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Which provider to call.
    pub provider: LlmProvider,

    /// Model name/identifier.
    pub model: String,

    /// API key for authentication.
    pub api_key: String,

    /// Base URL for the API. Defaults to the provider's public endpoint.
    pub base_url: String,

    /// Per-call completion token budget.
    pub max_tokens: usize,

    /// Request timeout duration.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

impl LlmConfig {
    /// Create a new configuration with provider defaults.
    pub fn new(
        provider: LlmProvider,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            api_key: api_key.into(),
            base_url: provider.default_base_url().to_string(),
            max_tokens: default_max_tokens(),
            timeout: default_timeout(),
        }
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-call completion token budget.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_max_tokens() -> usize {
    4096
}
