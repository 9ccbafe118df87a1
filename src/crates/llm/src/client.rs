//! Provider-dispatching client with structured output decoding.

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{LlmError, Result};
use crate::outputs::StructuredOutput;
use crate::remote::{AnthropicClient, OpenAiClient};
use serde_json::Value;
use tracing::{debug, warn};

/// A configured LLM client, one variant per supported provider.
///
/// Cheap to clone; the underlying HTTP client is shared and safe for
/// concurrent calls from multiple tasks.
#[derive(Clone)]
pub enum LlmClient {
    /// OpenAI chat completions.
    OpenAi(OpenAiClient),
    /// Anthropic messages.
    Anthropic(AnthropicClient),
}

impl LlmClient {
    /// Build a client from configuration.
    ///
    /// Fails with [`LlmError::ApiKeyNotFound`] when the key is empty.
    pub fn from_config(config: LlmConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::ApiKeyNotFound(format!(
                "provider {:?}, model {}",
                config.provider, config.model
            )));
        }

        Ok(match config.provider {
            LlmProvider::OpenAi => Self::OpenAi(OpenAiClient::new(config)?),
            LlmProvider::Anthropic => Self::Anthropic(AnthropicClient::new(config)?),
        })
    }

    /// Model identifier this client targets.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi(c) => c.model(),
            Self::Anthropic(c) => c.model(),
        }
    }

    /// Request a structured output of type `T` for a system+user message pair.
    ///
    /// The schema is enforced at this boundary: the caller never sees
    /// untyped text. A decode failure triggers exactly one recovery attempt
    /// with the parse error appended to the user message; a second failure
    /// surfaces [`LlmError::Schema`].
    pub async fn complete<T: StructuredOutput>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<T> {
        let schema = T::schema();
        let raw = self
            .invoke(system_prompt, user_prompt, T::NAME, T::DESCRIPTION, &schema)
            .await?;

        match serde_json::from_value::<T>(raw) {
            Ok(value) => Ok(value),
            Err(first_err) => {
                warn!(
                    schema = T::NAME,
                    error = %first_err,
                    "Structured output decode failed, retrying once"
                );

                let recovery_prompt = format!(
                    "{user_prompt}\n\nYour previous reply did not conform to the \
                     `{}` schema: {first_err}. Reply again, conforming exactly to \
                     the schema.",
                    T::NAME
                );
                let raw = self
                    .invoke(system_prompt, &recovery_prompt, T::NAME, T::DESCRIPTION, &schema)
                    .await?;

                serde_json::from_value::<T>(raw)
                    .map_err(|e| LlmError::schema(T::NAME, e.to_string()))
            }
        }
    }

    async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        name: &str,
        description: &str,
        schema: &Value,
    ) -> Result<Value> {
        debug!(schema = name, model = self.model(), "Invoking LLM");
        match self {
            Self::OpenAi(c) => {
                c.invoke_tool(system_prompt, user_prompt, name, description, schema)
                    .await
            }
            Self::Anthropic(c) => {
                c.invoke_tool(system_prompt, user_prompt, name, description, schema)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_rejects_empty_key() {
        let config = LlmConfig::new(LlmProvider::OpenAi, "gpt-5", "");
        let result = LlmClient::from_config(config);
        assert!(matches!(result, Err(LlmError::ApiKeyNotFound(_))));
    }

    #[test]
    fn test_from_config_openai() {
        let config = LlmConfig::new(LlmProvider::OpenAi, "gpt-5", "test-key");
        let client = LlmClient::from_config(config).unwrap();
        assert_eq!(client.model(), "gpt-5");
    }

    #[test]
    fn test_from_config_anthropic() {
        let config = LlmConfig::new(LlmProvider::Anthropic, "claude-sonnet-4", "test-key");
        let client = LlmClient::from_config(config).unwrap();
        assert_eq!(client.model(), "claude-sonnet-4");
    }
}
