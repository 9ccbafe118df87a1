//! Anthropic messages client.
//!
//! Structured outputs are requested by registering the target schema as the
//! single available tool and forcing the model to use it.

use crate::config::LlmConfig;
use crate::error::{LlmError, Result};
use reqwest::Client;
use serde_json::{json, Value};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client.
#[derive(Clone)]
pub struct AnthropicClient {
    config: LlmConfig,
    client: Client,
}

impl AnthropicClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Http)?;

        Ok(Self { config, client })
    }

    /// Model identifier this client targets.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Call the model with a forced tool and return the tool input it supplied.
    pub async fn invoke_tool(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        name: &str,
        description: &str,
        schema: &Value,
    ) -> Result<Value> {
        let url = format!("{}/v1/messages", self.config.base_url);
        let body = Self::build_request_body(
            &self.config.model,
            self.config.max_tokens,
            system_prompt,
            user_prompt,
            name,
            description,
            schema,
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(format!("Anthropic request timed out: {}", e))
                } else {
                    LlmError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LlmError::Authentication(error_text),
                429 => LlmError::RateLimited(error_text),
                _ => {
                    LlmError::Unavailable(format!("Anthropic API error {}: {}", status, error_text))
                }
            });
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Self::extract_tool_input(&reply, name)
    }

    fn build_request_body(
        model: &str,
        max_tokens: usize,
        system_prompt: &str,
        user_prompt: &str,
        name: &str,
        description: &str,
        schema: &Value,
    ) -> Value {
        json!({
            "model": model,
            "max_tokens": max_tokens,
            "system": system_prompt,
            "messages": [
                {"role": "user", "content": user_prompt}
            ],
            "tools": [{
                "name": name,
                "description": description,
                "input_schema": schema
            }],
            "tool_choice": {"type": "tool", "name": name}
        })
    }

    /// Pull the forced tool's input out of a messages reply.
    fn extract_tool_input(reply: &Value, name: &str) -> Result<Value> {
        reply["content"]
            .as_array()
            .and_then(|blocks| {
                blocks.iter().find(|b| {
                    b["type"].as_str() == Some("tool_use") && b["name"].as_str() == Some(name)
                })
            })
            .map(|block| block["input"].clone())
            .ok_or_else(|| {
                LlmError::InvalidResponse(format!("no tool_use block for '{}' in reply", name))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmProvider;

    #[test]
    fn test_client_creation() {
        let config = LlmConfig::new(LlmProvider::Anthropic, "claude-sonnet-4", "test-key");
        let client = AnthropicClient::new(config).unwrap();
        assert_eq!(client.model(), "claude-sonnet-4");
    }

    #[test]
    fn test_build_request_body_separates_system() {
        let schema = json!({"type": "object", "properties": {}});
        let body = AnthropicClient::build_request_body(
            "claude-sonnet-4",
            4096,
            "You are a planner",
            "Plan this",
            "code_planning_decision",
            "desc",
            &schema,
        );

        assert_eq!(body["system"], "You are a planner");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["tool_choice"]["name"], "code_planning_decision");
    }

    #[test]
    fn test_extract_tool_input() {
        let reply = json!({
            "content": [
                {"type": "text", "text": "thinking..."},
                {
                    "type": "tool_use",
                    "name": "python_code",
                    "input": {"code": "print('hello')"}
                }
            ]
        });

        let input = AnthropicClient::extract_tool_input(&reply, "python_code").unwrap();
        assert_eq!(input["code"], "print('hello')");
    }

    #[test]
    fn test_extract_tool_input_missing_block() {
        let reply = json!({"content": [{"type": "text", "text": "no tool"}]});
        let result = AnthropicClient::extract_tool_input(&reply, "python_code");
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }
}
