//! OpenAI chat completions client.
//!
//! Structured outputs are requested by registering the target schema as the
//! single available function tool and forcing the model to call it.

use crate::config::LlmConfig;
use crate::error::{LlmError, Result};
use reqwest::Client;
use serde_json::{json, Value};

/// OpenAI API client.
#[derive(Clone)]
pub struct OpenAiClient {
    config: LlmConfig,
    client: Client,
}

impl OpenAiClient {
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

    /// Call the model with a forced function tool and return the arguments
    /// the model supplied for it.
    pub async fn invoke_tool(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        name: &str,
        description: &str,
        schema: &Value,
    ) -> Result<Value> {
        let url = format!("{}/chat/completions", self.config.base_url);
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
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(format!("OpenAI request timed out: {}", e))
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
                _ => LlmError::Unavailable(format!("OpenAI API error {}: {}", status, error_text)),
            });
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Self::extract_tool_arguments(&reply, name)
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
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "tools": [{
                "type": "function",
                "function": {
                    "name": name,
                    "description": description,
                    "parameters": schema
                }
            }],
            "tool_choice": {
                "type": "function",
                "function": {"name": name}
            }
        })
    }

    /// Pull the forced tool call's arguments out of a chat completion reply.
    fn extract_tool_arguments(reply: &Value, name: &str) -> Result<Value> {
        let call = reply["choices"][0]["message"]["tool_calls"]
            .as_array()
            .and_then(|calls| {
                calls
                    .iter()
                    .find(|c| c["function"]["name"].as_str() == Some(name))
            })
            .ok_or_else(|| {
                LlmError::InvalidResponse(format!("no tool call for '{}' in reply", name))
            })?;

        let arguments = call["function"]["arguments"].as_str().ok_or_else(|| {
            LlmError::InvalidResponse("tool call arguments are not a string".to_string())
        })?;

        serde_json::from_str(arguments)
            .map_err(|e| LlmError::InvalidResponse(format!("tool arguments are not JSON: {}", e)))
    }
}
