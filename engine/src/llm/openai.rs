//! OpenAI-compatible chat completions provider
//!
//! Serves both OpenAI itself and Anyscale Endpoints, which expose the same
//! `/chat/completions` API under a different base URL.

use super::{CompletionPort, CompletionRequest, LLMError};
use crate::secrets::{scrub, SecretString};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

pub struct OpenAICompatibleProvider {
    name: String,
    base_url: String,
    api_key: SecretString,
    client: reqwest::Client,
}

impl OpenAICompatibleProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> super::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                LLMError::ProviderUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> LLMError {
        if e.is_timeout() {
            LLMError::Timeout
        } else if e.is_connect() {
            LLMError::ProviderUnavailable(format!("Cannot connect to {}", self.name))
        } else {
            LLMError::NetworkError(scrub(&e.to_string(), Some(&self.api_key)))
        }
    }
}

#[async_trait]
impl CompletionPort for OpenAICompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check_health(&self) -> bool {
        let url = format!("{}/models", self.base_url);
        match self
            .client
            .get(&url)
            .bearer_auth(self.api_key.unsecure())
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!("{} health check failed: {}", self.name, self.map_send_error(e));
                false
            }
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> super::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let api_messages: Vec<_> = request
            .messages()
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role.to_string(),
                    "content": msg.content
                })
            })
            .collect();

        let payload = json!({
            "model": request.model,
            "messages": api_messages,
            "temperature": request.temperature,
        });

        tracing::debug!(
            provider = %self.name,
            instruction = %request.instruction_id,
            model = %request.model,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.unsecure())
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = scrub(
                &response.text().await.unwrap_or_default(),
                Some(&self.api_key),
            );

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed(text),
                429 => LLMError::RateLimitExceeded,
                404 => LLMError::InvalidRequest(format!("Model not found: {}", request.model)),
                _ => LLMError::ProviderUnavailable(format!(
                    "{} API error ({}): {}",
                    self.name, status, text
                )),
            });
        }

        let data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| LLMError::ParseError("Empty content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let provider = OpenAICompatibleProvider::new(
            "anyscale",
            "https://api.endpoints.anyscale.com/v1/",
            SecretString::new("esecret_test"),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(provider.name(), "anyscale");
        assert_eq!(provider.base_url, "https://api.endpoints.anyscale.com/v1");
    }
}
