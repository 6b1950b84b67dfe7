//! LLM Provider Abstraction Layer
//!
//! This module provides a common interface for the chat-completion backends
//! the prompt generator can talk to (OpenAI, Anyscale, Ollama). The
//! `CompletionPort` trait is the only thing the generation pipeline depends
//! on, so tests can substitute scripted implementations.
//!
//! Model and temperature travel on every `CompletionRequest` instead of being
//! stored on the provider, so one provider handle can serve concurrent
//! requests with different settings.

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub mod models;
pub mod ollama;
pub mod openai;

pub use models::{ModelSelection, ProviderKind};

use crate::config::LLMConfig;
use crate::secrets::secret_from_env;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Assistant reply used to prime a seeded conversation
pub const SEED_ACKNOWLEDGEMENT: &str = "Understood.";

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<LLMError> for EngineError {
    fn from(err: LLMError) -> Self {
        EngineError::UpstreamUnavailable(err.to_string())
    }
}

/// Message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,

    /// Assistant message
    Assistant,

    /// System message
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// One completion call: an instruction context plus a user message
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Identifier of the instruction context (e.g. `RULES_PROMPT`)
    pub instruction_id: String,

    /// Instruction text sent as the system message
    pub instruction: String,

    /// Provider-level model id
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Replay the instruction as a user turn before the real message
    pub seed_conversation: bool,

    /// The user message; may be empty
    pub user_message: String,
}

impl CompletionRequest {
    /// Build the conversation sent to the provider
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = vec![Message::system(&self.instruction)];
        if self.seed_conversation {
            messages.push(Message::user(&self.instruction));
            messages.push(Message::assistant(SEED_ACKNOWLEDGEMENT));
        }
        messages.push(Message::user(&self.user_message));
        messages
    }
}

/// Completion provider trait that all backends must implement
#[async_trait]
pub trait CompletionPort: Send + Sync {
    /// Returns the name of the provider (e.g., "openai", "ollama")
    fn name(&self) -> &str;

    /// Generate raw text for one request
    ///
    /// # Returns
    /// * `Ok(String)` - The assistant message content, unvalidated
    /// * `Err(LLMError)` - If the request fails
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Check if the provider is currently healthy and available
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

/// Build the provider for a model selection
///
/// # Errors
/// Returns `EngineError::Config` if the provider's API key variable is not
/// set, or `EngineError::UpstreamUnavailable` if the HTTP client cannot be
/// built.
pub fn connect(
    selection: &ModelSelection,
    config: &LLMConfig,
) -> std::result::Result<Arc<dyn CompletionPort>, EngineError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let provider: Arc<dyn CompletionPort> = match selection.provider {
        ProviderKind::OpenAI => {
            let api_key = secret_from_env(&config.openai.api_key_env)?;
            Arc::new(openai::OpenAICompatibleProvider::new(
                ProviderKind::OpenAI.as_str(),
                &config.openai.base_url,
                api_key,
                timeout,
            )?)
        }
        ProviderKind::Anyscale => {
            let api_key = secret_from_env(&config.anyscale.api_key_env)?;
            Arc::new(openai::OpenAICompatibleProvider::new(
                ProviderKind::Anyscale.as_str(),
                &config.anyscale.base_url,
                api_key,
                timeout,
            )?)
        }
        ProviderKind::Ollama => Arc::new(ollama::OllamaProvider::new(
            &config.ollama.base_url,
            timeout,
        )?),
    };

    tracing::debug!(
        "Connected {} provider for model {}",
        provider.name(),
        selection.model
    );

    Ok(provider)
}
