//! Error types and handling
//!
//! This module provides the error types used throughout the Augur engine.
//! All errors implement the `AugurErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages never carry API keys or raw provider payloads. Upstream
//! failures are reduced to a short description before they reach this type.

use crate::types::SectionKind;
use thiserror::Error;

/// Trait for Augur error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait AugurErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried by the caller, usually after
    /// changing the input or waiting for the provider to come back.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Input**: Topic or section selection rejected before any provider call
/// - **Generation**: Retry bounds exhausted without a valid result
/// - **Upstream**: The completion provider failed or was unreachable
/// - **Configuration**: Invalid or missing configuration
///
/// # Examples
///
/// ```
/// use sdk::errors::{AugurErrorExt, EngineError};
///
/// let error = EngineError::InvalidInput("No App Idea provided".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Config("missing instruction".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown section: {0}")]
    UnknownSection(String),

    // Generation errors
    #[error("Failed to generate a valid {0} section")]
    SectionGenerationFailed(SectionKind),

    #[error("Failed to generate a valid document after {attempts} attempts")]
    BatchGenerationFailed { attempts: u32 },

    // Provider errors
    #[error("Upstream provider unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Generation cancelled")]
    Cancelled,

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AugurErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::InvalidInput(_) => "Check the app idea and the model selection",
            Self::UnknownSection(_) => {
                "Use one of: introduction, pretraining, rules, important, app_name"
            }

            Self::SectionGenerationFailed(_) => {
                "The model kept returning unusable text. Try again or pick another model"
            }
            Self::BatchGenerationFailed { .. } => {
                "The model could not produce a complete prompt. Try again or raise the temperature"
            }

            Self::UpstreamUnavailable(_) => {
                "LLM provider unavailable. Check your API keys and network"
            }
            Self::Cancelled => "Generation was cancelled",

            Self::Config(_) => "Check your config.toml file and environment variables",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::Config(_) => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
