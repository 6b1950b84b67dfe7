//! Augur Engine Library
//!
//! This library provides the generation pipeline behind the `augur` binary.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// LLM provider abstraction layer
pub mod llm;

/// Instruction texts per section kind
pub mod instructions;

/// Concurrent generation-and-validation pipeline
pub mod pipeline;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
