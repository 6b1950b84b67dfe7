//! Augur SDK
//!
//! Shared types and errors for the Augur prompt generator.
//! This crate is used by the engine and by anything embedding it.

/// Error types and handling
pub mod errors;

/// Prompt data model
pub mod types;

// Re-export commonly used types
pub use errors::{AugurErrorExt, EngineError};
pub use types::{
    Artifact, GenerationParams, GenerationRequest, Provenance, SectionEntry, SectionKind,
    SectionRule, Topic,
};
