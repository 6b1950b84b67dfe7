//! Single-section regeneration
//!
//! Re-runs one section task against an assembled artifact, using the current
//! value as the "do not repeat" hint. Only that section changes; on failure
//! the caller gets the untouched artifact back alongside the error.

use super::orchestrator::Orchestrator;
use super::section::run_section;
use sdk::errors::EngineError;
use sdk::types::{Artifact, GenerationParams, SectionKind};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// A failed regeneration, carrying the unchanged input artifact
#[derive(Debug)]
pub struct RegenerationFailure {
    pub artifact: Artifact,
    pub error: EngineError,
}

impl fmt::Display for RegenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RegenerationFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Regenerates single sections with the same provider and bounds as generation
pub struct RegenerationController<'a> {
    orchestrator: &'a Orchestrator,
}

impl<'a> RegenerationController<'a> {
    pub fn new(orchestrator: &'a Orchestrator) -> Self {
        Self { orchestrator }
    }

    /// Replace `kind` in `artifact` with a freshly generated, different value
    ///
    /// `params` overrides the model and temperature recorded on the artifact
    /// for this call only.
    pub async fn regenerate(
        &self,
        artifact: Artifact,
        kind: SectionKind,
        params: Option<GenerationParams>,
        cancel: &CancellationToken,
    ) -> Result<Artifact, RegenerationFailure> {
        let prior = match artifact.section(kind) {
            Some(prior) => prior.to_string(),
            None => {
                return Err(RegenerationFailure {
                    artifact,
                    error: EngineError::UnknownSection(kind.to_string()),
                })
            }
        };

        let input = if kind.uses_topic() {
            artifact.topic.prompt()
        } else {
            String::new()
        };
        let params = params.unwrap_or_else(|| artifact.params.clone());
        let ctx = self.orchestrator.section_context(params);

        info!(section = %kind, "Regenerating section");

        let outcome = match run_section(&ctx, kind, &input, Some(&prior), cancel).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(section = %kind, "Regeneration failed: {}", error);
                return Err(RegenerationFailure { artifact, error });
            }
        };

        match artifact.with_section(kind, outcome.text) {
            Ok(next) => Ok(next),
            Err(error) => Err(RegenerationFailure { artifact, error }),
        }
    }
}
