//! Section task
//!
//! Produces one accepted section value: call the provider, validate, and
//! retry on content-shape rejections up to the `RetryPolicy` bound. Provider
//! failures are returned immediately without consuming a retry.

use super::validator::{self, Verdict, BREAK_MARKER};
use crate::instructions::InstructionSet;
use crate::llm::{CompletionPort, CompletionRequest};
use sdk::errors::EngineError;
use sdk::types::{GenerationParams, SectionKind};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Bound on per-section retries beyond the first try
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Total provider calls a section may consume
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

/// Everything a section task reads; shared read-only across workers
#[derive(Clone)]
pub struct SectionContext {
    pub provider: Arc<dyn CompletionPort>,
    pub instructions: Arc<InstructionSet>,
    pub params: GenerationParams,
    pub seed_conversation: bool,
    pub policy: RetryPolicy,
}

/// An accepted section value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOutcome {
    pub kind: SectionKind,
    pub text: String,
    /// Rejected candidates before this one was accepted
    pub retries: u32,
}

/// Decorate the user message with a hint against repeating `prior`
pub fn decorate_input(input: &str, prior: Option<&str>) -> String {
    match prior.map(|p| p.replace(BREAK_MARKER, "")) {
        Some(prior) if !prior.trim().is_empty() => {
            let prior = prior.trim();
            if input.is_empty() {
                format!("Not: {}", prior)
            } else {
                format!("{} - not: {}", input, prior)
            }
        }
        _ => input.to_string(),
    }
}

/// Generate one section
///
/// `input` is the user message for this kind (the decorated topic or empty).
/// When `prior` is given the accepted value is guaranteed to differ from it.
///
/// # Errors
/// - `SectionGenerationFailed` once the retry bound is exhausted
/// - `UpstreamUnavailable` on the first provider failure
/// - `Cancelled` if `cancel` fires while a call is in flight
/// - `Config` if the kind has no instruction text
pub async fn run_section(
    ctx: &SectionContext,
    kind: SectionKind,
    input: &str,
    prior: Option<&str>,
    cancel: &CancellationToken,
) -> Result<SectionOutcome, EngineError> {
    let request = CompletionRequest {
        instruction_id: kind.instruction_id().to_string(),
        instruction: ctx.instructions.get(kind)?.to_string(),
        model: ctx.params.model.clone(),
        temperature: ctx.params.temperature,
        seed_conversation: ctx.seed_conversation,
        user_message: decorate_input(input, prior),
    };

    let mut retries = 0u32;
    loop {
        if retries > ctx.policy.max_retries {
            warn!(section = %kind, retries, "Retry bound exhausted");
            return Err(EngineError::SectionGenerationFailed(kind));
        }

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        debug!(section = %kind, attempt = retries + 1, "Requesting completion");

        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(section = %kind, "Cancelled while waiting for provider");
                return Err(EngineError::Cancelled);
            }
            result = ctx.provider.complete(&request) => result.map_err(|e| {
                warn!(section = %kind, provider = ctx.provider.name(), "Provider failed: {}", e);
                EngineError::from(e)
            })?,
        };

        match validator::validate(&raw, kind.rule()) {
            Verdict::Accepted(text) if prior == Some(text.as_str()) => {
                debug!(section = %kind, "Candidate repeats the prior value");
            }
            Verdict::Accepted(text) => {
                info!(section = %kind, retries, "Section accepted");
                return Ok(SectionOutcome {
                    kind,
                    text,
                    retries,
                });
            }
            Verdict::Rejected(reason) => {
                debug!(section = %kind, "Candidate rejected: {}", reason);
            }
        }

        retries += 1;
    }
}
