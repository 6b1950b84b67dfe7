//! Orchestrator
//!
//! Runs one section task per requested kind concurrently, joins them, checks
//! the assembled document, and restarts the whole batch on failure up to the
//! outer bound. Every batch starts from empty slots; nothing from a failed
//! batch survives into the next one.

use super::assembler;
use super::section::{run_section, RetryPolicy, SectionContext, SectionOutcome};
use crate::config::PipelineConfig;
use crate::instructions::InstructionSet;
use crate::llm::CompletionPort;
use chrono::Utc;
use futures::future::join_all;
use sdk::errors::EngineError;
use sdk::types::{
    Artifact, GenerationParams, GenerationRequest, Provenance, SectionEntry, SectionKind,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};

/// Bounds shared by generation and regeneration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub section_policy: RetryPolicy,
    pub max_batch_retries: u32,
    pub min_document_words: usize,
    pub seed_conversation: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for PipelineSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            section_policy: RetryPolicy::new(config.max_section_retries),
            max_batch_retries: config.max_batch_retries,
            min_document_words: config.min_document_words,
            seed_conversation: config.seed_conversation,
        }
    }
}

/// One worker's failure, reported through the batch error channel
#[derive(Debug)]
struct WorkerFailure {
    kind: SectionKind,
    error: EngineError,
}

/// Section workers of one batch; aborted if the batch future is dropped
struct BatchWorkers(Vec<JoinHandle<Option<SectionOutcome>>>);

impl Drop for BatchWorkers {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

pub struct Orchestrator {
    provider: Arc<dyn CompletionPort>,
    instructions: Arc<InstructionSet>,
    settings: PipelineSettings,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn CompletionPort>,
        instructions: Arc<InstructionSet>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            provider,
            instructions,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub(crate) fn section_context(&self, params: GenerationParams) -> SectionContext {
        SectionContext {
            provider: Arc::clone(&self.provider),
            instructions: Arc::clone(&self.instructions),
            params,
            seed_conversation: self.settings.seed_conversation,
            policy: self.settings.section_policy,
        }
    }

    /// Generate a complete artifact
    ///
    /// # Errors
    /// - `Config` if a requested kind has no instruction text
    /// - `BatchGenerationFailed` once the outer bound is exhausted
    /// - `UpstreamUnavailable` on the first provider failure in any batch
    /// - `Cancelled` if `cancel` fires; no partial artifact is returned
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Artifact, EngineError> {
        self.instructions.require(request.sections())?;

        let run_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("generate", run = %run_id);

        async {
            let request_log = request.request_log();
            info!("{}", request_log);

            let ctx = self.section_context(request.params().clone());
            let mut batch = 0u32;

            loop {
                if batch > self.settings.max_batch_retries {
                    error!(batches = batch, "Failed to generate a valid response");
                    return Err(EngineError::BatchGenerationFailed { attempts: batch });
                }
                batch += 1;

                match self.run_batch(&ctx, request, cancel).await {
                    Ok(outcomes) => {
                        let section_retries: BTreeMap<SectionKind, u32> = outcomes
                            .iter()
                            .map(|outcome| (outcome.kind, outcome.retries))
                            .collect();
                        let entries: Vec<SectionEntry> = outcomes
                            .into_iter()
                            .map(|outcome| SectionEntry {
                                kind: outcome.kind,
                                text: outcome.text,
                            })
                            .collect();

                        if self.document_is_long_enough(&entries, batch) {
                            info!(batch, "Artifact assembled");
                            return Ok(Artifact::new(
                                request.topic().clone(),
                                request.params().clone(),
                                entries,
                                Provenance {
                                    request_log,
                                    created_at: Utc::now(),
                                    batch_attempts: batch,
                                    section_retries,
                                    regenerations: 0,
                                },
                            ));
                        }
                    }
                    Err(EngineError::SectionGenerationFailed(kind)) => {
                        warn!(batch, section = %kind, "Section failed, restarting batch");
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        .instrument(span)
        .await
    }

    fn document_is_long_enough(&self, entries: &[SectionEntry], batch: u32) -> bool {
        // A name-only request has no body to measure
        if !entries.iter().any(|entry| entry.kind.in_document()) {
            return true;
        }

        let words = assembler::word_count(&assembler::render_storage(entries));
        if words < self.settings.min_document_words {
            warn!(
                batch,
                words,
                min = self.settings.min_document_words,
                "Prompt is too short, restarting batch"
            );
            return false;
        }
        true
    }

    /// Run one batch: spawn a worker per kind, join them all, then report
    async fn run_batch(
        &self,
        ctx: &SectionContext,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<SectionOutcome>, EngineError> {
        let kinds = request.sections();
        let (err_tx, mut err_rx) = mpsc::channel::<WorkerFailure>(kinds.len());
        let batch_cancel = cancel.child_token();
        // Dropping this future stops every worker still talking to the provider
        let _cancel_on_drop = batch_cancel.clone().drop_guard();

        let handles = kinds
            .iter()
            .map(|&kind| {
                let ctx = ctx.clone();
                let token = batch_cancel.clone();
                let err_tx = err_tx.clone();
                let input = if kind.uses_topic() {
                    request.topic().prompt()
                } else {
                    String::new()
                };

                tokio::spawn(
                    async move {
                        match run_section(&ctx, kind, &input, None, &token).await {
                            Ok(outcome) => Some(outcome),
                            Err(error) => {
                                // Capacity equals the worker count, so this never sees Full
                                if let Err(e) = err_tx.try_send(WorkerFailure { kind, error }) {
                                    warn!(section = %kind, "Dropped worker failure: {}", e);
                                }
                                None
                            }
                        }
                    }
                    .in_current_span(),
                )
            })
            .collect();
        let mut workers = BatchWorkers(handles);
        drop(err_tx);

        let joined = join_all(workers.0.iter_mut()).await;

        let mut slots = Vec::with_capacity(kinds.len());
        let mut panicked = None;
        for (kind, result) in kinds.iter().zip(joined) {
            match result {
                Ok(slot) => slots.push(slot),
                Err(e) => {
                    error!(section = %kind, "Section worker panicked: {}", e);
                    panicked.get_or_insert(*kind);
                    slots.push(None);
                }
            }
        }

        let mut failures = Vec::new();
        while let Ok(failure) = err_rx.try_recv() {
            failures.push(failure);
        }

        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        if let Some(error) = most_severe(failures) {
            return Err(error);
        }
        if let Some(kind) = panicked {
            return Err(EngineError::SectionGenerationFailed(kind));
        }

        // Every worker succeeded, so every slot is filled
        slots
            .into_iter()
            .zip(kinds)
            .map(|(slot, kind)| slot.ok_or(EngineError::SectionGenerationFailed(*kind)))
            .collect()
    }
}

/// Pick the failure that decides the batch: anything that is not a
/// content-shape failure ends generation, so it wins over a retryable one.
fn most_severe(failures: Vec<WorkerFailure>) -> Option<EngineError> {
    let mut retryable = None;
    for failure in failures {
        match failure.error {
            EngineError::SectionGenerationFailed(_) => {
                retryable.get_or_insert(failure.error);
            }
            error => {
                warn!(section = %failure.kind, "Batch failed: {}", error);
                return Some(error);
            }
        }
    }
    retryable
}
