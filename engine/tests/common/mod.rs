//! Shared fixtures for pipeline integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use augur_engine::instructions::InstructionSet;
use augur_engine::llm::{CompletionPort, CompletionRequest, LLMError, Result as LLMResult};
use augur_engine::pipeline::{Orchestrator, PipelineSettings};
use sdk::types::{GenerationParams, GenerationRequest, SectionKind, Topic};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const INTRO: &str = "You are a friendly kitchen companion that helps home cooks \
    organise recipes, plan weekly meals and build shopping lists. You answer in a warm \
    and practical tone, suggest substitutions when an ingredient is missing and keep \
    every explanation short enough to follow while cooking.";

pub const PRETRAINING: &str = "\
    1. Common cooking techniques such as braising, roasting and poaching\n\
    2. Standard kitchen measurements and how to convert between them\n\
    3. Food safety temperatures for meat, poultry and leftovers\n\
    4. Seasonal produce and when it tastes the best\n\
    5. Typical pantry staples found in most home kitchens";

pub const RULES: &str = "- Keep every answer focused on cooking and meal planning\n\
    - Ask a clarifying question when the request is ambiguous\n\
    - Always mention allergens present in a suggested recipe\n\
    - Prefer metric units unless the user asks otherwise\n\
    - Never invent nutritional facts that you are unsure about";

pub const REMINDERS: &str = "- Stay concise and friendly in every single reply\n\
    - Double check quantities before listing a shopping list\n\
    - Respect dietary restrictions the user has shared before";

pub const APP_NAME: &str = "Recipe Pal";

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
    /// Never answers within a test's lifetime
    Hang,
}

impl Reply {
    pub fn text(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

/// Completion port replying from per-instruction queues
///
/// Once a queue is drained the canned valid text for that instruction is
/// returned, so tests only script the calls they care about.
pub struct ScriptedProvider {
    queues: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn script(self, kind: SectionKind, replies: Vec<Reply>) -> Self {
        self.queues
            .lock()
            .unwrap()
            .insert(kind.instruction_id().to_string(), replies.into());
        self
    }

    /// Calls made for one section kind
    pub fn calls(&self, kind: SectionKind) -> usize {
        self.requests_for(kind).len()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests_for(&self, kind: SectionKind) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.instruction_id == kind.instruction_id())
            .cloned()
            .collect()
    }
}

pub fn canned(instruction_id: &str) -> &'static str {
    match instruction_id {
        "INTRO_PROMPT" => INTRO,
        "PT_PROMPT" => PRETRAINING,
        "RULES_PROMPT" => RULES,
        "REMINDER_PROMPT" => REMINDERS,
        "APPNAME_PROMPT" => APP_NAME,
        _ => "",
    }
}

#[async_trait]
impl CompletionPort for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> LLMResult<String> {
        self.requests.lock().unwrap().push(request.clone());

        let next = self
            .queues
            .lock()
            .unwrap()
            .get_mut(&request.instruction_id)
            .and_then(VecDeque::pop_front);

        match next {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Fail) => Err(LLMError::ProviderUnavailable(
                "scripted outage".to_string(),
            )),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(300)).await;
                Ok(String::new())
            }
            None => Ok(canned(&request.instruction_id).to_string()),
        }
    }
}

/// Takes `delay` per call and always answers with unusable text
pub struct SlowRejectingProvider {
    delay: Duration,
    calls: AtomicUsize,
}

impl SlowRejectingProvider {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionPort for SlowRejectingProvider {
    fn name(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _request: &CompletionRequest) -> LLMResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(String::new())
    }
}

pub fn instructions() -> InstructionSet {
    SectionKind::ALL
        .iter()
        .fold(InstructionSet::default(), |set, kind| {
            set.with(
                kind.instruction_id(),
                format!("Write the {} section", kind),
            )
        })
}

pub fn orchestrator(provider: Arc<ScriptedProvider>) -> Orchestrator {
    Orchestrator::new(
        provider,
        Arc::new(instructions()),
        PipelineSettings::default(),
    )
}

pub fn params() -> GenerationParams {
    GenerationParams::new("test-model", 0.7).unwrap()
}

pub fn request(topic: &str) -> GenerationRequest {
    GenerationRequest::new(Topic::parse(topic, 75).unwrap(), params())
}
