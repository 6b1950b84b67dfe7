//! Instruction texts
//!
//! Each section kind is generated under its own instruction context,
//! identified by `SectionKind::instruction_id`. The texts come from the
//! `[instructions]` table of the config file; environment variables with the
//! same name take precedence.

use sdk::errors::EngineError;
use sdk::types::SectionKind;
use std::collections::{BTreeMap, HashMap};

/// Resolved instruction texts keyed by instruction id
#[derive(Debug, Clone, Default)]
pub struct InstructionSet {
    texts: HashMap<String, String>,
}

impl InstructionSet {
    /// Resolve from the config table and the process environment
    pub fn from_config(table: &BTreeMap<String, String>) -> Self {
        Self::from_sources(table, |id| std::env::var(id).ok())
    }

    /// Resolve from a config table and an environment lookup
    pub fn from_sources<F>(table: &BTreeMap<String, String>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut texts: HashMap<String, String> = table
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(id, text)| (id.clone(), text.clone()))
            .collect();

        for kind in SectionKind::ALL {
            let id = kind.instruction_id();
            if let Some(text) = env(id).filter(|t| !t.trim().is_empty()) {
                tracing::debug!("Instruction {} taken from environment", id);
                texts.insert(id.to_string(), text);
            }
        }

        Self { texts }
    }

    /// Set or replace one instruction
    pub fn with(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.texts.insert(id.into(), text.into());
        self
    }

    /// Instruction text for a section kind
    pub fn get(&self, kind: SectionKind) -> Result<&str, EngineError> {
        self.texts
            .get(kind.instruction_id())
            .map(String::as_str)
            .ok_or_else(|| {
                EngineError::Config(format!(
                    "{} instruction is not set",
                    kind.instruction_id()
                ))
            })
    }

    /// Instruction ids required by `kinds` that have no text
    pub fn missing(&self, kinds: &[SectionKind]) -> Vec<&'static str> {
        kinds
            .iter()
            .map(|kind| kind.instruction_id())
            .filter(|id| !self.texts.contains_key(*id))
            .collect()
    }

    /// Fail unless every kind in `kinds` has instruction text
    pub fn require(&self, kinds: &[SectionKind]) -> Result<(), EngineError> {
        let missing = self.missing(kinds);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Config(format!(
                "Missing instructions: {}",
                missing.join(", ")
            )))
        }
    }
}
