//! Prompt data model
//!
//! Types shared by the generation pipeline and its callers: the fixed set of
//! section kinds with their acceptance rules, the validated generation request
//! and the assembled artifact.

use crate::errors::EngineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Prefix prepended to the user's topic before it is sent to a provider
pub const TOPIC_PREFIX: &str = "App Idea: ";

/// Default upper bound on the raw topic length, in characters
pub const DEFAULT_MAX_TOPIC_CHARS: usize = 75;

/// One of the fixed pieces of a generated operating prompt
///
/// The declaration order is the document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    /// Opening paragraph of the document
    Introduction,
    /// Background knowledge the persona should assume
    Pretraining,
    /// Behavioural rules
    Rules,
    /// Short list of reminders closing the document
    Important,
    /// Short product name, rendered as the title
    AppName,
}

impl SectionKind {
    /// Every kind, in document order
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Introduction,
        SectionKind::Pretraining,
        SectionKind::Rules,
        SectionKind::Important,
        SectionKind::AppName,
    ];

    /// Identifier of the instruction context used to generate this kind
    pub fn instruction_id(&self) -> &'static str {
        match self {
            SectionKind::Introduction => "INTRO_PROMPT",
            SectionKind::Pretraining => "PT_PROMPT",
            SectionKind::Rules => "RULES_PROMPT",
            SectionKind::Important => "REMINDER_PROMPT",
            SectionKind::AppName => "APPNAME_PROMPT",
        }
    }

    /// Acceptance rule applied to raw provider output for this kind
    pub fn rule(&self) -> SectionRule {
        match self {
            SectionKind::Introduction => SectionRule::FreeForm,
            SectionKind::Pretraining | SectionKind::Rules => SectionRule::List {
                min_items: 4,
                max_items: 6,
            },
            SectionKind::Important => SectionRule::List {
                min_items: 2,
                max_items: 4,
            },
            SectionKind::AppName => SectionRule::ShortName {
                min_words: 1,
                max_words: 5,
            },
        }
    }

    /// Markdown heading placed before the section in the document body
    pub fn heading(&self) -> Option<&'static str> {
        match self {
            SectionKind::Pretraining => Some("Pretraining"),
            SectionKind::Rules => Some("Rules"),
            SectionKind::Important => Some("Important"),
            SectionKind::Introduction | SectionKind::AppName => None,
        }
    }

    /// Whether the section is part of the document body.
    /// The app name is carried alongside the body as its title.
    pub fn in_document(&self) -> bool {
        !matches!(self, SectionKind::AppName)
    }

    /// Whether the user message sent for this kind is the topic.
    /// Rules and reminders are generated from the instruction alone.
    pub fn uses_topic(&self) -> bool {
        !matches!(self, SectionKind::Rules | SectionKind::Important)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Introduction => "introduction",
            SectionKind::Pretraining => "pretraining",
            SectionKind::Rules => "rules",
            SectionKind::Important => "important",
            SectionKind::AppName => "app_name",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "introduction" | "intro" => Ok(SectionKind::Introduction),
            "pretraining" => Ok(SectionKind::Pretraining),
            "rules" => Ok(SectionKind::Rules),
            "important" | "reminder" => Ok(SectionKind::Important),
            "appname" | "name" => Ok(SectionKind::AppName),
            _ => Err(EngineError::UnknownSection(s.to_string())),
        }
    }
}

/// Structural acceptance rule for a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionRule {
    /// A single non-empty paragraph
    FreeForm,
    /// A bulleted list with an inclusive item-count range
    List { min_items: usize, max_items: usize },
    /// A name of a few words taken from the first line
    ShortName { min_words: usize, max_words: usize },
}

/// User-supplied topic, validated for emptiness and length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Validate raw user text as a topic
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if the text is empty (after trimming)
    /// or longer than `max_chars` characters.
    pub fn parse(raw: &str, max_chars: usize) -> Result<Self, EngineError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidInput("No App Idea provided".to_string()));
        }
        if trimmed.chars().count() > max_chars {
            return Err(EngineError::InvalidInput(format!(
                "App Idea too long (max {} characters)",
                max_chars
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The topic as it is sent to the provider
    pub fn prompt(&self) -> String {
        format!("{}{}", TOPIC_PREFIX, self.0)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request provider settings
///
/// Threaded through every completion call instead of being stored on a shared
/// provider handle, so concurrent requests never observe each other's settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Provider-level model identifier
    pub model: String,

    /// Sampling temperature (0.0-2.0)
    pub temperature: f32,
}

impl GenerationParams {
    /// Create validated generation parameters
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` for an empty model or a temperature
    /// outside 0.0-2.0.
    pub fn new(model: impl Into<String>, temperature: f32) -> Result<Self, EngineError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(EngineError::InvalidInput("No model selected".to_string()));
        }
        if !(0.0..=2.0).contains(&temperature) {
            return Err(EngineError::InvalidInput(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                temperature
            )));
        }
        Ok(Self { model, temperature })
    }
}

/// Immutable description of one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    topic: Topic,
    sections: Vec<SectionKind>,
    params: GenerationParams,
}

impl GenerationRequest {
    /// Request every section kind
    pub fn new(topic: Topic, params: GenerationParams) -> Self {
        Self {
            topic,
            sections: SectionKind::ALL.to_vec(),
            params,
        }
    }

    /// Restrict the request to a subset of section kinds
    ///
    /// Duplicates are dropped and the kinds are kept in document order.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidInput` if no kinds are given.
    pub fn with_sections(mut self, sections: &[SectionKind]) -> Result<Self, EngineError> {
        let mut sections = sections.to_vec();
        sections.sort();
        sections.dedup();
        if sections.is_empty() {
            return Err(EngineError::InvalidInput(
                "At least one section must be selected".to_string(),
            ));
        }
        self.sections = sections;
        Ok(self)
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn sections(&self) -> &[SectionKind] {
        &self.sections
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// One-line summary of the inputs, recorded as provenance
    pub fn request_log(&self) -> String {
        format!(
            "{} - Model: {} - Temp: {:.6}",
            self.topic.prompt(),
            self.params.model,
            self.params.temperature
        )
    }
}

/// One accepted section value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub kind: SectionKind,
    pub text: String,
}

/// Where an artifact came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Inputs and parameters used, see `GenerationRequest::request_log`
    pub request_log: String,

    /// When the artifact was assembled
    pub created_at: DateTime<Utc>,

    /// Batches started before this artifact was accepted (1 = first try)
    pub batch_attempts: u32,

    /// Inner retries consumed per section in the accepted batch
    #[serde(default)]
    pub section_retries: BTreeMap<SectionKind, u32>,

    /// Sections regenerated after assembly
    #[serde(default)]
    pub regenerations: u32,
}

/// A fully assembled, validated operating prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub topic: Topic,
    pub params: GenerationParams,
    sections: Vec<SectionEntry>,
    pub provenance: Provenance,
}

impl Artifact {
    /// Build an artifact, ordering sections by kind
    pub fn new(
        topic: Topic,
        params: GenerationParams,
        mut sections: Vec<SectionEntry>,
        provenance: Provenance,
    ) -> Self {
        sections.sort_by_key(|entry| entry.kind);
        Self {
            topic,
            params,
            sections,
            provenance,
        }
    }

    /// Sections in document order
    pub fn sections(&self) -> &[SectionEntry] {
        &self.sections
    }

    /// Accepted value for a kind, if the artifact carries it
    pub fn section(&self, kind: SectionKind) -> Option<&str> {
        self.sections
            .iter()
            .find(|entry| entry.kind == kind)
            .map(|entry| entry.text.as_str())
    }

    /// Copy of this artifact with one section replaced
    ///
    /// # Errors
    ///
    /// Returns `EngineError::UnknownSection` if the artifact has no such section.
    pub fn with_section(&self, kind: SectionKind, text: String) -> Result<Self, EngineError> {
        let mut next = self.clone();
        let slot = next
            .sections
            .iter_mut()
            .find(|entry| entry.kind == kind)
            .ok_or_else(|| EngineError::UnknownSection(kind.to_string()))?;
        slot.text = text;
        next.provenance.regenerations += 1;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenerationParams {
        GenerationParams::new("mistralai/Mixtral-8x7B-Instruct-v0.1", 0.7).unwrap()
    }

    #[test]
    fn test_section_kind_order_matches_all() {
        let mut sorted = SectionKind::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, SectionKind::ALL.to_vec());
    }

    #[test]
    fn test_section_kind_parse() {
        assert_eq!("rules".parse::<SectionKind>().unwrap(), SectionKind::Rules);
        assert_eq!("appName".parse::<SectionKind>().unwrap(), SectionKind::AppName);
        assert_eq!("app-name".parse::<SectionKind>().unwrap(), SectionKind::AppName);
        assert_eq!(
            " Introduction ".parse::<SectionKind>().unwrap(),
            SectionKind::Introduction
        );
        assert!(matches!(
            "summary".parse::<SectionKind>(),
            Err(EngineError::UnknownSection(s)) if s == "summary"
        ));
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for kind in SectionKind::ALL {
            assert_eq!(kind.to_string().parse::<SectionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_topic_validation() {
        assert!(matches!(
            Topic::parse("   ", 75),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            Topic::parse(&"x".repeat(76), 75),
            Err(EngineError::InvalidInput(_))
        ));

        let topic = Topic::parse(" recipe tracker ", 75).unwrap();
        assert_eq!(topic.as_str(), "recipe tracker");
        assert_eq!(topic.prompt(), "App Idea: recipe tracker");
    }

    #[test]
    fn test_topic_length_counts_characters() {
        let topic = "é".repeat(75);
        assert!(Topic::parse(&topic, 75).is_ok());
    }

    #[test]
    fn test_params_validation() {
        assert!(GenerationParams::new("", 0.7).is_err());
        assert!(GenerationParams::new("gpt-3.5-turbo", 2.5).is_err());
        assert!(GenerationParams::new("gpt-3.5-turbo", -0.1).is_err());
        assert!(GenerationParams::new("gpt-3.5-turbo", 0.0).is_ok());
    }

    #[test]
    fn test_request_sections_are_ordered_and_deduplicated() {
        let topic = Topic::parse("recipe tracker", 75).unwrap();
        let request = GenerationRequest::new(topic, params())
            .with_sections(&[SectionKind::Rules, SectionKind::Introduction, SectionKind::Rules])
            .unwrap();
        assert_eq!(
            request.sections(),
            &[SectionKind::Introduction, SectionKind::Rules]
        );
    }

    #[test]
    fn test_request_rejects_empty_section_selection() {
        let topic = Topic::parse("recipe tracker", 75).unwrap();
        assert!(GenerationRequest::new(topic, params())
            .with_sections(&[])
            .is_err());
    }

    #[test]
    fn test_request_log() {
        let topic = Topic::parse("recipe tracker", 75).unwrap();
        let request = GenerationRequest::new(topic, params());
        assert_eq!(
            request.request_log(),
            "App Idea: recipe tracker - \
             Model: mistralai/Mixtral-8x7B-Instruct-v0.1 - Temp: 0.700000"
        );
    }

    #[test]
    fn test_artifact_with_section_replaces_only_that_section() {
        let topic = Topic::parse("recipe tracker", 75).unwrap();
        let artifact = Artifact::new(
            topic,
            params(),
            vec![
                SectionEntry {
                    kind: SectionKind::Rules,
                    text: "- old".to_string(),
                },
                SectionEntry {
                    kind: SectionKind::Introduction,
                    text: "intro".to_string(),
                },
            ],
            Provenance {
                request_log: String::new(),
                created_at: Utc::now(),
                batch_attempts: 1,
                section_retries: BTreeMap::new(),
                regenerations: 0,
            },
        );

        assert_eq!(artifact.sections()[0].kind, SectionKind::Introduction);

        let next = artifact
            .with_section(SectionKind::Rules, "- new".to_string())
            .unwrap();
        assert_eq!(next.section(SectionKind::Rules), Some("- new"));
        assert_eq!(next.section(SectionKind::Introduction), Some("intro"));
        assert_eq!(next.provenance.regenerations, 1);
        assert_eq!(artifact.section(SectionKind::Rules), Some("- old"));

        assert!(matches!(
            artifact.with_section(SectionKind::AppName, "Name".to_string()),
            Err(EngineError::UnknownSection(_))
        ));
    }

    #[test]
    fn test_artifact_json_round_trip() {
        let topic = Topic::parse("recipe tracker", 75).unwrap();
        let mut retries = BTreeMap::new();
        retries.insert(SectionKind::Rules, 2);
        let artifact = Artifact::new(
            topic,
            params(),
            vec![SectionEntry {
                kind: SectionKind::AppName,
                text: "Recipe Keeper".to_string(),
            }],
            Provenance {
                request_log: "log".to_string(),
                created_at: Utc::now(),
                batch_attempts: 1,
                section_retries: retries,
                regenerations: 0,
            },
        );

        let json = serde_json::to_string(&artifact).unwrap();
        assert!(json.contains(r#""kind":"app_name""#));
        let parsed: Artifact = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, artifact);
    }
}
