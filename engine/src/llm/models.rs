//! Model catalog
//!
//! Resolves user-facing model selections (`provider,model`, where `model` may
//! be a short alias) into a provider and a provider-level model id.

use sdk::errors::EngineError;
use std::fmt;
use std::str::FromStr;

/// Supported completion backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAI,
    Anyscale,
    Ollama,
}

const OPENAI_MODELS: &[(&str, &str)] = &[
    ("turbo", "gpt-4-turbo-preview"),
    ("turbo35", "gpt-3.5-turbo"),
];

const ANYSCALE_MODELS: &[(&str, &str)] = &[
    ("m7b", "mistralai/Mistral-7B-Instruct-v0.1"),
    ("m8x7b", "mistralai/Mixtral-8x7B-Instruct-v0.1"),
    ("l7b", "meta-llama/Llama-2-7b-chat-hf"),
    ("l13b", "meta-llama/Llama-2-13b-chat-hf"),
    ("l70b", "meta-llama/Llama-2-70b-chat-hf"),
    ("cl34b", "codellama/CodeLlama-34b-Instruct-hf"),
    ("cl70b", "codellama/CodeLlama-70b-Instruct-hf"),
];

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAI,
        ProviderKind::Anyscale,
        ProviderKind::Ollama,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anyscale => "anyscale",
            ProviderKind::Ollama => "ollama",
        }
    }

    /// (alias, model id) pairs known for this provider.
    /// Empty for Ollama, which accepts whatever is pulled locally.
    pub fn aliases(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ProviderKind::OpenAI => OPENAI_MODELS,
            ProviderKind::Anyscale => ANYSCALE_MODELS,
            ProviderKind::Ollama => &[],
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OpenAI",
            ProviderKind::Anyscale => "Anyscale",
            ProviderKind::Ollama => "Ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAI),
            "anyscale" => Ok(ProviderKind::Anyscale),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(EngineError::InvalidInput(format!(
                "Invalid AI provider: {}",
                other
            ))),
        }
    }
}

/// A provider together with a resolved model id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub provider: ProviderKind,
    pub model: String,
}

impl ModelSelection {
    /// Parse a `provider,model` selection
    ///
    /// # Errors
    /// Returns `EngineError::InvalidInput` for a missing separator, an unknown
    /// provider or a model the provider does not offer.
    pub fn parse(value: &str) -> Result<Self, EngineError> {
        let (provider, model) = value.split_once(',').ok_or_else(|| {
            EngineError::InvalidInput(format!(
                "Invalid model selection '{}', expected provider,model",
                value
            ))
        })?;

        Self::resolve(provider.parse()?, model)
    }

    /// Resolve an alias or full model id for a provider
    pub fn resolve(provider: ProviderKind, model: &str) -> Result<Self, EngineError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(EngineError::InvalidInput("No model selected".to_string()));
        }

        if provider == ProviderKind::Ollama {
            return Ok(Self {
                provider,
                model: model.to_string(),
            });
        }

        provider
            .aliases()
            .iter()
            .find(|(alias, id)| *alias == model || *id == model)
            .map(|(_, id)| Self {
                provider,
                model: (*id).to_string(),
            })
            .ok_or_else(|| {
                EngineError::InvalidInput(format!("Invalid {} model: {}", provider.label(), model))
            })
    }

    /// Find the provider whose catalog lists `id`, falling back to `fallback`
    ///
    /// Used when only a model id is known, e.g. the one recorded on an artifact.
    pub fn from_model_id(id: &str, fallback: ProviderKind) -> Result<Self, EngineError> {
        let owner = ProviderKind::ALL
            .into_iter()
            .find(|provider| provider.aliases().iter().any(|(_, known)| *known == id));
        Self::resolve(owner.unwrap_or(fallback), id)
    }
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.provider, self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_alias() {
        let selection = ModelSelection::parse("anyscale,m8x7b").unwrap();
        assert_eq!(selection.provider, ProviderKind::Anyscale);
        assert_eq!(selection.model, "mistralai/Mixtral-8x7B-Instruct-v0.1");

        let selection = ModelSelection::parse("openai,turbo35").unwrap();
        assert_eq!(selection.model, "gpt-3.5-turbo");
    }

    #[test]
    fn test_parse_full_id() {
        let selection =
            ModelSelection::parse("anyscale,codellama/CodeLlama-70b-Instruct-hf").unwrap();
        assert_eq!(selection.model, "codellama/CodeLlama-70b-Instruct-hf");
    }

    #[test]
    fn test_ollama_passes_any_model() {
        let selection = ModelSelection::parse("ollama,llama3.1:8b").unwrap();
        assert_eq!(selection.provider, ProviderKind::Ollama);
        assert_eq!(selection.model, "llama3.1:8b");
    }

    #[test]
    fn test_rejects_unknown_model_for_provider() {
        // Anyscale aliases are not OpenAI models
        let err = ModelSelection::parse("openai,m7b").unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(m) if m == "Invalid OpenAI model: m7b"));
    }

    #[test]
    fn test_rejects_bad_format_and_provider() {
        assert!(ModelSelection::parse("turbo").is_err());
        assert!(ModelSelection::parse("gemini,pro").is_err());
        assert!(ModelSelection::parse("openai,").is_err());
    }

    #[test]
    fn test_from_model_id_finds_catalog_owner() {
        let selection =
            ModelSelection::from_model_id("gpt-3.5-turbo", ProviderKind::Anyscale).unwrap();
        assert_eq!(selection.provider, ProviderKind::OpenAI);

        let selection = ModelSelection::from_model_id("llama3", ProviderKind::Ollama).unwrap();
        assert_eq!(selection.provider, ProviderKind::Ollama);
    }

    #[test]
    fn test_display_round_trip() {
        let selection = ModelSelection::parse("openai,turbo").unwrap();
        assert_eq!(selection.to_string(), "openai,gpt-4-turbo-preview");
        assert_eq!(ModelSelection::parse(&selection.to_string()).unwrap(), selection);
    }
}
