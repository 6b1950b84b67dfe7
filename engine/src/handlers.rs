//! Command handlers for CLI operations
//!
//! This module implements the handlers for all CLI commands:
//! - generate: Run the pipeline for an app idea
//! - regenerate: Redo one section of a saved artifact
//! - models: List providers and aliases
//! - doctor: Validate configuration, instructions and provider access
//! - config show / path

use anyhow::{Context, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::instructions::InstructionSet;
use crate::llm::{self, ModelSelection, ProviderKind};
use crate::pipeline::{assembler, Orchestrator, PipelineSettings, RegenerationController};
use sdk::errors::AugurErrorExt;
use sdk::types::{Artifact, GenerationParams, GenerationRequest, SectionKind, Topic};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Options for `augur generate`
#[derive(Debug, Default)]
pub struct GenerateOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub sections: Vec<SectionKind>,
    pub output: Option<PathBuf>,
    pub save: bool,
}

/// Options for `augur regenerate`
#[derive(Debug)]
pub struct RegenerateOptions {
    pub artifact: PathBuf,
    pub section: SectionKind,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub in_place: bool,
}

/// Resolve the model selection from a CLI value or the config defaults
///
/// A value without a comma names a model of the default provider.
pub fn resolve_selection(config: &Config, model: Option<&str>) -> Result<ModelSelection> {
    let default_provider: ProviderKind = config.llm.default_provider.parse()?;
    let selection = match model {
        Some(value) if value.contains(',') => ModelSelection::parse(value)?,
        Some(value) => ModelSelection::resolve(default_provider, value)?,
        None => ModelSelection::resolve(default_provider, &config.llm.default_model)?,
    };
    Ok(selection)
}

fn build_orchestrator(config: &Config, selection: &ModelSelection) -> Result<Orchestrator> {
    let provider = llm::connect(selection, &config.llm)?;
    let instructions = InstructionSet::from_config(&config.instructions);
    Ok(Orchestrator::new(
        provider,
        Arc::new(instructions),
        PipelineSettings::from(&config.pipeline),
    ))
}

fn write_artifact(path: &Path, artifact: &Artifact) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(artifact)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Artifact written to {}", path.display());
    Ok(())
}

fn print_artifact(artifact: &Artifact, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            if let Some(title) = assembler::title(artifact.sections()) {
                println!("# {}", title);
                println!();
            }
            println!("{}", assembler::render_storage(artifact.sections()));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(artifact)?);
        }
    }
    Ok(())
}

/// Generate an operating prompt
pub async fn handle_generate(
    topic: String,
    options: GenerateOptions,
    config: &Config,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let topic = Topic::parse(&topic, config.pipeline.max_topic_chars)?;
    let selection = resolve_selection(config, options.model.as_deref())?;
    let params = GenerationParams::new(
        selection.model.clone(),
        options.temperature.unwrap_or(config.llm.temperature),
    )?;

    let mut request = GenerationRequest::new(topic, params);
    if !options.sections.is_empty() {
        request = request.with_sections(&options.sections)?;
    }

    let orchestrator = build_orchestrator(config, &selection)?;
    let artifact = orchestrator.generate(&request, cancel).await?;

    if let Some(path) = &options.output {
        write_artifact(path, &artifact)?;
    }
    if options.save {
        let path = config
            .core
            .data_dir
            .join("artifacts")
            .join(format!("{}.json", uuid::Uuid::new_v4()));
        write_artifact(&path, &artifact)?;
        eprintln!("Saved to {}", path.display());
    }

    print_artifact(&artifact, format)
}

/// Regenerate one section of a saved artifact
///
/// On failure the input file is left untouched.
pub async fn handle_regenerate(
    options: RegenerateOptions,
    config: &Config,
    format: OutputFormat,
    cancel: &CancellationToken,
) -> Result<()> {
    let contents = std::fs::read_to_string(&options.artifact)
        .with_context(|| format!("Failed to read {}", options.artifact.display()))?;
    let artifact: Artifact = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid artifact file {}", options.artifact.display()))?;

    let selection = match options.model.as_deref() {
        Some(model) => resolve_selection(config, Some(model))?,
        None => ModelSelection::from_model_id(
            &artifact.params.model,
            config.llm.default_provider.parse()?,
        )?,
    };
    let params = if options.model.is_some() || options.temperature.is_some() {
        Some(GenerationParams::new(
            selection.model.clone(),
            options.temperature.unwrap_or(artifact.params.temperature),
        )?)
    } else {
        None
    };

    let orchestrator = build_orchestrator(config, &selection)?;
    let controller = RegenerationController::new(&orchestrator);

    let updated = controller
        .regenerate(artifact, options.section, params, cancel)
        .await
        .map_err(|failure| failure.error)?;

    if options.in_place {
        write_artifact(&options.artifact, &updated)?;
    }

    print_artifact(&updated, format)
}

/// List providers and model aliases
pub fn handle_models(config: &Config, format: OutputFormat) -> Result<()> {
    let default = resolve_selection(config, None).ok();

    match format {
        OutputFormat::Text => {
            for provider in ProviderKind::ALL {
                println!("{}:", provider);
                if provider.aliases().is_empty() {
                    println!("  any locally pulled model (e.g. ollama,llama3.1:8b)");
                }
                for (alias, id) in provider.aliases() {
                    let marker = match &default {
                        Some(d) if d.provider == provider && d.model == *id => " (default)",
                        _ => "",
                    };
                    println!("  {:<8} {}{}", alias, id, marker);
                }
            }
        }
        OutputFormat::Json => {
            let providers: Vec<_> = ProviderKind::ALL
                .iter()
                .map(|provider| {
                    json!({
                        "provider": provider.as_str(),
                        "models": provider.aliases().iter().map(|(alias, id)| {
                            json!({ "alias": alias, "id": id })
                        }).collect::<Vec<_>>(),
                    })
                })
                .collect();
            let output = json!({
                "providers": providers,
                "default": default.map(|d| d.to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Validate configuration, instructions and provider access
pub async fn handle_doctor(config: &Config, format: OutputFormat) -> Result<()> {
    let mut issues = Vec::new();
    let mut checks: Vec<(String, String)> = Vec::new();

    // Config is already validated when loaded
    checks.push(("Configuration".to_string(), "Valid".to_string()));

    let instructions = InstructionSet::from_config(&config.instructions);
    for kind in SectionKind::ALL {
        let id = kind.instruction_id();
        if instructions.missing(&[kind]).is_empty() {
            checks.push((id.to_string(), "Set".to_string()));
        } else {
            checks.push((id.to_string(), "Missing".to_string()));
            issues.push(format!(
                "{} is not set. Add it to [instructions] or export it.",
                id
            ));
        }
    }

    for (provider, key_env) in [
        (ProviderKind::OpenAI, &config.llm.openai.api_key_env),
        (ProviderKind::Anyscale, &config.llm.anyscale.api_key_env),
    ] {
        let status = match crate::secrets::secret_from_env(key_env) {
            Ok(_) => "Configured",
            Err(_) => "Not configured",
        };
        checks.push((format!("{} API key (${})", provider, key_env), status.to_string()));
    }

    match resolve_selection(config, None) {
        Ok(selection) => {
            checks.push(("Default model".to_string(), selection.to_string()));
            let label = format!("{} provider", selection.provider);
            match llm::connect(&selection, &config.llm) {
                Ok(provider) => {
                    if provider.check_health().await {
                        checks.push((label, "Available".to_string()));
                    } else {
                        checks.push((label, "Not available".to_string()));
                        issues.push(format!("{} is not reachable.", selection.provider));
                    }
                }
                Err(e) => {
                    checks.push((label, "Not configured".to_string()));
                    issues.push(format!("{} ({})", e, e.user_hint()));
                }
            }
        }
        Err(e) => {
            checks.push(("Default model".to_string(), "Invalid".to_string()));
            issues.push(e.to_string());
        }
    }

    match format {
        OutputFormat::Text => {
            println!(
                "Augur v{} ({} - {})",
                env!("CARGO_PKG_VERSION"),
                env!("GIT_COMMIT_HASH"),
                env!("BUILD_TIMESTAMP")
            );
            println!("============================");
            println!();

            println!("System Checks:");
            for (check, status) in &checks {
                println!("  {:<32} {}", format!("{}:", check), status);
            }

            println!();

            if issues.is_empty() {
                println!("✓ All checks passed!");
            } else {
                println!("⚠ Issues found:");
                println!();
                for (i, issue) in issues.iter().enumerate() {
                    println!("  {}. {}", i + 1, issue);
                }
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "checks": checks.iter().map(|(name, status)| {
                    json!({
                        "name": name,
                        "status": status
                    })
                }).collect::<Vec<_>>(),
                "issues": issues,
                "healthy": issues.is_empty()
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Print the effective configuration
pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", config.to_toml()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}

/// Print the configuration file path
pub fn handle_config_path(custom: Option<&Path>, format: OutputFormat) -> Result<()> {
    let path = match custom {
        Some(path) => path.to_path_buf(),
        None => Config::default_config_path()?,
    };
    match format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => println!("{}", json!({ "path": path })),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_selection_defaults() {
        let config = Config::default();
        let selection = resolve_selection(&config, None).unwrap();
        assert_eq!(selection.provider, ProviderKind::Anyscale);
        assert_eq!(selection.model, "mistralai/Mixtral-8x7B-Instruct-v0.1");
    }

    #[test]
    fn test_resolve_selection_bare_model_uses_default_provider() {
        let config = Config::default();
        let selection = resolve_selection(&config, Some("l70b")).unwrap();
        assert_eq!(selection.model, "meta-llama/Llama-2-70b-chat-hf");

        assert!(resolve_selection(&config, Some("turbo")).is_err());
    }

    #[test]
    fn test_resolve_selection_explicit_provider() {
        let config = Config::default();
        let selection = resolve_selection(&config, Some("openai,turbo")).unwrap();
        assert_eq!(selection.provider, ProviderKind::OpenAI);
        assert_eq!(selection.model, "gpt-4-turbo-preview");
    }

    #[tokio::test]
    async fn test_generate_rejects_long_topic_before_connecting() {
        let config = Config::default();
        let err = handle_generate(
            "x".repeat(80),
            GenerateOptions::default(),
            &config,
            OutputFormat::Text,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        let engine = err.downcast_ref::<sdk::EngineError>().unwrap();
        assert!(matches!(engine, sdk::EngineError::InvalidInput(_)));
    }
}
