//! Configuration management
//!
//! This module handles loading, validation, and management of the Augur configuration.
//! Configuration is stored in TOML format at ~/.augur/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory
//! - **llm**: Default provider, model and temperature plus per-provider endpoints
//! - **pipeline**: Retry bounds and document acceptance thresholds
//! - **instructions**: Instruction text per section, overridable from the environment
//!
//! # Path Expansion
//!
//! `~` in `core.data_dir` is expanded to the user's home directory. The data
//! directory is only created when something is written to it.
//!
//! # Examples
//!
//! ```no_run
//! use augur_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration from default location
//! let config = Config::load_or_create()?;
//!
//! // Access configuration values
//! println!("Default provider: {}", config.llm.default_provider);
//! println!("Batch retries: {}", config.pipeline.max_batch_retries);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Providers accepted in `llm.default_provider`
pub const VALID_PROVIDERS: [&str; 3] = ["openai", "anyscale", "ollama"];

const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// LLM provider configuration
    pub llm: LLMConfig,

    /// Generation pipeline bounds
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Instruction text keyed by instruction id (e.g. `INTRO_PROMPT`)
    #[serde(default)]
    pub instructions: BTreeMap<String, String>,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Default LLM provider (openai, anyscale, ollama)
    pub default_provider: String,

    /// Default model, either a catalog alias or a full model id
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default sampling temperature (0.0-2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// OpenAI provider settings
    #[serde(default = "OpenAICompatibleConfig::openai")]
    pub openai: OpenAICompatibleConfig,

    /// Anyscale endpoint settings
    #[serde(default = "OpenAICompatibleConfig::anyscale")]
    pub anyscale: OpenAICompatibleConfig,

    /// Ollama provider settings
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Settings for an OpenAI-compatible chat completions endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenAICompatibleConfig {
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    // Note: the key itself never lives in the config file
}

impl OpenAICompatibleConfig {
    pub fn openai() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }

    pub fn anyscale() -> Self {
        Self {
            base_url: "https://api.endpoints.anyscale.com/v1".to_string(),
            api_key_env: "ANYSCALE_API_KEY".to_string(),
        }
    }
}

/// Ollama provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for Ollama API
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
        }
    }
}

/// Generation pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Retries allowed per section beyond the first try
    #[serde(default = "default_retries")]
    pub max_section_retries: u32,

    /// Whole-batch restarts allowed beyond the first batch
    #[serde(default = "default_retries")]
    pub max_batch_retries: u32,

    /// Minimum word count of the assembled document
    #[serde(default = "default_min_document_words")]
    pub min_document_words: usize,

    /// Maximum topic length in characters
    #[serde(default = "default_max_topic_chars")]
    pub max_topic_chars: usize,

    /// Prime each conversation by replaying the instruction as a user turn
    #[serde(default)]
    pub seed_conversation: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_section_retries: default_retries(),
            max_batch_retries: default_retries(),
            min_document_words: default_min_document_words(),
            max_topic_chars: default_max_topic_chars(),
            seed_conversation: false,
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.augur")
}

fn default_model() -> String {
    "m8x7b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout() -> u64 {
    120
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_retries() -> u32 {
    3
}

fn default_min_document_words() -> usize {
    100
}

fn default_max_topic_chars() -> usize {
    sdk::types::DEFAULT_MAX_TOPIC_CHARS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig {
                log_level: default_log_level(),
                data_dir: default_data_dir(),
            },
            llm: LLMConfig {
                default_provider: "anyscale".to_string(),
                default_model: default_model(),
                temperature: default_temperature(),
                request_timeout_secs: default_request_timeout(),
                openai: OpenAICompatibleConfig::openai(),
                anyscale: OpenAICompatibleConfig::anyscale(),
                ollama: OllamaConfig::default(),
            },
            pipeline: PipelineConfig::default(),
            instructions: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.augur/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let config = Self::default();

        let toml_string = config.to_toml()?;
        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Created default config at {}", path.display());

        let mut config = config;
        config.validate_and_process()?;
        Ok(config)
    }

    /// Serialize to pretty TOML
    pub fn to_toml(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Get the default configuration file path (~/.augur/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".augur").join("config.toml"))
    }

    /// Validate and process configuration
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` naming the first offending field.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        if !VALID_LOG_LEVELS.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if !VALID_PROVIDERS.contains(&self.llm.default_provider.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid default provider '{}'. Must be one of: {}",
                self.llm.default_provider,
                VALID_PROVIDERS.join(", ")
            )));
        }

        if self.llm.default_model.trim().is_empty() {
            return Err(EngineError::Config(
                "default_model must not be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(EngineError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.llm.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.min_document_words == 0 {
            return Err(EngineError::Config(
                "min_document_words must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.max_topic_chars == 0 {
            return Err(EngineError::Config(
                "max_topic_chars must be greater than 0".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
///
/// # Examples
///
/// ```ignore
/// let path = PathBuf::from("~/.augur");
/// let expanded = expand_path(&path)?;
/// // expanded is now /home/user/.augur (on Unix)
/// ```
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
