//! CLI interface for Augur
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags.

use clap::{Parser, Subcommand};
use sdk::types::SectionKind;
use std::path::PathBuf;

/// Augur operating-prompt generator
///
/// Turns a short app idea into a multi-section operating prompt for an AI
/// persona by fanning out one completion per section and validating each.
#[derive(Parser, Debug)]
#[command(name = "augur")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an operating prompt for an app idea
    Generate {
        /// The app idea (at most 75 characters by default)
        topic: String,

        /// Model as provider,model (e.g. anyscale,m8x7b) or a model of the default provider
        #[arg(short, long)]
        model: Option<String>,

        /// Sampling temperature (0.0-2.0)
        #[arg(short, long)]
        temperature: Option<f32>,

        /// Only generate these sections (comma separated). The document body
        /// must still reach the minimum word count, so list-only subsets often fail
        #[arg(long, value_delimiter = ',')]
        sections: Vec<SectionKind>,

        /// Write the artifact as JSON to this file
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Save the artifact as JSON under the data directory
        #[arg(long)]
        save: bool,
    },

    /// Regenerate one section of a saved artifact
    Regenerate {
        /// Artifact JSON file produced by `generate --output` or `--save`
        #[arg(long, value_name = "PATH")]
        artifact: PathBuf,

        /// Section to regenerate
        #[arg(long)]
        section: SectionKind,

        /// Model override as provider,model
        #[arg(short, long)]
        model: Option<String>,

        /// Temperature override
        #[arg(short, long)]
        temperature: Option<f32>,

        /// Write the updated artifact back to the input file
        #[arg(long)]
        in_place: bool,
    },

    /// List providers and model aliases
    Models,

    /// Run system diagnostics
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["augur", "models"]);
        assert!(matches!(cli.command, Command::Models));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["augur", "--json", "--log", "debug", "doctor"]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));
    }

    #[test]
    fn test_generate_command() {
        let cli = Cli::parse_from([
            "augur",
            "generate",
            "recipe tracker",
            "--model",
            "openai,turbo35",
            "--temperature",
            "0.4",
            "--sections",
            "intro,rules,app_name",
        ]);
        if let Command::Generate {
            topic,
            model,
            temperature,
            sections,
            output,
            save,
        } = cli.command
        {
            assert_eq!(topic, "recipe tracker");
            assert_eq!(model.as_deref(), Some("openai,turbo35"));
            assert_eq!(temperature, Some(0.4));
            assert_eq!(
                sections,
                vec![
                    SectionKind::Introduction,
                    SectionKind::Rules,
                    SectionKind::AppName
                ]
            );
            assert!(output.is_none());
            assert!(!save);
        } else {
            panic!("Expected Generate command");
        }
    }

    #[test]
    fn test_sections_help_mentions_word_count() {
        use clap::CommandFactory;

        let command = Cli::command();
        let generate = command.find_subcommand("generate").unwrap();
        let sections = generate
            .get_arguments()
            .find(|arg| arg.get_id() == "sections")
            .unwrap();
        let help = sections.get_help().unwrap().to_string();
        assert!(help.contains("minimum word count"));
    }

    #[test]
    fn test_generate_rejects_unknown_section() {
        let result = Cli::try_parse_from(["augur", "generate", "x", "--sections", "summary"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_regenerate_command() {
        let cli = Cli::parse_from([
            "augur",
            "regenerate",
            "--artifact",
            "prompt.json",
            "--section",
            "rules",
            "--in-place",
        ]);
        if let Command::Regenerate {
            artifact,
            section,
            in_place,
            ..
        } = cli.command
        {
            assert_eq!(artifact, PathBuf::from("prompt.json"));
            assert_eq!(section, SectionKind::Rules);
            assert!(in_place);
        } else {
            panic!("Expected Regenerate command");
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["augur", "--config", "/tmp/augur.toml", "config", "path"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/augur.toml")));
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Path
            }
        ));
    }
}
