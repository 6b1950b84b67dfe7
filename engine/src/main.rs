// Augur operating-prompt generator
// Main entry point for the augur binary

use augur_engine::cli::{Cli, Command, ConfigAction};
use augur_engine::config::Config;
use augur_engine::handlers::{
    handle_config_path, handle_config_show, handle_doctor, handle_generate, handle_models,
    handle_regenerate, GenerateOptions, OutputFormat, RegenerateOptions,
};
use augur_engine::telemetry::init_telemetry_with_level;
use clap::Parser;
use sdk::errors::{AugurErrorExt, EngineError};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<EngineError>() {
            Some(engine) => {
                eprintln!("Error: {}", engine);
                eprintln!("Hint: {}", engine.user_hint());
            }
            None => eprintln!("Error: {:#}", e),
        }
        tracing::debug!("{:?}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // `config path` must work even when the file is broken
    if let Command::Config {
        action: ConfigAction::Path,
    } = &cli.command
    {
        return handle_config_path(cli.config.as_deref(), format);
    }

    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log wins over the config file; RUST_LOG wins over both
    init_telemetry_with_level(cli.log.as_deref().unwrap_or(&config.core.log_level));

    tracing::debug!(
        "Augur v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    let cancel = CancellationToken::new();
    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            watcher.cancel();
        }
    });

    match cli.command {
        Command::Generate {
            topic,
            model,
            temperature,
            sections,
            output,
            save,
        } => {
            let options = GenerateOptions {
                model,
                temperature,
                sections,
                output,
                save,
            };
            handle_generate(topic, options, &config, format, &cancel).await
        }

        Command::Regenerate {
            artifact,
            section,
            model,
            temperature,
            in_place,
        } => {
            let options = RegenerateOptions {
                artifact,
                section,
                model,
                temperature,
                in_place,
            };
            handle_regenerate(options, &config, format, &cancel).await
        }

        Command::Models => handle_models(&config, format),

        Command::Doctor => handle_doctor(&config, format).await,

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Path => handle_config_path(cli.config.as_deref(), format),
        },
    }
}
