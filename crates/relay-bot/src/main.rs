//! Main entry point for the reading relay.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use relay_bot::RelayBot;
use relay_common::init_logging;
use relay_config::{apply_env_overrides, Config, ConfigLoader};
use std::path::PathBuf;
use tracing::{error, info};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (TOML, YAML or JSON)
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, overriding the configured one
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the default configuration to PATH
    InitConfig {
        /// Destination file; the extension picks the format
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(Command::InitConfig { path }) = &args.command {
        ConfigLoader::new(path)
            .save(&Config::default())
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let mut config = load_config(&args).await?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    let _log_guard = init_logging(&config.logging).context("failed to initialize logging")?;
    info!("Starting reading relay {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = RelayBot::new(config).run().await {
        error!("Relay stopped with an error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

async fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::new(path).load().await?,
        None => Config::default(),
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}
