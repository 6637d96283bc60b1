mod cli;
mod commands;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use hotmod_core::GlobalConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

const DEFAULT_CONFIG_PATH: &str = "hotmod.json";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Compile { development } => commands::compile(&config, development),
        Command::Reconcile { target } => commands::reconcile(&config, &target),
        Command::Start => commands::start(&config).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> Result<GlobalConfig> {
    match path {
        Some(path) => Ok(GlobalConfig::load(path)?),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Ok(GlobalConfig::load(default_path)?)
            } else {
                info!(
                    target: "hotmod_cli",
                    "no config file found, using built-in defaults"
                );
                Ok(GlobalConfig::default())
            }
        }
    }
}
