//! eventslot CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use eventslot_core::init_tracing;

use eventslot_client::cli::{Cli, Command, ConfigAction};
use eventslot_client::commands;
use eventslot_client::config::ClientConfig;
use eventslot_client::error::ClientResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let tracing_config = cli.log_format.tracing_config(cli.debug || config.debug);
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {}", e);
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// An explicit `--config` must load; the default file falls back to defaults.
fn load_config(cli: &Cli) -> ClientResult<ClientConfig> {
    match cli.config {
        Some(ref path) => ClientConfig::load_from(path),
        None => Ok(ClientConfig::load().unwrap_or_else(|e| {
            eprintln!("warning: {}, using defaults", e);
            ClientConfig::default()
        })),
    }
}

async fn run(cli: Cli, config: ClientConfig) -> ClientResult<()> {
    match cli.command {
        Command::Expand(args) => commands::expand::run(&args, &config).await,
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
