#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;

use std::process;

use anyhow::Context;

use crate::config::{Cli, create_services};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "pieceflow_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "pieceflow_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "pieceflow_cli::config";
pub const TRACING_TARGET_COMMAND: &str = "pieceflow_cli::command";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::debug!(
            target: TRACING_TARGET_SHUTDOWN,
            "command completed successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = ?error,
            "command failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    Cli::init_tracing()?;
    cli.log();
    cli.validate()?;

    let services = create_services(&cli).await?;
    let output = command::run(&cli.command, services, cli.trigger.clone()).await?;

    if let Some(output) = output {
        let rendered = serde_json::to_string_pretty(&output).context("failed to render output")?;
        println!("{rendered}");
    }

    Ok(())
}
