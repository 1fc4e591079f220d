//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── nats: NatsConfig          # Job queue and context store connection
//! ├── engine: EngineConfig      # Remote execution engine
//! ├── backend: BackendUrlConfig # Public backend URL for webhooks
//! ├── trigger: TriggerConfig    # Polling cadence
//! └── command: Command          # enable | disable | execute
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! pieceflow --nats-url nats://localhost:4222 --engine-url http://localhost:3001 \
//!     enable --params params.json
//!
//! # Or via environment variables
//! NATS_URL=nats://localhost:4222 ENGINE_URL=http://localhost:3001 \
//!     pieceflow enable --params params.json
//! ```

mod provider;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use pieceflow_engine::{BackendUrlConfig, EngineConfig};
use pieceflow_nats::NatsConfig;
use pieceflow_trigger::TriggerConfig;
pub use provider::create_services;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "pieceflow")]
#[command(about = "Enable, disable and execute flow triggers")]
#[command(version)]
pub struct Cli {
    /// NATS connection backing the job queue and trigger context.
    #[clap(flatten)]
    pub nats: NatsConfig,

    /// Remote execution engine connection.
    #[clap(flatten)]
    pub engine: EngineConfig,

    /// Externally reachable backend URL used in webhook URLs.
    #[clap(flatten)]
    pub backend: BackendUrlConfig,

    /// Trigger registration settings.
    #[clap(flatten)]
    pub trigger: TriggerConfig,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Trigger operations exposed by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand, Serialize, Deserialize)]
pub enum Command {
    /// Register the trigger of a flow version.
    Enable {
        /// JSON file with the lifecycle parameters
        #[arg(long, short)]
        params: PathBuf,
    },

    /// Unregister the trigger of a flow version.
    Disable {
        /// JSON file with the lifecycle parameters
        #[arg(long, short)]
        params: PathBuf,
    },

    /// Turn a received payload into flow run payloads.
    Execute {
        /// JSON file with the trigger execution request
        #[arg(long, short)]
        request: PathBuf,
    },
}

impl Command {
    /// Returns the subcommand name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Enable { .. } => "enable",
            Self::Disable { .. } => "disable",
            Self::Execute { .. } => "execute",
        }
    }
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is read before clap runs so its values act as `env` defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// The level follows `RUST_LOG` and defaults to `info`.
    pub fn init_tracing() -> anyhow::Result<()> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow!("failed to initialize tracing: {e}"))
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.nats
            .validate()
            .map_err(|e| anyhow!(e))
            .context("invalid NATS configuration")?;
        self.engine
            .validate()
            .map_err(|e| anyhow!(e))
            .context("invalid engine configuration")?;
        self.backend
            .validate()
            .map_err(|e| anyhow!(e))
            .context("invalid backend URL configuration")?;
        self.trigger
            .validate()
            .map_err(|e| anyhow!(e))
            .context("invalid trigger configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            command = self.command.name(),
            nats_url = %self.nats.nats_url,
            engine_url = %self.engine.engine_url,
            engine_timeout_secs = self.engine.engine_timeout,
            backend_url = ?self.backend.backend_url,
            polling_cron = self.trigger.polling_cron(),
            "Configuration"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    const REQUIRED: [&str; 7] = [
        "pieceflow",
        "--nats-url",
        "nats://localhost:4222",
        "--nats-token",
        "secret",
        "--engine-url",
        "http://localhost:3001",
    ];

    fn parse(extra: &[&str]) -> Cli {
        Cli::try_parse_from(REQUIRED.iter().chain(extra).copied()).unwrap()
    }

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_enable() {
        let cli = parse(&["enable", "--params", "params.json"]);
        assert_eq!(
            cli.command,
            Command::Enable {
                params: PathBuf::from("params.json")
            }
        );
        assert_eq!(cli.command.name(), "enable");
        assert_eq!(cli.backend.backend_port, 3000);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_parse_execute_with_overrides() {
        let cli = parse(&[
            "--backend-url",
            "https://api.example.com",
            "--polling-cron",
            "0 */5 * * * *",
            "execute",
            "-r",
            "request.json",
        ]);

        assert_eq!(cli.command.name(), "execute");
        assert_eq!(cli.backend.backend_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(cli.trigger.polling_cron(), "0 */5 * * * *");
    }

    #[test]
    fn test_missing_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(REQUIRED).is_err());
    }

    #[test]
    fn test_validate_reports_bad_engine_url() {
        let mut cli = parse(&["disable", "-p", "params.json"]);
        cli.engine.engine_url = "ftp://engine".to_string();

        let error = cli.validate().unwrap_err();
        assert!(format!("{error:#}").contains("invalid engine configuration"));
    }
}
