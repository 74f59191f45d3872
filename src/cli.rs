//! # Command Line Interface
//!
//! One-shot commands against the configured credential backend.

use crate::config::AppConfig;
use crate::credmgrs::{retrieve_configured, CredentialManager, DbKey};
use crate::errors::Result;
use crate::observability::{init_observability, log_config_info, MetricsRegistry};
use crate::{APP_NAME, VERSION};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "credbroker")]
#[command(about = "Brokers database passwords for IAM-authenticated callers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Secrets file override (CREDBROKER_SECRETS_FILE)
    #[arg(long)]
    pub secrets_file: Option<PathBuf>,

    /// Vault address override (VAULT_ADDR)
    #[arg(long)]
    pub vault_addr: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the name of the credential backend that would be used
    Backend,

    /// Retrieve one database password on behalf of an IAM identity
    Password {
        /// ARN of the already-authenticated IAM principal
        #[arg(long)]
        iam_arn: String,

        /// Database host
        #[arg(long)]
        host: String,

        /// Database port
        #[arg(long)]
        port: String,

        /// Database user
        #[arg(long)]
        user: String,
    },
}

impl Cli {
    /// Apply command-line overrides on top of the environment configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(ref path) = self.secrets_file {
            config.local_file.path = path.clone();
        }
        if let Some(ref address) = self.vault_addr {
            config.vault.address = Some(address.clone());
        }
        if self.verbose {
            config.observability.log_level = "debug".to_string();
        }
    }
}

/// Load configuration, select a backend and run the requested command.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    init_observability(&config.observability).await?;
    info!(app_name = APP_NAME, version = VERSION, "Starting credbroker");
    log_config_info(&config);

    let manager = retrieve_configured(&config, MetricsRegistry::global()).await?;

    let output = execute(&cli.command, manager.as_ref()).await?;
    println!("{}", output);
    Ok(())
}

/// Run one command against an already-selected credential manager and
/// return what should be printed.
pub async fn execute(command: &Commands, manager: &dyn CredentialManager) -> Result<String> {
    match command {
        Commands::Backend => Ok(manager.name().to_string()),
        Commands::Password { iam_arn, host, port, user } => {
            let identity = DbKey::new(iam_arn, host, port, user);
            let span = crate::password_request_span!(identity);

            let password = manager.password(&span, &identity).await?;
            Ok(password.into_inner())
        }
    }
}
