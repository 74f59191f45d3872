//! # Structured Logging
//!
//! Subscriber setup and the per-request span handed to credential managers.
//!
//! Every password retrieval runs inside a `password_request` span carrying the
//! caller's identity and a fresh request ID. Backends and the tracker emit
//! their events as children of that span, so one request can be followed
//! across the selector, the backend and the metrics decorator. The password
//! itself is never a span field.

use crate::config::ObservabilityConfig;
use crate::errors::{BrokerError, Result};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Create the span that scopes one password retrieval.
///
/// ```rust,ignore
/// let identity = DbKey::new(arn, "db.example.com", "5432", "alice");
/// let span = password_request_span!(identity);
/// let password = manager.password(&span, &identity).await?;
/// ```
#[macro_export]
macro_rules! password_request_span {
    ($identity:expr) => {{
        let identity: &$crate::credmgrs::DbKey = &$identity;
        tracing::info_span!(
            "password_request",
            iam_arn = %identity.iam_arn,
            db_host = %identity.db_host,
            db_port = %identity.db_port,
            db_user = %identity.db_user,
            request_id = %uuid::Uuid::new_v4()
        )
    }};
    ($identity:expr, $($field:tt)*) => {{
        let identity: &$crate::credmgrs::DbKey = &$identity;
        tracing::info_span!(
            "password_request",
            iam_arn = %identity.iam_arn,
            db_host = %identity.db_host,
            db_port = %identity.db_port,
            db_user = %identity.db_user,
            request_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    }};
}

/// Build the log filter: `RUST_LOG` wins, otherwise the configured level.
pub fn env_filter(config: &ObservabilityConfig) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&config.log_level).map_err(|e| {
            BrokerError::config(format!("Invalid log level '{}': {}", config.log_level, e))
        })
    })
}

/// Install the global subscriber. An already-installed subscriber is kept.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let filter = env_filter(config)?;

    let installed = if config.json_logging {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().with_env_filter(filter).json().finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder().with_env_filter(filter).finish(),
        )
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already set, keeping it");
    }

    Ok(())
}

/// Log configuration at startup
pub fn log_config_info(config: &crate::config::AppConfig) {
    tracing::info!(
        vault_address = config.vault.address.as_deref().unwrap_or("<unset>"),
        vault_namespace = config.vault.namespace.as_deref().unwrap_or("<none>"),
        token_sink = config.vault.token_path.is_some(),
        secrets_file = %config.local_file.path.display(),
        metrics_enabled = %config.observability.enable_metrics,
        "credbroker configuration"
    );
}
