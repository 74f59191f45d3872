//! # Observability Infrastructure
//!
//! Structured logging and Prometheus metrics for credbroker.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::{
    init_metrics, MetricsRegistry, PasswordMetrics, PasswordMetricsSnapshot, PASSWORD_ATTEMPTS,
    PASSWORD_FAILURES, PASSWORD_REQUEST_MILLISECONDS, PASSWORD_UNAUTHORIZED,
};

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use ::tracing::info;

/// Initialize logging, then metrics
pub async fn init_observability(config: &ObservabilityConfig) -> Result<()> {
    init_logging(config)?;

    if config.enable_metrics {
        init_metrics(config).await?;
    }

    info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        metrics_enabled = %config.enable_metrics,
        "Observability initialized successfully"
    );

    Ok(())
}
