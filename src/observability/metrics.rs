//! # Metrics Collection
//!
//! Password retrieval instruments and the Prometheus exporter.
//!
//! Instruments are exported through the `metrics` facade. Each one also keeps
//! an atomic shadow value so the current totals can be read back without
//! scraping the exporter.

use crate::config::ObservabilityConfig;
use crate::errors::{BrokerError, Result};
use ::tracing::{info, warn};
use metrics::{counter, describe_counter, describe_gauge, gauge, Counter, Gauge, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const PASSWORD_ATTEMPTS: &str = "total_password_retrieval_attempts";
pub const PASSWORD_FAILURES: &str = "total_password_retrieval_failures";
pub const PASSWORD_UNAUTHORIZED: &str = "total_password_retrieval_unauthorized";
pub const PASSWORD_REQUEST_MILLISECONDS: &str = "total_password_request_milliseconds";

/// Process-wide registry of instrument names
static REGISTRY: Lazy<MetricsRegistry> = Lazy::new(MetricsRegistry::new);

/// Tracks which instrument names have been claimed. A name can be registered
/// only once per registry.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    names: Mutex<HashSet<&'static str>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by the whole process
    pub fn global() -> &'static MetricsRegistry {
        &REGISTRY
    }

    /// Claim every name in `names`, or none of them.
    pub fn register_all(&self, names: &[&'static str]) -> Result<()> {
        let mut registered = self.names.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(taken) = names.iter().find(|name| registered.contains(*name)) {
            return Err(BrokerError::metrics(format!("metric {} is already registered", taken)));
        }

        registered.extend(names.iter().copied());
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.names.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).contains(name)
    }
}

/// Point-in-time view of the password retrieval instruments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PasswordMetricsSnapshot {
    pub attempts: u64,
    pub failures: u64,
    pub unauthorized: u64,
    pub request_milliseconds: u64,
}

/// The four password retrieval instruments
pub struct PasswordMetrics {
    attempts: Counter,
    failures: Counter,
    unauthorized: Counter,
    request_milliseconds: Gauge,
    attempts_total: AtomicU64,
    failures_total: AtomicU64,
    unauthorized_total: AtomicU64,
    request_milliseconds_total: AtomicU64,
}

impl PasswordMetrics {
    /// Describe and register the instruments against the installed recorder.
    ///
    /// # Errors
    ///
    /// [`BrokerError::Metrics`] if any of the names was already registered
    /// with `registry`.
    pub fn register(registry: &MetricsRegistry) -> Result<Self> {
        registry.register_all(&[
            PASSWORD_ATTEMPTS,
            PASSWORD_FAILURES,
            PASSWORD_UNAUTHORIZED,
            PASSWORD_REQUEST_MILLISECONDS,
        ])?;

        describe_counter!(PASSWORD_ATTEMPTS, Unit::Count, "Total password retrieval attempts");
        describe_counter!(PASSWORD_FAILURES, Unit::Count, "Total failed password retrievals");
        describe_counter!(
            PASSWORD_UNAUTHORIZED,
            Unit::Count,
            "Total password retrievals denied because the IAM identity was not authorized"
        );
        describe_gauge!(
            PASSWORD_REQUEST_MILLISECONDS,
            Unit::Milliseconds,
            "Cumulative time spent retrieving passwords"
        );

        Ok(Self {
            attempts: counter!(PASSWORD_ATTEMPTS),
            failures: counter!(PASSWORD_FAILURES),
            unauthorized: counter!(PASSWORD_UNAUTHORIZED),
            request_milliseconds: gauge!(PASSWORD_REQUEST_MILLISECONDS),
            attempts_total: AtomicU64::new(0),
            failures_total: AtomicU64::new(0),
            unauthorized_total: AtomicU64::new(0),
            request_milliseconds_total: AtomicU64::new(0),
        })
    }

    pub fn record_attempt(&self) {
        self.attempts.increment(1);
        self.attempts_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self, unauthorized: bool) {
        self.failures.increment(1);
        self.failures_total.fetch_add(1, Ordering::Relaxed);

        if unauthorized {
            self.unauthorized.increment(1);
            self.unauthorized_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_elapsed(&self, elapsed: Duration) {
        let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.request_milliseconds.increment(millis as f64);
        self.request_milliseconds_total.fetch_add(millis, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PasswordMetricsSnapshot {
        PasswordMetricsSnapshot {
            attempts: self.attempts_total.load(Ordering::Relaxed),
            failures: self.failures_total.load(Ordering::Relaxed),
            unauthorized: self.unauthorized_total.load(Ordering::Relaxed),
            request_milliseconds: self.request_milliseconds_total.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for PasswordMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordMetrics").field("totals", &self.snapshot()).finish()
    }
}

/// Initialize the Prometheus exporter
pub async fn init_metrics(config: &ObservabilityConfig) -> Result<()> {
    if !config.enable_metrics {
        return Ok(());
    }

    let metrics_addr = match config.metrics_bind_address() {
        Some(addr) => addr,
        None => {
            warn!("Metrics disabled: no bind address configured");
            return Ok(());
        }
    };

    let socket_addr: SocketAddr = metrics_addr.parse().map_err(|e| {
        BrokerError::config(format!("Invalid metrics bind address '{}': {}", metrics_addr, e))
    })?;

    PrometheusBuilder::new()
        .with_http_listener(socket_addr)
        .add_global_label("service", &config.service_name)
        .install()
        .map_err(|e| {
            BrokerError::metrics(format!("Failed to initialize metrics exporter: {}", e))
        })?;

    info!(
        metrics_addr = %metrics_addr,
        service_name = %config.service_name,
        "Metrics collection initialized"
    );

    Ok(())
}
