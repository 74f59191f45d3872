//! # Configuration Settings
//!
//! Defines the configuration structure for credbroker.

use crate::errors::{BrokerError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct AppConfig {
    /// HashiCorp Vault backend configuration
    #[validate(nested)]
    pub vault: VaultSettings,

    /// Local secrets file backend configuration
    #[validate(nested)]
    pub local_file: LocalFileSettings,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup. Unset keys fall
    /// back to their defaults; set keys that do not parse are an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let vault = VaultSettings {
            address: non_empty("VAULT_ADDR"),
            token_path: non_empty("CREDBROKER_VAULT_TOKEN_PATH").map(PathBuf::from),
            namespace: non_empty("VAULT_NAMESPACE"),
            request_timeout_seconds: parse_or(
                non_empty("CREDBROKER_VAULT_TIMEOUT_SECONDS"),
                "CREDBROKER_VAULT_TIMEOUT_SECONDS",
                defaults.vault.request_timeout_seconds,
            )?,
        };

        let local_file = LocalFileSettings {
            path: non_empty("CREDBROKER_SECRETS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_file.path),
        };

        let observability = ObservabilityConfig {
            enable_metrics: non_empty("CREDBROKER_ENABLE_METRICS")
                .map(|s| parse_bool(&s))
                .unwrap_or(defaults.observability.enable_metrics),
            metrics_port: parse_or(
                non_empty("CREDBROKER_METRICS_PORT"),
                "CREDBROKER_METRICS_PORT",
                defaults.observability.metrics_port,
            )?,
            service_name: non_empty("CREDBROKER_SERVICE_NAME")
                .unwrap_or(defaults.observability.service_name),
            log_level: non_empty("CREDBROKER_LOG_LEVEL")
                .unwrap_or(defaults.observability.log_level),
            json_logging: non_empty("CREDBROKER_JSON_LOGGING")
                .map(|s| parse_bool(&s))
                .unwrap_or(defaults.observability.json_logging),
        };

        Ok(Self { vault, local_file, observability })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(BrokerError::from)?;

        self.validate_custom()?;

        Ok(())
    }

    /// Checks the validator derive cannot express
    fn validate_custom(&self) -> Result<()> {
        if self.local_file.path.as_os_str().is_empty() {
            return Err(BrokerError::validation_field(
                "Secrets file path cannot be empty",
                "local_file.path",
            ));
        }

        if let Some(ref address) = self.vault.address {
            if !address.starts_with("http://") && !address.starts_with("https://") {
                return Err(BrokerError::validation_field(
                    "Vault address must start with 'http://' or 'https://'",
                    "vault.address",
                ));
            }
        }

        Ok(())
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| BrokerError::config(format!("Invalid {} '{}': {}", key, value, e))),
        None => Ok(default),
    }
}

fn parse_bool(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

/// HashiCorp Vault backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VaultSettings {
    /// Vault server address. The Vault backend is skipped when unset.
    pub address: Option<String>,

    /// File holding a Vault token, used when `VAULT_TOKEN` is not set
    pub token_path: Option<PathBuf>,

    /// Vault Enterprise namespace
    pub namespace: Option<String>,

    /// Per-request timeout in seconds
    #[validate(range(
        min = 1,
        max = 300,
        message = "Vault request timeout must be between 1 and 300 seconds"
    ))]
    pub request_timeout_seconds: u64,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self { address: None, token_path: None, namespace: None, request_timeout_seconds: 10 }
    }
}

impl VaultSettings {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Local secrets file backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocalFileSettings {
    /// Path to the YAML secrets file
    pub path: PathBuf,
}

impl Default for LocalFileSettings {
    fn default() -> Self {
        Self { path: PathBuf::from("secrets.yaml") }
    }
}

/// Observability configuration for logging and metrics
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Metrics server port (0 = disabled)
    pub metrics_port: u16,

    /// Service name attached to exported metrics
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            metrics_port: 9090,
            service_name: "credbroker".to_string(),
            log_level: "info".to_string(),
            json_logging: false,
        }
    }
}

impl ObservabilityConfig {
    /// Get metrics bind address (None if disabled)
    pub fn metrics_bind_address(&self) -> Option<String> {
        if self.metrics_port == 0 {
            None
        } else {
            Some(format!("0.0.0.0:{}", self.metrics_port))
        }
    }
}
