//! # credbroker
//!
//! credbroker hands out database passwords to callers whose IAM identity has
//! already been verified. Each stored secret carries an allow-list of IAM
//! ARNs; a password is released only to a caller on that list.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌────────────────────────┐
//! password  ───▶  │ Tracker (metrics)      │
//! request         └──────────┬─────────────┘
//!                            ▼
//!              selected at startup, in order
//!           ┌───────────────────┬──────────────────┐
//!           │ HashiCorp Vault   │ Local YAML file  │
//!           │ (KV v1 approzium) │ (secrets.yaml)   │
//!           └───────────────────┴──────────────────┘
//! ```
//!
//! ## Core Components
//!
//! - **credmgrs**: the [`CredentialManager`] trait, the backends, startup
//!   selection and the metrics-tracking decorator
//! - **observability**: structured logging and Prometheus metrics
//! - **config**: environment-driven settings
//! - **errors**: process-level error type
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use credbroker::credmgrs::{retrieve_configured, DbKey};
//! use credbroker::observability::MetricsRegistry;
//! use credbroker::{AppConfig, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let manager = retrieve_configured(&config, MetricsRegistry::global()).await?;
//!
//!     let identity = DbKey::new("arn:aws:iam::111:role/app", "db.example.com", "5432", "alice");
//!     let span = credbroker::password_request_span!(identity);
//!     let password = manager.password(&span, &identity).await?;
//!     println!("{} characters", password.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod credmgrs;
pub mod errors;
pub mod observability;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use credmgrs::{CredentialError, CredentialManager, DbKey, SecretString};
pub use errors::{BrokerError, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "credbroker");
    }
}
