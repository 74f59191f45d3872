//! # Configuration Management
//!
//! Settings for the credential backends and observability, read from the
//! environment (optionally seeded from a `.env` file by the binary).
//!
//! | Variable | Default |
//! |---|---|
//! | `VAULT_ADDR` | unset, Vault backend skipped |
//! | `VAULT_NAMESPACE` | unset |
//! | `CREDBROKER_VAULT_TOKEN_PATH` | unset |
//! | `CREDBROKER_VAULT_TIMEOUT_SECONDS` | `10` |
//! | `CREDBROKER_SECRETS_FILE` | `secrets.yaml` |
//! | `CREDBROKER_ENABLE_METRICS` | `true` |
//! | `CREDBROKER_METRICS_PORT` | `9090` |
//! | `CREDBROKER_SERVICE_NAME` | `credbroker` |
//! | `CREDBROKER_LOG_LEVEL` | `info` |
//! | `CREDBROKER_JSON_LOGGING` | `false` |

pub mod settings;

pub use settings::{AppConfig, LocalFileSettings, ObservabilityConfig, VaultSettings};
