//! Credential managers: where database passwords come from.
//!
//! A credential manager answers one question: given an authenticated IAM
//! identity and a database endpoint and user, what is the password, and is
//! this identity allowed to have it?
//!
//! # Architecture
//!
//! Everything is built around the [`CredentialManager`] trait:
//! - **name**: a fixed, human-readable backend name
//! - **password**: fetch the stored record and enforce its IAM allow-list
//!
//! # Supported Backends
//!
//! - **HashiCorp Vault**: KV v1 engine mounted at `approzium`
//! - **Local file**: a YAML list of entries, for development
//!
//! At startup [`selector::select`] tries each backend in priority order and
//! keeps the first one that initializes. The winner is wrapped in a
//! [`Tracker`] that records retrieval metrics.
//!
//! # Example
//!
//! ```rust,ignore
//! use credbroker::credmgrs::{retrieve_configured, CredentialManager, DbKey};
//! use credbroker::observability::MetricsRegistry;
//!
//! let manager = retrieve_configured(&config, MetricsRegistry::global()).await?;
//!
//! let identity = DbKey::new("arn:aws:iam::111:role/app", "db.example.com", "5432", "alice");
//! let span = credbroker::password_request_span!(identity);
//! let password = manager.password(&span, &identity).await?;
//! ```

pub mod error;
pub mod local_file;
pub mod record;
pub mod selector;
pub mod token;
pub mod tracker;
pub mod types;
pub mod vault;

pub use error::{CredentialError, Result};
pub use local_file::LocalFile;
pub use selector::{default_candidates, select, Candidate};
pub use tracker::Tracker;
pub use types::{DbKey, SecretString};
pub use vault::HashiCorpVault;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::Span;

use crate::config::AppConfig;
use crate::observability::{MetricsRegistry, PasswordMetrics};

/// A source of database passwords.
///
/// Implementations must be safe to call concurrently from many tasks.
#[async_trait]
pub trait CredentialManager: Send + Sync {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Retrieve the password for `identity`, failing with
    /// [`CredentialError::NotAuthorized`] unless `identity.iam_arn` is on the
    /// record's allow-list.
    ///
    /// Events about this call are emitted as children of `request_span`.
    async fn password(&self, request_span: &Span, identity: &DbKey) -> Result<SecretString>;
}

impl std::fmt::Debug for dyn CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager").field("name", &self.name()).finish()
    }
}

#[async_trait]
impl<T: CredentialManager + ?Sized> CredentialManager for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn password(&self, request_span: &Span, identity: &DbKey) -> Result<SecretString> {
        (**self).password(request_span, identity).await
    }
}

/// Select a backend from the configured candidates and wrap it in a [`Tracker`].
///
/// # Errors
///
/// Fails if no backend can be initialized or the retrieval metrics cannot be
/// registered. Either is fatal at startup.
pub async fn retrieve_configured(
    config: &AppConfig,
    registry: &MetricsRegistry,
) -> crate::Result<Arc<dyn CredentialManager>> {
    let backend = select(default_candidates(config)).await?;
    let metrics = PasswordMetrics::register(registry)?;

    Ok(Arc::new(Tracker::new(backend, Arc::new(metrics))))
}
