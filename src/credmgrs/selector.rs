//! Startup-time backend selection.
//!
//! Candidates are tried strictly in the order given. The first one that
//! constructs successfully is used for the rest of the process lifetime;
//! there is no re-selection once traffic is being served.

use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, info};

use super::error::{CredentialError, Result};
use super::local_file::LocalFile;
use super::vault::HashiCorpVault;
use super::CredentialManager;
use crate::config::AppConfig;

type Constructor<'a> =
    Box<dyn FnOnce() -> BoxFuture<'a, Result<Box<dyn CredentialManager>>> + Send + 'a>;

/// A named, not-yet-attempted backend constructor.
pub struct Candidate<'a> {
    name: &'static str,
    construct: Constructor<'a>,
}

impl<'a> Candidate<'a> {
    pub fn new<F, Fut, M>(name: &'static str, construct: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: std::future::Future<Output = Result<M>> + Send + 'a,
        M: CredentialManager + 'static,
    {
        let construct: Constructor<'a> = Box::new(move || {
            construct()
                .map(|built| built.map(|m| Box::new(m) as Box<dyn CredentialManager>))
                .boxed()
        });
        Self { name, construct }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for Candidate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate").field("name", &self.name).finish()
    }
}

/// The built-in candidates in priority order: centrally managed stores first,
/// then the local file.
pub fn default_candidates(config: &AppConfig) -> Vec<Candidate<'_>> {
    vec![
        Candidate::new("HashiCorp Vault", move || HashiCorpVault::new(&config.vault)),
        Candidate::new("local file", move || LocalFile::new(&config.local_file)),
    ]
}

/// Return the first candidate that constructs successfully.
///
/// # Errors
///
/// [`CredentialError::NoneAvailable`] if every candidate fails. Individual
/// failures are only reported at debug level.
pub async fn select(candidates: Vec<Candidate<'_>>) -> Result<Box<dyn CredentialManager>> {
    for candidate in candidates {
        let name = candidate.name;
        match (candidate.construct)().await {
            Ok(manager) => {
                info!(credential_manager = %manager.name(), "Selected credential manager");
                return Ok(manager);
            }
            Err(e) => {
                debug!(
                    candidate = name,
                    error = %e,
                    "Didn't select credential manager"
                );
            }
        }
    }

    Err(CredentialError::NoneAvailable)
}
