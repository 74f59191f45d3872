//! Scoped Vault token injection.
//!
//! When no `VAULT_TOKEN` is present in the environment, the token is read
//! from a sink file (for example one maintained by Vault Agent) each time a
//! client is built. The token is placed in `VAULT_TOKEN` only while the
//! returned [`ScopedVaultToken`] is alive and is removed again on drop. One
//! process-wide mutex is held for the whole inject/clear window.

use std::env;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::error::{CredentialError, Result};
use super::vault::VAULT_BACKEND_NAME;

/// Environment variable the Vault client reads its token from.
pub const VAULT_TOKEN_ENV: &str = "VAULT_TOKEN";

static TOKEN_ENV_LOCK: Mutex<()> = Mutex::new(());

/// A Vault token that is visible in the environment for the lifetime of this guard.
pub struct ScopedVaultToken {
    token: String,
    injected: bool,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedVaultToken {
    /// Resolve the token for one client build.
    ///
    /// An ambient, non-empty `VAULT_TOKEN` wins and is left in place. Otherwise
    /// the sink file at `token_path` is read and injected until drop.
    pub fn acquire(token_path: Option<&Path>) -> Result<Self> {
        let lock = TOKEN_ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(ambient) = env::var(VAULT_TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
            return Ok(Self { token: ambient, injected: false, _lock: lock });
        }

        let Some(path) = token_path else {
            return Err(CredentialError::unavailable(
                VAULT_BACKEND_NAME,
                "no VAULT_TOKEN set and no token sink path configured",
            ));
        };

        // Blocking read: the sink is a few bytes and the lock cannot be held
        // across an await, so this stays synchronous inside the guard
        let token = std::fs::read_to_string(path)
            .map_err(|e| {
                CredentialError::unavailable(
                    VAULT_BACKEND_NAME,
                    format!("unable to read token sink {}: {}", path.display(), e),
                )
            })?
            .trim()
            .to_string();

        if token.is_empty() {
            return Err(CredentialError::unavailable(
                VAULT_BACKEND_NAME,
                format!("token sink {} is empty", path.display()),
            ));
        }

        env::set_var(VAULT_TOKEN_ENV, &token);
        tracing::trace!(token_path = %path.display(), "Injected Vault token from sink");
        Ok(Self { token, injected: true, _lock: lock })
    }

    /// The resolved token. Never log it.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether this guard placed the token into the environment.
    pub fn injected(&self) -> bool {
        self.injected
    }
}

impl Drop for ScopedVaultToken {
    fn drop(&mut self) {
        if self.injected {
            env::remove_var(VAULT_TOKEN_ENV);
        }
    }
}

impl std::fmt::Debug for ScopedVaultToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedVaultToken")
            .field("token", &"[REDACTED]")
            .field("injected", &self.injected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_debug_redacts_token() {
        let mut sink = tempfile::NamedTempFile::new().unwrap();
        sink.write_all(b"s.debugtoken").unwrap();

        let scoped = ScopedVaultToken::acquire(Some(sink.path())).unwrap();
        let rendered = format!("{:?}", scoped);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("s.debugtoken"));
    }
}
