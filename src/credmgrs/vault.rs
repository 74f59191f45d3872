//! HashiCorp Vault credential manager.
//!
//! Secrets live in a KV v1 engine mounted at [`MOUNT_PATH`], one secret per
//! database endpoint, keyed `<host>:<port>`:
//!
//! ```text
//! $ vault secrets enable -path=approzium -version=1 kv
//! $ vault write approzium/db.example.com:5432 \
//!     alice='{"password":"pw1","iam_roles":["arn:aws:iam::111:role/app"]}'
//! ```
//!
//! Construction probes the mount with a LIST request, so the Vault policy
//! must grant `list` on `approzium/` as well as `read` on `approzium/*`.
//! A 404 from the probe (empty mount) is accepted; a 403 fails selection.
//!
//! A fresh client is built for every call so that a rotating token sink is
//! always honoured. See [`super::token`] for how the token is resolved.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, Span};
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv1;

use super::error::{CredentialError, Result};
use super::record::password_from_secret;
use super::token::ScopedVaultToken;
use super::types::{DbKey, SecretString};
use super::CredentialManager;
use crate::config::VaultSettings;

/// Mount path of the KV v1 secrets engine holding database secrets.
pub const MOUNT_PATH: &str = "approzium";

pub(crate) const VAULT_BACKEND_NAME: &str = "HashiCorp Vault";

/// Credential manager backed by a HashiCorp Vault KV v1 mount.
#[derive(Clone)]
pub struct HashiCorpVault {
    address: String,
    namespace: Option<String>,
    token_path: Option<PathBuf>,
    timeout: Duration,
}

impl std::fmt::Debug for HashiCorpVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashiCorpVault")
            .field("address", &self.address)
            .field("namespace", &self.namespace)
            .field("token_path", &self.token_path)
            .field("mount_path", &MOUNT_PATH)
            .finish()
    }
}

impl HashiCorpVault {
    /// Build a Vault credential manager and prove it can talk to the mount.
    ///
    /// # Errors
    ///
    /// [`CredentialError::BackendUnavailable`] if no address is configured, the
    /// token cannot be loaded, or the liveness probe against the mount fails.
    pub async fn new(settings: &VaultSettings) -> Result<Self> {
        let address = settings.address.clone().filter(|a| !a.is_empty()).ok_or_else(|| {
            CredentialError::unavailable(VAULT_BACKEND_NAME, "no vault address detected")
        })?;

        let manager = Self {
            address,
            namespace: settings.namespace.clone(),
            token_path: settings.token_path.clone(),
            timeout: settings.request_timeout(),
        };

        let client = manager.client()?;
        match kv1::list(&client, MOUNT_PATH, "").await {
            Ok(_) | Err(ClientError::APIError { code: 404, .. }) => {}
            Err(e) => {
                return Err(CredentialError::unavailable(
                    VAULT_BACKEND_NAME,
                    format!("liveness probe against mount {} failed: {}", MOUNT_PATH, e),
                ))
            }
        }

        debug!(address = %manager.address, mount_path = MOUNT_PATH, "Vault mount is reachable");
        Ok(manager)
    }

    /// Build a client with the current token. The token guard is released
    /// before this returns, so no environment state outlives the build.
    fn client(&self) -> Result<VaultClient> {
        let scoped = ScopedVaultToken::acquire(self.token_path.as_deref())?;

        let mut settings_builder = VaultClientSettingsBuilder::default();
        settings_builder.address(&self.address);
        settings_builder.token(scoped.token());
        settings_builder.timeout(Some(self.timeout));

        if let Some(ref namespace) = self.namespace {
            settings_builder.namespace(Some(namespace.clone()));
        }

        let settings = settings_builder.build().map_err(|e| {
            CredentialError::unavailable(
                VAULT_BACKEND_NAME,
                format!("invalid Vault configuration: {}", e),
            )
        })?;

        VaultClient::new(settings).map_err(|e| {
            CredentialError::unavailable(
                VAULT_BACKEND_NAME,
                format!("failed to create Vault client: {}", e),
            )
        })
    }
}

#[async_trait]
impl CredentialManager for HashiCorpVault {
    fn name(&self) -> &str {
        VAULT_BACKEND_NAME
    }

    async fn password(&self, request_span: &Span, identity: &DbKey) -> Result<SecretString> {
        let client = self.client()?;

        let location = identity.location();
        let path = format!("{}/{}", MOUNT_PATH, location);
        debug!(parent: request_span, path = %path, "Reading secret record from Vault");

        let data: Map<String, Value> =
            kv1::get(&client, MOUNT_PATH, &location).await.map_err(|e| match e {
                ClientError::APIError { code: 404, .. } => CredentialError::not_found(&path),
                ClientError::ResponseDataEmptyError | ClientError::ResponseEmptyError => {
                    CredentialError::malformed("no response body data returned from Vault")
                }
                // serde's message can quote the payload, so it is not forwarded
                ClientError::JsonParseError { .. } => {
                    CredentialError::malformed("response data is not a JSON object")
                }
                other => CredentialError::unavailable(VAULT_BACKEND_NAME, other.to_string()),
            })?;

        password_from_secret(&data, identity)
    }
}
