//! Local YAML file credential manager.
//!
//! Used when no Vault is reachable, typically in development. The file is a
//! list of entries, one per database user:
//!
//! ```yaml
//! - dbhost: db.example.com
//!   dbport: 5432
//!   dbuser: alice
//!   password: pw1
//!   iam_arns:
//!     - arn:aws:iam::111:role/app
//! ```
//!
//! The file is re-read on every call, so edits take effect without a restart.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use tracing::{debug, info, Span};

use super::error::{CredentialError, Result};
use super::record::authorize;
use super::types::{DbKey, SecretString};
use super::CredentialManager;
use crate::config::LocalFileSettings;

const LOCAL_FILE_BACKEND_NAME: &str = "local file";

/// One entry in the secrets file.
#[derive(Deserialize)]
struct LocalSecret {
    dbhost: String,
    #[serde(deserialize_with = "port_as_string")]
    dbport: String,
    dbuser: String,
    password: SecretString,
    iam_arns: Option<Vec<String>>,
}

fn port_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u64),
        Text(String),
    }

    Ok(match Port::deserialize(deserializer)? {
        Port::Number(n) => n.to_string(),
        Port::Text(s) => s,
    })
}

/// Credential manager reading a YAML secrets file from local disk.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    /// Open the secrets file and check that it parses.
    pub async fn new(settings: &LocalFileSettings) -> Result<Self> {
        let manager = Self { path: settings.path.clone() };

        let entries = load(&manager.path).await.map_err(|e| {
            CredentialError::unavailable(LOCAL_FILE_BACKEND_NAME, e.to_string())
        })?;

        info!(path = %manager.path.display(), entries = entries.len(), "Loaded local secrets file");
        Ok(manager)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn load(path: &Path) -> Result<Vec<LocalSecret>> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        CredentialError::unavailable(
            LOCAL_FILE_BACKEND_NAME,
            format!("unable to read {}: {}", path.display(), e),
        )
    })?;

    // Only the position is reported; the YAML error text can quote file contents
    serde_yaml::from_str(&raw).map_err(|e| {
        let position = e
            .location()
            .map(|l| format!(" at line {}, column {}", l.line(), l.column()))
            .unwrap_or_default();
        CredentialError::malformed(format!(
            "{} is not a valid secrets file{}",
            path.display(),
            position
        ))
    })
}

#[async_trait]
impl CredentialManager for LocalFile {
    fn name(&self) -> &str {
        LOCAL_FILE_BACKEND_NAME
    }

    async fn password(&self, request_span: &Span, identity: &DbKey) -> Result<SecretString> {
        debug!(parent: request_span, path = %self.path.display(), "Reading local secrets file");

        let entry = load(&self.path)
            .await?
            .into_iter()
            .find(|s| {
                s.dbhost == identity.db_host
                    && s.dbport == identity.db_port
                    && s.dbuser == identity.db_user
            })
            .ok_or_else(|| {
                CredentialError::not_found(format!("{}/{}", identity.location(), identity.db_user))
            })?;

        let allowed = entry.iam_arns.as_deref().ok_or_else(|| {
            CredentialError::malformed(format!(
                "iam_arns not found for {}/{}",
                identity.location(),
                identity.db_user
            ))
        })?;

        authorize(&identity.iam_arn, allowed)?;
        Ok(entry.password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const APP_ROLE: &str = "arn:aws:iam::111:role/app";

    const SECRETS: &str = r#"
- dbhost: db.example.com
  dbport: 5432
  dbuser: alice
  password: pw1
  iam_arns:
    - arn:aws:iam::111:role/app
    - arn:aws:iam::222:role/batch
- dbhost: db.example.com
  dbport: "3306"
  dbuser: bob
  password: pw2
  iam_arns: []
"#;

    fn secrets_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    async fn manager(file: &tempfile::NamedTempFile) -> LocalFile {
        LocalFile::new(&LocalFileSettings { path: file.path().to_path_buf() }).await.unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_fails_construction() {
        let settings = LocalFileSettings { path: PathBuf::from("/nonexistent/secrets.yaml") };
        let err = LocalFile::new(&settings).await.unwrap_err();
        assert!(matches!(err, CredentialError::BackendUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_unparseable_file_fails_construction() {
        let file = secrets_file("not: [a, list");
        let err = LocalFile::new(&LocalFileSettings { path: file.path().to_path_buf() })
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::BackendUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_authorized_caller_gets_password() {
        let file = secrets_file(SECRETS);
        let local = manager(&file).await;
        assert_eq!(local.name(), "local file");

        let identity = DbKey::new(APP_ROLE, "db.example.com", "5432", "alice");
        let password = local.password(&Span::none(), &identity).await.unwrap();
        assert_eq!(password.expose_secret(), "pw1");

        let identity = DbKey::new("arn:aws:iam::222:role/batch", "db.example.com", "5432", "alice");
        assert!(local.password(&Span::none(), &identity).await.is_ok());
    }

    #[tokio::test]
    async fn test_unlisted_caller_is_not_authorized() {
        let file = secrets_file(SECRETS);
        let local = manager(&file).await;

        let identity = DbKey::new("arn:aws:iam::999:role/other", "db.example.com", "5432", "alice");
        let err = local.password(&Span::none(), &identity).await.unwrap_err();
        assert!(err.is_not_authorized());

        // String ports are accepted and an empty allow-list denies everyone
        let identity = DbKey::new(APP_ROLE, "db.example.com", "3306", "bob");
        let err = local.password(&Span::none(), &identity).await.unwrap_err();
        assert!(err.is_not_authorized());
    }

    #[tokio::test]
    async fn test_unknown_identity_is_not_found() {
        let file = secrets_file(SECRETS);
        let local = manager(&file).await;

        let identity = DbKey::new(APP_ROLE, "db.example.com", "5432", "mallory");
        let err = local.password(&Span::none(), &identity).await.unwrap_err();
        assert!(matches!(err, CredentialError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_allow_list_is_malformed_not_denied() {
        let file = secrets_file(
            "- dbhost: db.example.com\n  dbport: 5432\n  dbuser: dave\n  password: pw4\n",
        );
        let local = manager(&file).await;

        let identity = DbKey::new(APP_ROLE, "db.example.com", "5432", "dave");
        let err = local.password(&Span::none(), &identity).await.unwrap_err();
        assert!(!err.is_not_authorized());
        assert_eq!(
            err.to_string(),
            "malformed secret record: iam_arns not found for db.example.com:5432/dave"
        );
    }

    #[tokio::test]
    async fn test_file_is_reread_on_every_call() {
        let mut file = secrets_file(SECRETS);
        let local = manager(&file).await;
        let identity = DbKey::new(APP_ROLE, "db.example.com", "5432", "carol");
        assert!(local.password(&Span::none(), &identity).await.is_err());

        writeln!(file, "- dbhost: db.example.com\n  dbport: 5432\n  dbuser: carol").unwrap();
        writeln!(file, "  password: pw3\n  iam_arns: [\"{}\"]", APP_ROLE).unwrap();
        file.flush().unwrap();

        let password = local.password(&Span::none(), &identity).await.unwrap();
        assert_eq!(password.expose_secret(), "pw3");
    }

    #[tokio::test]
    async fn test_corrupted_file_is_malformed_at_call_time() {
        let file = secrets_file(SECRETS);
        let local = manager(&file).await;
        std::fs::write(file.path(), "- dbhost: [").unwrap();

        let identity = DbKey::new(APP_ROLE, "db.example.com", "5432", "alice");
        let err = local.password(&Span::none(), &identity).await.unwrap_err();
        assert!(matches!(err, CredentialError::MalformedRecord { .. }));
    }
}
