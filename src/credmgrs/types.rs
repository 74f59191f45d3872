//! Value types shared by every credential manager.
//!
//! [`DbKey`] is the lookup key a caller presents, and [`SecretString`] is the
//! password a manager hands back. Neither type is ever mutated after creation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Identity of a password request.
///
/// The IAM ARN has already been verified by the transport layer; whether that
/// principal may reach this database is decided by the credential manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DbKey {
    /// ARN of the IAM principal the caller proved it controls
    pub iam_arn: String,

    /// Database host as the caller addressed it
    pub db_host: String,

    /// Database port, kept as a string to match the stored record key
    pub db_port: String,

    /// Database user whose password is requested
    pub db_user: String,
}

impl DbKey {
    pub fn new(
        iam_arn: impl Into<String>,
        db_host: impl Into<String>,
        db_port: impl Into<String>,
        db_user: impl Into<String>,
    ) -> Self {
        Self {
            iam_arn: iam_arn.into(),
            db_host: db_host.into(),
            db_port: db_port.into(),
            db_user: db_user.into(),
        }
    }

    /// `host:port` location of the secret record for this identity.
    pub fn location(&self) -> String {
        format!("{}:{}", self.db_host, self.db_port)
    }
}

/// A password wrapper that redacts its contents in Debug, Display, and serialization.
///
/// Memory is zeroed when the value is dropped. The plain password is only
/// reachable through [`SecretString::expose_secret`] or
/// [`SecretString::into_inner`].
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(SecretString(value))
    }
}

impl SecretString {
    /// Creates a new SecretString from a string value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying password. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Consumes the SecretString and returns the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
