//! Secret record decoding and IAM authorization.
//!
//! A secret record is stored per `host:port` and maps each database user to a
//! JSON-encoded string:
//!
//! ```json
//! { "alice": "{\"password\":\"pw1\",\"iam_roles\":[\"arn:aws:iam::111:role/app\"]}" }
//! ```
//!
//! The allow-list is checked before the password field is read, so a denied
//! caller never causes the password to leave this module.

use serde_json::{Map, Value};

use super::error::{CredentialError, Result};
use super::types::{DbKey, SecretString};

/// Extract the password for `identity.db_user` from a record's data map,
/// enforcing that `identity.iam_arn` appears in the user's `iam_roles`.
pub fn password_from_secret(data: &Map<String, Value>, identity: &DbKey) -> Result<SecretString> {
    let user_data = match data.get(&identity.db_user) {
        Some(Value::String(raw)) => raw,
        Some(other) => {
            return Err(CredentialError::malformed(format!(
                "entry for user {} is {}, expected string",
                identity.db_user,
                json_type(other)
            )))
        }
        None => {
            return Err(CredentialError::malformed(format!(
                "no entry for user {}",
                identity.db_user
            )))
        }
    };

    let user_record: Map<String, Value> = serde_json::from_str(user_data).map_err(|e| {
        CredentialError::malformed(format!(
            "entry for user {} is not a JSON object: {}",
            identity.db_user,
            decode_failure(&e)
        ))
    })?;

    let roles = iam_roles(&user_record)?;
    authorize(&identity.iam_arn, &roles)?;

    match user_record.get("password") {
        Some(Value::String(password)) => Ok(SecretString::new(password.as_str())),
        Some(other) => Err(CredentialError::malformed(format!(
            "password is {}, expected string",
            json_type(other)
        ))),
        None => Err(CredentialError::malformed("password not found")),
    }
}

/// Decode the `iam_roles` allow-list. Every entry must be a string.
fn iam_roles(user_record: &Map<String, Value>) -> Result<Vec<&str>> {
    let raw = user_record
        .get("iam_roles")
        .ok_or_else(|| CredentialError::malformed("iam_roles not found"))?;

    let entries = raw.as_array().ok_or_else(|| {
        CredentialError::malformed(format!("iam_roles is {}, expected array", json_type(raw)))
    })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry.as_str().ok_or_else(|| {
                CredentialError::malformed(format!(
                    "iam_roles[{}] is {}, expected string",
                    index,
                    json_type(entry)
                ))
            })
        })
        .collect()
}

/// Exact, case-sensitive allow-list check. An empty list never matches.
pub fn authorize<S: AsRef<str>>(iam_arn: &str, allowed: &[S]) -> Result<()> {
    if allowed.iter().any(|role| role.as_ref() == iam_arn) {
        Ok(())
    } else {
        Err(CredentialError::NotAuthorized)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn decode_failure(error: &serde_json::Error) -> &'static str {
    use serde_json::error::Category;

    match error.classify() {
        Category::Io => "i/o error",
        Category::Syntax => "syntax error",
        Category::Data => "wrong JSON type",
        Category::Eof => "unexpected end of input",
    }
}
