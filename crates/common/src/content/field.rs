use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An AES-GCM encrypted string as it is stored in the sync store
///
/// `{"ct": "<base64 ciphertext + tag>", "iv": "<base64 96-bit nonce>"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedField {
    pub ct: String,
    pub iv: String,
}

/// A sensitive string that may or may not be encrypted yet
///
/// Records written before field encryption existed hold plain strings, so
///  every sensitive field is read as either shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Protected {
    Encrypted(EncryptedField),
    Plain(String),
}

impl Protected {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, Protected::Encrypted(_))
    }

    /// The plaintext, if this value is not encrypted
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            Protected::Plain(s) => Some(s),
            Protected::Encrypted(_) => None,
        }
    }

    /// Something safe to render: the plaintext, or `fallback` while encrypted
    pub fn display_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.as_plain().unwrap_or(fallback)
    }
}

impl Default for Protected {
    fn default() -> Self {
        Protected::Plain(String::new())
    }
}

impl From<String> for Protected {
    fn from(s: String) -> Self {
        Protected::Plain(s)
    }
}

impl From<&str> for Protected {
    fn from(s: &str) -> Self {
        Protected::Plain(s.to_string())
    }
}

impl From<EncryptedField> for Protected {
    fn from(field: EncryptedField) -> Self {
        Protected::Encrypted(field)
    }
}

/// Whether a JSON value has the `{ct, iv}` shape, both strings
pub fn is_encrypted_field(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => {
            obj.get("ct").map(Value::is_string).unwrap_or(false)
                && obj.get("iv").map(Value::is_string).unwrap_or(false)
        }
        None => false,
    }
}

/// Render a JSON value as text without ever leaking a raw `{ct, iv}` object
pub fn safe_string(value: &Value, fallback: &str) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => fallback.to_string(),
    }
}
