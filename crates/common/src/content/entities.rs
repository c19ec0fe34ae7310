use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::field::Protected;
use crate::now;

/// Name of the marker key set on objects whose sensitive fields are encrypted
pub const ENCRYPTED_MARKER: &str = "_encrypted";

/// An entity with a fixed set of fields that must be encrypted at rest
pub trait SensitiveFields: Serialize + DeserializeOwned + Send + Sync {
    /// Top level string fields to encrypt
    const FIELDS: &'static [&'static str];
    /// Keys holding arrays of [`Attachment`]s
    const ATTACHMENTS: &'static [&'static str] = &[];

    /// Key the entity is stored under
    fn id(&self) -> &str;
}

/// Register the sensitive fields of an entity with an `id: String` field
#[macro_export]
macro_rules! sensitive_fields {
    ($($entity:ty => [$($field:literal),* $(,)?] $(attachments [$($nested:literal),* $(,)?])?;)*) => {
        $(
            impl $crate::content::SensitiveFields for $entity {
                const FIELDS: &'static [&'static str] = &[$($field),*];
                $(const ATTACHMENTS: &'static [&'static str] = &[$($nested),*];)?

                fn id(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: Protected,
    pub mime_type: String,
    pub size: u64,
    /// base64 file contents
    pub data: Protected,
    #[serde(rename = "_encrypted", default, skip_serializing_if = "is_false")]
    pub encrypted: bool,
}

impl Attachment {
    pub fn new(name: &str, mime_type: &str, data: &[u8]) -> Self {
        use base64::{engine::general_purpose::STANDARD, Engine};
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            mime_type: mime_type.to_string(),
            size: data.len() as u64,
            data: STANDARD.encode(data).into(),
            encrypted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: MessageRole,
    pub content: Protected,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "_encrypted", default, skip_serializing_if = "is_false")]
    pub encrypted: bool,
}

impl Message {
    pub fn new(conversation_id: &str, role: MessageRole, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            role,
            content: content.into(),
            attachments: Vec::new(),
            created_at: now(),
            encrypted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub title: Protected,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Protected>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "_encrypted", default, skip_serializing_if = "is_false")]
    pub encrypted: bool,
}

impl Conversation {
    pub fn new(title: &str) -> Self {
        let created_at = now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            summary: None,
            created_at,
            updated_at: created_at,
            encrypted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeItem {
    pub id: String,
    pub title: String,
    pub content: Protected,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "_encrypted", default, skip_serializing_if = "is_false")]
    pub encrypted: bool,
}

impl KnowledgeItem {
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            content: content.into(),
            tags: Vec::new(),
            created_at: now(),
            encrypted: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: String,
    pub content: Protected,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "_encrypted", default, skip_serializing_if = "is_false")]
    pub encrypted: bool,
}

impl Memory {
    pub fn new(content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            created_at: now(),
            encrypted: false,
        }
    }
}

sensitive_fields! {
    Message => ["content"] attachments ["attachments"];
    Conversation => ["title", "summary"];
    KnowledgeItem => ["content"];
    Memory => ["content"];
    Attachment => ["data", "name"];
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registries() {
        assert_eq!(<Message as SensitiveFields>::FIELDS, &["content"]);
        assert_eq!(<Message as SensitiveFields>::ATTACHMENTS, &["attachments"]);
        assert_eq!(<Conversation as SensitiveFields>::FIELDS, &["title", "summary"]);
        assert!(<Memory as SensitiveFields>::ATTACHMENTS.is_empty());
        assert_eq!(<Attachment as SensitiveFields>::FIELDS, &["data", "name"]);
    }

    #[test]
    fn test_marker_only_serialized_when_set() {
        let mut memory = Memory::new("remember this");
        let value = serde_json::to_value(&memory).unwrap();
        assert!(value.get(ENCRYPTED_MARKER).is_none());

        memory.encrypted = true;
        let value = serde_json::to_value(&memory).unwrap();
        assert_eq!(value[ENCRYPTED_MARKER], json!(true));
    }

    #[test]
    fn test_legacy_message_parses() {
        let value = json!({
            "id": "m1",
            "conversationId": "c1",
            "role": "user",
            "content": "hello from before encryption",
            "createdAt": 1700000000000i64
        });
        let message: Message = serde_json::from_value(value).unwrap();
        assert_eq!(message.content.as_plain(), Some("hello from before encryption"));
        assert!(!message.encrypted);
        assert!(message.attachments.is_empty());
    }
}
