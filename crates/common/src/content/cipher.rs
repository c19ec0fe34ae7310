use std::sync::Arc;

use futures::future::join_all;
use serde_json::{Map, Value};

use super::entities::{Attachment, SensitiveFields, ENCRYPTED_MARKER};
use super::field::{is_encrypted_field, EncryptedField, Protected};
use super::ContentError;
use crate::storage::SecureStorage;
use crate::store::SyncStore;

/// A decrypted value plus the number of fields that could not be decrypted
///
/// Undecryptable fields come back as empty strings. A non-zero `degraded`
///  count means data was lost from the caller's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted<T> {
    pub value: T,
    pub degraded: usize,
}

impl<T> Decrypted<T> {
    pub fn is_complete(&self) -> bool {
        self.degraded == 0
    }
}

/// Field-level encryption on top of a root key provider
#[derive(Debug)]
pub struct FieldCipher<S> {
    storage: Arc<S>,
}

impl<S> Clone for FieldCipher<S> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
        }
    }
}

impl<S: SecureStorage> FieldCipher<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Encrypt a single string
    ///
    /// Missing and empty input has nothing to protect and yields `None`.
    pub async fn encrypt_field(
        &self,
        plaintext: Option<&str>,
    ) -> Result<Option<EncryptedField>, ContentError> {
        let plaintext = match plaintext {
            Some(p) if !p.is_empty() => p,
            _ => return Ok(None),
        };
        let sealed = self
            .storage
            .encrypt_credential(plaintext)
            .await
            .map_err(|e| ContentError::Storage(e.to_string()))?;
        Ok(Some(EncryptedField {
            ct: sealed.encrypted,
            iv: sealed.iv,
        }))
    }

    /// Decrypt a single field
    pub async fn decrypt_field(&self, field: &EncryptedField) -> Result<String, ContentError> {
        self.storage
            .decrypt_credential(&field.ct, &field.iv, "")
            .await
            .map_err(|e| ContentError::Storage(e.to_string()))
    }

    /// Resolve a possibly encrypted value to its plaintext
    pub async fn reveal(&self, value: &Protected) -> Result<String, ContentError> {
        match value {
            Protected::Plain(s) => Ok(s.clone()),
            Protected::Encrypted(field) => self.decrypt_field(field).await,
        }
    }

    /// Encrypt the named string fields of `obj` concurrently and mark it
    ///
    /// Fields that are missing, empty, not strings or already encrypted are
    ///  left as they are. Either every field is encrypted or `obj` is left
    ///  untouched.
    pub async fn encrypt_fields(
        &self,
        obj: &mut Map<String, Value>,
        fields: &[&str],
    ) -> Result<(), ContentError> {
        let pending: Vec<(&str, &str)> = fields
            .iter()
            .filter_map(|name| match obj.get(*name) {
                Some(Value::String(s)) if !s.is_empty() => Some((*name, s.as_str())),
                _ => None,
            })
            .collect();

        let results = join_all(
            pending
                .iter()
                .map(|(_, plaintext)| self.encrypt_field(Some(*plaintext))),
        )
        .await;

        let mut encrypted = Vec::with_capacity(results.len());
        for ((name, _), result) in pending.iter().zip(results) {
            if let Some(field) = result? {
                encrypted.push((name.to_string(), field));
            }
        }

        for (name, field) in encrypted {
            obj.insert(name, serde_json::to_value(field)?);
        }
        obj.insert(ENCRYPTED_MARKER.to_string(), Value::Bool(true));
        Ok(())
    }

    /// Decrypt the named fields of `obj` concurrently and drop the marker
    ///
    /// Plain strings pass through, so records written before encryption
    ///  still read. A field that fails to decrypt becomes `""` and is counted
    ///  rather than failing the whole object.
    ///
    /// # Returns
    /// The number of degraded fields
    pub async fn decrypt_fields(&self, obj: &mut Map<String, Value>, fields: &[&str]) -> usize {
        let pending: Vec<(&str, EncryptedField)> = fields
            .iter()
            .filter_map(|name| {
                obj.get(*name)
                    .filter(|value| is_encrypted_field(value))
                    .and_then(|value| serde_json::from_value(value.clone()).ok())
                    .map(|field| (*name, field))
            })
            .collect();

        obj.remove(ENCRYPTED_MARKER);
        if pending.is_empty() {
            return 0;
        }

        let results = join_all(pending.iter().map(|(_, field)| self.decrypt_field(field))).await;

        let mut degraded = 0;
        for ((name, _), result) in pending.iter().zip(results) {
            let plaintext = match result {
                Ok(plaintext) => plaintext,
                Err(e) => {
                    tracing::warn!("failed to decrypt field '{}', degrading to empty: {}", name, e);
                    degraded += 1;
                    String::new()
                }
            };
            obj.insert(name.to_string(), Value::String(plaintext));
        }
        degraded
    }

    /// Encrypt each element of a string list, preserving order
    ///
    /// Empty strings stay plain.
    pub async fn encrypt_string_array(
        &self,
        items: &[String],
    ) -> Result<Vec<Protected>, ContentError> {
        let results =
            join_all(items.iter().map(|item| self.encrypt_field(Some(item.as_str())))).await;
        items
            .iter()
            .zip(results)
            .map(|(item, result)| {
                Ok(match result? {
                    Some(field) => Protected::Encrypted(field),
                    None => Protected::Plain(item.clone()),
                })
            })
            .collect()
    }

    /// Decrypt a list that may mix plain and encrypted elements
    pub async fn decrypt_string_array(&self, items: &[Protected]) -> Decrypted<Vec<String>> {
        let results = join_all(items.iter().map(|item| self.reveal(item))).await;
        let mut degraded = 0;
        let value: Vec<String> = results
            .into_iter()
            .map(|result| {
                result.unwrap_or_else(|e| {
                    tracing::warn!("failed to decrypt list element, degrading to empty: {}", e);
                    degraded += 1;
                    String::new()
                })
            })
            .collect();
        Decrypted { value, degraded }
    }

    /// Encrypt the registered fields of an entity, nested attachments included
    pub async fn encrypt_entity<T: SensitiveFields>(&self, entity: &T) -> Result<T, ContentError> {
        let mut obj = to_object(entity)?;
        self.encrypt_fields(&mut obj, T::FIELDS).await?;

        for key in T::ATTACHMENTS {
            if let Some(Value::Array(items)) = obj.get_mut(*key) {
                let results = join_all(items.iter_mut().filter_map(Value::as_object_mut).map(
                    |item| self.encrypt_fields(item, <Attachment as SensitiveFields>::FIELDS),
                ))
                .await;
                results.into_iter().collect::<Result<Vec<_>, _>>()?;
            }
        }

        Ok(serde_json::from_value(Value::Object(obj))?)
    }

    /// Decrypt the registered fields of an entity, nested attachments included
    pub async fn decrypt_entity<T: SensitiveFields>(
        &self,
        entity: &T,
    ) -> Result<Decrypted<T>, ContentError> {
        let obj = to_object(entity)?;
        self.decrypt_object::<T>(obj).await
    }

    async fn decrypt_object<T: SensitiveFields>(
        &self,
        mut obj: Map<String, Value>,
    ) -> Result<Decrypted<T>, ContentError> {
        let mut degraded = self.decrypt_fields(&mut obj, T::FIELDS).await;

        for key in T::ATTACHMENTS {
            if let Some(Value::Array(items)) = obj.get_mut(*key) {
                let counts = join_all(items.iter_mut().filter_map(Value::as_object_mut).map(
                    |item| self.decrypt_fields(item, <Attachment as SensitiveFields>::FIELDS),
                ))
                .await;
                degraded += counts.into_iter().sum::<usize>();
            }
        }

        Ok(Decrypted {
            value: serde_json::from_value(Value::Object(obj))?,
            degraded,
        })
    }

    pub async fn encrypt_attachments(
        &self,
        attachments: &[Attachment],
    ) -> Result<Vec<Attachment>, ContentError> {
        join_all(attachments.iter().map(|a| self.encrypt_entity(a)))
            .await
            .into_iter()
            .collect()
    }

    pub async fn decrypt_attachments(
        &self,
        attachments: &[Attachment],
    ) -> Result<Decrypted<Vec<Attachment>>, ContentError> {
        let results = join_all(attachments.iter().map(|a| self.decrypt_entity(a))).await;
        let mut value = Vec::with_capacity(results.len());
        let mut degraded = 0;
        for result in results {
            let decrypted = result?;
            degraded += decrypted.degraded;
            value.push(decrypted.value);
        }
        Ok(Decrypted { value, degraded })
    }

    /// Encrypt `entity` and write it to `store` under its id
    pub async fn put_entity<St, T>(&self, store: &St, entity: &T) -> Result<(), ContentError>
    where
        St: SyncStore,
        T: SensitiveFields,
    {
        let encrypted = self.encrypt_entity(entity).await?;
        let value = serde_json::to_value(&encrypted)?;
        store
            .set(entity.id(), value)
            .await
            .map_err(|e| ContentError::Store(e.to_string()))
    }

    /// Read an entity from `store` and decrypt it
    pub async fn get_entity<St, T>(
        &self,
        store: &St,
        id: &str,
    ) -> Result<Option<Decrypted<T>>, ContentError>
    where
        St: SyncStore,
        T: SensitiveFields,
    {
        let value = store
            .get(id)
            .await
            .map_err(|e| ContentError::Store(e.to_string()))?;
        match value {
            Some(Value::Object(obj)) => Ok(Some(self.decrypt_object::<T>(obj).await?)),
            Some(_) => Err(ContentError::NotAnObject),
            None => Ok(None),
        }
    }
}

fn to_object<T: serde::Serialize>(entity: &T) -> Result<Map<String, Value>, ContentError> {
    match serde_json::to_value(entity)? {
        Value::Object(obj) => Ok(obj),
        _ => Err(ContentError::NotAnObject),
    }
}
