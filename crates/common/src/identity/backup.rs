use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::user::{user_id_for, UserIdentity, UserIdentityWithKeys};
use super::IdentityError;
use crate::crypto::{
    derive_password_key, generate_salt, PublicKey, SecretError, SecretKey, NONCE_SIZE, SALT_SIZE,
};

/// Current version of the identity backup format
pub const IDENTITY_EXPORT_VERSION: u64 = 1;

/// The JSON document inside an identity backup
///
/// The private key is PKCS8 DER, AES-GCM encrypted under a PBKDF2 key derived
/// from the user's password and `salt`. The whole document is base64 encoded
/// before it leaves [`export_identity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedIdentity {
    pub version: u64,
    pub id: String,
    pub public_key: PublicKey,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub encrypted_private_key: String,
    pub iv: String,
    pub salt: String,
}

/// Encrypt an identity (private key included) under a password
///
/// # Returns
/// The base64 encoded backup document
pub async fn export_identity(
    identity: &UserIdentityWithKeys,
    password: &str,
) -> Result<String, IdentityError> {
    let salt = generate_salt()?;
    let key = derive_password_key(password, &salt).await?;

    let private_key = identity.secret_key().to_pkcs8_der()?;
    let sealed = key.encrypt(&private_key)?;

    let exported = ExportedIdentity {
        version: IDENTITY_EXPORT_VERSION,
        id: identity.id.clone(),
        public_key: identity.public_key.clone(),
        display_name: identity.display_name.clone(),
        created_at: identity.created_at,
        encrypted_private_key: STANDARD.encode(&sealed.data),
        iv: STANDARD.encode(sealed.nonce),
        salt: STANDARD.encode(salt),
    };

    let json = serde_json::to_vec(&exported).map_err(anyhow::Error::from)?;
    tracing::info!("exported identity {}", identity.id);
    Ok(STANDARD.encode(json))
}

/// Restore an identity from a backup produced by [`export_identity`]
///
/// A wrong password and a tampered backup both fail with
/// [`IdentityError::Decryption`]; nothing is returned partially.
pub async fn import_identity(
    exported: &str,
    password: &str,
) -> Result<UserIdentityWithKeys, IdentityError> {
    let json = STANDARD
        .decode(exported.trim())
        .map_err(|e| IdentityError::Malformed(format!("invalid base64: {}", e)))?;

    // Check the version before anything else so newer formats are reported
    //  as such rather than as malformed documents
    let value: Value = serde_json::from_slice(&json)
        .map_err(|e| IdentityError::Malformed(format!("invalid json: {}", e)))?;
    match value.get("version").and_then(Value::as_u64) {
        Some(IDENTITY_EXPORT_VERSION) => {}
        Some(version) => return Err(IdentityError::UnsupportedVersion(version)),
        None => return Err(IdentityError::Malformed("missing version".to_string())),
    }

    let exported: ExportedIdentity =
        serde_json::from_value(value).map_err(|e| IdentityError::Malformed(e.to_string()))?;

    let salt = decode_field("salt", &exported.salt, SALT_SIZE)?;
    let iv = decode_field("iv", &exported.iv, NONCE_SIZE)?;
    let encrypted = STANDARD
        .decode(&exported.encrypted_private_key)
        .map_err(|e| IdentityError::Malformed(format!("invalid encryptedPrivateKey: {}", e)))?;

    let key = derive_password_key(password, &salt).await?;
    let der = key.decrypt(&encrypted, &iv).map_err(|e| match e {
        SecretError::Decrypt => IdentityError::Decryption,
        other => IdentityError::Secret(other),
    })?;
    let secret_key = SecretKey::from_pkcs8_der(&der).map_err(|_| IdentityError::Decryption)?;

    if secret_key.public() != exported.public_key || user_id_for(&exported.public_key) != exported.id
    {
        return Err(IdentityError::Mismatch);
    }

    tracing::info!("imported identity {}", exported.id);

    Ok(UserIdentityWithKeys::from_parts(
        UserIdentity {
            id: exported.id,
            public_key: exported.public_key,
            display_name: exported.display_name,
            avatar: None,
            created_at: exported.created_at,
        },
        secret_key,
    ))
}

fn decode_field(name: &str, value: &str, len: usize) -> Result<Vec<u8>, IdentityError> {
    let bytes = STANDARD
        .decode(value)
        .map_err(|e| IdentityError::Malformed(format!("invalid {}: {}", name, e)))?;
    if bytes.len() != len {
        return Err(IdentityError::Malformed(format!(
            "{} must be {} bytes, got {}",
            name,
            len,
            bytes.len()
        )));
    }
    Ok(bytes)
}
