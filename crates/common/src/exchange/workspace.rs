use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::keys::{derive_shared_secret, ExchangePublicKey, ExchangeSecretKey};
use super::ExchangeError;
use crate::crypto::{Exportable, Secret, SecretError};

/// The symmetric key shared by every device in a workspace
pub type WorkspaceKey = Secret<Exportable>;

/// A workspace key wrapped for a single recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedKey {
    /// base64 AES-GCM ciphertext of the raw key
    pub encrypted_key: String,
    /// base64 96-bit nonce
    pub iv: String,
}

impl WrappedKey {
    /// Open this wrapped key as its recipient
    pub fn open(
        &self,
        sender_public_key: &ExchangePublicKey,
        recipient_private_key: &ExchangeSecretKey,
    ) -> Result<WorkspaceKey, ExchangeError> {
        decrypt_key_from_sender(
            &self.encrypted_key,
            &self.iv,
            sender_public_key,
            recipient_private_key,
        )
    }
}

pub fn generate_workspace_key() -> Result<WorkspaceKey, ExchangeError> {
    let key = Secret::<Exportable>::generate()?;
    tracing::debug!("generated workspace key");
    Ok(key)
}

/// Wrap `workspace_key` under the pairwise secret between sender and recipient
pub fn encrypt_key_for_recipient(
    workspace_key: &WorkspaceKey,
    recipient_public_key: &ExchangePublicKey,
    sender_private_key: &ExchangeSecretKey,
) -> Result<WrappedKey, ExchangeError> {
    let shared = derive_shared_secret(sender_private_key, recipient_public_key);
    let raw = workspace_key.export_raw();
    let sealed = shared.encrypt(raw.as_ref())?;

    Ok(WrappedKey {
        encrypted_key: STANDARD.encode(&sealed.data),
        iv: STANDARD.encode(sealed.nonce),
    })
}

/// Recover a workspace key wrapped by [`encrypt_key_for_recipient`]
pub fn decrypt_key_from_sender(
    encrypted_key: &str,
    iv: &str,
    sender_public_key: &ExchangePublicKey,
    recipient_private_key: &ExchangeSecretKey,
) -> Result<WorkspaceKey, ExchangeError> {
    let data = STANDARD.decode(encrypted_key)?;
    let nonce = STANDARD.decode(iv)?;

    let shared = derive_shared_secret(recipient_private_key, sender_public_key);
    let raw = shared.decrypt(&data, &nonce).map_err(|e| match e {
        SecretError::Decrypt => ExchangeError::Unwrap,
        other => ExchangeError::Secret(other),
    })?;

    Ok(Secret::<Exportable>::import_raw(&raw)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::SECRET_SIZE;
    use crate::exchange::generate_key_exchange_key_pair;

    #[test]
    fn test_wrap_roundtrip() {
        let sender = generate_key_exchange_key_pair();
        let recipient = generate_key_exchange_key_pair();
        let workspace_key = generate_workspace_key().unwrap();

        let wrapped =
            encrypt_key_for_recipient(&workspace_key, &recipient.public_key, &sender.private_key)
                .unwrap();
        let unwrapped = wrapped
            .open(&sender.public_key, &recipient.private_key)
            .unwrap();

        assert_eq!(
            workspace_key.export_raw().as_ref(),
            unwrapped.export_raw().as_ref()
        );
    }

    #[test]
    fn test_wrapped_key_does_not_contain_raw_key() {
        let sender = generate_key_exchange_key_pair();
        let recipient = generate_key_exchange_key_pair();
        let workspace_key = generate_workspace_key().unwrap();

        let wrapped =
            encrypt_key_for_recipient(&workspace_key, &recipient.public_key, &sender.private_key)
                .unwrap();
        let ct = STANDARD.decode(&wrapped.encrypted_key).unwrap();
        assert_eq!(ct.len(), SECRET_SIZE + crate::crypto::TAG_SIZE);
        assert_ne!(&ct[..SECRET_SIZE], workspace_key.export_raw().as_ref());
    }

    #[test]
    fn test_wrong_recipient_fails() {
        let sender = generate_key_exchange_key_pair();
        let recipient = generate_key_exchange_key_pair();
        let eve = generate_key_exchange_key_pair();
        let workspace_key = generate_workspace_key().unwrap();

        let wrapped =
            encrypt_key_for_recipient(&workspace_key, &recipient.public_key, &sender.private_key)
                .unwrap();
        let result = wrapped.open(&sender.public_key, &eve.private_key);
        assert!(matches!(result, Err(ExchangeError::Unwrap)));
    }

    #[test]
    fn test_malformed_iv() {
        let sender = generate_key_exchange_key_pair();
        let recipient = generate_key_exchange_key_pair();
        let result = decrypt_key_from_sender(
            &STANDARD.encode([0u8; 48]),
            &STANDARD.encode([0u8; 4]),
            &sender.public_key,
            &recipient.private_key,
        );
        assert!(matches!(
            result,
            Err(ExchangeError::Secret(SecretError::InvalidNonce(4)))
        ));
    }
}
