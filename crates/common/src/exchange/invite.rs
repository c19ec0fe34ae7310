use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keys::ExchangePublicKey;
use super::ExchangeError;
use crate::crypto::{signature_from_bytes, PublicKey};
use crate::identity::{user_id_for, UserIdentityWithKeys};

/// Domain separation for exchange key assertions
const ASSERTION_CONTEXT: &[u8] = b"tandem-exchange-key-v1";

/// An ECDH public key signed by a long-term user identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedExchangeKey {
    pub identity_id: String,
    pub identity_public_key: PublicKey,
    pub exchange_public_key: ExchangePublicKey,
    /// base64 raw (r || s) ECDSA signature
    pub signature: String,
}

fn assertion_message(identity_id: &str, exchange_public_key: &ExchangePublicKey) -> Vec<u8> {
    let spki = exchange_public_key.spki_der();
    let mut message =
        Vec::with_capacity(ASSERTION_CONTEXT.len() + identity_id.len() + spki.len() + 2);
    message.extend_from_slice(ASSERTION_CONTEXT);
    message.push(0);
    message.extend_from_slice(identity_id.as_bytes());
    message.push(0);
    message.extend_from_slice(spki);
    message
}

impl SignedExchangeKey {
    pub fn sign(identity: &UserIdentityWithKeys, exchange_public_key: &ExchangePublicKey) -> Self {
        let message = assertion_message(&identity.id, exchange_public_key);
        let signature = identity.sign(&message);
        Self {
            identity_id: identity.id.clone(),
            identity_public_key: identity.public_key.clone(),
            exchange_public_key: exchange_public_key.clone(),
            signature: STANDARD.encode(signature.to_bytes()),
        }
    }

    /// Check the assertion and return the exchange key it vouches for
    pub fn verify(&self) -> Result<&ExchangePublicKey, ExchangeError> {
        if user_id_for(&self.identity_public_key) != self.identity_id {
            return Err(ExchangeError::BadSignature);
        }
        let signature = signature_from_bytes(&STANDARD.decode(&self.signature)?)
            .map_err(|_| ExchangeError::BadSignature)?;
        let message = assertion_message(&self.identity_id, &self.exchange_public_key);
        self.identity_public_key
            .verify(&message, &signature)
            .map_err(|_| ExchangeError::BadSignature)?;
        Ok(&self.exchange_public_key)
    }
}

/// What a room code carries: a session id and the creator's exchange key
///
/// Room codes are the URL-safe base64 (unpadded) encoding of the JSON form,
///  so they can be pasted into chat or rendered as a QR code as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInvite {
    pub session_id: Uuid,
    pub public_key: ExchangePublicKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<SignedExchangeKey>,
}

impl RoomInvite {
    /// An anonymous invite for a fresh session
    pub fn new(public_key: ExchangePublicKey) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            public_key,
            assertion: None,
        }
    }

    /// An invite whose exchange key is vouched for by `identity`
    pub fn signed(identity: &UserIdentityWithKeys, public_key: ExchangePublicKey) -> Self {
        let assertion = SignedExchangeKey::sign(identity, &public_key);
        Self {
            session_id: Uuid::new_v4(),
            public_key,
            assertion: Some(assertion),
        }
    }

    pub fn encode(&self) -> Result<String, ExchangeError> {
        let json = serde_json::to_vec(self).map_err(anyhow::Error::from)?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    pub fn decode(code: &str) -> Result<Self, ExchangeError> {
        let json = URL_SAFE_NO_PAD
            .decode(code.trim().trim_end_matches('='))
            .map_err(|e| ExchangeError::InvalidInvite(e.to_string()))?;
        serde_json::from_slice(&json).map_err(|e| ExchangeError::InvalidInvite(e.to_string()))
    }

    /// Return the exchange key only if a valid identity assertion backs it
    ///
    /// # Arguments
    /// * `expected_identity` - pin the assertion to a known user id
    pub fn authenticated_key(
        &self,
        expected_identity: Option<&str>,
    ) -> Result<&ExchangePublicKey, ExchangeError> {
        let assertion = self.assertion.as_ref().ok_or(ExchangeError::Unauthenticated)?;
        let key = assertion.verify()?;
        if key != &self.public_key {
            return Err(ExchangeError::BadSignature);
        }
        if let Some(expected) = expected_identity {
            if expected != assertion.identity_id {
                return Err(ExchangeError::UnexpectedIdentity {
                    expected: expected.to_string(),
                    actual: assertion.identity_id.clone(),
                });
            }
        }
        Ok(&self.public_key)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::exchange::generate_key_exchange_key_pair;
    use crate::identity::generate_user_identity;

    #[test]
    fn test_assertion_verifies() {
        let identity = generate_user_identity(None);
        let pair = generate_key_exchange_key_pair();
        let signed = SignedExchangeKey::sign(&identity, &pair.public_key);
        assert_eq!(signed.verify().unwrap(), &pair.public_key);
    }

    #[test]
    fn test_substituted_key_is_rejected() {
        let identity = generate_user_identity(None);
        let pair = generate_key_exchange_key_pair();
        let mallory = generate_key_exchange_key_pair();

        let mut signed = SignedExchangeKey::sign(&identity, &pair.public_key);
        signed.exchange_public_key = mallory.public_key;
        assert!(matches!(signed.verify(), Err(ExchangeError::BadSignature)));
    }

    #[test]
    fn test_forged_identity_id_is_rejected() {
        let identity = generate_user_identity(None);
        let pair = generate_key_exchange_key_pair();
        let mut signed = SignedExchangeKey::sign(&identity, &pair.public_key);
        signed.identity_id = "0".repeat(32);
        assert!(matches!(signed.verify(), Err(ExchangeError::BadSignature)));
    }

    #[test]
    fn test_room_code_roundtrip() {
        let identity = generate_user_identity(None);
        let pair = generate_key_exchange_key_pair();
        let invite = RoomInvite::signed(&identity, pair.public_key.clone());

        let code = invite.encode().unwrap();
        assert!(code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let decoded = RoomInvite::decode(&code).unwrap();
        assert_eq!(decoded, invite);
        assert_eq!(
            decoded.authenticated_key(Some(&identity.id)).unwrap(),
            &pair.public_key
        );
    }

    #[test]
    fn test_anonymous_invite_is_unauthenticated() {
        let pair = generate_key_exchange_key_pair();
        let invite = RoomInvite::new(pair.public_key);
        let decoded = RoomInvite::decode(&invite.encode().unwrap()).unwrap();
        assert!(decoded.assertion.is_none());
        assert!(matches!(
            decoded.authenticated_key(None),
            Err(ExchangeError::Unauthenticated)
        ));
    }

    #[test]
    fn test_pinned_identity_mismatch() {
        let identity = generate_user_identity(None);
        let pair = generate_key_exchange_key_pair();
        let invite = RoomInvite::signed(&identity, pair.public_key);
        let result = invite.authenticated_key(Some("ffffffffffffffffffffffffffffffff"));
        assert!(matches!(
            result,
            Err(ExchangeError::UnexpectedIdentity { .. })
        ));
    }

    #[test]
    fn test_swapped_outer_key_is_rejected() {
        let identity = generate_user_identity(None);
        let pair = generate_key_exchange_key_pair();
        let mallory = generate_key_exchange_key_pair();
        let mut invite = RoomInvite::signed(&identity, pair.public_key);
        invite.public_key = mallory.public_key;
        assert!(matches!(
            invite.authenticated_key(None),
            Err(ExchangeError::BadSignature)
        ));
    }

    #[test]
    fn test_garbage_room_code() {
        assert!(matches!(
            RoomInvite::decode("not a room code!"),
            Err(ExchangeError::InvalidInvite(_))
        ));
    }
}
