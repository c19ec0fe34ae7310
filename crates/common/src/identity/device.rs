use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{PublicKey, SecretKey, Signature};

/// Length of a device id in hex characters
pub const DEVICE_ID_LENGTH: usize = 16;

/// A device registered to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_seen: DateTime<Utc>,
    pub public_key: PublicKey,
}

/// A device identity together with its own private key
#[derive(Debug, Clone)]
pub struct DeviceIdentityWithKeys {
    device: DeviceIdentity,
    secret_key: SecretKey,
}

impl Deref for DeviceIdentityWithKeys {
    type Target = DeviceIdentity;
    fn deref(&self) -> &Self::Target {
        &self.device
    }
}

impl DeviceIdentityWithKeys {
    pub fn device(&self) -> &DeviceIdentity {
        &self.device
    }

    pub fn sign(&self, data: &[u8]) -> Signature {
        self.secret_key.sign(data)
    }

    /// Refresh `last_seen` in place
    pub fn touch(&mut self) {
        self.device = update_device_last_seen(&self.device);
    }
}

/// Generate a new device keypair for `user_id`
///
/// The device key is unrelated to the user's identity key. When no name is
///  given one is derived from the platform.
pub fn generate_device_identity(
    user_id: &str,
    device_name: Option<String>,
) -> DeviceIdentityWithKeys {
    let secret_key = SecretKey::generate();
    let public_key = secret_key.public();
    let id = public_key.fingerprint(DEVICE_ID_LENGTH);
    let name = device_name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(detect_device_name);

    tracing::info!("generated device {} ({}) for user {}", id, name, user_id);

    DeviceIdentityWithKeys {
        device: DeviceIdentity {
            id,
            user_id: user_id.to_string(),
            name,
            last_seen: crate::now(),
            public_key,
        },
        secret_key,
    }
}

/// Return a copy of `device` with `last_seen` set to now
pub fn update_device_last_seen(device: &DeviceIdentity) -> DeviceIdentity {
    DeviceIdentity {
        last_seen: crate::now(),
        ..device.clone()
    }
}

/// Human readable name for the current machine, e.g. `Mac (aarch64)`
pub fn detect_device_name() -> String {
    let platform = match std::env::consts::OS {
        "macos" => "Mac",
        "ios" => "iPhone",
        "android" => "Android Device",
        "windows" => "Windows PC",
        "linux" => "Linux Desktop",
        "freebsd" | "openbsd" | "netbsd" | "dragonfly" => "BSD Machine",
        _ => "Unknown Device",
    };

    let host = ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|host| host.trim().to_string())
        .find(|host| !host.is_empty());

    match host {
        Some(host) => format!("{} ({})", platform, host),
        None => format!("{} ({})", platform, std::env::consts::ARCH),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::identity::generate_user_identity;

    #[test]
    fn test_device_id_shape() {
        let user = generate_user_identity(None);
        let device = generate_device_identity(&user.id, Some("Laptop".to_string()));

        assert_eq!(device.id.len(), DEVICE_ID_LENGTH);
        assert!(device.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(device.user_id, user.id);
        assert_eq!(device.name, "Laptop");
    }

    #[test]
    fn test_device_key_is_independent_of_user_key() {
        let user = generate_user_identity(None);
        let a = generate_device_identity(&user.id, None);
        let b = generate_device_identity(&user.id, None);

        assert_ne!(a.public_key, user.public_key);
        assert_ne!(a.public_key, b.public_key);
        assert_ne!(a.id, b.id);
        assert!(!user.id.starts_with(&a.id));
    }

    #[test]
    fn test_auto_detected_name() {
        let device = generate_device_identity("user", None);
        assert!(!device.name.is_empty());

        let blank = generate_device_identity("user", Some("   ".to_string()));
        assert_eq!(blank.name, detect_device_name());
    }

    #[test]
    fn test_update_last_seen_is_pure() {
        let mut device = generate_device_identity("user", Some("Phone".to_string()));
        let before = device.device().clone();

        std::thread::sleep(std::time::Duration::from_millis(5));
        let updated = update_device_last_seen(&before);

        assert!(updated.last_seen > before.last_seen);
        assert_eq!(updated.id, before.id);
        assert_eq!(updated.public_key, before.public_key);
        assert_eq!(device.last_seen, before.last_seen);

        device.touch();
        assert!(device.last_seen > before.last_seen);
    }

    #[test]
    fn test_device_signatures() {
        let device = generate_device_identity("user", None);
        let signature = device.sign(b"heartbeat");
        assert!(device.public_key.verify(b"heartbeat", &signature).is_ok());
    }

    #[test]
    fn test_serialized_shape() {
        let device = generate_device_identity("user", Some("Tablet".to_string()));
        let json = serde_json::to_value(device.device()).unwrap();
        assert_eq!(json["userId"], "user");
        assert_eq!(json["name"], "Tablet");
        assert!(json["lastSeen"].is_i64());
        assert_eq!(json["publicKey"], device.public_key.to_base64());
    }

    #[test]
    fn test_device_json_roundtrip() {
        let device = generate_device_identity("user", Some("Tablet".to_string()));
        let json = serde_json::to_string(device.device()).unwrap();
        let recovered: DeviceIdentity = serde_json::from_str(&json).unwrap();
        assert_eq!(&recovered, device.device());

        let touched = update_device_last_seen(device.device());
        let json = serde_json::to_string(&touched).unwrap();
        assert_eq!(serde_json::from_str::<DeviceIdentity>(&json).unwrap(), touched);
    }
}
