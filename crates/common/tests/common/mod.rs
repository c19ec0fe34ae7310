//! Shared test utilities for the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use common::content::FieldCipher;
use common::storage::{LocalSecureStorage, LocalStorageError, SealedCredential, SecureStorage};

/// A password that passes the strength gate
pub const STRONG_PASSWORD: &str = "Tr0ub4dor&3xyz!";

/// Root key provider that counts every crypto call it serves
#[derive(Debug)]
pub struct CountingStorage {
    inner: LocalSecureStorage,
    encrypts: AtomicUsize,
    decrypts: AtomicUsize,
}

impl CountingStorage {
    pub async fn new() -> Self {
        let inner = LocalSecureStorage::device();
        inner.init().await.unwrap();
        Self {
            inner,
            encrypts: AtomicUsize::new(0),
            decrypts: AtomicUsize::new(0),
        }
    }

    pub fn encrypts(&self) -> usize {
        self.encrypts.load(Ordering::SeqCst)
    }

    pub fn decrypts(&self) -> usize {
        self.decrypts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecureStorage for CountingStorage {
    type Error = LocalStorageError;

    async fn init(&self) -> Result<(), Self::Error> {
        self.inner.init().await
    }

    async fn encrypt_credential(&self, plaintext: &str) -> Result<SealedCredential, Self::Error> {
        self.encrypts.fetch_add(1, Ordering::SeqCst);
        self.inner.encrypt_credential(plaintext).await
    }

    async fn decrypt_credential(
        &self,
        encrypted: &str,
        iv: &str,
        salt: &str,
    ) -> Result<String, Self::Error> {
        self.decrypts.fetch_add(1, Ordering::SeqCst);
        self.inner.decrypt_credential(encrypted, iv, salt).await
    }
}

/// A field cipher over a fresh, initialized counting provider
pub async fn counting_cipher() -> (FieldCipher<CountingStorage>, Arc<CountingStorage>) {
    let storage = Arc::new(CountingStorage::new().await);
    (FieldCipher::new(storage.clone()), storage)
}

/// A field cipher over a fresh device-mode provider
pub async fn local_cipher() -> FieldCipher<LocalSecureStorage> {
    let storage = LocalSecureStorage::device();
    storage.init().await.unwrap();
    FieldCipher::new(Arc::new(storage))
}
