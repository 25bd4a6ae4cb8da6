//! Symmetric key storage for encrypted registries.
//!
//! Registries only carry a `symmetricKeyRef`; the key itself lives here.

use std::collections::HashMap;

use async_trait::async_trait;
use credreg_crypto::SymmetricKey;
use parking_lot::RwLock;

use crate::error::{RegistryError, RegistryResult};

/// Storage for content keys, addressed by reference.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Store `key` under `key_ref`. Existing references are never overwritten.
    async fn put(&self, key_ref: &str, key: &SymmetricKey) -> RegistryResult<()>;

    async fn get(&self, key_ref: &str) -> RegistryResult<Option<SymmetricKey>>;
}

/// In-memory key store.
#[derive(Default)]
pub struct MemoryKeyStore {
    keys: RwLock<HashMap<String, SymmetricKey>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryKeyStore")
            .field("keys", &self.keys.read().len())
            .finish()
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    async fn put(&self, key_ref: &str, key: &SymmetricKey) -> RegistryResult<()> {
        let mut keys = self.keys.write();
        if keys.contains_key(key_ref) {
            return Err(RegistryError::Conflict(format!(
                "key reference {key_ref} is already in use"
            )));
        }
        keys.insert(key_ref.to_string(), key.clone());
        Ok(())
    }

    async fn get(&self, key_ref: &str) -> RegistryResult<Option<SymmetricKey>> {
        Ok(self.keys.read().get(key_ref).cloned())
    }
}
