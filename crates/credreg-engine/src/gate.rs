//! # Encryption / Payment Gate
//!
//! Content of an encrypted registry is stored and published as an
//! AES-256-GCM envelope. The gate owns the key store: it provisions a key
//! when the registry is created, opens and re-seals content for the
//! engine's own read-modify-write path, and releases a key to an outside
//! caller only after a qualifying payment is matched locally and confirmed
//! by the payment verifier.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use credreg_core::{PaymentCondition, PaymentEvidence};
use credreg_crypto::SymmetricKey;
use uuid::Uuid;

use crate::collaborators::PaymentVerifier;
use crate::error::{RegistryError, RegistryResult};
use crate::keystore::KeyStore;
use crate::registry::Registry;
use crate::retry::bounded;

/// A released decryption key and the payment that unlocked it.
#[derive(Debug, Clone)]
pub struct DecryptionGrant {
    pub key: SymmetricKey,
    pub condition: PaymentCondition,
    pub tx_hash: String,
}

/// Gate in front of encrypted registry content.
pub struct PaymentGate {
    keys: Arc<dyn KeyStore>,
    verifier: Arc<dyn PaymentVerifier>,
    timeout: Duration,
}

impl PaymentGate {
    pub fn new(
        keys: Arc<dyn KeyStore>,
        verifier: Arc<dyn PaymentVerifier>,
        timeout: Duration,
    ) -> Self {
        Self {
            keys,
            verifier,
            timeout,
        }
    }

    /// True whenever the registry is encrypted.
    pub fn is_payment_needed(&self, registry: &Registry) -> bool {
        registry.encrypted
    }

    /// Generate and store a fresh key, returning its reference.
    pub async fn provision(&self) -> RegistryResult<(String, SymmetricKey)> {
        let key_ref = format!("key-{}", Uuid::new_v4());
        let key = SymmetricKey::generate();
        self.keys.put(&key_ref, &key).await?;
        Ok((key_ref, key))
    }

    async fn key_for(&self, registry: &Registry) -> RegistryResult<SymmetricKey> {
        let key_ref = registry.symmetric_key_ref.as_deref().ok_or_else(|| {
            RegistryError::Storage(format!("encrypted registry {} has no key reference", registry.id))
        })?;
        self.keys.get(key_ref).await?.ok_or_else(|| {
            RegistryError::Storage(format!(
                "key {key_ref} for registry {} is missing from the key store",
                registry.id
            ))
        })
    }

    /// Encrypt encoded content for storage. Plaintext registries pass through.
    pub async fn seal_content(&self, registry: &Registry, encoded: &str) -> RegistryResult<String> {
        if !registry.encrypted {
            return Ok(encoded.to_string());
        }
        let key = self.key_for(registry).await?;
        Ok(credreg_crypto::seal_str(&key, encoded)?)
    }

    /// Decrypt stored content. Plaintext registries pass through.
    pub async fn open_content(&self, registry: &Registry, stored: &str) -> RegistryResult<String> {
        if !registry.encrypted {
            return Ok(stored.to_string());
        }
        let key = self.key_for(registry).await?;
        Ok(credreg_crypto::open_str(&key, stored)?)
    }

    /// Release the registry's key if `evidence` satisfies one of its
    /// payment conditions.
    pub async fn authorize_decrypt(
        &self,
        registry: &Registry,
        evidence: Option<&PaymentEvidence>,
    ) -> RegistryResult<DecryptionGrant> {
        let evidence = evidence.ok_or_else(|| {
            RegistryError::Unauthorized(format!(
                "registry \"{}\" is encrypted; payment evidence is required",
                registry.name
            ))
        })?;

        let now = Utc::now();
        let condition = registry
            .payment_conditions
            .iter()
            .find(|c| c.is_met_by(evidence, now))
            .ok_or_else(|| {
                tracing::warn!(
                    registry_id = %registry.id,
                    tx_hash = %evidence.tx_hash,
                    "payment evidence matches no condition"
                );
                RegistryError::Unauthorized(
                    "payment does not match any condition of this registry".into(),
                )
            })?;

        let confirmed = bounded("payment verification", self.timeout, async {
            self.verifier
                .verify(condition, evidence)
                .await
                .map_err(|e| RegistryError::collaborator("payment verifier", e))
        })
        .await?;
        if !confirmed {
            tracing::warn!(
                registry_id = %registry.id,
                tx_hash = %evidence.tx_hash,
                "payment verifier rejected evidence"
            );
            return Err(RegistryError::Unauthorized(
                "payment could not be verified".into(),
            ));
        }

        Ok(DecryptionGrant {
            key: self.key_for(registry).await?,
            condition: condition.clone(),
            tx_hash: evidence.tx_hash.clone(),
        })
    }
}
