//! Symmetric key persistence on the `registry_keys` table.

use async_trait::async_trait;
use credreg_crypto::SymmetricKey;
use credreg_engine::{KeyStore, RegistryError, RegistryResult};
use sqlx::PgPool;

use super::query_error;

/// Postgres-backed [`KeyStore`]. Rows are insert-only.
#[derive(Debug, Clone)]
pub struct PgKeyStore {
    pool: PgPool,
}

impl PgKeyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyStore for PgKeyStore {
    async fn put(&self, key_ref: &str, key: &SymmetricKey) -> RegistryResult<()> {
        let hex = key.to_hex();
        sqlx::query("INSERT INTO registry_keys (key_ref, key_hex) VALUES ($1, $2)")
            .bind(key_ref)
            .bind(hex.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("key insert", e))?;
        Ok(())
    }

    async fn get(&self, key_ref: &str) -> RegistryResult<Option<SymmetricKey>> {
        let hex: Option<String> =
            sqlx::query_scalar("SELECT key_hex FROM registry_keys WHERE key_ref = $1")
                .bind(key_ref)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| query_error("key get", e))?;

        hex.map(|hex| {
            let hex = zeroize::Zeroizing::new(hex);
            SymmetricKey::from_hex(&hex).map_err(|_| {
                tracing::error!(key_ref, "stored key is not valid hex");
                RegistryError::Storage(format!("key {key_ref} is unreadable"))
            })
        })
        .transpose()
    }
}
