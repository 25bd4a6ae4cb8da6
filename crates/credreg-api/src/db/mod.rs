//! # Database Persistence Layer
//!
//! Postgres persistence for the registry catalog and the symmetric key
//! store via SQLx.
//!
//! The database layer is **optional**. When `DATABASE_URL` is set, the
//! engine's catalog and key store are backed by Postgres and every
//! allocation, seal and bulk update is a single conditional `UPDATE`. When
//! absent, the API runs on the in-memory catalog (development and tests).
//!
//! ## Uniqueness
//!
//! Partial unique indexes enforce at most one ACTIVE and at most one
//! STANDBY registry per series; a unique index on
//! `(issuer_did, name, list_type, purpose_key)` enforces name uniqueness
//! within a family. Violations surface as `Conflict`.

pub mod keys;
pub mod registries;

pub use keys::PgKeyStore;
pub use registries::PgCatalog;

use credreg_engine::RegistryError;
use sqlx::postgres::{PgPool, PgPoolOptions};

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set, running with the in-memory catalog. \
                 Registries will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Map a query failure onto the engine's error taxonomy.
///
/// Unique violations become `Conflict`; everything else is a storage
/// failure and is logged here.
pub(crate) fn query_error(operation: &'static str, err: sqlx::Error) -> RegistryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return RegistryError::Conflict(format!(
                "{operation} violates {}",
                db.constraint().unwrap_or("a uniqueness constraint")
            ));
        }
    }
    tracing::error!(operation, error = %err, "database query failed");
    RegistryError::Storage(format!("{operation} failed"))
}
