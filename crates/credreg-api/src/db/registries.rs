//! Registry catalog persistence.
//!
//! All statements operate on the `status_registries` table. Mutations are
//! single conditional statements keyed on `version`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credreg_core::{
    CredentialCategory, Did, ListKind, ListType, PaymentCondition, RegistryId, SeriesId,
    StatusPurpose, StorageType,
};
use credreg_engine::{
    Registry, RegistryCatalog, RegistryError, RegistryFilter, RegistryResult, Reservation,
};
use credreg_state::{ChainPointers, RegistryState};
use sqlx::PgPool;
use uuid::Uuid;

use super::query_error;

const COLUMNS: &str = "id, series_id, ordinal, name, issuer_did, uri, kind, storage_type, \
     credential_category, size, write_cursor, state, version, previous_uri, next_uri, \
     encrypted, symmetric_key_ref, payment_conditions, content, created_at, updated_at, \
     sealed_at, deprecated";

/// Postgres-backed [`RegistryCatalog`].
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_registries(rows: Vec<RegistryRow>) -> RegistryResult<Vec<Registry>> {
    rows.into_iter().map(RegistryRow::into_registry).collect()
}

fn to_i64(field: &'static str, value: u64) -> RegistryResult<i64> {
    i64::try_from(value)
        .map_err(|_| RegistryError::Storage(format!("{field} {value} exceeds the column range")))
}

fn to_u64(field: &'static str, value: i64) -> RegistryResult<u64> {
    u64::try_from(value).map_err(|_| RegistryError::Storage(format!("stored {field} {value} is negative")))
}

fn to_json<T: serde::Serialize>(field: &'static str, value: &T) -> RegistryResult<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| RegistryError::Storage(format!("cannot serialize {field}: {e}")))
}

#[async_trait]
impl RegistryCatalog for PgCatalog {
    async fn insert(&self, registry: &Registry) -> RegistryResult<()> {
        sqlx::query(
            "INSERT INTO status_registries (id, series_id, ordinal, name, issuer_did, uri,
             list_type, purpose_key, kind, storage_type, credential_category, size,
             write_cursor, state, version, previous_uri, next_uri, encrypted,
             symmetric_key_ref, payment_conditions, content, created_at, updated_at,
             sealed_at, deprecated)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                     $16, $17, $18, $19, $20, $21, $22, $23, $24, $25)",
        )
        .bind(registry.id.as_uuid())
        .bind(registry.series_id.as_uuid())
        .bind(registry.ordinal as i32)
        .bind(&registry.name)
        .bind(registry.issuer_did.as_str())
        .bind(&registry.uri)
        .bind(registry.list_type().as_str())
        .bind(registry.purpose_key())
        .bind(to_json("kind", &registry.kind)?)
        .bind(registry.storage_type.as_str())
        .bind(registry.credential_category.as_str())
        .bind(to_i64("size", registry.size)?)
        .bind(to_i64("write_cursor", registry.write_cursor)?)
        .bind(registry.state.as_str())
        .bind(to_i64("version", registry.version)?)
        .bind(&registry.chain.previous_uri)
        .bind(&registry.chain.next_uri)
        .bind(registry.encrypted)
        .bind(&registry.symmetric_key_ref)
        .bind(to_json("payment_conditions", &registry.payment_conditions)?)
        .bind(&registry.content)
        .bind(registry.created_at)
        .bind(registry.updated_at)
        .bind(registry.sealed_at)
        .bind(registry.deprecated)
        .execute(&self.pool)
        .await
        .map_err(|e| query_error("registry insert", e))?;
        Ok(())
    }

    async fn get(&self, id: RegistryId) -> RegistryResult<Option<Registry>> {
        let row = sqlx::query_as::<_, RegistryRow>(&format!(
            "SELECT {COLUMNS} FROM status_registries WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("registry get", e))?;
        row.map(RegistryRow::into_registry).transpose()
    }

    async fn find_by_name(
        &self,
        did: &Did,
        name: &str,
        purpose: StatusPurpose,
        list_type: Option<ListType>,
    ) -> RegistryResult<Option<Registry>> {
        let rows = sqlx::query_as::<_, RegistryRow>(&format!(
            "SELECT {COLUMNS} FROM status_registries
             WHERE issuer_did = $1 AND name = $2 AND ($3::text IS NULL OR list_type = $3)
             ORDER BY created_at, ordinal"
        ))
        .bind(did.as_str())
        .bind(name)
        .bind(list_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("registry find", e))?;
        Ok(into_registries(rows)?
            .into_iter()
            .find(|r| r.kind.serves(purpose)))
    }

    async fn list(&self, filter: &RegistryFilter) -> RegistryResult<Vec<Registry>> {
        let rows = sqlx::query_as::<_, RegistryRow>(&format!(
            "SELECT {COLUMNS} FROM status_registries
             WHERE ($1::text IS NULL OR issuer_did = $1)
               AND ($2::text IS NULL OR state = $2)
               AND ($3::text IS NULL OR name = $3)
               AND ($4::text IS NULL OR list_type = $4)
               AND ($5::text IS NULL OR credential_category = $5)
               AND ($6::boolean IS NULL OR deprecated = $6)
             ORDER BY created_at, ordinal"
        ))
        .bind(filter.did.as_ref().map(|d| d.as_str()))
        .bind(filter.state.map(|s| s.as_str()))
        .bind(filter.name.as_deref())
        .bind(filter.list_type.map(|t| t.as_str()))
        .bind(filter.credential_category.map(|c| c.as_str()))
        .bind(filter.deprecated)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("registry list", e))?;
        // Purpose membership lives in the kind column.
        Ok(into_registries(rows)?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect())
    }

    async fn series(&self, series: SeriesId) -> RegistryResult<Vec<Registry>> {
        let rows = sqlx::query_as::<_, RegistryRow>(&format!(
            "SELECT {COLUMNS} FROM status_registries WHERE series_id = $1 ORDER BY ordinal"
        ))
        .bind(series.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("registry series", e))?;
        into_registries(rows)
    }

    async fn replace_if_version(
        &self,
        registry: &Registry,
        expected_version: u64,
    ) -> RegistryResult<bool> {
        if registry.version != expected_version + 1 {
            return Err(RegistryError::Storage(format!(
                "replacement of {} must carry version {}, got {}",
                registry.id,
                expected_version + 1,
                registry.version
            )));
        }
        let result = sqlx::query(
            "UPDATE status_registries SET
                 name = $1, write_cursor = $2, state = $3, version = $4,
                 previous_uri = $5, next_uri = $6, content = $7, updated_at = $8,
                 sealed_at = $9, deprecated = $10
             WHERE id = $11 AND version = $12",
        )
        .bind(&registry.name)
        .bind(to_i64("write_cursor", registry.write_cursor)?)
        .bind(registry.state.as_str())
        .bind(to_i64("version", registry.version)?)
        .bind(&registry.chain.previous_uri)
        .bind(&registry.chain.next_uri)
        .bind(&registry.content)
        .bind(registry.updated_at)
        .bind(registry.sealed_at)
        .bind(registry.deprecated)
        .bind(registry.id.as_uuid())
        .bind(to_i64("version", expected_version)?)
        .execute(&self.pool)
        .await
        .map_err(|e| query_error("registry update", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn reserve_index(
        &self,
        id: RegistryId,
        expected_version: u64,
    ) -> RegistryResult<Option<Reservation>> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, ReservationRow>(
            "UPDATE status_registries SET
                 write_cursor = write_cursor + 1,
                 version = version + 1,
                 updated_at = $3,
                 state = CASE WHEN write_cursor + 1 = size THEN 'FULL' ELSE state END,
                 sealed_at = CASE WHEN write_cursor + 1 = size THEN $3 ELSE sealed_at END
             WHERE id = $1 AND version = $2 AND state = 'ACTIVE' AND write_cursor < size
             RETURNING write_cursor, version, state, sealed_at",
        )
        .bind(id.as_uuid())
        .bind(to_i64("version", expected_version)?)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("index reservation", e))?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn ping(&self) -> RegistryResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| query_error("ping", e))?;
        Ok(())
    }
}

/// Internal row type for SQLx mapping.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RegistryRow {
    id: Uuid,
    series_id: Uuid,
    ordinal: i32,
    name: String,
    issuer_did: String,
    uri: String,
    kind: serde_json::Value,
    storage_type: String,
    credential_category: String,
    size: i64,
    write_cursor: i64,
    state: String,
    version: i64,
    previous_uri: Option<String>,
    next_uri: Option<String>,
    encrypted: bool,
    symmetric_key_ref: Option<String>,
    payment_conditions: serde_json::Value,
    content: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sealed_at: Option<DateTime<Utc>>,
    deprecated: bool,
}

impl RegistryRow {
    fn corrupt(&self, field: &str, detail: impl std::fmt::Display) -> RegistryError {
        tracing::error!(registry_id = %self.id, field, %detail, "unreadable registry row");
        RegistryError::Storage(format!("registry {} has an unreadable {field}", self.id))
    }

    pub(crate) fn into_registry(self) -> RegistryResult<Registry> {
        let issuer_did = Did::new(self.issuer_did.clone()).map_err(|e| self.corrupt("issuer_did", e))?;
        let kind: ListKind =
            serde_json::from_value(self.kind.clone()).map_err(|e| self.corrupt("kind", e))?;
        kind.validate().map_err(|e| self.corrupt("kind", e))?;
        let storage_type = StorageType::from_name(&self.storage_type)
            .ok_or_else(|| self.corrupt("storage_type", &self.storage_type))?;
        let credential_category = CredentialCategory::from_name(&self.credential_category)
            .ok_or_else(|| self.corrupt("credential_category", &self.credential_category))?;
        let state = RegistryState::from_name(&self.state)
            .ok_or_else(|| self.corrupt("state", &self.state))?;
        let payment_conditions: Vec<PaymentCondition> =
            serde_json::from_value(self.payment_conditions.clone())
                .map_err(|e| self.corrupt("payment_conditions", e))?;
        let ordinal = u32::try_from(self.ordinal).map_err(|e| self.corrupt("ordinal", e))?;

        Ok(Registry {
            id: RegistryId::from_uuid(self.id),
            series_id: SeriesId::from_uuid(self.series_id),
            ordinal,
            name: self.name,
            issuer_did,
            uri: self.uri,
            kind,
            storage_type,
            credential_category,
            size: to_u64("size", self.size)?,
            write_cursor: to_u64("write_cursor", self.write_cursor)?,
            state,
            version: to_u64("version", self.version)?,
            chain: ChainPointers {
                previous_uri: self.previous_uri,
                next_uri: self.next_uri,
            },
            encrypted: self.encrypted,
            symmetric_key_ref: self.symmetric_key_ref,
            payment_conditions,
            content: self.content,
            created_at: self.created_at,
            updated_at: self.updated_at,
            sealed_at: self.sealed_at,
            deprecated: self.deprecated,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    write_cursor: i64,
    version: i64,
    state: String,
    sealed_at: Option<DateTime<Utc>>,
}

impl ReservationRow {
    fn into_reservation(self) -> RegistryResult<Reservation> {
        let write_cursor = to_u64("write_cursor", self.write_cursor)?;
        let state = RegistryState::from_name(&self.state)
            .ok_or_else(|| RegistryError::Storage(format!("unknown registry state {}", self.state)))?;
        Ok(Reservation {
            index: write_cursor.saturating_sub(1),
            version: to_u64("version", self.version)?,
            write_cursor,
            state,
            sealed_at: self.sealed_at,
        })
    }
}
