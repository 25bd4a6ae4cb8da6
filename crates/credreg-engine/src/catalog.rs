//! # Registry Catalog
//!
//! Persisted metadata and content of every registry; the single source of
//! truth for capacity, write position and lifecycle state.
//!
//! ## Conditional writes
//!
//! Every mutation is one atomic conditional write keyed on the row's
//! `version`:
//!
//! - [`RegistryCatalog::reserve_index`] increments `write_cursor` and
//!   `version` only if the row still has the expected version, is ACTIVE and
//!   has free capacity. When the new cursor equals `size` the same write
//!   marks the row FULL and stamps `sealed_at`.
//! - [`RegistryCatalog::replace_if_version`] swaps the whole row only if the
//!   stored version equals the expected one.
//!
//! A write whose condition fails returns `false` / `None` rather than an
//! error; callers re-read and retry.
//!
//! ## Uniqueness
//!
//! Inserts and replacements are rejected with `Conflict` when they would
//! create a second ACTIVE or second STANDBY registry in a series, reuse a
//! series ordinal, or reuse a name within an issuer + list type + purpose
//! family.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credreg_core::{Did, ListType, RegistryId, SeriesId, StatusPurpose};
use credreg_state::RegistryState;
use parking_lot::RwLock;

use crate::error::{RegistryError, RegistryResult};
use crate::registry::{Registry, RegistryFilter, RegistryRef};
use crate::retry::bounded;

/// Result of a committed index reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// The index handed out.
    pub index: u64,
    /// Row version after the write.
    pub version: u64,
    /// Cursor after the write.
    pub write_cursor: u64,
    /// State after the write (FULL when this reservation filled the list).
    pub state: RegistryState,
    pub sealed_at: Option<DateTime<Utc>>,
}

impl Reservation {
    /// Whether this reservation consumed the last free index.
    pub fn filled(&self) -> bool {
        self.state == RegistryState::Full
    }
}

/// Storage backend for registries.
#[async_trait]
pub trait RegistryCatalog: Send + Sync {
    /// Insert a new row.
    async fn insert(&self, registry: &Registry) -> RegistryResult<()>;

    async fn get(&self, id: RegistryId) -> RegistryResult<Option<Registry>>;

    /// Find a registry by issuer, name and purpose, optionally narrowed by
    /// list type. The oldest match wins.
    async fn find_by_name(
        &self,
        did: &Did,
        name: &str,
        purpose: StatusPurpose,
        list_type: Option<ListType>,
    ) -> RegistryResult<Option<Registry>>;

    /// All rows matching `filter`, oldest first.
    async fn list(&self, filter: &RegistryFilter) -> RegistryResult<Vec<Registry>>;

    /// All rows of a series, ordered by ordinal.
    async fn series(&self, series: SeriesId) -> RegistryResult<Vec<Registry>>;

    /// Replace the row with `registry` if its stored version is
    /// `expected_version`. `registry.version` must be `expected_version + 1`.
    async fn replace_if_version(
        &self,
        registry: &Registry,
        expected_version: u64,
    ) -> RegistryResult<bool>;

    /// Reserve the next index of an ACTIVE registry at `expected_version`.
    async fn reserve_index(
        &self,
        id: RegistryId,
        expected_version: u64,
    ) -> RegistryResult<Option<Reservation>>;

    /// Check the backend is reachable.
    async fn ping(&self) -> RegistryResult<()> {
        Ok(())
    }
}

/// Resolve a caller's reference to a stored registry.
///
/// A series reference resolves to the series' ACTIVE registry, or to its
/// newest member when none is ACTIVE.
pub async fn resolve_ref(
    catalog: &dyn RegistryCatalog,
    reference: &RegistryRef,
) -> RegistryResult<Registry> {
    let found = match reference {
        RegistryRef::Id(id) => catalog.get(*id).await?,
        RegistryRef::Name {
            did,
            name,
            purpose,
            list_type,
        } => catalog.find_by_name(did, name, *purpose, *list_type).await?,
        RegistryRef::Series(series) => {
            let members = catalog.series(*series).await?;
            match members.iter().position(|r| r.state == RegistryState::Active) {
                Some(i) => members.into_iter().nth(i),
                None => members.into_iter().last(),
            }
        }
    };
    found.ok_or_else(|| RegistryError::NotFound(reference.to_string()))
}

// -- In-memory catalog ---------------------------------------------------------

/// Thread-safe in-memory catalog.
///
/// Each conditional write runs under a single `parking_lot` write lock, so
/// the check and the mutation are one atomic step. The lock is never held
/// across an `.await`.
#[derive(Debug, Default, Clone)]
pub struct MemoryCatalog {
    rows: Arc<RwLock<HashMap<RegistryId, Registry>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored registries.
    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn check_unique(
    rows: &HashMap<RegistryId, Registry>,
    candidate: &Registry,
) -> RegistryResult<()> {
    for other in rows.values().filter(|r| r.id != candidate.id) {
        if other.same_family(candidate) {
            return Err(RegistryError::Conflict(format!(
                "a {} registry named \"{}\" already exists for {}",
                candidate.list_type(),
                candidate.name,
                candidate.issuer_did
            )));
        }
        if other.series_id != candidate.series_id {
            continue;
        }
        if other.ordinal == candidate.ordinal {
            return Err(RegistryError::Conflict(format!(
                "series {} already has a registry at position {}",
                candidate.series_id, candidate.ordinal
            )));
        }
        if candidate.state != RegistryState::Full && other.state == candidate.state {
            return Err(RegistryError::Conflict(format!(
                "series {} already has a {} registry",
                candidate.series_id, candidate.state
            )));
        }
    }
    Ok(())
}

fn sorted(mut rows: Vec<Registry>) -> Vec<Registry> {
    rows.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then(a.ordinal.cmp(&b.ordinal))
    });
    rows
}

#[async_trait]
impl RegistryCatalog for MemoryCatalog {
    async fn insert(&self, registry: &Registry) -> RegistryResult<()> {
        let mut rows = self.rows.write();
        if rows.contains_key(&registry.id) {
            return Err(RegistryError::Conflict(format!(
                "registry {} already exists",
                registry.id
            )));
        }
        check_unique(&rows, registry)?;
        rows.insert(registry.id, registry.clone());
        Ok(())
    }

    async fn get(&self, id: RegistryId) -> RegistryResult<Option<Registry>> {
        Ok(self.rows.read().get(&id).cloned())
    }

    async fn find_by_name(
        &self,
        did: &Did,
        name: &str,
        purpose: StatusPurpose,
        list_type: Option<ListType>,
    ) -> RegistryResult<Option<Registry>> {
        let filter = RegistryFilter {
            did: Some(did.clone()),
            name: Some(name.to_string()),
            purpose: Some(purpose),
            list_type,
            ..RegistryFilter::default()
        };
        Ok(self.list(&filter).await?.into_iter().next())
    }

    async fn list(&self, filter: &RegistryFilter) -> RegistryResult<Vec<Registry>> {
        let rows = self
            .rows
            .read()
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        Ok(sorted(rows))
    }

    async fn series(&self, series: SeriesId) -> RegistryResult<Vec<Registry>> {
        let mut rows: Vec<Registry> = self
            .rows
            .read()
            .values()
            .filter(|r| r.series_id == series)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.ordinal);
        Ok(rows)
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
        let mut rows = self.rows.write();
        match rows.get(&registry.id) {
            Some(current) if current.version == expected_version => {}
            _ => return Ok(false),
        }
        check_unique(&rows, registry)?;
        rows.insert(registry.id, registry.clone());
        Ok(true)
    }

    async fn reserve_index(
        &self,
        id: RegistryId,
        expected_version: u64,
    ) -> RegistryResult<Option<Reservation>> {
        let mut rows = self.rows.write();
        let Some(row) = rows.get_mut(&id) else {
            return Ok(None);
        };
        if row.version != expected_version
            || row.state != RegistryState::Active
            || row.write_cursor >= row.size
        {
            return Ok(None);
        }
        let now = Utc::now();
        let index = row.write_cursor;
        row.write_cursor += 1;
        row.version += 1;
        row.updated_at = now;
        if row.write_cursor == row.size {
            row.state = RegistryState::Full;
            row.sealed_at = Some(now);
        }
        Ok(Some(Reservation {
            index,
            version: row.version,
            write_cursor: row.write_cursor,
            state: row.state,
            sealed_at: row.sealed_at,
        }))
    }
}

// -- Time-bounded wrapper ------------------------------------------------------

/// Catalog decorator that bounds every call by a timeout.
pub struct TimedCatalog {
    inner: Arc<dyn RegistryCatalog>,
    limit: Duration,
}

impl TimedCatalog {
    pub fn new(inner: Arc<dyn RegistryCatalog>, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

#[async_trait]
impl RegistryCatalog for TimedCatalog {
    async fn insert(&self, registry: &Registry) -> RegistryResult<()> {
        bounded("catalog insert", self.limit, self.inner.insert(registry)).await
    }

    async fn get(&self, id: RegistryId) -> RegistryResult<Option<Registry>> {
        bounded("catalog get", self.limit, self.inner.get(id)).await
    }

    async fn find_by_name(
        &self,
        did: &Did,
        name: &str,
        purpose: StatusPurpose,
        list_type: Option<ListType>,
    ) -> RegistryResult<Option<Registry>> {
        bounded(
            "catalog find",
            self.limit,
            self.inner.find_by_name(did, name, purpose, list_type),
        )
        .await
    }

    async fn list(&self, filter: &RegistryFilter) -> RegistryResult<Vec<Registry>> {
        bounded("catalog list", self.limit, self.inner.list(filter)).await
    }

    async fn series(&self, series: SeriesId) -> RegistryResult<Vec<Registry>> {
        bounded("catalog series", self.limit, self.inner.series(series)).await
    }

    async fn replace_if_version(
        &self,
        registry: &Registry,
        expected_version: u64,
    ) -> RegistryResult<bool> {
        bounded(
            "catalog update",
            self.limit,
            self.inner.replace_if_version(registry, expected_version),
        )
        .await
    }

    async fn reserve_index(
        &self,
        id: RegistryId,
        expected_version: u64,
    ) -> RegistryResult<Option<Reservation>> {
        bounded(
            "catalog reserve",
            self.limit,
            self.inner.reserve_index(id, expected_version),
        )
        .await
    }

    async fn ping(&self) -> RegistryResult<()> {
        bounded("catalog ping", self.limit, self.inner.ping()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::fixtures::registry;

    #[tokio::test]
    async fn reserve_increments_cursor_and_version() {
        let catalog = MemoryCatalog::new();
        let r = registry("list", 3);
        catalog.insert(&r).await.unwrap();

        let res = catalog.reserve_index(r.id, 0).await.unwrap().unwrap();
        assert_eq!(res.index, 0);
        assert_eq!(res.version, 1);
        assert!(!res.filled());

        // Stale version loses.
        assert!(catalog.reserve_index(r.id, 0).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn last_reservation_seals_row() {
        let catalog = MemoryCatalog::new();
        let r = registry("list", 2);
        catalog.insert(&r).await.unwrap();
        catalog.reserve_index(r.id, 0).await.unwrap().unwrap();
        let last = catalog.reserve_index(r.id, 1).await.unwrap().unwrap();
        assert_eq!(last.index, 1);
        assert!(last.filled());
        assert!(last.sealed_at.is_some());

        let stored = catalog.get(r.id).await.unwrap().unwrap();
        assert_eq!(stored.state, RegistryState::Full);
        assert_eq!(stored.write_cursor, 2);
        assert!(stored.invariants_hold());
        assert!(catalog.reserve_index(r.id, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_is_conditional_on_version() {
        let catalog = MemoryCatalog::new();
        let r = registry("list", 8);
        catalog.insert(&r).await.unwrap();

        let mut next = r.next_version();
        next.deprecated = true;
        assert!(catalog.replace_if_version(&next, 0).await.unwrap());

        let mut stale = r.next_version();
        stale.content = Some("u".into());
        assert!(!catalog.replace_if_version(&stale, 0).await.unwrap());
        assert!(catalog.get(r.id).await.unwrap().unwrap().deprecated);
    }

    #[tokio::test]
    async fn second_active_in_series_rejected() {
        let catalog = MemoryCatalog::new();
        let a = registry("a", 8);
        catalog.insert(&a).await.unwrap();

        let mut b = registry("b", 8);
        b.series_id = a.series_id;
        b.ordinal = 1;
        assert!(matches!(
            catalog.insert(&b).await,
            Err(RegistryError::Conflict(_))
        ));

        b.state = RegistryState::Standby;
        catalog.insert(&b).await.unwrap();

        let mut c = registry("c", 8);
        c.series_id = a.series_id;
        c.ordinal = 2;
        c.state = RegistryState::Standby;
        assert!(matches!(
            catalog.insert(&c).await,
            Err(RegistryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_name_in_family_rejected() {
        let catalog = MemoryCatalog::new();
        catalog.insert(&registry("employees", 8)).await.unwrap();
        assert!(matches!(
            catalog.insert(&registry("employees", 8)).await,
            Err(RegistryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn find_by_name_filters_purpose() {
        let catalog = MemoryCatalog::new();
        let r = registry("employees", 8);
        catalog.insert(&r).await.unwrap();
        let found = catalog
            .find_by_name(&r.issuer_did, "employees", StatusPurpose::Revocation, None)
            .await
            .unwrap();
        assert_eq!(found.map(|f| f.id), Some(r.id));
        let missing = catalog
            .find_by_name(&r.issuer_did, "employees", StatusPurpose::Suspension, None)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    struct StallingCatalog;

    #[async_trait]
    impl RegistryCatalog for StallingCatalog {
        async fn insert(&self, _: &Registry) -> RegistryResult<()> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
        async fn get(&self, _: RegistryId) -> RegistryResult<Option<Registry>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }
        async fn find_by_name(
            &self,
            _: &Did,
            _: &str,
            _: StatusPurpose,
            _: Option<ListType>,
        ) -> RegistryResult<Option<Registry>> {
            Ok(None)
        }
        async fn list(&self, _: &RegistryFilter) -> RegistryResult<Vec<Registry>> {
            Ok(vec![])
        }
        async fn series(&self, _: SeriesId) -> RegistryResult<Vec<Registry>> {
            Ok(vec![])
        }
        async fn replace_if_version(&self, _: &Registry, _: u64) -> RegistryResult<bool> {
            Ok(false)
        }
        async fn reserve_index(&self, _: RegistryId, _: u64) -> RegistryResult<Option<Reservation>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn timed_catalog_surfaces_timeout() {
        let timed = TimedCatalog::new(Arc::new(StallingCatalog), Duration::from_millis(20));
        let err = timed.get(RegistryId::new()).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Timeout);
    }
}
