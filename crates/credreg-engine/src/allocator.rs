//! # Index Allocator
//!
//! Hands out unique, never-reused indices from the ACTIVE registry of a
//! series.
//!
//! Each allocation reads the ACTIVE row and issues one conditional write
//! that bumps `writeCursor` and `version`. A lost race is retried with
//! jittered backoff. The write that consumes the last index also seals the
//! row, after which the allocator promotes the series' STANDBY successor so
//! the next caller lands on it.
//!
//! Past the standby threshold the allocator asks the lifecycle manager, on
//! a spawned task, to pre-create a STANDBY successor. Requests for the same
//! series are de-duplicated in process; the catalog's one-STANDBY rule
//! covers other processes.

use std::collections::HashSet;
use std::sync::Arc;

use credreg_core::{RegistryId, SeriesId};
use credreg_state::RegistryState;
use parking_lot::Mutex;
use serde::Serialize;

use crate::catalog::{resolve_ref, Reservation, RegistryCatalog};
use crate::config::EngineConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::lifecycle::LifecycleManager;
use crate::registry::{Registry, RegistryRef};
use crate::retry::{retry_cas, Attempt, RetryPolicy};

/// A reserved index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub registry_id: RegistryId,
    /// Resource URI of the registry that owns the index.
    pub uri: String,
    pub index: u64,
    /// Row version after the reservation.
    pub version: u64,
    /// Whether this call scheduled STANDBY pre-creation.
    pub standby_requested: bool,
}

/// Optimistic index allocator.
pub struct IndexAllocator {
    catalog: Arc<dyn RegistryCatalog>,
    lifecycle: Arc<LifecycleManager>,
    standby_threshold: f64,
    retry: RetryPolicy,
    pending: Arc<Mutex<HashSet<SeriesId>>>,
}

impl IndexAllocator {
    pub fn new(
        catalog: Arc<dyn RegistryCatalog>,
        lifecycle: Arc<LifecycleManager>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            catalog,
            lifecycle,
            standby_threshold: config.standby_threshold,
            retry: RetryPolicy::from_config(config),
            pending: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Reserve the next index in the series of `reference`.
    pub async fn allocate(&self, reference: &RegistryRef) -> RegistryResult<Allocation> {
        let series = resolve_ref(self.catalog.as_ref(), reference).await?.series_id;

        let (active, reservation) = retry_cas(&self.retry, "allocate", |_| async move {
            let Some(active) = self.active_in(series).await? else {
                // Either an interrupted seal was repaired here or a
                // concurrent fill promoted the successor since our read.
                if self.lifecycle.resume_promotion(series).await?.is_some()
                    || self.active_in(series).await?.is_some()
                {
                    return Ok(Attempt::Retry);
                }
                return Err(RegistryError::Full {
                    series,
                    detail: "every registry in the series is sealed".into(),
                });
            };
            if active.deprecated {
                return Err(RegistryError::invalid(
                    "statusListName",
                    format!("registry \"{}\" is deprecated", active.name),
                ));
            }
            if active.is_exhausted() {
                return Err(RegistryError::Full {
                    series,
                    detail: format!("registry {} has no free index", active.id),
                });
            }
            match self.catalog.reserve_index(active.id, active.version).await? {
                Some(reservation) => Ok(Attempt::Done((active, reservation))),
                None => Ok(Attempt::Retry),
            }
        })
        .await?;

        tracing::debug!(
            registry_id = %active.id,
            series_id = %series,
            index = reservation.index,
            version = reservation.version,
            "index allocated"
        );

        if reservation.filled() {
            self.after_fill(&active).await;
        }
        let standby_requested = !reservation.filled()
            && self.crossed_threshold(&active, &reservation)
            && self.request_standby(series);

        Ok(Allocation {
            registry_id: active.id,
            uri: active.uri,
            index: reservation.index,
            version: reservation.version,
            standby_requested,
        })
    }

    async fn active_in(&self, series: SeriesId) -> RegistryResult<Option<Registry>> {
        Ok(self
            .catalog
            .series(series)
            .await?
            .into_iter()
            .find(|r| r.state == RegistryState::Active))
    }

    /// Promote the successor of a registry this allocator just filled.
    ///
    /// The reservation is already committed; a failure here is repaired by
    /// the next allocation through `resume_promotion`.
    async fn after_fill(&self, filled: &Registry) {
        tracing::info!(
            registry_id = %filled.id,
            series_id = %filled.series_id,
            "registry reached capacity and was sealed"
        );
        let sealed = match self.catalog.get(filled.id).await {
            Ok(Some(row)) => row,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(registry_id = %filled.id, error = %e, "could not reload sealed registry");
                return;
            }
        };
        if let Err(e) = self.lifecycle.promote_successor(&sealed).await {
            tracing::warn!(
                registry_id = %sealed.id,
                error = %e,
                "promotion after fill failed; it will be resumed on the next allocation"
            );
        }
    }

    fn crossed_threshold(&self, registry: &Registry, reservation: &Reservation) -> bool {
        if self.standby_threshold >= 1.0 {
            return false;
        }
        let mark = (self.standby_threshold * registry.size as f64).ceil() as u64;
        reservation.write_cursor >= mark.max(1)
    }

    /// Spawn STANDBY pre-creation unless a request for `series` is in flight.
    fn request_standby(&self, series: SeriesId) -> bool {
        if !self.pending.lock().insert(series) {
            return false;
        }
        let lifecycle = Arc::clone(&self.lifecycle);
        let pending = Arc::clone(&self.pending);
        tokio::spawn(async move {
            if let Err(e) = lifecycle.ensure_standby(series).await {
                tracing::warn!(series_id = %series, error = %e, "standby pre-creation failed");
            }
            pending.lock().remove(&series);
        });
        true
    }
}
