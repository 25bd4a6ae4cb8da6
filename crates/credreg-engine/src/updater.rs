//! # Bulk Status Updater
//!
//! Applies one status change to a batch of indices as a single conditional
//! write: either every index in the batch changes or none does. A batch
//! that changes nothing is a successful no-op and leaves `version` alone.
//!
//! Publishing happens after the local commit. A failed publish is reported
//! in the outcome and never rolls the commit back.

use std::sync::Arc;

use credreg_core::{RegistryId, StatusChange};
use serde::Serialize;

use crate::catalog::{resolve_ref, RegistryCatalog};
use crate::collaborators::{Collaborators, ResourceMetadata};
use crate::config::EngineConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::gate::PaymentGate;
use crate::registry::{Registry, RegistryRef};
use crate::retry::{retry_cas, Attempt, RetryPolicy};

/// A batch status change.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub registry: RegistryRef,
    pub indices: Vec<u64>,
    pub change: StatusChange,
    /// Publish the new content after committing.
    pub publish: bool,
    /// When set, reject registries whose encryption flag differs.
    pub expect_encrypted: Option<bool>,
}

/// What happened at one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexChange {
    pub index: u64,
    pub previous: u32,
    pub current: u32,
    pub changed: bool,
}

/// Result of [`BulkUpdater::apply`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub registry_id: RegistryId,
    pub updated: bool,
    pub changes: Vec<IndexChange>,
    /// Row version after the call; unchanged for a no-op batch.
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_metadata: Option<ResourceMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_error: Option<String>,
}

impl UpdateOutcome {
    /// Indices whose code actually changed.
    pub fn changed_indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.changes.iter().filter(|c| c.changed).map(|c| c.index)
    }
}

/// Batch status writer.
pub struct BulkUpdater {
    catalog: Arc<dyn RegistryCatalog>,
    gate: Arc<PaymentGate>,
    collaborators: Collaborators,
    retry: RetryPolicy,
}

impl BulkUpdater {
    pub fn new(
        catalog: Arc<dyn RegistryCatalog>,
        gate: Arc<PaymentGate>,
        collaborators: Collaborators,
        config: &EngineConfig,
    ) -> Self {
        Self {
            catalog,
            gate,
            collaborators,
            retry: RetryPolicy::from_config(config),
        }
    }

    /// Apply `request.change` to every index in the batch.
    pub async fn apply(&self, request: UpdateRequest) -> RegistryResult<UpdateOutcome> {
        if request.indices.is_empty() {
            return Err(RegistryError::invalid(
                "indices",
                "at least one index is required",
            ));
        }
        let target = resolve_ref(self.catalog.as_ref(), &request.registry).await?;
        if let Some(expected) = request.expect_encrypted {
            if expected != target.encrypted {
                let reason = if target.encrypted {
                    "registry is encrypted; use the encrypted update operation"
                } else {
                    "registry is not encrypted"
                };
                return Err(RegistryError::invalid("encrypted", reason));
            }
        }
        let code = target.kind.resolve_change(request.change)?;

        let mut indices = request.indices;
        indices.sort_unstable();
        indices.dedup();
        if let Some(&index) = indices.iter().find(|&&i| i >= target.size) {
            return Err(RegistryError::InvalidIndex {
                index,
                size: target.size,
            });
        }

        self.collaborators
            .ensure_issuer_active(&target.issuer_did)
            .await?;

        let id = target.id;
        let indices = indices.as_slice();
        let (row, changes, stored) = retry_cas(&self.retry, "status update", |attempt| async move {
            let row = self
                .catalog
                .get(id)
                .await?
                .ok_or_else(|| RegistryError::NotFound(format!("registry {id}")))?;
            let stored = self.collaborators.stored_content(&row).await?;
            let encoded = self.gate.open_content(&row, &stored).await?;
            let mut list =
                credreg_codec::decode(&encoded, row.list_type(), row.size, row.status_size())?;

            let mut changes = Vec::with_capacity(indices.len());
            for &index in indices {
                let previous = list.set_code(index, code)?;
                changes.push(IndexChange {
                    index,
                    previous,
                    current: code,
                    changed: previous != code,
                });
            }
            if !changes.iter().any(|c| c.changed) {
                return Ok(Attempt::Done((row, changes, stored)));
            }

            let encoded = credreg_codec::encode(&list, row.list_type())?;
            let mut updated = row.next_version();
            let sealed = self.gate.seal_content(&row, &encoded).await?;
            updated.content = Some(sealed.clone());
            if self.catalog.replace_if_version(&updated, row.version).await? {
                tracing::debug!(
                    registry_id = %id,
                    version = updated.version,
                    attempt,
                    "status update committed"
                );
                Ok(Attempt::Done((updated, changes, sealed)))
            } else {
                Ok(Attempt::Retry)
            }
        })
        .await?;

        let mut outcome = UpdateOutcome {
            registry_id: row.id,
            updated: true,
            changes,
            version: row.version,
            published: None,
            resource_metadata: None,
            publish_error: None,
        };
        if request.publish {
            self.publish(&row, &stored, &mut outcome).await;
        }
        Ok(outcome)
    }

    async fn publish(&self, row: &Registry, content: &str, outcome: &mut UpdateOutcome) {
        match self.collaborators.publish(row, content).await {
            Ok(receipt) => {
                outcome.published = Some(true);
                outcome.resource_metadata = Some(receipt.resource_metadata);
            }
            Err(e) => {
                tracing::warn!(
                    registry_id = %row.id,
                    version = row.version,
                    error = %e,
                    "publish failed; local commit stands"
                );
                outcome.published = Some(false);
                outcome.publish_error = Some(e.to_string());
            }
        }
    }
}
