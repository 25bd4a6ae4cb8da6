//! # Lifecycle Manager
//!
//! Creates registries, seals them, and chains each sealed registry to its
//! successor within a series.
//!
//! ## Series shape
//!
//! A series is an ordered set of registries sharing a [`SeriesId`]. At any
//! time it holds at most one ACTIVE and at most one STANDBY registry; every
//! other member is FULL. Chain pointers form a singly linked list by URI:
//!
//! ```text
//! employees (FULL) ──next──▶ employees-1 (ACTIVE) ──next──▶ (unset)
//!                 ◀──prev──                        ◀──prev── employees-2 (STANDBY)
//! ```
//!
//! A STANDBY's `previousUri` is set when it is created; the sealed
//! registry's `nextUri` is set in the same conditional write that seals it.
//! Both pointers are set once.
//!
//! ## Interrupted seals
//!
//! Sealing and promotion are two conditional writes on two rows. If the
//! process stops between them the series has a FULL tail and a STANDBY but
//! no ACTIVE registry. [`LifecycleManager::resume_promotion`] finishes the
//! job and is called by the allocator before it reports `Full`.

use std::sync::Arc;

use chrono::Utc;
use credreg_core::{
    CredentialCategory, Did, ListKind, PaymentCondition, RegistryId, SeriesId, StorageType,
    ValidationError, MAX_LIST_SIZE,
};
use credreg_state::{ChainPointers, RegistryState, SealReason, TransitionRecord};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::{resolve_ref, RegistryCatalog};
use crate::collaborators::Collaborators;
use crate::config::EngineConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::gate::PaymentGate;
use crate::registry::{Registry, RegistryFilter, RegistryRef};
use crate::retry::{retry_cas, Attempt, RetryPolicy};

/// Longest accepted registry name, in characters.
pub const MAX_NAME_LEN: usize = 255;

const SUCCESSOR_NAME_ATTEMPTS: usize = 4;

/// Parameters for [`LifecycleManager::create`].
#[derive(Debug, Clone)]
pub struct CreateParams {
    pub name: String,
    pub issuer_did: Did,
    pub kind: ListKind,
    pub storage_type: StorageType,
    pub credential_category: CredentialCategory,
    /// Defaults to the configured list size.
    pub size: Option<u64>,
    pub encrypted: bool,
    pub payment_conditions: Vec<PaymentCondition>,
    /// Join the series of this registry instead of starting a new one.
    pub successor_of: Option<RegistryId>,
}

impl CreateParams {
    /// Plaintext root registry with default size.
    pub fn new(name: impl Into<String>, issuer_did: Did, kind: ListKind) -> Self {
        Self {
            name: name.into(),
            issuer_did,
            kind,
            storage_type: StorageType::Ledger,
            credential_category: CredentialCategory::Credential,
            size: None,
            encrypted: false,
            payment_conditions: Vec::new(),
            successor_of: None,
        }
    }
}

/// Result of sealing a registry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SealOutcome {
    /// The registry after sealing.
    pub sealed: Registry,
    /// The successor promoted to ACTIVE, if one was waiting.
    pub promoted: Option<Registry>,
    /// Transitions committed by this call, in order.
    pub transitions: Vec<TransitionRecord>,
}

/// Where a new registry lands in its series.
struct Placement {
    series_id: SeriesId,
    ordinal: u32,
    state: RegistryState,
    previous_uri: Option<String>,
    /// FULL tail whose `nextUri` must point at the new registry.
    link_tail: Option<RegistryId>,
}

/// Creates, seals, promotes and deprecates registries.
pub struct LifecycleManager {
    catalog: Arc<dyn RegistryCatalog>,
    gate: Arc<PaymentGate>,
    collaborators: Collaborators,
    config: EngineConfig,
    retry: RetryPolicy,
}

impl LifecycleManager {
    pub fn new(
        catalog: Arc<dyn RegistryCatalog>,
        gate: Arc<PaymentGate>,
        collaborators: Collaborators,
        config: EngineConfig,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            catalog,
            gate,
            collaborators,
            config,
            retry,
        }
    }

    /// Create a registry holding the all-zero list.
    pub async fn create(&self, params: CreateParams) -> RegistryResult<Registry> {
        validate_name(&params.name)?;
        params.kind.validate()?;
        let size = params.size.unwrap_or(self.config.default_list_size);
        if size == 0 || size > MAX_LIST_SIZE {
            return Err(ValidationError::InvalidSize {
                size,
                max: MAX_LIST_SIZE,
            }
            .into());
        }
        validate_payment_conditions(params.encrypted, &params.payment_conditions)?;
        self.collaborators
            .ensure_issuer_active(&params.issuer_did)
            .await?;
        self.ensure_name_free(&params).await?;

        let placement = self.place(&params).await?;
        let id = RegistryId::new();
        let uri = Registry::resource_uri(&params.issuer_did, id);
        let blank = credreg_codec::blank(size, params.kind.list_type(), params.kind.status_size())?;
        let (symmetric_key_ref, content) = if params.encrypted {
            let (key_ref, key) = self.gate.provision().await?;
            (Some(key_ref), credreg_crypto::seal_str(&key, &blank)?)
        } else {
            (None, blank)
        };

        let now = Utc::now();
        let registry = Registry {
            id,
            series_id: placement.series_id,
            ordinal: placement.ordinal,
            name: params.name,
            issuer_did: params.issuer_did,
            uri,
            kind: params.kind,
            storage_type: params.storage_type,
            credential_category: params.credential_category,
            size,
            write_cursor: 0,
            state: placement.state,
            version: 0,
            chain: ChainPointers {
                previous_uri: placement.previous_uri,
                next_uri: None,
            },
            encrypted: params.encrypted,
            symmetric_key_ref,
            payment_conditions: params.payment_conditions,
            content: Some(content),
            created_at: now,
            updated_at: now,
            sealed_at: None,
            deprecated: false,
        };
        self.catalog.insert(&registry).await?;
        tracing::info!(
            registry_id = %registry.id,
            series_id = %registry.series_id,
            ordinal = registry.ordinal,
            state = %registry.state,
            size = registry.size,
            "registry created"
        );

        if let Some(tail) = placement.link_tail {
            self.link_next(tail, &registry.uri).await?;
        }

        if registry.storage_type == StorageType::Ledger {
            if let Some(content) = &registry.content {
                if let Err(e) = self.collaborators.publish(&registry, content).await {
                    tracing::warn!(
                        registry_id = %registry.id,
                        error = %e,
                        "initial publish failed; content is kept in the catalog"
                    );
                }
            }
        }
        Ok(registry)
    }

    async fn ensure_name_free(&self, params: &CreateParams) -> RegistryResult<()> {
        if self.name_taken(&params.issuer_did, &params.name, &params.kind).await? {
            return Err(ValidationError::InvalidName {
                name: params.name.clone(),
                reason: "already in use by this issuer for the same list type and purpose".into(),
            }
            .into());
        }
        Ok(())
    }

    async fn name_taken(&self, did: &Did, name: &str, kind: &ListKind) -> RegistryResult<bool> {
        let filter = RegistryFilter {
            did: Some(did.clone()),
            name: Some(name.to_string()),
            list_type: Some(kind.list_type()),
            ..RegistryFilter::default()
        };
        let mut wanted: Vec<_> = kind.purposes();
        wanted.sort();
        Ok(self.catalog.list(&filter).await?.iter().any(|r| {
            let mut existing = r.purposes();
            existing.sort();
            existing == wanted
        }))
    }

    /// First free name for a successor of `root_name` at `ordinal`.
    ///
    /// Tries `root-N`, then `root-N-1`, `root-N-1-1`, and finally falls back
    /// to a random suffix.
    async fn free_successor_name(
        &self,
        active: &Registry,
        root_name: &str,
        ordinal: u32,
    ) -> RegistryResult<String> {
        let mut candidate = Registry::successor_name(root_name, ordinal);
        for _ in 0..SUCCESSOR_NAME_ATTEMPTS {
            if !self.name_taken(&active.issuer_did, &candidate, &active.kind).await? {
                return Ok(candidate);
            }
            candidate = Registry::successor_name(&candidate, 1);
        }
        let suffix = Uuid::new_v4().simple().to_string();
        Ok(format!("{}-{}", Registry::successor_name(root_name, ordinal), &suffix[..8]))
    }

    async fn place(&self, params: &CreateParams) -> RegistryResult<Placement> {
        let Some(predecessor_id) = params.successor_of else {
            return Ok(Placement {
                series_id: SeriesId::new(),
                ordinal: 0,
                state: RegistryState::Active,
                previous_uri: None,
                link_tail: None,
            });
        };

        let predecessor = self
            .catalog
            .get(predecessor_id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("registry {predecessor_id}")))?;
        if predecessor.issuer_did != params.issuer_did {
            return Err(RegistryError::invalid(
                "successorOf",
                "successor must be issued by the same DID",
            ));
        }
        if predecessor.kind.list_type() != params.kind.list_type() {
            return Err(RegistryError::invalid(
                "successorOf",
                format!("successor must be a {} list", predecessor.list_type()),
            ));
        }

        let members = self.catalog.series(predecessor.series_id).await?;
        let ordinal = members.iter().map(|r| r.ordinal).max().unwrap_or(0) + 1;
        let active = members.iter().find(|r| r.state == RegistryState::Active);
        let standby = members.iter().find(|r| r.state == RegistryState::Standby);

        if let Some(standby) = standby {
            return Err(RegistryError::invalid(
                "successorOf",
                format!(
                    "series {} already has a STANDBY registry ({})",
                    predecessor.series_id, standby.id
                ),
            ));
        }

        let placement = match active {
            Some(active) => Placement {
                series_id: predecessor.series_id,
                ordinal,
                state: RegistryState::Standby,
                previous_uri: Some(active.uri.clone()),
                link_tail: None,
            },
            None => {
                let tail = members
                    .iter()
                    .filter(|r| r.chain.next_uri.is_none())
                    .max_by_key(|r| r.ordinal);
                Placement {
                    series_id: predecessor.series_id,
                    ordinal,
                    state: RegistryState::Active,
                    previous_uri: tail.map(|t| t.uri.clone()),
                    link_tail: tail.map(|t| t.id),
                }
            }
        };
        Ok(placement)
    }

    /// Set `nextUri` on registry `id`. A no-op if it already names `next`.
    async fn link_next(&self, id: RegistryId, next: &str) -> RegistryResult<Registry> {
        retry_cas(&self.retry, "link successor", |_| async move {
            let row = self.load(id).await?;
            let mut updated = row.next_version();
            if !updated.chain.link_next(&row.uri, next)? {
                return Ok(Attempt::Done(row));
            }
            if self.catalog.replace_if_version(&updated, row.version).await? {
                tracing::info!(registry_id = %id, next_uri = next, "registry chained to successor");
                Ok(Attempt::Done(updated))
            } else {
                Ok(Attempt::Retry)
            }
        })
        .await
    }

    async fn load(&self, id: RegistryId) -> RegistryResult<Registry> {
        self.catalog
            .get(id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("registry {id}")))
    }

    /// Seal the referenced registry and promote its STANDBY successor.
    ///
    /// Sealing a FULL registry only completes a pending promotion.
    pub async fn seal(
        &self,
        reference: &RegistryRef,
        reason: SealReason,
    ) -> RegistryResult<SealOutcome> {
        let target = resolve_ref(self.catalog.as_ref(), reference).await?;
        let target_id = target.id;

        let (sealed, record) = retry_cas(&self.retry, "seal", |_| async move {
            let row = self.load(target_id).await?;
            if row.state == RegistryState::Full {
                return Ok(Attempt::Done((row, None)));
            }
            row.state.ensure_transition(RegistryState::Full)?;

            let mut updated = row.next_version();
            updated.state = RegistryState::Full;
            updated.sealed_at = Some(updated.updated_at);
            let standby = self
                .catalog
                .series(row.series_id)
                .await?
                .into_iter()
                .find(|r| r.state == RegistryState::Standby);
            if let Some(standby) = &standby {
                updated.chain.link_next(&row.uri, &standby.uri)?;
            }
            let record = TransitionRecord::new(
                RegistryState::Active,
                RegistryState::Full,
                updated.version,
                Some(reason),
            )?;
            if self.catalog.replace_if_version(&updated, row.version).await? {
                Ok(Attempt::Done((updated, Some(record))))
            } else {
                Ok(Attempt::Retry)
            }
        })
        .await?;

        let mut transitions = Vec::new();
        if let Some(record) = record {
            tracing::info!(
                registry_id = %sealed.id,
                series_id = %sealed.series_id,
                reason = %reason,
                version = sealed.version,
                "registry sealed"
            );
            transitions.push(record);
        }

        let promoted = match self.promote_successor(&sealed).await? {
            Some((registry, record)) => {
                transitions.push(record);
                Some(registry)
            }
            None => None,
        };
        let sealed = self.load(sealed.id).await?;
        Ok(SealOutcome {
            sealed,
            promoted,
            transitions,
        })
    }

    /// Promote the STANDBY successor of a sealed registry.
    ///
    /// Returns `None` when the series already has an ACTIVE registry or has
    /// no STANDBY waiting.
    pub async fn promote_successor(
        &self,
        sealed: &Registry,
    ) -> RegistryResult<Option<(Registry, TransitionRecord)>> {
        let members = self.catalog.series(sealed.series_id).await?;
        if members.iter().any(|r| r.state == RegistryState::Active) {
            return Ok(None);
        }
        let Some(standby) = members.into_iter().find(|r| r.state == RegistryState::Standby) else {
            return Ok(None);
        };

        if sealed.chain.next_uri.as_deref() != Some(standby.uri.as_str()) {
            self.link_next(sealed.id, &standby.uri).await?;
        }

        let standby_id = standby.id;
        let sealed_uri = sealed.uri.as_str();
        let promoted = retry_cas(&self.retry, "promote", |_| async move {
            let row = self.load(standby_id).await?;
            if row.state != RegistryState::Standby {
                return Ok(Attempt::Done(None));
            }
            let mut updated = row.next_version();
            updated.state = RegistryState::Active;
            updated.chain.link_previous(&row.uri, sealed_uri)?;
            let record = TransitionRecord::new(
                RegistryState::Standby,
                RegistryState::Active,
                updated.version,
                None,
            )?;
            if self.catalog.replace_if_version(&updated, row.version).await? {
                Ok(Attempt::Done(Some((updated, record))))
            } else {
                Ok(Attempt::Retry)
            }
        })
        .await?;

        if let Some((registry, _)) = &promoted {
            tracing::info!(
                registry_id = %registry.id,
                series_id = %registry.series_id,
                previous_uri = sealed_uri,
                "standby registry promoted"
            );
        }
        Ok(promoted)
    }

    /// Create the next STANDBY successor if the series has none.
    ///
    /// Returns the new registry, or `None` when nothing was needed.
    pub async fn ensure_standby(&self, series: SeriesId) -> RegistryResult<Option<Registry>> {
        let members = self.catalog.series(series).await?;
        if members.iter().any(|r| r.state == RegistryState::Standby) {
            return Ok(None);
        }
        let Some(active) = members.iter().find(|r| r.state == RegistryState::Active) else {
            return Ok(None);
        };
        let root_name = members.first().map_or(active.name.as_str(), |r| r.name.as_str());
        let ordinal = members.iter().map(|r| r.ordinal).max().unwrap_or(0) + 1;

        let name = self.free_successor_name(active, root_name, ordinal).await?;
        let params = CreateParams {
            name,
            issuer_did: active.issuer_did.clone(),
            kind: active.kind.clone(),
            storage_type: active.storage_type,
            credential_category: active.credential_category,
            size: Some(active.size),
            encrypted: active.encrypted,
            payment_conditions: active.payment_conditions.clone(),
            successor_of: Some(active.id),
        };
        match self.create(params).await {
            Ok(standby) => {
                tracing::info!(
                    registry_id = %standby.id,
                    series_id = %series,
                    name = %standby.name,
                    "standby successor created"
                );
                Ok(Some(standby))
            }
            Err(e) => {
                // Lost the race to another creator: the series now has its standby.
                let has_standby = self
                    .catalog
                    .series(series)
                    .await?
                    .iter()
                    .any(|r| r.state == RegistryState::Standby);
                if has_standby {
                    Ok(None)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Finish an interrupted seal by promoting the waiting STANDBY.
    pub async fn resume_promotion(&self, series: SeriesId) -> RegistryResult<Option<Registry>> {
        let members = self.catalog.series(series).await?;
        if members.iter().any(|r| r.state == RegistryState::Active) {
            return Ok(None);
        }
        let Some(tail) = members
            .into_iter()
            .filter(|r| r.state == RegistryState::Full)
            .max_by_key(|r| r.ordinal)
        else {
            return Ok(None);
        };
        let promoted = self.promote_successor(&tail).await?;
        if promoted.is_some() {
            tracing::info!(series_id = %series, "resumed interrupted promotion");
        }
        Ok(promoted.map(|(registry, _)| registry))
    }

    /// Mark the referenced registry deprecated.
    pub async fn deprecate(&self, reference: &RegistryRef) -> RegistryResult<Registry> {
        let id = resolve_ref(self.catalog.as_ref(), reference).await?.id;
        retry_cas(&self.retry, "deprecate", |_| async move {
            let row = self.load(id).await?;
            if row.deprecated {
                return Ok(Attempt::Done(row));
            }
            let mut updated = row.next_version();
            updated.deprecated = true;
            if self.catalog.replace_if_version(&updated, row.version).await? {
                tracing::info!(registry_id = %id, "registry deprecated");
                Ok(Attempt::Done(updated))
            } else {
                Ok(Attempt::Retry)
            }
        })
        .await
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    let reason = if name.trim().is_empty() {
        Some("must not be empty")
    } else if name.chars().count() > MAX_NAME_LEN {
        Some("must be at most 255 characters")
    } else if name.chars().any(char::is_control) {
        Some("must not contain control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }),
        None => Ok(()),
    }
}

fn validate_payment_conditions(
    encrypted: bool,
    conditions: &[PaymentCondition],
) -> Result<(), ValidationError> {
    match (encrypted, conditions.is_empty()) {
        (true, true) => Err(ValidationError::InvalidPaymentCondition(
            "encrypted registries require at least one payment condition".into(),
        )),
        (false, false) => Err(ValidationError::InvalidPaymentCondition(
            "payment conditions apply only to encrypted registries".into(),
        )),
        _ => conditions.iter().try_for_each(PaymentCondition::validate),
    }
}
