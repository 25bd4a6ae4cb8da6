//! # Registry Engine
//!
//! Wires the catalog, collaborators, gate and components together and
//! exposes the operations callers use. Every component receives its
//! collaborators as explicit `Arc<dyn Trait>` handles.

use std::sync::Arc;

use credreg_core::{RegistryId, SeriesId};
use credreg_state::SealReason;

use crate::allocator::{Allocation, IndexAllocator};
use crate::catalog::{resolve_ref, MemoryCatalog, RegistryCatalog, TimedCatalog};
use crate::checker::{CheckRequest, StatusChecker, StatusReport};
use crate::collaborators::{Collaborators, DidResolver, LedgerBroadcaster, PaymentVerifier};
use crate::config::EngineConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::gate::PaymentGate;
use crate::keystore::{KeyStore, MemoryKeyStore};
use crate::lifecycle::{CreateParams, LifecycleManager, SealOutcome};
use crate::registry::{Registry, RegistryFilter, RegistryRef};
use crate::updater::{BulkUpdater, UpdateOutcome, UpdateRequest};

/// The status registry engine.
pub struct RegistryEngine {
    catalog: Arc<dyn RegistryCatalog>,
    lifecycle: Arc<LifecycleManager>,
    allocator: IndexAllocator,
    updater: BulkUpdater,
    checker: StatusChecker,
    gate: Arc<PaymentGate>,
    config: EngineConfig,
}

impl RegistryEngine {
    pub fn builder() -> RegistryEngineBuilder {
        RegistryEngineBuilder::default()
    }

    /// Engine over an in-memory catalog and in-process collaborators.
    pub fn in_memory(config: EngineConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gate(&self) -> &PaymentGate {
        &self.gate
    }

    pub async fn create(&self, params: CreateParams) -> RegistryResult<Registry> {
        self.lifecycle.create(params).await
    }

    pub async fn allocate(&self, reference: &RegistryRef) -> RegistryResult<Allocation> {
        self.allocator.allocate(reference).await
    }

    pub async fn apply(&self, request: UpdateRequest) -> RegistryResult<UpdateOutcome> {
        self.updater.apply(request).await
    }

    pub async fn check(&self, request: &CheckRequest) -> RegistryResult<StatusReport> {
        self.checker.check(request).await
    }

    pub async fn seal(
        &self,
        reference: &RegistryRef,
        reason: SealReason,
    ) -> RegistryResult<SealOutcome> {
        self.lifecycle.seal(reference, reason).await
    }

    pub async fn deprecate(&self, reference: &RegistryRef) -> RegistryResult<Registry> {
        self.lifecycle.deprecate(reference).await
    }

    pub async fn ensure_standby(&self, series: SeriesId) -> RegistryResult<Option<Registry>> {
        self.lifecycle.ensure_standby(series).await
    }

    pub async fn resume_promotion(&self, series: SeriesId) -> RegistryResult<Option<Registry>> {
        self.lifecycle.resume_promotion(series).await
    }

    pub async fn get(&self, id: RegistryId) -> RegistryResult<Registry> {
        self.catalog
            .get(id)
            .await?
            .ok_or_else(|| RegistryError::NotFound(format!("registry {id}")))
    }

    /// Resolve any reference to its registry row.
    pub async fn search(&self, reference: &RegistryRef) -> RegistryResult<Registry> {
        resolve_ref(self.catalog.as_ref(), reference).await
    }

    pub async fn list(&self, filter: &RegistryFilter) -> RegistryResult<Vec<Registry>> {
        self.catalog.list(filter).await
    }

    /// All registries of a series, root first.
    pub async fn series(&self, series: SeriesId) -> RegistryResult<Vec<Registry>> {
        self.catalog.series(series).await
    }

    /// Check the catalog is reachable.
    pub async fn ping(&self) -> RegistryResult<()> {
        self.catalog.ping().await
    }
}

/// Builder for [`RegistryEngine`]. Unset handles fall back to the
/// in-memory catalog, in-memory key store and in-process collaborators.
#[derive(Default)]
pub struct RegistryEngineBuilder {
    catalog: Option<Arc<dyn RegistryCatalog>>,
    keys: Option<Arc<dyn KeyStore>>,
    resolver: Option<Arc<dyn DidResolver>>,
    ledger: Option<Arc<dyn LedgerBroadcaster>>,
    payments: Option<Arc<dyn PaymentVerifier>>,
    config: EngineConfig,
}

impl RegistryEngineBuilder {
    pub fn catalog(mut self, catalog: Arc<dyn RegistryCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn key_store(mut self, keys: Arc<dyn KeyStore>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn did_resolver(mut self, resolver: Arc<dyn DidResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn LedgerBroadcaster>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn payment_verifier(mut self, payments: Arc<dyn PaymentVerifier>) -> Self {
        self.payments = Some(payments);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> RegistryEngine {
        let config = self.config;
        let mut collaborators = Collaborators::local(config.collaborator_timeout);
        if let Some(resolver) = self.resolver {
            collaborators.resolver = resolver;
        }
        if let Some(ledger) = self.ledger {
            collaborators.ledger = ledger;
        }
        if let Some(payments) = self.payments {
            collaborators.payments = payments;
        }

        let inner = self
            .catalog
            .unwrap_or_else(|| Arc::new(MemoryCatalog::new()) as Arc<dyn RegistryCatalog>);
        let catalog: Arc<dyn RegistryCatalog> =
            Arc::new(TimedCatalog::new(inner, config.store_timeout));
        let keys = self
            .keys
            .unwrap_or_else(|| Arc::new(MemoryKeyStore::new()) as Arc<dyn KeyStore>);
        let gate = Arc::new(PaymentGate::new(
            keys,
            collaborators.payments.clone(),
            config.collaborator_timeout,
        ));

        let lifecycle = Arc::new(LifecycleManager::new(
            catalog.clone(),
            gate.clone(),
            collaborators.clone(),
            config.clone(),
        ));
        let allocator = IndexAllocator::new(catalog.clone(), lifecycle.clone(), &config);
        let updater = BulkUpdater::new(catalog.clone(), gate.clone(), collaborators.clone(), &config);
        let checker = StatusChecker::new(catalog.clone(), gate.clone(), collaborators);

        RegistryEngine {
            catalog,
            lifecycle,
            allocator,
            updater,
            checker,
            gate,
            config,
        }
    }
}
