//! # credreg-engine — Status Registry Engine
//!
//! Turns fixed-capacity status lists into an unbounded, concurrency-safe
//! index supply.
//!
//! ## Components
//!
//! - **Catalog** ([`catalog`]): persisted registry rows; every mutation is
//!   one conditional write keyed on the row's `version`.
//! - **Index Allocator** ([`allocator`]): reserves unique, monotonically
//!   increasing indices from a series' ACTIVE registry.
//! - **Lifecycle Manager** ([`lifecycle`]): creates, seals, chains and
//!   promotes registries; pre-creates STANDBY successors.
//! - **Bulk Updater** ([`updater`]): all-or-nothing status changes over a
//!   batch of indices, optionally published to the ledger.
//! - **Payment Gate** ([`gate`]): encrypts content and releases keys only
//!   against verified payments.
//! - **Status Checker** ([`checker`]): reads one index.
//!
//! [`RegistryEngine`] wires them together.
//!
//! ## Crate Policy
//!
//! - No in-process lock stands in for the catalog's conditional writes.
//! - Every catalog and collaborator call is time-bounded.
//! - No `.unwrap()` outside tests.

pub mod allocator;
pub mod catalog;
pub mod checker;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod gate;
pub mod keystore;
pub mod lifecycle;
pub mod registry;
pub mod retry;
pub mod updater;

pub use allocator::{Allocation, IndexAllocator};
pub use catalog::{resolve_ref, MemoryCatalog, RegistryCatalog, Reservation, TimedCatalog};
pub use checker::{CheckRequest, StatusChecker, StatusReport};
pub use collaborators::{
    resource_type_for, CollaboratorError, Collaborators, DidResolution, DidResolver,
    LedgerBroadcaster, LocalLedger, PaymentVerifier, PermissiveDidResolver, PublishReceipt,
    RejectingPaymentVerifier, ResourceMetadata,
};
pub use config::{ConfigError, EngineConfig};
pub use engine::{RegistryEngine, RegistryEngineBuilder};
pub use error::{ErrorKind, RegistryError, RegistryResult};
pub use gate::{DecryptionGrant, PaymentGate};
pub use keystore::{KeyStore, MemoryKeyStore};
pub use lifecycle::{CreateParams, LifecycleManager, SealOutcome};
pub use registry::{Registry, RegistryFilter, RegistryRef};
pub use updater::{BulkUpdater, IndexChange, UpdateOutcome, UpdateRequest};
