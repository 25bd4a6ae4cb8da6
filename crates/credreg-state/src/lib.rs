//! # credreg-state — Registry Lifecycle
//!
//! The lifecycle of one status list registry and the chain that links the
//! registries of a series together.
//!
//! ```text
//! STANDBY ─promote()──▶ ACTIVE ─seal()──▶ FULL
//!                          ▲                │
//!                          └── successor ◀──┘ (nextUri / previousUri)
//! ```
//!
//! A series holds at most one ACTIVE and at most one STANDBY registry.
//! FULL is terminal. Chain pointers are written once and never change.

pub mod chain;
pub mod registry;

pub use chain::{ChainError, ChainPointers};
pub use registry::{RegistryState, SealReason, TransitionError, TransitionRecord};
