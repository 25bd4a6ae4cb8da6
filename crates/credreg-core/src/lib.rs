//! # credreg-core — Foundational Types for the Status Registry
//!
//! Every other crate in the workspace depends on `credreg-core`; it depends
//! on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `RegistryId`, `SeriesId` and
//!    `Did` are distinct types with validated constructors. No bare strings
//!    or UUIDs cross crate boundaries as identifiers.
//!
//! 2. **Closed list kind.** A status list is either
//!    [`ListKind::SingleBit`] (one purpose, one bit per credential) or
//!    [`ListKind::MultiBit`] (N bits per credential with declared status
//!    messages). The kind is fixed when a registry is created and is never
//!    re-inferred from loose fields afterwards.
//!
//! 3. **Validation at construction.** Status message tables, payment
//!    conditions and DIDs are validated once, producing a
//!    [`ValidationError`] that names the offending input.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `credreg-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod kind;
pub mod payment;

pub use error::{CredregError, ValidationError};
pub use identity::{Did, RegistryId, SeriesId};
pub use kind::{
    CredentialCategory, ListKind, ListType, StatusChange, StatusMessage, StatusMessages,
    StatusPurpose, StorageType,
};
pub use payment::{PaymentCondition, PaymentEvidence};

/// Default number of addressable indices in a new status list.
///
/// 131,072 entries is the minimum bitstring length recommended for herd
/// privacy (16 KiB of single-bit entries).
pub const DEFAULT_LIST_SIZE: u64 = 131_072;

/// Upper bound on the number of indices in one status list.
pub const MAX_LIST_SIZE: u64 = 16_777_216;

/// Upper bound on the number of bits per index for multi-bit lists.
pub const MAX_STATUS_SIZE: u8 = 8;
