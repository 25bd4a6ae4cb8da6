//! # Error Types — Structured Error Hierarchy
//!
//! Defines the validation errors shared by every crate in the workspace.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Validation errors carry the rejected input and the expected shape so
//!   that operators can fix a request without reading the source.
//! - Engine-level failures (not found, full, conflict) live in
//!   `credreg-engine`; this crate only knows about malformed values.

use thiserror::Error;

/// Top-level error type for foundational operations.
#[derive(Error, Debug)]
pub enum CredregError {
    /// A domain value failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validation errors for domain values.
///
/// Each variant names the field at fault. These map to the `ValidationError`
/// kind at the engine and HTTP layers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// DID does not conform to W3C DID syntax (did:method:identifier).
    #[error("invalid DID format: \"{0}\" (expected did:<method>:<identifier>)")]
    InvalidDid(String),

    /// Registry name is empty, too long, or contains control characters.
    #[error("invalid status list name \"{name}\": {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Requested list size is zero or above the supported maximum.
    #[error("invalid list size {size}: must be between 1 and {max}")]
    InvalidSize {
        /// The rejected size.
        size: u64,
        /// The largest accepted size.
        max: u64,
    },

    /// Bits-per-index is not valid for the list type.
    #[error("invalid status size {status_size}: {reason}")]
    InvalidStatusSize {
        /// The rejected status size.
        status_size: u8,
        /// Why it was rejected.
        reason: String,
    },

    /// The status message table is incomplete or inconsistent.
    #[error("invalid status messages: {0}")]
    InvalidStatusMessages(String),

    /// The purpose set is empty or not representable by the list type.
    #[error("invalid status purpose: {0}")]
    InvalidPurpose(String),

    /// A status code does not fit in (or is not declared for) the list.
    #[error("status code {code} is not valid for this list: {reason}")]
    InvalidCode {
        /// The rejected code.
        code: u32,
        /// Why it was rejected.
        reason: String,
    },

    /// The requested status change is not meaningful for the list kind.
    #[error("status change \"{change}\" is not supported by a {list_type} list: {reason}")]
    UnsupportedChange {
        /// The requested change.
        change: String,
        /// The list type it was applied to.
        list_type: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A payment condition is malformed.
    #[error("invalid payment condition: {0}")]
    InvalidPaymentCondition(String),

    /// Catch-all for a single malformed request field.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The field name as it appears on the wire.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
