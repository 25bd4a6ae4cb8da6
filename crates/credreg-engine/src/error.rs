//! # Engine Error Types
//!
//! Every failure surfaced by the engine carries a machine-distinguishable
//! [`ErrorKind`] and a human-readable message. Conversions from the lower
//! crates (codec, state, crypto, collaborators) happen here so that
//! components can use `?` throughout.

use credreg_codec::CodecError;
use credreg_core::{SeriesId, ValidationError};
use credreg_crypto::CryptoError;
use credreg_state::{ChainError, TransitionError};
use thiserror::Error;

use crate::collaborators::CollaboratorError;

/// Convenience alias used throughout the engine.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Machine-readable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Registry or DID absent.
    NotFound,
    /// Capacity exhausted and no successor chained.
    Full,
    /// Optimistic-concurrency retries exhausted, or a uniqueness rule hit.
    Conflict,
    /// Index outside the list.
    InvalidIndex,
    /// Malformed create/update parameters.
    Validation,
    /// Payment condition unmet for an encrypted registry.
    Unauthorized,
    /// Ledger, resolver or payment-verifier call failed.
    Ledger,
    /// A store or collaborator call exceeded its time bound.
    Timeout,
    /// Catalog backend failure.
    Storage,
}

impl ErrorKind {
    /// Stable wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Full => "FULL",
            Self::Conflict => "CONFLICT",
            Self::InvalidIndex => "INVALID_INDEX",
            Self::Validation => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Ledger => "LEDGER_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Storage => "STORAGE_ERROR",
        }
    }

    /// Whether a caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict | Self::Ledger | Self::Timeout)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by engine operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The named registry or DID does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The series has no ACTIVE registry with free capacity.
    #[error("status list series {series} is full ({detail}); create a successor registry")]
    Full {
        /// The exhausted series.
        series: SeriesId,
        /// What was found when allocating.
        detail: String,
    },

    /// Concurrent writers kept winning, or a uniqueness rule was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The index is outside the registry.
    #[error("index {index} is out of range for a registry of size {size}")]
    InvalidIndex {
        /// The rejected index.
        index: u64,
        /// Registry size.
        size: u64,
    },

    /// Request parameters are malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The payment gate refused access.
    #[error("payment required: {0}")]
    Unauthorized(String),

    /// An external collaborator failed.
    #[error("{collaborator} error: {message}")]
    Ledger {
        /// Which collaborator (`ledger`, `resolver`, `payment verifier`).
        collaborator: &'static str,
        /// What went wrong.
        message: String,
    },

    /// A bounded call ran out of time.
    #[error("{operation} timed out after {after_ms} ms")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
        /// The bound that was exceeded.
        after_ms: u64,
    },

    /// The catalog or key store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl RegistryError {
    /// The machine-readable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Full { .. } => ErrorKind::Full,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidIndex { .. } => ErrorKind::InvalidIndex,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Ledger { .. } => ErrorKind::Ledger,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Wrap a collaborator failure, attributing it to `collaborator`.
    pub fn collaborator(collaborator: &'static str, err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::NotFound(what) => Self::NotFound(what),
            other => Self::Ledger {
                collaborator,
                message: other.to_string(),
            },
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation(ValidationError::InvalidField {
            field,
            reason: reason.into(),
        })
    }
}

impl From<CodecError> for RegistryError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::InvalidIndex { index, size } => Self::InvalidIndex { index, size },
            CodecError::CodeOutOfRange { code, status_size } => {
                Self::Validation(ValidationError::InvalidCode {
                    code,
                    reason: format!("does not fit in {status_size} bit(s)"),
                })
            }
            other => Self::invalid("content", other.to_string()),
        }
    }
}

impl From<TransitionError> for RegistryError {
    fn from(err: TransitionError) -> Self {
        Self::invalid("state", err.to_string())
    }
}

impl From<ChainError> for RegistryError {
    fn from(err: ChainError) -> Self {
        Self::Conflict(err.to_string())
    }
}

impl From<CryptoError> for RegistryError {
    fn from(err: CryptoError) -> Self {
        Self::Storage(format!("content encryption: {err}"))
    }
}
