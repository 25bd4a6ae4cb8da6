//! # Registry State Machine
//!
//! `STANDBY → ACTIVE → FULL`. A registry is created ACTIVE when its series
//! has no ACTIVE registry, otherwise STANDBY. It becomes FULL in the same
//! conditional write that moves its cursor to capacity, or when an operator
//! seals it explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime lifecycle state of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistryState {
    /// Receiving allocations. At most one per series.
    #[serde(rename = "ACTIVE")]
    Active,
    /// Pre-created successor waiting for the ACTIVE registry to seal.
    #[serde(rename = "STANDBY")]
    Standby,
    /// Sealed. No further allocations. Terminal.
    #[serde(rename = "FULL")]
    Full,
}

impl RegistryState {
    /// The canonical string name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Standby => "STANDBY",
            Self::Full => "FULL",
        }
    }

    /// Convert a canonical state name to a `RegistryState`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ACTIVE" => Some(Self::Active),
            "STANDBY" => Some(Self::Standby),
            "FULL" => Some(Self::Full),
            _ => None,
        }
    }

    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Full)
    }

    /// Whether allocations may be served from this state.
    pub fn accepts_allocations(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Return the set of valid target states from this state.
    pub fn valid_transitions(&self) -> &'static [RegistryState] {
        match self {
            Self::Standby => &[Self::Active],
            Self::Active => &[Self::Full],
            Self::Full => &[],
        }
    }

    /// Check that moving to `to` is a legal transition.
    pub fn ensure_transition(&self, to: RegistryState) -> Result<(), TransitionError> {
        if self.valid_transitions().contains(&to) {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { from: *self, to })
        }
    }
}

impl std::fmt::Display for RegistryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a registry was sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SealReason {
    /// The write cursor reached the list size.
    Capacity,
    /// An operator sealed the registry before it filled.
    Explicit,
}

impl SealReason {
    /// The canonical string name of this reason.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capacity => "capacity",
            Self::Explicit => "explicit",
        }
    }
}

impl std::fmt::Display for SealReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record of a single state transition of one registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    /// State before the transition.
    pub from_state: RegistryState,
    /// State after the transition.
    pub to_state: RegistryState,
    /// When the transition was committed.
    pub timestamp: DateTime<Utc>,
    /// Catalog version of the row after the transition.
    pub version: u64,
    /// Set for transitions into FULL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SealReason>,
}

impl TransitionRecord {
    /// Build a record, rejecting illegal transitions.
    pub fn new(
        from_state: RegistryState,
        to_state: RegistryState,
        version: u64,
        reason: Option<SealReason>,
    ) -> Result<Self, TransitionError> {
        from_state.ensure_transition(to_state)?;
        Ok(Self {
            from_state,
            to_state,
            timestamp: Utc::now(),
            version,
            reason,
        })
    }
}

/// Errors from attempting a lifecycle transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The transition is not on the lifecycle graph.
    #[error("invalid registry transition from {from} to {to}")]
    InvalidTransition {
        /// Current state.
        from: RegistryState,
        /// Requested state.
        to: RegistryState,
    },
}
