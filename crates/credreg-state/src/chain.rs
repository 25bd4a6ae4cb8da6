//! # Series Chain Pointers
//!
//! Registries of one series form a singly linked, acyclic chain by URI:
//! each registry may name its predecessor (`previousUri`) and its successor
//! (`nextUri`). Each pointer is written at most once. Re-writing the same
//! value is a no-op so that interrupted seals can be replayed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two chain pointers carried by a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainPointers {
    /// URI of the registry this one succeeds.
    pub previous_uri: Option<String>,
    /// URI of the registry that succeeds this one.
    pub next_uri: Option<String>,
}

/// Errors from linking registries.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The pointer already names a different registry.
    #[error("{pointer} is already set to {existing}; refusing to relink to {requested}")]
    AlreadyLinked {
        /// `"previousUri"` or `"nextUri"`.
        pointer: &'static str,
        /// The stored value.
        existing: String,
        /// The value that was requested.
        requested: String,
    },

    /// A registry cannot point at itself.
    #[error("registry {0} cannot be linked to itself")]
    SelfLink(String),
}

impl ChainPointers {
    /// Set `previousUri`. Returns `true` if the value changed.
    pub fn link_previous(&mut self, own_uri: &str, previous: &str) -> Result<bool, ChainError> {
        set_once(&mut self.previous_uri, "previousUri", own_uri, previous)
    }

    /// Set `nextUri`. Returns `true` if the value changed.
    pub fn link_next(&mut self, own_uri: &str, next: &str) -> Result<bool, ChainError> {
        set_once(&mut self.next_uri, "nextUri", own_uri, next)
    }
}

fn set_once(
    slot: &mut Option<String>,
    pointer: &'static str,
    own_uri: &str,
    target: &str,
) -> Result<bool, ChainError> {
    if own_uri == target {
        return Err(ChainError::SelfLink(own_uri.to_string()));
    }
    match slot {
        Some(existing) if existing == target => Ok(false),
        Some(existing) => Err(ChainError::AlreadyLinked {
            pointer,
            existing: existing.clone(),
            requested: target.to_string(),
        }),
        None => {
            *slot = Some(target.to_string());
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "did:cheqd:testnet:abc/resources/a";
    const B: &str = "did:cheqd:testnet:abc/resources/b";
    const C: &str = "did:cheqd:testnet:abc/resources/c";

    #[test]
    fn pointers_set_once() {
        let mut p = ChainPointers::default();
        assert!(p.link_next(A, B).unwrap());
        assert_eq!(p.next_uri.as_deref(), Some(B));
        assert!(!p.link_next(A, B).unwrap());
        assert!(matches!(
            p.link_next(A, C),
            Err(ChainError::AlreadyLinked { pointer: "nextUri", .. })
        ));
    }

    #[test]
    fn self_link_rejected() {
        let mut p = ChainPointers::default();
        assert!(matches!(p.link_previous(A, A), Err(ChainError::SelfLink(_))));
    }

    #[test]
    fn camel_case_wire_names() {
        let mut p = ChainPointers::default();
        p.link_previous(B, A).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["previousUri"], A);
        assert!(json["nextUri"].is_null());
    }
}
