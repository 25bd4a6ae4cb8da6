//! # Registry Record
//!
//! The catalog's unit of record: one fixed-capacity status list, its write
//! position, lifecycle state, chain pointers and encoded content.

use chrono::{DateTime, Utc};
use credreg_core::{
    CredentialCategory, Did, ListKind, ListType, PaymentCondition, RegistryId, SeriesId,
    StatusPurpose, StorageType,
};
use credreg_state::{ChainPointers, RegistryState};
use serde::{Deserialize, Serialize};

/// One status list registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    pub id: RegistryId,
    /// Series this registry belongs to.
    pub series_id: SeriesId,
    /// Position in the series; 0 for the root.
    pub ordinal: u32,
    pub name: String,
    pub issuer_did: Did,
    /// Stable resource URI: `{issuerDid}/resources/{id}`.
    pub uri: String,
    pub kind: ListKind,
    pub storage_type: StorageType,
    pub credential_category: CredentialCategory,
    pub size: u64,
    /// Next unassigned index; `0 <= write_cursor <= size`.
    pub write_cursor: u64,
    pub state: RegistryState,
    /// Incremented by exactly one on every committed mutation.
    pub version: u64,
    #[serde(flatten)]
    pub chain: ChainPointers,
    pub encrypted: bool,
    /// Key store reference; present iff `encrypted`.
    pub symmetric_key_ref: Option<String>,
    pub payment_conditions: Vec<PaymentCondition>,
    /// Encoded list (ciphertext envelope when encrypted). `None` when the
    /// content lives only on the ledger.
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sealed_at: Option<DateTime<Utc>>,
    pub deprecated: bool,
}

impl Registry {
    /// Resource URI of registry `id` issued by `did`.
    pub fn resource_uri(did: &Did, id: RegistryId) -> String {
        format!("{did}/resources/{id}")
    }

    /// Name of the successor with `ordinal` in a series rooted at `root_name`.
    pub fn successor_name(root_name: &str, ordinal: u32) -> String {
        format!("{root_name}-{ordinal}")
    }

    pub fn list_type(&self) -> ListType {
        self.kind.list_type()
    }

    pub fn status_size(&self) -> u8 {
        self.kind.status_size()
    }

    pub fn purposes(&self) -> Vec<StatusPurpose> {
        self.kind.purposes()
    }

    /// Canonical key of the purpose set, used for name uniqueness.
    pub fn purpose_key(&self) -> String {
        let mut purposes: Vec<&str> = self.purposes().iter().map(|p| p.as_str()).collect();
        purposes.sort_unstable();
        purposes.join(",")
    }

    /// Indices not yet allocated.
    pub fn remaining(&self) -> u64 {
        self.size.saturating_sub(self.write_cursor)
    }

    /// Whether the cursor has reached capacity.
    pub fn is_exhausted(&self) -> bool {
        self.write_cursor >= self.size
    }

    /// Whether `other` shares this registry's uniqueness family.
    pub fn same_family(&self, other: &Registry) -> bool {
        self.issuer_did == other.issuer_did
            && self.name == other.name
            && self.list_type() == other.list_type()
            && self.purpose_key() == other.purpose_key()
    }

    /// Structural invariants that must hold for every stored row.
    pub fn invariants_hold(&self) -> bool {
        let cursor_in_range = self.write_cursor <= self.size;
        let full_iff_sealed = (self.state == RegistryState::Full) == self.sealed_at.is_some();
        let cursor_full_means_sealed =
            self.write_cursor < self.size || self.state == RegistryState::Full;
        let key_iff_encrypted = self.encrypted == self.symmetric_key_ref.is_some();
        cursor_in_range && full_iff_sealed && cursor_full_means_sealed && key_iff_encrypted
    }

    /// Copy of `self` prepared as the next version of the row.
    pub(crate) fn next_version(&self) -> Registry {
        let mut next = self.clone();
        next.version = self.version + 1;
        next.updated_at = Utc::now();
        next
    }
}

/// How a caller names a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryRef {
    /// By identifier.
    Id(RegistryId),
    /// By issuer, name and purpose, optionally narrowed by list type.
    Name {
        did: Did,
        name: String,
        purpose: StatusPurpose,
        list_type: Option<ListType>,
    },
    /// By series; resolves to the series' ACTIVE registry.
    Series(SeriesId),
}

impl std::fmt::Display for RegistryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "registry {id}"),
            Self::Name {
                did, name, purpose, ..
            } => write!(f, "registry \"{name}\" ({purpose}) of {did}"),
            Self::Series(series) => write!(f, "series {series}"),
        }
    }
}

/// Listing filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryFilter {
    pub did: Option<Did>,
    pub state: Option<RegistryState>,
    pub name: Option<String>,
    pub list_type: Option<ListType>,
    pub credential_category: Option<CredentialCategory>,
    pub deprecated: Option<bool>,
    pub purpose: Option<StatusPurpose>,
}

impl RegistryFilter {
    pub fn matches(&self, registry: &Registry) -> bool {
        self.did.as_ref().map_or(true, |d| *d == registry.issuer_did)
            && self.state.map_or(true, |s| s == registry.state)
            && self.name.as_ref().map_or(true, |n| *n == registry.name)
            && self.list_type.map_or(true, |t| t == registry.list_type())
            && self
                .credential_category
                .map_or(true, |c| c == registry.credential_category)
            && self.deprecated.map_or(true, |d| d == registry.deprecated)
            && self.purpose.map_or(true, |p| registry.kind.serves(p))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::registry;
    use super::*;

    #[test]
    fn uri_and_successor_names() {
        let did = Did::new("did:cheqd:testnet:zABC").unwrap();
        let id = RegistryId::new();
        assert_eq!(
            Registry::resource_uri(&did, id),
            format!("did:cheqd:testnet:zABC/resources/{id}")
        );
        assert_eq!(Registry::successor_name("employees", 2), "employees-2");
    }

    #[test]
    fn invariants_detect_unsealed_full_cursor() {
        let mut r = registry("list", 4);
        assert!(r.invariants_hold());
        r.write_cursor = 4;
        assert!(!r.invariants_hold());
        r.state = RegistryState::Full;
        r.sealed_at = Some(Utc::now());
        assert!(r.invariants_hold());
    }

    #[test]
    fn filter_matches_fields() {
        let r = registry("list", 4);
        assert!(RegistryFilter::default().matches(&r));
        let by_state = RegistryFilter {
            state: Some(RegistryState::Full),
            ..RegistryFilter::default()
        };
        assert!(!by_state.matches(&r));
        let by_purpose = RegistryFilter {
            purpose: Some(StatusPurpose::Revocation),
            list_type: Some(ListType::SingleBit),
            ..RegistryFilter::default()
        };
        assert!(by_purpose.matches(&r));
    }

    #[test]
    fn serializes_chain_pointers_inline() {
        let mut r = registry("list", 4);
        r.chain.previous_uri = Some("did:cheqd:testnet:zABCDEF/resources/prev".into());
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["previousUri"], "did:cheqd:testnet:zABCDEF/resources/prev");
        assert_eq!(json["writeCursor"], 0);
        assert_eq!(json["kind"]["listType"], "SingleBit");
    }
}
