//! # Status List Kinds
//!
//! The vocabulary of a status list: what it is for ([`StatusPurpose`]), how
//! many bits it spends per credential ([`ListKind`]), what each multi-bit
//! code means ([`StatusMessages`]), and which change a caller asks for
//! ([`StatusChange`]).
//!
//! [`ListKind`] is a closed variant chosen once when a registry is created.
//! Everything that depends on the list type (bit width, accepted purposes,
//! how "revoke" maps to a code) is answered by matching on it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::MAX_STATUS_SIZE;

/// What a status list (or one of its bits) records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPurpose {
    /// Permanent cancellation of a credential.
    Revocation,
    /// Temporary hold on a credential.
    Suspension,
    /// Arbitrary status codes with human-readable messages.
    Message,
}

impl StatusPurpose {
    /// Return the wire name of this purpose.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revocation => "revocation",
            Self::Suspension => "suspension",
            Self::Message => "message",
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "revocation" => Some(Self::Revocation),
            "suspension" => Some(Self::Suspension),
            "message" => Some(Self::Message),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatusPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The encoding family of a status list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListType {
    /// One bit per credential, one purpose per list.
    SingleBit,
    /// `statusSize` bits per credential, enumerable status codes.
    MultiBit,
}

impl ListType {
    /// Return the wire name of this list type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleBit => "SingleBit",
            Self::MultiBit => "MultiBit",
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "SingleBit" => Some(Self::SingleBit),
            "MultiBit" => Some(Self::MultiBit),
            _ => None,
        }
    }
}

impl std::fmt::Display for ListType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the encoded content of a registry is durably published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Published as a resource on a ledger via the broadcaster.
    Ledger,
    /// Kept only in the local catalog.
    Local,
}

impl StorageType {
    /// Return the wire name of this storage type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ledger => "ledger",
            Self::Local => "local",
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ledger" => Some(Self::Ledger),
            "local" => Some(Self::Local),
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of credential the indices of a registry are handed out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialCategory {
    /// Ordinary verifiable credentials.
    Credential,
    /// Accreditations (trust-chain credentials).
    Accreditation,
}

impl CredentialCategory {
    /// Return the wire name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credential => "credential",
            Self::Accreditation => "accreditation",
        }
    }

    /// Parse a wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "credential" => Some(Self::Credential),
            "accreditation" => Some(Self::Accreditation),
            _ => None,
        }
    }
}

impl std::fmt::Display for CredentialCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a multi-bit status table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    /// The numeric code stored in the list.
    pub status: u32,
    /// The semantic label of the code, e.g. `"revoked"`.
    pub message: String,
}

/// The code → label table of a multi-bit list, ordered by code.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusMessages(Vec<StatusMessage>);

impl StatusMessages {
    /// Build a table from entries. Entries are sorted by code; call
    /// [`StatusMessages::validate`] before relying on completeness.
    pub fn new(mut entries: Vec<StatusMessage>) -> Self {
        entries.sort_by_key(|e| e.status);
        Self(entries)
    }

    /// Build a table from `(code, label)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (u32, &'a str)>) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(status, message)| StatusMessage {
                    status,
                    message: message.to_string(),
                })
                .collect(),
        )
    }

    /// Check that the table is complete for `status_size` bits per index.
    ///
    /// A complete table declares at least two codes, its codes are exactly
    /// `0..n` with no gaps, `n <= 2^status_size`, and labels are non-empty
    /// and unique (case-insensitive). Code 0 is the unset/"valid" state.
    pub fn validate(&self, status_size: u8) -> Result<(), ValidationError> {
        let capacity = 1u64 << status_size;
        let count = self.0.len() as u64;
        if count < 2 {
            return Err(ValidationError::InvalidStatusMessages(
                "a multi-bit list must declare at least two status codes".into(),
            ));
        }
        if count > capacity {
            return Err(ValidationError::InvalidStatusMessages(format!(
                "{count} status codes declared but status size {status_size} only represents {capacity}"
            )));
        }
        for (expected, entry) in self.0.iter().enumerate() {
            if u64::from(entry.status) != expected as u64 {
                return Err(ValidationError::InvalidStatusMessages(format!(
                    "status codes must be contiguous from 0; expected {expected}, found {}",
                    entry.status
                )));
            }
        }
        let mut labels = BTreeSet::new();
        for entry in &self.0 {
            let label = entry.message.trim().to_ascii_lowercase();
            if label.is_empty() {
                return Err(ValidationError::InvalidStatusMessages(format!(
                    "status code {} has an empty message",
                    entry.status
                )));
            }
            if !labels.insert(label) {
                return Err(ValidationError::InvalidStatusMessages(format!(
                    "duplicate status message \"{}\"",
                    entry.message
                )));
            }
        }
        Ok(())
    }

    /// Return the label declared for `code`.
    pub fn label(&self, code: u32) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.status == code)
            .map(|e| e.message.as_str())
    }

    /// Return the code whose label equals `label` (case-insensitive).
    pub fn code_for(&self, label: &str) -> Option<u32> {
        self.0
            .iter()
            .find(|e| e.message.eq_ignore_ascii_case(label))
            .map(|e| e.status)
    }

    /// Number of declared codes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no codes are declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in code order.
    pub fn iter(&self) -> impl Iterator<Item = &StatusMessage> {
        self.0.iter()
    }
}

/// A status transition requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusChange {
    /// Mark the credential revoked.
    Revoke,
    /// Mark the credential suspended.
    Suspend,
    /// Return the credential to the unset/"valid" state.
    Reinstate,
    /// Store an explicit status code.
    Code(u32),
}

impl std::fmt::Display for StatusChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Revoke => f.write_str("revoke"),
            Self::Suspend => f.write_str("suspend"),
            Self::Reinstate => f.write_str("reinstate"),
            Self::Code(code) => write!(f, "code {code}"),
        }
    }
}

/// The encoding and purpose set of a status list, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "listType")]
pub enum ListKind {
    /// One bit per credential for a single boolean purpose.
    SingleBit {
        /// Revocation or suspension.
        purpose: StatusPurpose,
    },
    /// `status_size` bits per credential with a declared code table.
    MultiBit {
        /// Bits per index.
        #[serde(rename = "statusSize")]
        status_size: u8,
        /// Code → label table.
        #[serde(rename = "statusMessages")]
        messages: StatusMessages,
        /// Purposes this list serves.
        purposes: Vec<StatusPurpose>,
    },
}

impl ListKind {
    /// Build a validated single-bit kind.
    pub fn single_bit(purpose: StatusPurpose) -> Result<Self, ValidationError> {
        let kind = Self::SingleBit { purpose };
        kind.validate()?;
        Ok(kind)
    }

    /// Build a validated multi-bit kind.
    ///
    /// An empty purpose set defaults to `[message]`.
    pub fn multi_bit(
        status_size: u8,
        messages: StatusMessages,
        mut purposes: Vec<StatusPurpose>,
    ) -> Result<Self, ValidationError> {
        if purposes.is_empty() {
            purposes.push(StatusPurpose::Message);
        }
        purposes.sort();
        purposes.dedup();
        let kind = Self::MultiBit {
            status_size,
            messages,
            purposes,
        };
        kind.validate()?;
        Ok(kind)
    }

    /// Validate the kind. Deserialized values must pass through here before
    /// being trusted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::SingleBit { purpose } => match purpose {
                StatusPurpose::Revocation | StatusPurpose::Suspension => Ok(()),
                StatusPurpose::Message => Err(ValidationError::InvalidPurpose(
                    "the message purpose requires a multi-bit list".into(),
                )),
            },
            Self::MultiBit {
                status_size,
                messages,
                purposes,
            } => {
                if *status_size == 0 || *status_size > MAX_STATUS_SIZE {
                    return Err(ValidationError::InvalidStatusSize {
                        status_size: *status_size,
                        reason: format!("must be between 1 and {MAX_STATUS_SIZE}"),
                    });
                }
                if purposes.is_empty() {
                    return Err(ValidationError::InvalidPurpose(
                        "at least one status purpose is required".into(),
                    ));
                }
                messages.validate(*status_size)
            }
        }
    }

    /// The list type of this kind.
    pub fn list_type(&self) -> ListType {
        match self {
            Self::SingleBit { .. } => ListType::SingleBit,
            Self::MultiBit { .. } => ListType::MultiBit,
        }
    }

    /// Bits per index.
    pub fn status_size(&self) -> u8 {
        match self {
            Self::SingleBit { .. } => 1,
            Self::MultiBit { status_size, .. } => *status_size,
        }
    }

    /// The purposes this list serves.
    pub fn purposes(&self) -> Vec<StatusPurpose> {
        match self {
            Self::SingleBit { purpose } => vec![*purpose],
            Self::MultiBit { purposes, .. } => purposes.clone(),
        }
    }

    /// Whether this list serves `purpose`.
    pub fn serves(&self, purpose: StatusPurpose) -> bool {
        match self {
            Self::SingleBit { purpose: own } => *own == purpose,
            Self::MultiBit { purposes, .. } => purposes.contains(&purpose),
        }
    }

    /// The code table of a multi-bit list.
    pub fn messages(&self) -> Option<&StatusMessages> {
        match self {
            Self::SingleBit { .. } => None,
            Self::MultiBit { messages, .. } => Some(messages),
        }
    }

    /// Resolve a requested change to the code stored in the list.
    pub fn resolve_change(&self, change: StatusChange) -> Result<u32, ValidationError> {
        let unsupported = |reason: String| ValidationError::UnsupportedChange {
            change: change.to_string(),
            list_type: self.list_type().to_string(),
            reason,
        };
        match self {
            Self::SingleBit { purpose } => match (change, purpose) {
                (StatusChange::Reinstate, _) => Ok(0),
                (StatusChange::Revoke, StatusPurpose::Revocation)
                | (StatusChange::Suspend, StatusPurpose::Suspension) => Ok(1),
                (StatusChange::Code(code @ (0 | 1)), _) => Ok(code),
                (StatusChange::Code(code), _) => Err(ValidationError::InvalidCode {
                    code,
                    reason: "single-bit lists only store 0 or 1".into(),
                }),
                (StatusChange::Revoke | StatusChange::Suspend, _) => {
                    Err(unsupported(format!("list purpose is {purpose}")))
                }
            },
            Self::MultiBit { messages, .. } => match change {
                StatusChange::Reinstate => Ok(0),
                StatusChange::Revoke => messages
                    .code_for("revoked")
                    .ok_or_else(|| unsupported("no status code is labelled \"revoked\"".into())),
                StatusChange::Suspend => messages
                    .code_for("suspended")
                    .ok_or_else(|| unsupported("no status code is labelled \"suspended\"".into())),
                StatusChange::Code(code) => {
                    if messages.label(code).is_some() {
                        Ok(code)
                    } else {
                        Err(ValidationError::InvalidCode {
                            code,
                            reason: format!("declared codes are 0..{}", messages.len()),
                        })
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn four_codes() -> StatusMessages {
        StatusMessages::from_pairs([(0, "valid"), (1, "revoked"), (2, "suspended"), (3, "unknown")])
    }

    #[test]
    fn purpose_wire_names_round_trip() {
        for p in [
            StatusPurpose::Revocation,
            StatusPurpose::Suspension,
            StatusPurpose::Message,
        ] {
            assert_eq!(StatusPurpose::from_name(p.as_str()), Some(p));
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, format!("\"{}\"", p.as_str()));
        }
        assert_eq!(StatusPurpose::from_name("Revocation"), None);
    }

    #[test]
    fn single_bit_rejects_message_purpose() {
        assert!(ListKind::single_bit(StatusPurpose::Revocation).is_ok());
        assert!(matches!(
            ListKind::single_bit(StatusPurpose::Message),
            Err(ValidationError::InvalidPurpose(_))
        ));
    }

    #[test]
    fn multi_bit_accepts_complete_table() {
        let kind = ListKind::multi_bit(2, four_codes(), vec![]).unwrap();
        assert_eq!(kind.status_size(), 2);
        assert_eq!(kind.purposes(), vec![StatusPurpose::Message]);
        assert_eq!(kind.list_type(), ListType::MultiBit);
    }

    #[test]
    fn multi_bit_rejects_too_many_codes_for_size() {
        let err = ListKind::multi_bit(1, four_codes(), vec![]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidStatusMessages(_)));
    }

    #[test]
    fn multi_bit_rejects_gap_in_codes() {
        let messages = StatusMessages::from_pairs([(0, "valid"), (2, "revoked")]);
        let err = ListKind::multi_bit(2, messages, vec![]).unwrap_err();
        assert!(err.to_string().contains("contiguous"));
    }

    #[test]
    fn multi_bit_rejects_single_code_and_duplicate_labels() {
        let one = StatusMessages::from_pairs([(0, "valid")]);
        assert!(ListKind::multi_bit(2, one, vec![]).is_err());
        let dup = StatusMessages::from_pairs([(0, "valid"), (1, "Valid")]);
        assert!(ListKind::multi_bit(2, dup, vec![]).is_err());
    }

    #[test]
    fn multi_bit_rejects_status_size_out_of_range() {
        assert!(matches!(
            ListKind::multi_bit(0, four_codes(), vec![]),
            Err(ValidationError::InvalidStatusSize { .. })
        ));
        assert!(matches!(
            ListKind::multi_bit(9, four_codes(), vec![]),
            Err(ValidationError::InvalidStatusSize { .. })
        ));
    }

    #[test]
    fn messages_sorted_on_construction() {
        let messages = StatusMessages::from_pairs([(1, "revoked"), (0, "valid")]);
        let codes: Vec<u32> = messages.iter().map(|m| m.status).collect();
        assert_eq!(codes, vec![0, 1]);
        assert_eq!(messages.label(1), Some("revoked"));
        assert_eq!(messages.code_for("REVOKED"), Some(1));
    }

    #[test]
    fn single_bit_revocation_changes() {
        let kind = ListKind::single_bit(StatusPurpose::Revocation).unwrap();
        assert_eq!(kind.resolve_change(StatusChange::Revoke), Ok(1));
        assert_eq!(kind.resolve_change(StatusChange::Reinstate), Ok(0));
        assert_eq!(kind.resolve_change(StatusChange::Code(1)), Ok(1));
        assert!(kind.resolve_change(StatusChange::Suspend).is_err());
        assert!(kind.resolve_change(StatusChange::Code(2)).is_err());
    }

    #[test]
    fn single_bit_suspension_changes() {
        let kind = ListKind::single_bit(StatusPurpose::Suspension).unwrap();
        assert_eq!(kind.resolve_change(StatusChange::Suspend), Ok(1));
        assert_eq!(kind.resolve_change(StatusChange::Reinstate), Ok(0));
        assert!(kind.resolve_change(StatusChange::Revoke).is_err());
    }

    #[test]
    fn multi_bit_changes_resolve_by_label() {
        let kind = ListKind::multi_bit(2, four_codes(), vec![]).unwrap();
        assert_eq!(kind.resolve_change(StatusChange::Revoke), Ok(1));
        assert_eq!(kind.resolve_change(StatusChange::Suspend), Ok(2));
        assert_eq!(kind.resolve_change(StatusChange::Reinstate), Ok(0));
        assert_eq!(kind.resolve_change(StatusChange::Code(3)), Ok(3));
        assert!(kind.resolve_change(StatusChange::Code(4)).is_err());
    }

    #[test]
    fn multi_bit_without_revoked_label_rejects_revoke() {
        let messages = StatusMessages::from_pairs([(0, "active"), (1, "expired")]);
        let kind = ListKind::multi_bit(1, messages, vec![]).unwrap();
        assert!(matches!(
            kind.resolve_change(StatusChange::Revoke),
            Err(ValidationError::UnsupportedChange { .. })
        ));
    }

    #[test]
    fn list_kind_serializes_with_tag() {
        let kind = ListKind::single_bit(StatusPurpose::Revocation).unwrap();
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["listType"], "SingleBit");
        assert_eq!(json["purpose"], "revocation");

        let multi = ListKind::multi_bit(2, four_codes(), vec![]).unwrap();
        let json = serde_json::to_value(&multi).unwrap();
        assert_eq!(json["listType"], "MultiBit");
        assert_eq!(json["statusSize"], 2);
        assert_eq!(json["statusMessages"][1]["message"], "revoked");
        let back: ListKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, multi);
    }

    #[test]
    fn status_change_wire_format() {
        assert_eq!(serde_json::to_string(&StatusChange::Revoke).unwrap(), "\"revoke\"");
        assert_eq!(
            serde_json::to_string(&StatusChange::Code(2)).unwrap(),
            "{\"code\":2}"
        );
    }
}
