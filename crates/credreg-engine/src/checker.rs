//! # Status Checker
//!
//! Answers "what is the status at index N of this issuer's list?". Single
//! bit lists answer with a boolean for their purpose; multi-bit lists
//! answer with the stored code and its label. Encrypted lists require a
//! payment that the gate accepts.

use std::sync::Arc;

use credreg_core::{Did, ListKind, ListType, PaymentEvidence, RegistryId, StatusPurpose};
use serde::Serialize;

use crate::catalog::RegistryCatalog;
use crate::collaborators::Collaborators;
use crate::error::{RegistryError, RegistryResult};
use crate::gate::PaymentGate;

/// Lookup of one index.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub did: Did,
    pub status_list_name: String,
    pub index: u64,
    pub purpose: StatusPurpose,
    pub list_type: Option<ListType>,
    pub payment_evidence: Option<PaymentEvidence>,
}

/// Status of one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub registry_id: RegistryId,
    pub index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Read-only status lookups.
pub struct StatusChecker {
    catalog: Arc<dyn RegistryCatalog>,
    gate: Arc<PaymentGate>,
    collaborators: Collaborators,
}

impl StatusChecker {
    pub fn new(
        catalog: Arc<dyn RegistryCatalog>,
        gate: Arc<PaymentGate>,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            catalog,
            gate,
            collaborators,
        }
    }

    pub async fn check(&self, request: &CheckRequest) -> RegistryResult<StatusReport> {
        let registry = self
            .catalog
            .find_by_name(
                &request.did,
                &request.status_list_name,
                request.purpose,
                request.list_type,
            )
            .await?
            .ok_or_else(|| {
                RegistryError::NotFound(format!(
                    "status list \"{}\" ({}) of {}",
                    request.status_list_name, request.purpose, request.did
                ))
            })?;
        if request.index >= registry.size {
            return Err(RegistryError::InvalidIndex {
                index: request.index,
                size: registry.size,
            });
        }

        let stored = self.collaborators.stored_content(&registry).await?;
        let encoded = if self.gate.is_payment_needed(&registry) {
            let grant = self
                .gate
                .authorize_decrypt(&registry, request.payment_evidence.as_ref())
                .await?;
            credreg_crypto::open_str(&grant.key, &stored)?
        } else {
            stored
        };
        let code = credreg_codec::code_at(
            &encoded,
            registry.list_type(),
            registry.size,
            registry.status_size(),
            request.index,
        )?;

        let mut report = StatusReport {
            registry_id: registry.id,
            index: request.index,
            revoked: None,
            suspended: None,
            status: None,
            message: None,
        };
        match &registry.kind {
            ListKind::SingleBit {
                purpose: StatusPurpose::Revocation,
            } => report.revoked = Some(code == 1),
            ListKind::SingleBit {
                purpose: StatusPurpose::Suspension,
            } => report.suspended = Some(code == 1),
            kind => {
                report.status = Some(code);
                report.message = credreg_codec::message_for(kind, code);
            }
        }
        Ok(report)
    }
}
