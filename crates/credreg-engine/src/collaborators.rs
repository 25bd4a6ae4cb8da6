//! # External Collaborators
//!
//! The engine consumes three external services through explicit handles:
//!
//! - [`DidResolver`]: confirms an issuer DID exists and is not deactivated
//!   before its registries are mutated.
//! - [`LedgerBroadcaster`]: publishes encoded content as a ledger resource
//!   and fetches it back.
//! - [`PaymentVerifier`]: confirms that presented payment evidence is real.
//!
//! In-process implementations live here for development and tests. HTTP
//! implementations live in `credreg-client`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use credreg_core::{Did, ListType, PaymentCondition, PaymentEvidence, RegistryId};
use credreg_crypto::Checksum;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::registry::Registry;
use crate::retry::bounded;

/// Errors reported by collaborators.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    /// The requested DID or resource does not exist.
    #[error("{0} not found")]
    NotFound(String),
    /// The service could not be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),
    /// The service answered with an error status.
    #[error("request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// The service answered with a body we cannot interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Outcome of resolving a DID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidResolution {
    pub did: Did,
    pub deactivated: bool,
    /// The resolved DID document, as returned by the resolver.
    pub document: serde_json::Value,
}

/// Metadata of a published ledger resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    pub resource_uri: String,
    pub resource_collection_id: String,
    pub resource_id: String,
    pub resource_name: String,
    pub resource_type: String,
    pub media_type: String,
    /// Publication count for this resource, starting at 1.
    pub resource_version: u64,
    pub checksum: String,
    pub created: DateTime<Utc>,
}

/// Receipt returned after a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishReceipt {
    pub resource_metadata: ResourceMetadata,
    pub checksum: String,
}

/// Resolves DIDs.
#[async_trait]
pub trait DidResolver: Send + Sync {
    async fn resolve(&self, did: &Did) -> Result<DidResolution, CollaboratorError>;
}

/// Publishes and fetches registry content on the ledger.
#[async_trait]
pub trait LedgerBroadcaster: Send + Sync {
    async fn publish(
        &self,
        registry: &Registry,
        content: &str,
    ) -> Result<PublishReceipt, CollaboratorError>;

    /// Latest published content, or `None` if nothing was published.
    async fn fetch(&self, registry: &Registry) -> Result<Option<String>, CollaboratorError>;
}

/// Confirms payment evidence against a condition.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    async fn verify(
        &self,
        condition: &PaymentCondition,
        evidence: &PaymentEvidence,
    ) -> Result<bool, CollaboratorError>;
}

/// The collaborator handles shared by engine components, with the time
/// bound applied to every call.
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn DidResolver>,
    pub ledger: Arc<dyn LedgerBroadcaster>,
    pub payments: Arc<dyn PaymentVerifier>,
    pub timeout: Duration,
}

impl Collaborators {
    /// In-process stubs: permissive resolver, local ledger, rejecting
    /// payment verifier.
    pub fn local(timeout: Duration) -> Self {
        Self {
            resolver: Arc::new(PermissiveDidResolver),
            ledger: Arc::new(LocalLedger::new()),
            payments: Arc::new(RejectingPaymentVerifier),
            timeout,
        }
    }

    /// Fail unless `did` resolves and is not deactivated.
    pub async fn ensure_issuer_active(&self, did: &Did) -> RegistryResult<()> {
        let resolution = bounded("DID resolution", self.timeout, async {
            self.resolver
                .resolve(did)
                .await
                .map_err(|e| RegistryError::collaborator("resolver", e))
        })
        .await?;
        if resolution.deactivated {
            return Err(RegistryError::invalid(
                "issuerDid",
                format!("{did} is deactivated"),
            ));
        }
        Ok(())
    }

    /// Publish `content` for `registry`.
    pub async fn publish(&self, registry: &Registry, content: &str) -> RegistryResult<PublishReceipt> {
        bounded("ledger publish", self.timeout, async {
            self.ledger
                .publish(registry, content)
                .await
                .map_err(|e| RegistryError::collaborator("ledger", e))
        })
        .await
    }

    /// The registry's stored content, fetched from the ledger when the
    /// catalog row carries none.
    pub async fn stored_content(&self, registry: &Registry) -> RegistryResult<String> {
        if let Some(content) = &registry.content {
            return Ok(content.clone());
        }
        let fetched = bounded("ledger fetch", self.timeout, async {
            self.ledger
                .fetch(registry)
                .await
                .map_err(|e| RegistryError::collaborator("ledger", e))
        })
        .await?;
        fetched.ok_or_else(|| RegistryError::NotFound(format!("content of registry {}", registry.id)))
    }
}

/// Resource type under which status lists are published.
pub fn resource_type_for(registry: &Registry) -> String {
    let kind = match registry.list_type() {
        ListType::SingleBit => "StatusList",
        ListType::MultiBit => "MultiBitStatusList",
    };
    if registry.encrypted {
        format!("Encrypted{kind}")
    } else {
        kind.to_string()
    }
}

/// Resolver that reports every syntactically valid DID as active.
#[derive(Debug, Default, Clone)]
pub struct PermissiveDidResolver;

#[async_trait]
impl DidResolver for PermissiveDidResolver {
    async fn resolve(&self, did: &Did) -> Result<DidResolution, CollaboratorError> {
        Ok(DidResolution {
            did: did.clone(),
            deactivated: false,
            document: serde_json::json!({ "id": did.as_str() }),
        })
    }
}

/// In-process ledger that keeps every published version in memory.
#[derive(Debug, Default)]
pub struct LocalLedger {
    resources: RwLock<HashMap<RegistryId, Vec<(String, ResourceMetadata)>>>,
}

impl LocalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `id` has been published.
    pub fn publish_count(&self, id: RegistryId) -> usize {
        self.resources.read().get(&id).map_or(0, Vec::len)
    }
}

#[async_trait]
impl LedgerBroadcaster for LocalLedger {
    async fn publish(
        &self,
        registry: &Registry,
        content: &str,
    ) -> Result<PublishReceipt, CollaboratorError> {
        let checksum = Checksum::of(content.as_bytes()).to_hex();
        let mut resources = self.resources.write();
        let versions = resources.entry(registry.id).or_default();
        let metadata = ResourceMetadata {
            resource_uri: registry.uri.clone(),
            resource_collection_id: registry.issuer_did.to_string(),
            resource_id: registry.id.to_string(),
            resource_name: registry.name.clone(),
            resource_type: resource_type_for(registry),
            media_type: "text/plain".to_string(),
            resource_version: versions.len() as u64 + 1,
            checksum: checksum.clone(),
            created: Utc::now(),
        };
        versions.push((content.to_string(), metadata.clone()));
        Ok(PublishReceipt {
            resource_metadata: metadata,
            checksum,
        })
    }

    async fn fetch(&self, registry: &Registry) -> Result<Option<String>, CollaboratorError> {
        Ok(self
            .resources
            .read()
            .get(&registry.id)
            .and_then(|v| v.last())
            .map(|(content, _)| content.clone()))
    }
}

/// Verifier that rejects all evidence. Encrypted registries stay locked
/// until a real verifier is configured.
#[derive(Debug, Default, Clone)]
pub struct RejectingPaymentVerifier;

#[async_trait]
impl PaymentVerifier for RejectingPaymentVerifier {
    async fn verify(
        &self,
        _condition: &PaymentCondition,
        _evidence: &PaymentEvidence,
    ) -> Result<bool, CollaboratorError> {
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::fixtures::registry;

    #[tokio::test]
    async fn local_ledger_versions_and_fetch() {
        let ledger = LocalLedger::new();
        let r = registry("list", 8);
        assert_eq!(ledger.fetch(&r).await.unwrap(), None);

        let first = ledger.publish(&r, "uAAA").await.unwrap();
        let second = ledger.publish(&r, "uBBB").await.unwrap();
        assert_eq!(first.resource_metadata.resource_version, 1);
        assert_eq!(second.resource_metadata.resource_version, 2);
        assert_eq!(second.checksum, Checksum::of(b"uBBB").to_hex());
        assert_eq!(ledger.fetch(&r).await.unwrap().as_deref(), Some("uBBB"));
        assert_eq!(ledger.publish_count(r.id), 2);
    }

    #[tokio::test]
    async fn permissive_resolver_reports_active() {
        let did = Did::new("did:web:example.com").unwrap();
        let res = PermissiveDidResolver.resolve(&did).await.unwrap();
        assert!(!res.deactivated);
        assert_eq!(res.document["id"], "did:web:example.com");
    }

    #[test]
    fn resource_type_reflects_kind_and_encryption() {
        let mut r = registry("list", 8);
        assert_eq!(resource_type_for(&r), "StatusList");
        r.encrypted = true;
        assert_eq!(resource_type_for(&r), "EncryptedStatusList");
    }
}
