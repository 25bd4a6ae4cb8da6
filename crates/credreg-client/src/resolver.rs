//! Client for a universal DID resolver.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET | `/1.0/identifiers/{did}` | Resolve a DID |
//!
//! The resolver answers with a DID resolution result; only the document and
//! `didDocumentMetadata.deactivated` are used.

use async_trait::async_trait;
use credreg_core::Did;
use credreg_engine::{CollaboratorError, DidResolution, DidResolver};
use serde::Deserialize;

use crate::error::{ensure_success, ClientError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolutionResult {
    #[serde(default)]
    did_document: serde_json::Value,
    #[serde(default)]
    did_document_metadata: DocumentMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct DocumentMetadata {
    #[serde(default)]
    deactivated: bool,
}

/// HTTP DID resolver.
#[derive(Debug, Clone)]
pub struct UniversalResolverClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl UniversalResolverClient {
    pub fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    /// Calls `GET {base_url}/1.0/identifiers/{did}`.
    pub async fn resolve_did(&self, did: &Did) -> Result<DidResolution, ClientError> {
        let endpoint = format!("GET /1.0/identifiers/{did}");
        let url = format!(
            "{}/1.0/identifiers/{did}",
            self.base_url.as_str().trim_end_matches('/')
        );

        let resp = crate::retry::retry_send(&endpoint, || {
            self.http
                .get(&url)
                .header(reqwest::header::ACCEPT, "application/ld+json;profile=\"https://w3id.org/did-resolution\"")
                .send()
        })
        .await
        .map_err(|e| ClientError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        let resp = ensure_success(&endpoint, resp).await?;
        let result: ResolutionResult =
            resp.json().await.map_err(|e| ClientError::Deserialization {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        Ok(DidResolution {
            did: did.clone(),
            deactivated: result.did_document_metadata.deactivated,
            document: result.did_document,
        })
    }
}

#[async_trait]
impl DidResolver for UniversalResolverClient {
    async fn resolve(&self, did: &Did) -> Result<DidResolution, CollaboratorError> {
        self.resolve_did(did).await.map_err(Into::into)
    }
}
