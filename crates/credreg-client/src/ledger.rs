//! Client for the resource ledger.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | `/resources` | Publish a new version of a resource |
//! | GET | `/resources/{id}` | Latest content of a resource (`text/plain`) |
//!
//! The ledger returns the metadata of the published version. The checksum
//! it reports must equal the SHA-256 of the content that was sent.

use async_trait::async_trait;
use credreg_crypto::Checksum;
use credreg_engine::{
    resource_type_for, CollaboratorError, LedgerBroadcaster, PublishReceipt, Registry,
    ResourceMetadata,
};
use serde::Serialize;

use crate::error::{ensure_success, ClientError};

/// Body of `POST /resources`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResourceRequest<'a> {
    pub collection_id: &'a str,
    pub resource_id: String,
    pub name: &'a str,
    pub resource_type: String,
    pub media_type: &'static str,
    pub uri: &'a str,
    pub data: &'a str,
}

/// HTTP ledger broadcaster.
#[derive(Debug, Clone)]
pub struct ResourceLedgerClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl ResourceLedgerClient {
    pub fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Calls `POST {base_url}/resources`.
    pub async fn publish_resource(
        &self,
        registry: &Registry,
        content: &str,
    ) -> Result<PublishReceipt, ClientError> {
        let endpoint = "POST /resources";
        let url = self.url("/resources");
        let body = PublishResourceRequest {
            collection_id: registry.issuer_did.as_str(),
            resource_id: registry.id.to_string(),
            name: &registry.name,
            resource_type: resource_type_for(registry),
            media_type: "text/plain",
            uri: &registry.uri,
            data: content,
        };

        let resp = crate::retry::retry_send(endpoint, || self.http.post(&url).json(&body).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        let resp = ensure_success(endpoint, resp).await?;
        let metadata: ResourceMetadata =
            resp.json().await.map_err(|e| ClientError::Deserialization {
                endpoint: endpoint.into(),
                source: e,
            })?;

        let checksum = Checksum::of(content.as_bytes()).to_hex();
        if !metadata.checksum.eq_ignore_ascii_case(&checksum) {
            return Err(ClientError::Unexpected {
                endpoint: endpoint.into(),
                reason: format!(
                    "ledger reported checksum {} for content with checksum {checksum}",
                    metadata.checksum
                ),
            });
        }
        Ok(PublishReceipt {
            resource_metadata: metadata,
            checksum,
        })
    }

    /// Calls `GET {base_url}/resources/{id}`. Returns `None` on 404.
    pub async fn fetch_resource(&self, registry: &Registry) -> Result<Option<String>, ClientError> {
        let endpoint = format!("GET /resources/{}", registry.id);
        let url = self.url(&format!("/resources/{}", registry.id));

        let resp = crate::retry::retry_send(&endpoint, || self.http.get(&url).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = ensure_success(&endpoint, resp).await?;
        let content = resp.text().await.map_err(|e| ClientError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        Ok(Some(content.trim().to_string()))
    }
}

#[async_trait]
impl LedgerBroadcaster for ResourceLedgerClient {
    async fn publish(
        &self,
        registry: &Registry,
        content: &str,
    ) -> Result<PublishReceipt, CollaboratorError> {
        self.publish_resource(registry, content)
            .await
            .map_err(Into::into)
    }

    async fn fetch(&self, registry: &Registry) -> Result<Option<String>, CollaboratorError> {
        self.fetch_resource(registry).await.map_err(Into::into)
    }
}
