//! Client for the payment verification service.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST | `/verify` | Confirm a payment against a condition |

use async_trait::async_trait;
use credreg_core::{PaymentCondition, PaymentEvidence};
use credreg_engine::{CollaboratorError, PaymentVerifier};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_success, ClientError};

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    condition: &'a PaymentCondition,
    evidence: &'a PaymentEvidence,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    verified: bool,
}

/// HTTP payment verifier.
#[derive(Debug, Clone)]
pub struct PaymentVerifierClient {
    http: reqwest::Client,
    base_url: url::Url,
}

impl PaymentVerifierClient {
    pub fn new(http: reqwest::Client, base_url: url::Url) -> Self {
        Self { http, base_url }
    }

    /// Calls `POST {base_url}/verify`.
    pub async fn verify_payment(
        &self,
        condition: &PaymentCondition,
        evidence: &PaymentEvidence,
    ) -> Result<bool, ClientError> {
        let endpoint = "POST /verify";
        let url = format!("{}/verify", self.base_url.as_str().trim_end_matches('/'));
        let body = VerifyRequest {
            condition,
            evidence,
        };

        let resp = crate::retry::retry_send(endpoint, || self.http.post(&url).json(&body).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.into(),
                source: e,
            })?;
        let resp = ensure_success(endpoint, resp).await?;
        let verdict: VerifyResponse = resp.json().await.map_err(|e| ClientError::Deserialization {
            endpoint: endpoint.into(),
            source: e,
        })?;
        if !verdict.verified {
            tracing::warn!(tx_hash = %evidence.tx_hash, "payment verifier rejected transaction");
        }
        Ok(verdict.verified)
    }
}

#[async_trait]
impl PaymentVerifier for PaymentVerifierClient {
    async fn verify(
        &self,
        condition: &PaymentCondition,
        evidence: &PaymentEvidence,
    ) -> Result<bool, CollaboratorError> {
        self.verify_payment(condition, evidence)
            .await
            .map_err(Into::into)
    }
}
