//! # Status API
//!
//! Bulk status updates over a batch of indices and single-index status
//! checks. Encrypted registries are updated through their own route and
//! checked only with payment evidence.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use credreg_core::{PaymentEvidence, StatusChange};
use credreg_engine::{CheckRequest, IndexChange, ResourceMetadata, StatusReport, UpdateOutcome, UpdateRequest};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::registries::{parse_did, parse_list_type, parse_purpose, RegistrySelector};
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Upper bound on indices in one update batch.
pub const MAX_BATCH: usize = 10_000;

/// Build the status router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/registries/update", post(update_status))
        .route("/v1/registries/update/encrypted", post(update_encrypted_status))
        .route("/v1/registries/check", post(check_status))
}

// ── Update ──────────────────────────────────────────────────────────────────

/// Request to change the status of a batch of indices.
///
/// Exactly one of `action` (`revoke`, `suspend`, `reinstate`) or
/// `statusCode` is given. `statusCode` applies to multi-bit lists only.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    #[serde(flatten)]
    pub registry: RegistrySelector,
    pub indices: Vec<u64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub status_code: Option<u32>,
    /// Publish the new content to the ledger after committing.
    #[serde(default = "default_publish")]
    pub publish: bool,
}

fn default_publish() -> bool {
    true
}

impl Validate for UpdateStatusRequest {
    fn validate(&self) -> Result<(), String> {
        self.registry.check()?;
        if self.indices.is_empty() {
            return Err("indices must not be empty".to_string());
        }
        if self.indices.len() > MAX_BATCH {
            return Err(format!("at most {MAX_BATCH} indices per update"));
        }
        match (&self.action, self.status_code) {
            (Some(_), Some(_)) => Err("give either action or statusCode, not both".to_string()),
            (None, None) => Err("one of action or statusCode is required".to_string()),
            _ => Ok(()),
        }
    }
}

impl UpdateStatusRequest {
    fn change(&self) -> Result<StatusChange, AppError> {
        if let Some(code) = self.status_code {
            return Ok(StatusChange::Code(code));
        }
        match self.action.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("revoke") => Ok(StatusChange::Revoke),
            Some("suspend") => Ok(StatusChange::Suspend),
            Some("reinstate") => Ok(StatusChange::Reinstate),
            Some(other) => Err(AppError::Validation(format!(
                "unknown action \"{other}\" (expected revoke, suspend or reinstate)"
            ))),
            None => Err(AppError::Validation(
                "one of action or statusCode is required".into(),
            )),
        }
    }

    fn into_engine(self, expect_encrypted: bool) -> Result<UpdateRequest, AppError> {
        Ok(UpdateRequest {
            registry: self.registry.to_ref()?,
            change: self.change()?,
            indices: self.indices,
            publish: self.publish,
            expect_encrypted: Some(expect_encrypted),
        })
    }
}

/// Outcome at one index.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IndexChangeView {
    pub index: u64,
    pub previous: u32,
    pub current: u32,
    pub changed: bool,
}

impl From<IndexChange> for IndexChangeView {
    fn from(c: IndexChange) -> Self {
        Self {
            index: c.index,
            previous: c.previous,
            current: c.current,
            changed: c.changed,
        }
    }
}

/// Result of a bulk update.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusResponse {
    pub status_list_id: Uuid,
    /// Whether the batch was applied. Per-index `changed` flags show no-ops.
    pub updated: bool,
    pub changes: Vec<IndexChangeView>,
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub resource_metadata: Option<ResourceMetadata>,
    /// Set when the commit succeeded but publication did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_error: Option<String>,
}

impl From<UpdateOutcome> for UpdateStatusResponse {
    fn from(o: UpdateOutcome) -> Self {
        Self {
            status_list_id: *o.registry_id.as_uuid(),
            updated: o.updated,
            changes: o.changes.into_iter().map(IndexChangeView::from).collect(),
            version: o.version,
            published: o.published,
            resource_metadata: o.resource_metadata,
            publish_error: o.publish_error,
        }
    }
}

/// POST /v1/registries/update — Change statuses on an unencrypted registry.
#[utoipa::path(
    post,
    path = "/v1/registries/update",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Batch applied", body = UpdateStatusResponse),
        (status = 400, description = "Index out of range", body = crate::error::ErrorBody),
        (status = 404, description = "Registry not found", body = crate::error::ErrorBody),
        (status = 409, description = "Concurrent modification", body = crate::error::ErrorBody),
    ),
    tag = "status"
)]
pub(crate) async fn update_status(
    State(state): State<AppState>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<UpdateStatusResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let outcome = state.engine.apply(req.into_engine(false)?).await?;
    Ok(Json(outcome.into()))
}

/// POST /v1/registries/update/encrypted — Change statuses on an encrypted registry.
#[utoipa::path(
    post,
    path = "/v1/registries/update/encrypted",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Batch applied", body = UpdateStatusResponse),
        (status = 404, description = "Registry not found", body = crate::error::ErrorBody),
        (status = 422, description = "Registry is not encrypted", body = crate::error::ErrorBody),
    ),
    tag = "status"
)]
pub(crate) async fn update_encrypted_status(
    State(state): State<AppState>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<UpdateStatusResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let outcome = state.engine.apply(req.into_engine(true)?).await?;
    Ok(Json(outcome.into()))
}

// ── Check ───────────────────────────────────────────────────────────────────

/// Request to read the status at one index.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckStatusRequest {
    pub did: String,
    pub status_list_name: String,
    pub index: u64,
    pub status_purpose: String,
    #[serde(default)]
    pub list_type: Option<String>,
    /// Required for encrypted registries.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub payment_evidence: Option<PaymentEvidence>,
}

impl Validate for CheckStatusRequest {
    fn validate(&self) -> Result<(), String> {
        if self.did.trim().is_empty() {
            return Err("did must not be empty".to_string());
        }
        if self.status_list_name.trim().is_empty() {
            return Err("statusListName must not be empty".to_string());
        }
        Ok(())
    }
}

/// Status at one index. Single-bit lists report `revoked` or `suspended`;
/// multi-bit lists report `status` and its `message`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusReportResponse {
    pub status_list_id: Uuid,
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

impl From<StatusReport> for StatusReportResponse {
    fn from(r: StatusReport) -> Self {
        Self {
            status_list_id: *r.registry_id.as_uuid(),
            index: r.index,
            revoked: r.revoked,
            suspended: r.suspended,
            status: r.status,
            message: r.message,
        }
    }
}

/// POST /v1/registries/check — Read the status at one index.
#[utoipa::path(
    post,
    path = "/v1/registries/check",
    request_body = CheckStatusRequest,
    responses(
        (status = 200, description = "Status read", body = StatusReportResponse),
        (status = 400, description = "Index out of range", body = crate::error::ErrorBody),
        (status = 402, description = "Payment evidence missing or insufficient", body = crate::error::ErrorBody),
        (status = 404, description = "Registry not found", body = crate::error::ErrorBody),
    ),
    tag = "status"
)]
pub(crate) async fn check_status(
    State(state): State<AppState>,
    body: Result<Json<CheckStatusRequest>, JsonRejection>,
) -> Result<Json<StatusReportResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let request = CheckRequest {
        did: parse_did(&req.did)?,
        status_list_name: req.status_list_name,
        index: req.index,
        purpose: parse_purpose(&req.status_purpose)?,
        list_type: req.list_type.as_deref().map(parse_list_type).transpose()?,
        payment_evidence: req.payment_evidence,
    };
    let report = state.engine.check(&request).await?;
    Ok(Json(report.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(body: serde_json::Value) -> UpdateStatusRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn action_maps_to_change() {
        let req = update(json!({
            "statusListId": Uuid::new_v4(),
            "indices": [1, 2],
            "action": "Suspend"
        }));
        assert!(req.validate().is_ok());
        assert_eq!(req.change().unwrap(), StatusChange::Suspend);
        assert!(req.publish);
    }

    #[test]
    fn status_code_maps_to_code_change() {
        let req = update(json!({
            "statusListId": Uuid::new_v4(),
            "indices": [7],
            "statusCode": 3,
            "publish": false
        }));
        assert_eq!(req.change().unwrap(), StatusChange::Code(3));
        assert!(!req.publish);
    }

    #[test]
    fn action_and_code_together_rejected() {
        let req = update(json!({
            "statusListId": Uuid::new_v4(),
            "indices": [7],
            "action": "revoke",
            "statusCode": 1
        }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn empty_batch_rejected() {
        let req = update(json!({
            "statusListId": Uuid::new_v4(),
            "indices": [],
            "action": "revoke"
        }));
        assert!(req.validate().is_err());
    }

    #[test]
    fn unknown_action_rejected() {
        let req = update(json!({
            "statusListId": Uuid::new_v4(),
            "indices": [0],
            "action": "expire"
        }));
        assert!(matches!(req.change(), Err(AppError::Validation(_))));
    }

    #[test]
    fn encrypted_route_pins_expectation() {
        let req = update(json!({
            "did": "did:cheqd:testnet:zStatus",
            "statusListName": "employees",
            "statusPurpose": "revocation",
            "indices": [0],
            "action": "revoke"
        }));
        let engine_req = req.into_engine(true).unwrap();
        assert_eq!(engine_req.expect_encrypted, Some(true));
        assert_eq!(engine_req.change, StatusChange::Revoke);
    }
}
