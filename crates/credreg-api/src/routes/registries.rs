//! # Registry API
//!
//! Registry creation (plain and encrypted), index allocation, lookup,
//! listing, search, explicit sealing and deprecation.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use credreg_core::{
    CredentialCategory, Did, ListKind, ListType, PaymentCondition, RegistryId, StatusMessage,
    StatusMessages, StatusPurpose, StorageType,
};
use credreg_engine::{Allocation, CreateParams, Registry, RegistryFilter, RegistryRef, SealOutcome};
use credreg_state::{RegistryState, SealReason, TransitionRecord};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, extract_validated_query, Validate};
use crate::state::AppState;

// ── Shared parsing ──────────────────────────────────────────────────────────

pub(crate) fn parse_did(raw: &str) -> Result<Did, AppError> {
    Ok(Did::new(raw.trim())?)
}

pub(crate) fn parse_purpose(raw: &str) -> Result<StatusPurpose, AppError> {
    StatusPurpose::from_name(raw).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown statusPurpose \"{raw}\" (expected revocation, suspension or message)"
        ))
    })
}

pub(crate) fn parse_list_type(raw: &str) -> Result<ListType, AppError> {
    ListType::from_name(raw).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown listType \"{raw}\" (expected SingleBit or MultiBit)"
        ))
    })
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    Ok(())
}

/// One purpose or several.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum PurposeInput {
    One(String),
    Many(Vec<String>),
}

impl PurposeInput {
    fn names(&self) -> Vec<&str> {
        match self {
            Self::One(p) => vec![p.as_str()],
            Self::Many(ps) => ps.iter().map(String::as_str).collect(),
        }
    }

    fn parse(&self) -> Result<Vec<StatusPurpose>, AppError> {
        self.names().into_iter().map(parse_purpose).collect()
    }
}

/// How requests name a registry: by id, or by issuer + name + purpose.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySelector {
    #[serde(default)]
    pub status_list_id: Option<Uuid>,
    #[serde(default)]
    pub did: Option<String>,
    #[serde(default)]
    pub status_list_name: Option<String>,
    #[serde(default)]
    pub status_purpose: Option<String>,
    #[serde(default)]
    pub list_type: Option<String>,
}

impl RegistrySelector {
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.status_list_id.is_some() {
            return Ok(());
        }
        match (&self.did, &self.status_list_name, &self.status_purpose) {
            (Some(did), Some(name), Some(purpose)) => {
                require("did", did)?;
                require("statusListName", name)?;
                require("statusPurpose", purpose)
            }
            _ => Err(
                "either statusListId or did, statusListName and statusPurpose are required"
                    .to_string(),
            ),
        }
    }

    pub(crate) fn to_ref(&self) -> Result<RegistryRef, AppError> {
        if let Some(id) = self.status_list_id {
            return Ok(RegistryRef::Id(RegistryId::from_uuid(id)));
        }
        let (Some(did), Some(name), Some(purpose)) =
            (&self.did, &self.status_list_name, &self.status_purpose)
        else {
            return Err(AppError::Validation(
                "either statusListId or did, statusListName and statusPurpose are required".into(),
            ));
        };
        Ok(RegistryRef::Name {
            did: parse_did(did)?,
            name: name.clone(),
            purpose: parse_purpose(purpose)?,
            list_type: self.list_type.as_deref().map(parse_list_type).transpose()?,
        })
    }
}

// ── Response DTOs ───────────────────────────────────────────────────────────

/// Registry as exposed by list and search.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistryView {
    pub status_list_id: Uuid,
    pub status_list_name: String,
    pub uri: String,
    pub issuer_id: String,
    pub previous_uri: Option<String>,
    pub next_uri: Option<String>,
    pub list_type: String,
    pub storage_type: String,
    pub encrypted: bool,
    pub credential_category: String,
    pub size: u64,
    pub write_cursor: u64,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub sealed_at: Option<DateTime<Utc>>,
    pub status_purpose: Vec<String>,
    pub deprecated: bool,
}

impl From<&Registry> for RegistryView {
    fn from(r: &Registry) -> Self {
        Self {
            status_list_id: *r.id.as_uuid(),
            status_list_name: r.name.clone(),
            uri: r.uri.clone(),
            issuer_id: r.issuer_did.to_string(),
            previous_uri: r.chain.previous_uri.clone(),
            next_uri: r.chain.next_uri.clone(),
            list_type: r.list_type().to_string(),
            storage_type: r.storage_type.to_string(),
            encrypted: r.encrypted,
            credential_category: r.credential_category.to_string(),
            size: r.size,
            write_cursor: r.write_cursor,
            state: r.state.to_string(),
            created_at: r.created_at,
            updated_at: r.updated_at,
            sealed_at: r.sealed_at,
            status_purpose: r.purposes().iter().map(|p| p.to_string()).collect(),
            deprecated: r.deprecated,
        }
    }
}

/// Search result: the listing fields plus raw content and code table.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchView {
    #[serde(flatten)]
    pub registry: RegistryView,
    /// Encoded list; ciphertext envelope for encrypted registries.
    pub content: Option<String>,
    pub status_size: u8,
    #[schema(value_type = Option<Vec<Object>>)]
    pub status_messages: Option<Vec<StatusMessage>>,
    #[schema(value_type = Vec<Object>)]
    pub payment_conditions: Vec<PaymentCondition>,
}

impl From<&Registry> for SearchView {
    fn from(r: &Registry) -> Self {
        Self {
            registry: RegistryView::from(r),
            content: r.content.clone(),
            status_size: r.status_size(),
            status_messages: r.kind.messages().map(|m| m.iter().cloned().collect()),
            payment_conditions: r.payment_conditions.clone(),
        }
    }
}

/// A single registry with its series position.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistryDetail {
    #[serde(flatten)]
    pub registry: RegistryView,
    pub series_id: Uuid,
    pub ordinal: u32,
    pub version: u64,
    pub status_size: u8,
    #[schema(value_type = Option<Vec<Object>>)]
    pub status_messages: Option<Vec<StatusMessage>>,
    #[schema(value_type = Vec<Object>)]
    pub payment_conditions: Vec<PaymentCondition>,
}

impl From<&Registry> for RegistryDetail {
    fn from(r: &Registry) -> Self {
        Self {
            registry: RegistryView::from(r),
            series_id: *r.series_id.as_uuid(),
            ordinal: r.ordinal,
            version: r.version,
            status_size: r.status_size(),
            status_messages: r.kind.messages().map(|m| m.iter().cloned().collect()),
            payment_conditions: r.payment_conditions.clone(),
        }
    }
}

// ── Create ──────────────────────────────────────────────────────────────────

/// Request to create a registry.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistryRequest {
    pub did: String,
    pub status_list_name: String,
    pub status_purpose: PurposeInput,
    /// `SingleBit` or `MultiBit`. Inferred from `statusSize` / `statusMessages`
    /// when absent.
    #[serde(default)]
    pub list_type: Option<String>,
    #[serde(default)]
    pub status_size: Option<u8>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub status_messages: Option<Vec<StatusMessage>>,
    /// Number of indices; the service default when absent.
    #[serde(default)]
    pub size: Option<u64>,
    /// `ledger` (default) or `local`.
    #[serde(default)]
    pub storage_type: Option<String>,
    /// `credential` (default) or `accreditation`.
    #[serde(default)]
    pub credential_category: Option<String>,
    /// Required for encrypted registries, rejected otherwise.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub payment_conditions: Vec<PaymentCondition>,
    /// Create the registry as the successor of this one.
    #[serde(default)]
    pub successor_of: Option<Uuid>,
}

impl Validate for CreateRegistryRequest {
    fn validate(&self) -> Result<(), String> {
        require("did", &self.did)?;
        require("statusListName", &self.status_list_name)?;
        if self.status_purpose.names().is_empty() {
            return Err("statusPurpose must name at least one purpose".to_string());
        }
        if self.size == Some(0) {
            return Err("size must be positive".to_string());
        }
        Ok(())
    }
}

impl CreateRegistryRequest {
    fn kind(&self) -> Result<ListKind, AppError> {
        let purposes = self.status_purpose.parse()?;
        let list_type = match self.list_type.as_deref() {
            Some(raw) => parse_list_type(raw)?,
            None if self.status_size.unwrap_or(1) > 1 || self.status_messages.is_some() => {
                ListType::MultiBit
            }
            None => ListType::SingleBit,
        };

        match list_type {
            ListType::SingleBit => {
                if self.status_size.is_some_and(|s| s != 1) {
                    return Err(AppError::Validation(
                        "SingleBit lists have a statusSize of 1".into(),
                    ));
                }
                let [purpose] = purposes.as_slice() else {
                    return Err(AppError::Validation(
                        "SingleBit lists serve exactly one statusPurpose".into(),
                    ));
                };
                Ok(ListKind::single_bit(*purpose)?)
            }
            ListType::MultiBit => {
                let status_size = self.status_size.ok_or_else(|| {
                    AppError::Validation("statusSize is required for MultiBit lists".into())
                })?;
                let messages = self.status_messages.clone().ok_or_else(|| {
                    AppError::Validation("statusMessages are required for MultiBit lists".into())
                })?;
                Ok(ListKind::multi_bit(
                    status_size,
                    StatusMessages::new(messages),
                    purposes,
                )?)
            }
        }
    }

    fn into_params(self, encrypted: bool) -> Result<CreateParams, AppError> {
        let kind = self.kind()?;
        let mut params = CreateParams::new(self.status_list_name, parse_did(&self.did)?, kind);
        if let Some(raw) = self.storage_type.as_deref() {
            params.storage_type = StorageType::from_name(raw).ok_or_else(|| {
                AppError::Validation(format!(
                    "unknown storageType \"{raw}\" (expected ledger or local)"
                ))
            })?;
        }
        if let Some(raw) = self.credential_category.as_deref() {
            params.credential_category = CredentialCategory::from_name(raw).ok_or_else(|| {
                AppError::Validation(format!(
                    "unknown credentialCategory \"{raw}\" (expected credential or accreditation)"
                ))
            })?;
        }
        params.size = self.size;
        params.encrypted = encrypted;
        params.payment_conditions = self.payment_conditions;
        params.successor_of = self.successor_of.map(RegistryId::from_uuid);
        Ok(params)
    }
}

/// Build the registries router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/registries", post(create_registry).get(list_registries))
        .route("/v1/registries/encrypted", post(create_encrypted_registry))
        .route("/v1/registries/allocate", post(allocate_index))
        .route("/v1/registries/search", get(search_registry))
        .route("/v1/registries/:id", get(get_registry))
        .route("/v1/registries/:id/seal", post(seal_registry))
        .route("/v1/registries/:id/deprecate", post(deprecate_registry))
}

/// POST /v1/registries — Create an unencrypted registry.
#[utoipa::path(
    post,
    path = "/v1/registries",
    request_body = CreateRegistryRequest,
    responses(
        (status = 201, description = "Registry created", body = RegistryDetail),
        (status = 409, description = "Name already in use", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid parameters", body = crate::error::ErrorBody),
    ),
    tag = "registries"
)]
pub(crate) async fn create_registry(
    State(state): State<AppState>,
    body: Result<Json<CreateRegistryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegistryDetail>), AppError> {
    let req = extract_validated_json(body)?;
    if !req.payment_conditions.is_empty() {
        return Err(AppError::Validation(
            "paymentConditions are only accepted by /v1/registries/encrypted".into(),
        ));
    }
    let registry = state.engine.create(req.into_params(false)?).await?;
    Ok((StatusCode::CREATED, Json(RegistryDetail::from(&registry))))
}

/// POST /v1/registries/encrypted — Create an encrypted registry.
#[utoipa::path(
    post,
    path = "/v1/registries/encrypted",
    request_body = CreateRegistryRequest,
    responses(
        (status = 201, description = "Encrypted registry created", body = RegistryDetail),
        (status = 422, description = "Invalid parameters", body = crate::error::ErrorBody),
    ),
    tag = "registries"
)]
pub(crate) async fn create_encrypted_registry(
    State(state): State<AppState>,
    body: Result<Json<CreateRegistryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegistryDetail>), AppError> {
    let req = extract_validated_json(body)?;
    if req.payment_conditions.is_empty() {
        return Err(AppError::Validation(
            "encrypted registries require at least one payment condition".into(),
        ));
    }
    let registry = state.engine.create(req.into_params(true)?).await?;
    Ok((StatusCode::CREATED, Json(RegistryDetail::from(&registry))))
}

// ── Allocate ────────────────────────────────────────────────────────────────

/// Request to allocate the next free index.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocateRequest {
    #[serde(flatten)]
    pub registry: RegistrySelector,
}

impl Validate for AllocateRequest {
    fn validate(&self) -> Result<(), String> {
        self.registry.check()
    }
}

/// An allocated index.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub status_list_id: Uuid,
    pub uri: String,
    pub index: u64,
    pub version: u64,
    pub standby_requested: bool,
}

impl From<Allocation> for AllocationResponse {
    fn from(a: Allocation) -> Self {
        Self {
            status_list_id: *a.registry_id.as_uuid(),
            uri: a.uri,
            index: a.index,
            version: a.version,
            standby_requested: a.standby_requested,
        }
    }
}

/// POST /v1/registries/allocate — Reserve the next index of a series.
#[utoipa::path(
    post,
    path = "/v1/registries/allocate",
    request_body = AllocateRequest,
    responses(
        (status = 200, description = "Index allocated", body = AllocationResponse),
        (status = 404, description = "Registry not found", body = crate::error::ErrorBody),
        (status = 409, description = "Series full or contended", body = crate::error::ErrorBody),
    ),
    tag = "registries"
)]
pub(crate) async fn allocate_index(
    State(state): State<AppState>,
    body: Result<Json<AllocateRequest>, JsonRejection>,
) -> Result<Json<AllocationResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let allocation = state.engine.allocate(&req.registry.to_ref()?).await?;
    Ok(Json(allocation.into()))
}

// ── Read ────────────────────────────────────────────────────────────────────

/// GET /v1/registries/:id — Fetch one registry.
#[utoipa::path(
    get,
    path = "/v1/registries/{id}",
    params(("id" = Uuid, Path, description = "Registry ID")),
    responses(
        (status = 200, description = "Registry found", body = RegistryDetail),
        (status = 404, description = "Registry not found", body = crate::error::ErrorBody),
    ),
    tag = "registries"
)]
pub(crate) async fn get_registry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistryDetail>, AppError> {
    let registry = state.engine.get(RegistryId::from_uuid(id)).await?;
    Ok(Json(RegistryDetail::from(&registry)))
}

/// Listing filters. Unset filters match everything.
#[derive(Debug, Default, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub did: Option<String>,
    pub state: Option<String>,
    pub status_list_name: Option<String>,
    pub list_type: Option<String>,
    pub credential_category: Option<String>,
    pub deprecated: Option<bool>,
}

impl Validate for ListQuery {
    fn validate(&self) -> Result<(), String> {
        if let Some(state) = &self.state {
            if RegistryState::from_name(state).is_none() {
                return Err(format!(
                    "unknown state \"{state}\" (expected ACTIVE, STANDBY or FULL)"
                ));
            }
        }
        Ok(())
    }
}

impl ListQuery {
    fn to_filter(&self) -> Result<RegistryFilter, AppError> {
        Ok(RegistryFilter {
            did: self.did.as_deref().map(parse_did).transpose()?,
            state: self.state.as_deref().and_then(RegistryState::from_name),
            name: self.status_list_name.clone(),
            list_type: self.list_type.as_deref().map(parse_list_type).transpose()?,
            credential_category: self
                .credential_category
                .as_deref()
                .map(|raw| {
                    CredentialCategory::from_name(raw).ok_or_else(|| {
                        AppError::Validation(format!("unknown credentialCategory \"{raw}\""))
                    })
                })
                .transpose()?,
            deprecated: self.deprecated,
            purpose: None,
        })
    }
}

/// GET /v1/registries — List registries.
#[utoipa::path(
    get,
    path = "/v1/registries",
    params(ListQuery),
    responses(
        (status = 200, description = "Matching registries", body = Vec<RegistryView>),
    ),
    tag = "registries"
)]
pub(crate) async fn list_registries(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<RegistryView>>, AppError> {
    let query = extract_validated_query(query)?;
    let registries = state.engine.list(&query.to_filter()?).await?;
    Ok(Json(registries.iter().map(RegistryView::from).collect()))
}

/// Search parameters.
#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    pub did: String,
    pub status_list_name: String,
    pub status_purpose: String,
    pub list_type: Option<String>,
}

impl Validate for SearchQuery {
    fn validate(&self) -> Result<(), String> {
        require("did", &self.did)?;
        require("statusListName", &self.status_list_name)?;
        require("statusPurpose", &self.status_purpose)
    }
}

/// GET /v1/registries/search — Raw content and metadata of one registry.
#[utoipa::path(
    get,
    path = "/v1/registries/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Registry found", body = SearchView),
        (status = 404, description = "Registry not found", body = crate::error::ErrorBody),
    ),
    tag = "registries"
)]
pub(crate) async fn search_registry(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<SearchView>, AppError> {
    let query = extract_validated_query(query)?;
    let reference = RegistryRef::Name {
        did: parse_did(&query.did)?,
        name: query.status_list_name.clone(),
        purpose: parse_purpose(&query.status_purpose)?,
        list_type: query.list_type.as_deref().map(parse_list_type).transpose()?,
    };
    let registry = state.engine.search(&reference).await?;
    Ok(Json(SearchView::from(&registry)))
}

// ── Lifecycle ───────────────────────────────────────────────────────────────

/// Outcome of an explicit seal.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SealResponse {
    pub sealed: RegistryView,
    pub promoted: Option<RegistryView>,
    #[schema(value_type = Vec<Object>)]
    pub transitions: Vec<TransitionRecord>,
}

impl From<SealOutcome> for SealResponse {
    fn from(outcome: SealOutcome) -> Self {
        Self {
            sealed: RegistryView::from(&outcome.sealed),
            promoted: outcome.promoted.as_ref().map(RegistryView::from),
            transitions: outcome.transitions,
        }
    }
}

/// POST /v1/registries/:id/seal — Seal a registry and promote its standby.
#[utoipa::path(
    post,
    path = "/v1/registries/{id}/seal",
    params(("id" = Uuid, Path, description = "Registry ID")),
    responses(
        (status = 200, description = "Registry sealed", body = SealResponse),
        (status = 404, description = "Registry not found", body = crate::error::ErrorBody),
        (status = 409, description = "Registry cannot be sealed", body = crate::error::ErrorBody),
    ),
    tag = "registries"
)]
pub(crate) async fn seal_registry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SealResponse>, AppError> {
    let reference = RegistryRef::Id(RegistryId::from_uuid(id));
    let outcome = state.engine.seal(&reference, SealReason::Explicit).await?;
    Ok(Json(outcome.into()))
}

/// POST /v1/registries/:id/deprecate — Mark a registry deprecated.
#[utoipa::path(
    post,
    path = "/v1/registries/{id}/deprecate",
    params(("id" = Uuid, Path, description = "Registry ID")),
    responses(
        (status = 200, description = "Registry deprecated", body = RegistryView),
        (status = 404, description = "Registry not found", body = crate::error::ErrorBody),
    ),
    tag = "registries"
)]
pub(crate) async fn deprecate_registry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistryView>, AppError> {
    let registry = state
        .engine
        .deprecate(&RegistryRef::Id(RegistryId::from_uuid(id)))
        .await?;
    Ok(Json(RegistryView::from(&registry)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create(body: serde_json::Value) -> CreateRegistryRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn single_purpose_defaults_to_single_bit() {
        let req = create(json!({
            "did": "did:cheqd:testnet:zRoutes",
            "statusListName": "employees",
            "statusPurpose": "revocation"
        }));
        assert_eq!(
            req.kind().unwrap(),
            ListKind::single_bit(StatusPurpose::Revocation).unwrap()
        );
    }

    #[test]
    fn status_messages_imply_multi_bit() {
        let req = create(json!({
            "did": "did:cheqd:testnet:zRoutes",
            "statusListName": "states",
            "statusPurpose": ["revocation", "suspension"],
            "statusSize": 2,
            "statusMessages": [
                { "status": 0, "message": "valid" },
                { "status": 1, "message": "revoked" },
                { "status": 2, "message": "suspended" },
                { "status": 3, "message": "unknown" }
            ]
        }));
        let kind = req.kind().unwrap();
        assert_eq!(kind.list_type(), ListType::MultiBit);
        assert_eq!(kind.status_size(), 2);
        assert!(kind.serves(StatusPurpose::Suspension));
    }

    #[test]
    fn single_bit_with_two_purposes_rejected() {
        let req = create(json!({
            "did": "did:cheqd:testnet:zRoutes",
            "statusListName": "both",
            "listType": "SingleBit",
            "statusPurpose": ["revocation", "suspension"]
        }));
        assert!(matches!(req.kind(), Err(AppError::Validation(_))));
    }

    #[test]
    fn multi_bit_without_messages_rejected() {
        let req = create(json!({
            "did": "did:cheqd:testnet:zRoutes",
            "statusListName": "bare",
            "listType": "MultiBit",
            "statusSize": 2,
            "statusPurpose": "message"
        }));
        assert!(matches!(req.kind(), Err(AppError::Validation(_))));
    }

    #[test]
    fn selector_requires_id_or_name_triple() {
        let empty = RegistrySelector::default();
        assert!(empty.check().is_err());

        let by_name = RegistrySelector {
            did: Some("did:cheqd:testnet:zRoutes".into()),
            status_list_name: Some("employees".into()),
            status_purpose: Some("revocation".into()),
            ..RegistrySelector::default()
        };
        assert!(by_name.check().is_ok());
        assert!(matches!(by_name.to_ref().unwrap(), RegistryRef::Name { .. }));

        let by_id = RegistrySelector {
            status_list_id: Some(Uuid::new_v4()),
            ..RegistrySelector::default()
        };
        assert!(matches!(by_id.to_ref().unwrap(), RegistryRef::Id(_)));
    }

    #[test]
    fn list_query_rejects_unknown_state() {
        let query = ListQuery {
            state: Some("ARCHIVED".into()),
            ..ListQuery::default()
        };
        assert!(query.validate().is_err());
    }
}
