//! End-to-end tests of the HTTP surface over the in-memory engine.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use credreg_api::auth::SecretToken;
use credreg_api::{app, AppConfig, AppState};
use credreg_engine::{EngineConfig, RegistryEngine};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

const DID: &str = "did:cheqd:testnet:zApiIntegration";

fn test_app() -> Router {
    test_app_with(AppConfig::default())
}

fn test_app_with(config: AppConfig) -> Router {
    let engine = RegistryEngine::in_memory(EngineConfig {
        standby_threshold: 1.0,
        ..EngineConfig::default()
    });
    app(AppState::with_engine(config, engine, None))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn create(app: &Router, name: &str, size: u64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/v1/registries",
        Some(json!({
            "did": DID,
            "statusListName": name,
            "statusPurpose": "revocation",
            "size": size
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}

async fn allocate(app: &Router, name: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/v1/registries/allocate",
        Some(json!({
            "did": DID,
            "statusListName": name,
            "statusPurpose": "revocation"
        })),
    )
    .await
}

async fn check(app: &Router, name: &str, index: u64) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/v1/registries/check",
        Some(json!({
            "did": DID,
            "statusListName": name,
            "statusPurpose": "revocation",
            "index": index
        })),
    )
    .await
}

#[tokio::test]
async fn allocate_revoke_and_check_round_trip() {
    let app = test_app();
    let created = create(&app, "employees", 1_024).await;
    assert_eq!(created["listType"], "SingleBit");
    assert_eq!(created["state"], "ACTIVE");
    assert_eq!(created["writeCursor"], 0);

    let (status, first) = allocate(&app, "employees").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["index"], 0);
    let (_, second) = allocate(&app, "employees").await;
    assert_eq!(second["index"], 1);

    let (status, report) = check(&app, "employees", 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["revoked"], false);

    let (status, outcome) = send(
        &app,
        "POST",
        "/v1/registries/update",
        Some(json!({
            "statusListId": created["statusListId"],
            "indices": [1],
            "action": "revoke"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "update failed: {outcome}");
    assert_eq!(outcome["updated"], true);
    assert_eq!(outcome["published"], true);
    assert_eq!(outcome["changes"][0]["current"], 1);

    let (_, report) = check(&app, "employees", 1).await;
    assert_eq!(report["revoked"], true);
    let (_, untouched) = check(&app, "employees", 0).await;
    assert_eq!(untouched["revoked"], false);
}

#[tokio::test]
async fn repeated_revocation_is_idempotent() {
    let app = test_app();
    let created = create(&app, "repeat", 64).await;
    let update = json!({
        "statusListId": created["statusListId"],
        "indices": [5],
        "action": "revoke",
        "publish": false
    });
    let (_, first) = send(&app, "POST", "/v1/registries/update", Some(update.clone())).await;
    assert_eq!(first["updated"], true);
    let (status, second) = send(&app, "POST", "/v1/registries/update", Some(update)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["updated"], true);
    assert_eq!(second["changes"][0]["changed"], false);
    assert_eq!(second["version"], first["version"]);
}

#[tokio::test]
async fn exhausted_series_returns_full() {
    let app = test_app();
    create(&app, "tiny", 2).await;
    assert_eq!(allocate(&app, "tiny").await.0, StatusCode::OK);
    assert_eq!(allocate(&app, "tiny").await.0, StatusCode::OK);

    let (status, body) = allocate(&app, "tiny").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "FULL");
}

#[tokio::test]
async fn out_of_range_index_is_rejected() {
    let app = test_app();
    let created = create(&app, "bounded", 16).await;
    let (status, body) = send(
        &app,
        "POST",
        "/v1/registries/update",
        Some(json!({
            "statusListId": created["statusListId"],
            "indices": [3, 16],
            "action": "revoke"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_INDEX");

    // All-or-nothing: index 3 was not touched.
    let (_, report) = check(&app, "bounded", 3).await;
    assert_eq!(report["revoked"], false);
}

#[tokio::test]
async fn list_exposes_exactly_the_listing_fields() {
    let app = test_app();
    create(&app, "listed", 32).await;
    let (status, body) = send(&app, "GET", &format!("/v1/registries?did={DID}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    let mut keys: Vec<&str> = items[0].as_object().unwrap().keys().map(String::as_str).collect();
    keys.sort_unstable();
    let mut expected = vec![
        "statusListId",
        "statusListName",
        "uri",
        "issuerId",
        "previousUri",
        "nextUri",
        "listType",
        "storageType",
        "encrypted",
        "credentialCategory",
        "size",
        "writeCursor",
        "state",
        "createdAt",
        "updatedAt",
        "sealedAt",
        "statusPurpose",
        "deprecated",
    ];
    expected.sort_unstable();
    assert_eq!(keys, expected);
}

#[tokio::test]
async fn list_filters_by_state() {
    let app = test_app();
    create(&app, "filtered", 32).await;
    let (_, active) = send(&app, "GET", "/v1/registries?state=ACTIVE", None).await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    let (_, full) = send(&app, "GET", "/v1/registries?state=FULL", None).await;
    assert!(full.as_array().unwrap().is_empty());
    let (status, _) = send(&app, "GET", "/v1/registries?state=ARCHIVED", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn search_returns_content_and_metadata() {
    let app = test_app();
    create(&app, "searched", 64).await;
    let (status, body) = send(
        &app,
        "GET",
        &format!("/v1/registries/search?did={DID}&statusListName=searched&statusPurpose=revocation"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "search failed: {body}");
    assert_eq!(body["statusListName"], "searched");
    assert_eq!(body["statusSize"], 1);
    assert!(body["content"].is_string());
    assert_eq!(body["paymentConditions"], json!([]));
}

#[tokio::test]
async fn multi_bit_status_codes() {
    let app = test_app();
    let (status, created) = send(
        &app,
        "POST",
        "/v1/registries",
        Some(json!({
            "did": DID,
            "statusListName": "lifecycle",
            "statusPurpose": "message",
            "statusSize": 2,
            "statusMessages": [
                { "status": 0, "message": "valid" },
                { "status": 1, "message": "revoked" },
                { "status": 2, "message": "suspended" },
                { "status": 3, "message": "unknown" }
            ],
            "size": 256
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {created}");
    assert_eq!(created["listType"], "MultiBit");

    let (status, _) = send(
        &app,
        "POST",
        "/v1/registries/update",
        Some(json!({
            "statusListId": created["statusListId"],
            "indices": [9],
            "statusCode": 2,
            "publish": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, report) = send(
        &app,
        "POST",
        "/v1/registries/check",
        Some(json!({
            "did": DID,
            "statusListName": "lifecycle",
            "statusPurpose": "message",
            "index": 9
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["status"], 2);
    assert_eq!(report["message"], "suspended");
}

#[tokio::test]
async fn encrypted_registry_is_gated() {
    let app = test_app();
    let request = json!({
        "did": DID,
        "statusListName": "paid",
        "statusPurpose": "revocation",
        "size": 64
    });

    let (status, _) = send(&app, "POST", "/v1/registries/encrypted", Some(request.clone())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let mut with_conditions = request.clone();
    with_conditions["paymentConditions"] = json!([{
        "address": "cheqd1feecollector",
        "amount": 1000,
        "denom": "ncheq",
        "windowSecs": 600
    }]);

    let (status, _) = send(&app, "POST", "/v1/registries", Some(with_conditions.clone())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, created) =
        send(&app, "POST", "/v1/registries/encrypted", Some(with_conditions)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {created}");
    assert_eq!(created["encrypted"], true);

    let update = json!({
        "statusListId": created["statusListId"],
        "indices": [2],
        "action": "revoke",
        "publish": false
    });
    let (status, _) = send(&app, "POST", "/v1/registries/update", Some(update.clone())).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let (status, _) = send(&app, "POST", "/v1/registries/update/encrypted", Some(update)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = check(&app, "paid", 2).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"]["code"], "PAYMENT_REQUIRED");
}

#[tokio::test]
async fn explicit_seal_then_allocation_is_full() {
    let app = test_app();
    let created = create(&app, "sealed", 128).await;
    let id = created["statusListId"].as_str().unwrap().to_string();

    let (status, outcome) = send(&app, "POST", &format!("/v1/registries/{id}/seal"), None).await;
    assert_eq!(status, StatusCode::OK, "seal failed: {outcome}");
    assert_eq!(outcome["sealed"]["state"], "FULL");
    assert!(outcome["sealed"]["sealedAt"].is_string());
    assert!(outcome["promoted"].is_null());

    let (status, body) = allocate(&app, "sealed").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "FULL");
}

#[tokio::test]
async fn deprecated_registry_refuses_allocation() {
    let app = test_app();
    let created = create(&app, "retired", 16).await;
    let id = created["statusListId"].as_str().unwrap().to_string();

    let (status, view) = send(&app, "POST", &format!("/v1/registries/{id}/deprecate"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["deprecated"], true);

    let (status, _) = allocate(&app, "retired").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn duplicate_name_is_rejected() {
    let app = test_app();
    create(&app, "unique", 16).await;
    let (status, body) = send(
        &app,
        "POST",
        "/v1/registries",
        Some(json!({
            "did": DID,
            "statusListName": "unique",
            "statusPurpose": "revocation"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_registry_is_not_found() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "GET",
        "/v1/registries/00000000-0000-4000-8000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = allocate(&app, "missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/registries")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bearer_token_is_enforced() {
    let app = test_app_with(AppConfig {
        auth_token: Some(SecretToken::new("s3cret")),
        ..AppConfig::default()
    });

    let (status, body) = send(&app, "GET", "/v1/registries", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/registries")
                .header("authorization", "Bearer s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health/readiness")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/v1/registries/allocate"].is_object());
}
