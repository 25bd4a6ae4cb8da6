//! # credreg-api — Axum API Service for the Status Registry
//!
//! HTTP surface over [`credreg_engine::RegistryEngine`].
//!
//! ## API Surface
//!
//! | Route                                   | Module                    | Operation            |
//! |-----------------------------------------|---------------------------|----------------------|
//! | `POST /v1/registries`                   | [`routes::registries`]    | Create registry      |
//! | `POST /v1/registries/encrypted`         | [`routes::registries`]    | Create encrypted     |
//! | `POST /v1/registries/allocate`          | [`routes::registries`]    | Allocate index       |
//! | `GET /v1/registries`                    | [`routes::registries`]    | List registries      |
//! | `GET /v1/registries/search`             | [`routes::registries`]    | Search one registry  |
//! | `GET /v1/registries/:id`                | [`routes::registries`]    | Fetch registry       |
//! | `POST /v1/registries/:id/seal`          | [`routes::registries`]    | Seal and promote     |
//! | `POST /v1/registries/:id/deprecate`     | [`routes::registries`]    | Deprecate            |
//! | `POST /v1/registries/update`            | [`routes::status`]        | Bulk update          |
//! | `POST /v1/registries/update/encrypted`  | [`routes::status`]        | Bulk update (enc.)   |
//! | `POST /v1/registries/check`             | [`routes::status`]        | Check status         |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```
//!
//! Health probes (`/health/liveness`, `/health/readiness`) are mounted
//! outside the auth middleware.
//!
//! ## OpenAPI
//!
//! Generated via utoipa derive macros, served at `/openapi.json`.

pub mod auth;
pub mod db;
pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::{AppConfig, AppState};

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;

/// Assemble the application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    // Body size limit: 2 MiB. Update batches are capped well below it.
    let api = Router::new()
        .merge(routes::registries::router())
        .merge(routes::status::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// Liveness probe: the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: the catalog answers within its time bound.
///
/// Returns 200 "ready" or 503 with a diagnostic message.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.engine.ping().await {
        tracing::warn!(error = %e, "catalog health check failed");
        return (StatusCode::SERVICE_UNAVAILABLE, "catalog unreachable").into_response();
    }
    (StatusCode::OK, "ready").into_response()
}
