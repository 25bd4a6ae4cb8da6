//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI spec served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::state::AppState;

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Static bearer token. Set via the AUTH_TOKEN env var."))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI spec for the registry API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "credreg API",
        version = "0.1.0",
        description = "Credential status registry and allocation engine.\n\nProvides:\n- **Registries**: single-bit and multi-bit status lists, optionally encrypted behind payment conditions\n- **Allocation**: unique indices across an unbounded series of fixed-size registries\n- **Status**: bulk updates and single-index checks\n\nAuthentication: Bearer token via `Authorization: Bearer <token>` header when configured. Health probes (`/health/*`) are unauthenticated.",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    security(
        ("bearer_auth" = [])
    ),
    paths(
        // ── Registries ──────────────────────────────────────────────────
        crate::routes::registries::create_registry,
        crate::routes::registries::create_encrypted_registry,
        crate::routes::registries::allocate_index,
        crate::routes::registries::get_registry,
        crate::routes::registries::list_registries,
        crate::routes::registries::search_registry,
        crate::routes::registries::seal_registry,
        crate::routes::registries::deprecate_registry,
        // ── Status ──────────────────────────────────────────────────────
        crate::routes::status::update_status,
        crate::routes::status::update_encrypted_status,
        crate::routes::status::check_status,
    ),
    components(
        schemas(
            crate::error::ErrorBody,
            crate::error::ErrorDetail,
            // ── Registry DTOs ───────────────────────────────────────────
            crate::routes::registries::PurposeInput,
            crate::routes::registries::RegistrySelector,
            crate::routes::registries::CreateRegistryRequest,
            crate::routes::registries::RegistryView,
            crate::routes::registries::RegistryDetail,
            crate::routes::registries::SearchView,
            crate::routes::registries::AllocateRequest,
            crate::routes::registries::AllocationResponse,
            crate::routes::registries::SealResponse,
            // ── Status DTOs ─────────────────────────────────────────────
            crate::routes::status::UpdateStatusRequest,
            crate::routes::status::UpdateStatusResponse,
            crate::routes::status::IndexChangeView,
            crate::routes::status::CheckStatusRequest,
            crate::routes::status::StatusReportResponse,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "registries", description = "Registry lifecycle and index allocation"),
        (name = "status", description = "Bulk status updates and status checks"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
