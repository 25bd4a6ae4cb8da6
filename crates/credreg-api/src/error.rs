//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps engine errors to HTTP status codes with a JSON body of the form
//! `{"error": {"code", "message", "details?"}}`. Storage and collaborator
//! failures are logged server-side; their details never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use credreg_engine::{ErrorKind, RegistryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "FULL", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details, present only for client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Registry or DID not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Semantically invalid request (422).
    #[error("{0}")]
    Validation(String),

    /// Body or query could not be parsed (400).
    #[error("{0}")]
    BadRequest(String),

    /// Index outside the registry (400).
    #[error("{0}")]
    InvalidIndex(String),

    /// Missing or invalid bearer token (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Payment gate refused access to an encrypted registry (402).
    #[error("{0}")]
    PaymentRequired(String),

    /// Series exhausted with no successor (409).
    #[error("{0}")]
    Full(String),

    /// Contention or uniqueness conflict (409).
    #[error("{0}")]
    Conflict(String),

    /// Ledger, resolver or payment verifier failed (502).
    #[error("{0}")]
    UpstreamError(String),

    /// A bounded call timed out; retryable (503).
    #[error("{0}")]
    Timeout(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::InvalidIndex(_) => (StatusCode::BAD_REQUEST, "INVALID_INDEX"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::PaymentRequired(_) => (StatusCode::PAYMENT_REQUIRED, "PAYMENT_REQUIRED"),
            Self::Full(_) => (StatusCode::CONFLICT, "FULL"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::UpstreamError(_) => (StatusCode::BAD_GATEWAY, "LEDGER_ERROR"),
            Self::Timeout(_) => (StatusCode::SERVICE_UNAVAILABLE, "TIMEOUT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::UpstreamError(_) => "An upstream service error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::UpstreamError(_) => tracing::error!(error = %self, "upstream service error"),
            Self::Timeout(_) => tracing::warn!(error = %self, "request timed out"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Full => Self::Full(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::InvalidIndex => Self::InvalidIndex(message),
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Unauthorized => Self::PaymentRequired(message),
            ErrorKind::Ledger => Self::UpstreamError(message),
            ErrorKind::Timeout => Self::Timeout(message),
            ErrorKind::Storage => Self::Internal(message),
        }
    }
}

impl From<credreg_core::ValidationError> for AppError {
    fn from(err: credreg_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credreg_core::SeriesId;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn engine_kinds_map_to_status_codes() {
        let cases = [
            (RegistryError::NotFound("registry x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                RegistryError::Full {
                    series: SeriesId::new(),
                    detail: "cursor at capacity".into(),
                },
                StatusCode::CONFLICT,
                "FULL",
            ),
            (RegistryError::Conflict("busy".into()), StatusCode::CONFLICT, "CONFLICT"),
            (
                RegistryError::InvalidIndex { index: 9, size: 8 },
                StatusCode::BAD_REQUEST,
                "INVALID_INDEX",
            ),
            (
                RegistryError::Unauthorized("no payment".into()),
                StatusCode::PAYMENT_REQUIRED,
                "PAYMENT_REQUIRED",
            ),
            (
                RegistryError::Ledger {
                    collaborator: "ledger",
                    message: "down".into(),
                },
                StatusCode::BAD_GATEWAY,
                "LEDGER_ERROR",
            ),
            (
                RegistryError::Timeout {
                    operation: "catalog get",
                    after_ms: 5,
                },
                StatusCode::SERVICE_UNAVAILABLE,
                "TIMEOUT",
            ),
            (
                RegistryError::Storage("pool closed".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(AppError::from(err).status_and_code(), (status, code));
        }
    }

    #[tokio::test]
    async fn full_response_names_the_condition() {
        let err = AppError::from(RegistryError::Full {
            series: SeriesId::new(),
            detail: "no ACTIVE registry".into(),
        });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "FULL");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("create a successor registry"));
    }

    #[tokio::test]
    async fn internal_message_is_hidden() {
        let response = AppError::Internal("password=hunter2".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(body["error"].get("details").is_none());
    }
}
