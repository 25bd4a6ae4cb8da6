//! Client error types.

use credreg_engine::CollaboratorError;

/// Errors from collaborator HTTP calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The service returned a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The response parsed but contradicts the request.
    #[error("unexpected response from {endpoint}: {reason}")]
    Unexpected { endpoint: String, reason: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<ClientError> for CollaboratorError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http { .. } | ClientError::Config(_) => {
                CollaboratorError::Unavailable(err.to_string())
            }
            ClientError::Api {
                status: 404,
                endpoint,
                ..
            } => CollaboratorError::NotFound(endpoint),
            ClientError::Api { status, body, .. } => CollaboratorError::Rejected {
                status,
                message: body,
            },
            ClientError::Deserialization { .. } | ClientError::Unexpected { .. } => {
                CollaboratorError::InvalidResponse(err.to_string())
            }
        }
    }
}

/// Turn a non-2xx response into [`ClientError::Api`].
pub(crate) async fn ensure_success(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(ClientError::Api {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}
