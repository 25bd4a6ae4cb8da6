//! # credreg-client — HTTP collaborators for the registry engine
//!
//! Typed reqwest clients implementing the engine's collaborator traits:
//!
//! - **DID resolver** ([`UniversalResolverClient`]) via
//!   `GET {base}/1.0/identifiers/{did}`
//! - **Ledger broadcaster** ([`ResourceLedgerClient`]) via
//!   `POST {base}/resources` and `GET {base}/resources/{id}`
//! - **Payment verifier** ([`PaymentVerifierClient`]) via
//!   `POST {base}/verify`
//!
//! Transport errors are retried with exponential backoff. Non-2xx
//! responses are returned immediately and mapped onto
//! [`credreg_engine::CollaboratorError`].

pub mod config;
pub mod error;
pub mod ledger;
pub mod payments;
pub mod resolver;
pub(crate) mod retry;

pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use ledger::ResourceLedgerClient;
pub use payments::PaymentVerifierClient;
pub use resolver::UniversalResolverClient;

use std::sync::Arc;
use std::time::Duration;

use credreg_engine::{DidResolver, LedgerBroadcaster, PaymentVerifier};

/// The HTTP collaborators named by a [`ClientConfig`]. Roles without a
/// configured URL are `None`.
#[derive(Debug, Clone)]
pub struct HttpCollaborators {
    resolver: Option<UniversalResolverClient>,
    ledger: Option<ResourceLedgerClient>,
    payments: Option<PaymentVerifierClient>,
}

impl HttpCollaborators {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        let ledger = match config.ledger_url {
            Some(url) => {
                let mut headers = reqwest::header::HeaderMap::new();
                if let Some(token) = &config.ledger_token {
                    let value = reqwest::header::HeaderValue::from_str(&format!(
                        "Bearer {}",
                        token.as_str()
                    ))
                    .map_err(|_| ConfigError::InvalidToken)?;
                    headers.insert(reqwest::header::AUTHORIZATION, value);
                }
                let ledger_http = reqwest::Client::builder()
                    .timeout(timeout)
                    .default_headers(headers)
                    .build()
                    .map_err(|e| ClientError::Http {
                        endpoint: "client_init".into(),
                        source: e,
                    })?;
                Some(ResourceLedgerClient::new(ledger_http, url))
            }
            None => None,
        };

        Ok(Self {
            resolver: config
                .resolver_url
                .map(|url| UniversalResolverClient::new(http.clone(), url)),
            ledger,
            payments: config
                .payment_url
                .map(|url| PaymentVerifierClient::new(http, url)),
        })
    }

    pub fn resolver(&self) -> Option<Arc<dyn DidResolver>> {
        self.resolver
            .clone()
            .map(|c| Arc::new(c) as Arc<dyn DidResolver>)
    }

    pub fn ledger(&self) -> Option<Arc<dyn LedgerBroadcaster>> {
        self.ledger
            .clone()
            .map(|c| Arc::new(c) as Arc<dyn LedgerBroadcaster>)
    }

    pub fn payments(&self) -> Option<Arc<dyn PaymentVerifier>> {
        self.payments
            .clone()
            .map(|c| Arc::new(c) as Arc<dyn PaymentVerifier>)
    }
}
