//! # Application State
//!
//! Shared state for the Axum application: the registry engine, the
//! configuration it was built from, and the optional database pool.

use std::sync::Arc;

use credreg_client::{ClientConfig, HttpCollaborators};
use credreg_engine::{EngineConfig, RegistryEngine};
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::SecretToken;
use crate::db::{PgCatalog, PgKeyStore};

/// Start-up configuration errors.
#[derive(Error, Debug)]
pub enum AppConfigError {
    #[error("invalid PORT value \"{0}\"")]
    InvalidPort(String),

    #[error("engine configuration: {0}")]
    Engine(#[from] credreg_engine::ConfigError),

    #[error("collaborator configuration: {0}")]
    Client(#[from] credreg_client::ConfigError),
}

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static bearer token. If `None`, authentication is disabled.
    pub auth_token: Option<SecretToken>,
    pub engine: EngineConfig,
    /// Base URLs of the HTTP collaborators. Unset roles use in-process stubs.
    pub clients: ClientConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("engine", &self.engine)
            .field("clients", &self.clients)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            engine: EngineConfig::default(),
            clients: ClientConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PORT` (default: 8080)
    /// - `AUTH_TOKEN` (default: unset, auth disabled)
    /// - `CREDREG_*` engine and collaborator variables
    pub fn from_env() -> Result<Self, AppConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppConfigError::InvalidPort(raw.clone()))?,
            Err(_) => 8080,
        };
        let auth_token = std::env::var("AUTH_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
            .map(SecretToken::new);

        Ok(Self {
            port,
            auth_token,
            engine: EngineConfig::from_env()?,
            clients: ClientConfig::from_env()?,
        })
    }
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RegistryEngine>,
    pub config: AppConfig,
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// In-memory state with default configuration and stub collaborators.
    pub fn new() -> Self {
        Self::with_engine(
            AppConfig::default(),
            RegistryEngine::in_memory(EngineConfig::default()),
            None,
        )
    }

    pub fn with_engine(config: AppConfig, engine: RegistryEngine, db_pool: Option<PgPool>) -> Self {
        Self {
            engine: Arc::new(engine),
            config,
            db_pool,
        }
    }

    /// Build the engine from configuration.
    ///
    /// With a pool, registries and keys live in Postgres; otherwise in
    /// memory. Collaborators with a configured URL use HTTP clients; the
    /// rest fall back to in-process stubs.
    pub fn bootstrap(
        config: AppConfig,
        db_pool: Option<PgPool>,
    ) -> Result<Self, credreg_client::ClientError> {
        let mut builder = RegistryEngine::builder().config(config.engine.clone());

        if let Some(pool) = &db_pool {
            builder = builder
                .catalog(Arc::new(PgCatalog::new(pool.clone())))
                .key_store(Arc::new(PgKeyStore::new(pool.clone())));
        }

        if config.clients.any_configured() {
            let http = HttpCollaborators::new(config.clients.clone())?;
            if let Some(resolver) = http.resolver() {
                tracing::info!("using HTTP DID resolver");
                builder = builder.did_resolver(resolver);
            }
            if let Some(ledger) = http.ledger() {
                tracing::info!("using HTTP resource ledger");
                builder = builder.ledger(ledger);
            }
            if let Some(payments) = http.payments() {
                tracing::info!("using HTTP payment verifier");
                builder = builder.payment_verifier(payments);
            }
        } else {
            tracing::warn!(
                "no collaborator URLs configured; using in-process resolver, ledger and payment stubs"
            );
        }

        let engine = builder.build();
        Ok(Self::with_engine(config, engine, db_pool))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
