//! Collaborator client configuration.
//!
//! Each collaborator is optional: an unset base URL means the engine keeps
//! its in-process stub for that role.

use url::Url;
use zeroize::Zeroizing;

/// Base URLs and credentials for the HTTP collaborators.
///
/// Custom `Debug` implementation redacts the ledger token.
#[derive(Clone)]
pub struct ClientConfig {
    /// Universal DID resolver, e.g. `https://resolver.cheqd.net`.
    pub resolver_url: Option<Url>,
    /// Resource ledger service.
    pub ledger_url: Option<Url>,
    /// Payment verification service.
    pub payment_url: Option<Url>,
    /// Bearer token sent to the ledger service.
    pub ledger_token: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("resolver_url", &self.resolver_url)
            .field("ledger_url", &self.ledger_url)
            .field("payment_url", &self.payment_url)
            .field(
                "ledger_token",
                &self.ledger_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            resolver_url: None,
            ledger_url: None,
            payment_url: None,
            ledger_token: None,
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CREDREG_RESOLVER_URL` (optional)
    /// - `CREDREG_LEDGER_URL` (optional)
    /// - `CREDREG_PAYMENT_URL` (optional)
    /// - `CREDREG_LEDGER_TOKEN` (optional)
    /// - `CREDREG_HTTP_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = match std::env::var("CREDREG_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    var: "CREDREG_HTTP_TIMEOUT_SECS",
                    value: raw,
                })?,
            Err(_) => 30,
        };
        Ok(Self {
            resolver_url: env_url("CREDREG_RESOLVER_URL")?,
            ledger_url: env_url("CREDREG_LEDGER_URL")?,
            payment_url: env_url("CREDREG_PAYMENT_URL")?,
            ledger_token: std::env::var("CREDREG_LEDGER_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .map(Zeroizing::new),
            timeout_secs,
        })
    }

    /// Whether any collaborator is configured.
    pub fn any_configured(&self) -> bool {
        self.resolver_url.is_some() || self.ledger_url.is_some() || self.payment_url.is_some()
    }
}

fn env_url(var: &'static str) -> Result<Option<Url>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) if !raw.is_empty() => Url::parse(&raw)
            .map(Some)
            .map_err(|e| ConfigError::InvalidUrl(var, e.to_string())),
        _ => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(&'static str, String),
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
    #[error("ledger token is not a valid header value")]
    InvalidToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let cfg = ClientConfig {
            ledger_url: Some(Url::parse("http://127.0.0.1:9000").unwrap()),
            ledger_token: Some(Zeroizing::new("super-secret".into())),
            ..ClientConfig::default()
        };
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
        assert!(cfg.any_configured());
    }

    #[test]
    fn env_url_absent_is_none() {
        assert!(env_url("CREDREG_NONEXISTENT_URL_VAR").unwrap().is_none());
    }

    #[test]
    fn default_has_no_collaborators() {
        let cfg = ClientConfig::default();
        assert!(!cfg.any_configured());
        assert_eq!(cfg.timeout_secs, 30);
    }
}
