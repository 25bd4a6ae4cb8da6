//! Engine configuration.
//!
//! Parsed once from the environment at start-up. Invalid values are errors,
//! never silently replaced by defaults.

use std::str::FromStr;
use std::time::Duration;

use credreg_core::{DEFAULT_LIST_SIZE, MAX_LIST_SIZE};

/// Tunables for allocation, retries and timeouts.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Size of registries created without an explicit size.
    pub default_list_size: u64,
    /// Fraction of `size` at which a STANDBY successor is pre-created.
    /// `1.0` disables pre-creation.
    pub standby_threshold: f64,
    /// Conditional-write attempts before surfacing `Conflict`.
    pub cas_max_retries: u32,
    /// Smallest backoff ceiling between attempts.
    pub backoff_base: Duration,
    /// Largest backoff ceiling between attempts.
    pub backoff_max: Duration,
    /// Bound on a single catalog call.
    pub store_timeout: Duration,
    /// Bound on a single ledger, resolver or payment-verifier call.
    pub collaborator_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_list_size: DEFAULT_LIST_SIZE,
            standby_threshold: 0.8,
            cas_max_retries: 16,
            backoff_base: Duration::from_millis(2),
            backoff_max: Duration::from_millis(250),
            store_timeout: Duration::from_millis(5_000),
            collaborator_timeout: Duration::from_millis(10_000),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CREDREG_DEFAULT_LIST_SIZE` (default: 131072)
    /// - `CREDREG_STANDBY_THRESHOLD` (default: 0.8)
    /// - `CREDREG_CAS_MAX_RETRIES` (default: 16)
    /// - `CREDREG_BACKOFF_BASE_MS` / `CREDREG_BACKOFF_MAX_MS` (default: 2 / 250)
    /// - `CREDREG_STORE_TIMEOUT_MS` (default: 5000)
    /// - `CREDREG_COLLABORATOR_TIMEOUT_MS` (default: 10000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            default_list_size: env_parse("CREDREG_DEFAULT_LIST_SIZE", defaults.default_list_size)?,
            standby_threshold: env_parse("CREDREG_STANDBY_THRESHOLD", defaults.standby_threshold)?,
            cas_max_retries: env_parse("CREDREG_CAS_MAX_RETRIES", defaults.cas_max_retries)?,
            backoff_base: Duration::from_millis(env_parse("CREDREG_BACKOFF_BASE_MS", 2u64)?),
            backoff_max: Duration::from_millis(env_parse("CREDREG_BACKOFF_MAX_MS", 250u64)?),
            store_timeout: Duration::from_millis(env_parse("CREDREG_STORE_TIMEOUT_MS", 5_000u64)?),
            collaborator_timeout: Duration::from_millis(env_parse(
                "CREDREG_COLLABORATOR_TIMEOUT_MS",
                10_000u64,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_list_size == 0 || self.default_list_size > MAX_LIST_SIZE {
            return Err(ConfigError::Invalid {
                var: "CREDREG_DEFAULT_LIST_SIZE",
                value: self.default_list_size.to_string(),
                reason: format!("must be between 1 and {MAX_LIST_SIZE}"),
            });
        }
        if !(self.standby_threshold > 0.0 && self.standby_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                var: "CREDREG_STANDBY_THRESHOLD",
                value: self.standby_threshold.to_string(),
                reason: "must be greater than 0 and at most 1".into(),
            });
        }
        if self.cas_max_retries == 0 {
            return Err(ConfigError::Invalid {
                var: "CREDREG_CAS_MAX_RETRIES",
                value: "0".into(),
                reason: "at least one attempt is required".into(),
            });
        }
        if self.backoff_base > self.backoff_max {
            return Err(ConfigError::Invalid {
                var: "CREDREG_BACKOFF_BASE_MS",
                value: self.backoff_base.as_millis().to_string(),
                reason: "must not exceed CREDREG_BACKOFF_MAX_MS".into(),
            });
        }
        if self.store_timeout.is_zero() || self.collaborator_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "CREDREG_*_TIMEOUT_MS",
                value: "0".into(),
                reason: "timeouts must be positive".into(),
            });
        }
        Ok(())
    }
}

fn env_parse<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.default_list_size, 131_072);
        assert_eq!(cfg.cas_max_retries, 16);
    }

    #[test]
    fn threshold_bounds() {
        let mut cfg = EngineConfig::default();
        cfg.standby_threshold = 0.0;
        assert!(cfg.validate().is_err());
        cfg.standby_threshold = 1.0;
        assert!(cfg.validate().is_ok());
        cfg.standby_threshold = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn backoff_order_checked() {
        let cfg = EngineConfig {
            backoff_base: Duration::from_millis(500),
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn env_parse_uses_default_when_absent() {
        let v: u32 = env_parse("CREDREG_TEST_ABSENT_VAR_1", 7).unwrap();
        assert_eq!(v, 7);
    }

    #[test]
    fn env_parse_rejects_garbage() {
        std::env::set_var("CREDREG_TEST_BAD_VAR_2", "not-a-number");
        let result: Result<u32, _> = env_parse("CREDREG_TEST_BAD_VAR_2", 7);
        std::env::remove_var("CREDREG_TEST_BAD_VAR_2");
        assert!(result.is_err());
    }
}
