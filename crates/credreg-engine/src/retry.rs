//! Bounded retry with full-jitter exponential backoff for conditional
//! writes, and time bounds for calls that may block.
//!
//! A conditional write that affects zero rows is not an error: the caller
//! re-reads and tries again. Only when every attempt loses does the loop
//! surface [`RegistryError::Conflict`].

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::config::EngineConfig;
use crate::error::{RegistryError, RegistryResult};

/// Result of one optimistic attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The conditional write committed.
    Done(T),
    /// Another writer won; re-read and retry.
    Retry,
}

/// Attempt budget and backoff bounds.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff ceiling for the first retry.
    pub base: Duration,
    /// Largest backoff ceiling.
    pub max: Duration,
}

impl RetryPolicy {
    /// Build the policy from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_attempts: config.cas_max_retries,
            base: config.backoff_base,
            max: config.backoff_max,
        }
    }

    /// Randomised delay before retry number `attempt` (0-based):
    /// uniform in `[0, min(max, base * 2^attempt)]`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self
            .base
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
            .min(self.max);
        let ceiling_us = u64::try_from(ceiling.as_micros()).unwrap_or(u64::MAX);
        if ceiling_us == 0 {
            return Duration::ZERO;
        }
        Duration::from_micros(rand::thread_rng().gen_range(0..=ceiling_us))
    }
}

/// Run `f` until it reports [`Attempt::Done`], an error, or the attempt
/// budget runs out.
pub async fn retry_cas<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &'static str,
    mut f: F,
) -> RegistryResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = RegistryResult<Attempt<T>>>,
{
    for attempt in 0..policy.max_attempts {
        match f(attempt).await? {
            Attempt::Done(value) => return Ok(value),
            Attempt::Retry => {
                let delay = policy.delay(attempt);
                tracing::debug!(
                    operation,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    "conditional write lost a race, retrying in {delay:?}"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
    Err(RegistryError::Conflict(format!(
        "{operation} gave up after {} attempts under contention",
        policy.max_attempts
    )))
}

/// Bound `fut` by `limit`, mapping expiry to a retryable timeout.
pub async fn bounded<T, Fut>(operation: &'static str, limit: Duration, fut: Fut) -> RegistryResult<T>
where
    Fut: Future<Output = RegistryResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(RegistryError::Timeout {
            operation,
            after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base: Duration::from_millis(1),
            max: Duration::from_millis(2),
        }
    }

    #[test]
    fn delay_respects_ceiling() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base: Duration::from_millis(2),
            max: Duration::from_millis(10),
        };
        for attempt in 0..40 {
            assert!(policy.delay(attempt) <= Duration::from_millis(10));
        }
        assert!(policy.delay(0) <= Duration::from_millis(2));
    }

    #[tokio::test]
    async fn retry_succeeds_after_lost_races() {
        let calls = AtomicU32::new(0);
        let result = retry_cas(&fast_policy(5), "test", |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Ok(Attempt::Retry)
                } else {
                    Ok(Attempt::Done(attempt))
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_exhaustion_is_conflict() {
        let calls = AtomicU32::new(0);
        let result: RegistryResult<()> = retry_cas(&fast_policy(4), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(Attempt::Retry) }
        })
        .await;
        assert!(matches!(result, Err(RegistryError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: RegistryResult<()> = retry_cas(&fast_policy(4), "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(RegistryError::NotFound("registry x".into())) }
        })
        .await;
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bounded_maps_expiry_to_timeout() {
        let result: RegistryResult<()> = bounded("slow call", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(
            result,
            Err(RegistryError::Timeout { operation: "slow call", after_ms: 10 })
        ));
    }
}
