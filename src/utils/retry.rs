//! Bounded retry with exponential backoff.
//!
//! Retry policy belongs to the transport layer: the CLI wraps whole
//! pipeline invocations in [`with_retry`], and the pipelines themselves
//! never retry. Whether a failure is worth repeating is decided by the
//! error's [`Retryable`] impl.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// Classifies whether a failed operation is worth repeating.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Backoff schedule for [`with_retry`].
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error,
/// or exhausts the attempt budget. Returns the last error on failure.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = config.initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < max_attempts && error.is_retryable() => {
                warn!(attempt, %error, "transient failure, retrying");
                sleep(jittered(delay)).await;
                delay = Duration::from_secs_f64(delay.as_secs_f64() * config.multiplier)
                    .min(config.max_delay);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Add up to 25% clock-derived jitter so concurrent callers hitting the
/// same recovering service spread out.
fn jittered(delay: Duration) -> Duration {
    let quarter_ms = delay.as_millis() as u64 / 4;
    if quarter_ms == 0 {
        return delay;
    }
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    delay + Duration::from_millis(nanos % quarter_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::error::{ProviderError, VectorStoreError};

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            ..Default::default()
        }
    }

    fn rate_limited() -> ProviderError {
        ProviderError::RateLimited {
            provider: "openai".to_string(),
            message: "slow down".to_string(),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_until_success() {
        let calls = AtomicU32::new(0);
        let answer = with_retry(&fast(), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(rate_limited())
            } else {
                Ok("recovered")
            }
        })
        .await
        .unwrap();

        assert_eq!(answer, "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let err = with_retry(&fast(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(ProviderError::Auth {
                provider: "openai".to_string(),
                message: "bad key".to_string(),
            })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::Auth { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_not_retried() {
        let calls = AtomicU32::new(0);
        let err = with_retry(&fast(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(VectorStoreError::DimensionMismatch {
                collection: "docs".to_string(),
                existing: 1536,
                requested: 384,
            })
        })
        .await
        .unwrap_err();

        assert!(matches!(err, VectorStoreError::DimensionMismatch { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let err = with_retry(&fast(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(ProviderError::Timeout)
        })
        .await
        .unwrap_err();

        assert!(matches!(err, ProviderError::Timeout));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
