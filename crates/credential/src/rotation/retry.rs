//! Retry logic with exponential backoff
//!
//! Bounded retry for issuance attempts. The policy deliberately fits inside
//! one 30-second validity window so a recovering issuer is retried while the
//! displayed code is merely stale, not ancient.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::error::RotationError;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first)
    pub max_attempts: u32,

    /// Initial backoff duration
    #[serde(with = "humantime_serde")]
    pub initial_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential)
    pub backoff_multiplier: f32,

    /// Maximum backoff duration
    #[serde(with = "humantime_serde")]
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom parameters
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        backoff_multiplier: f32,
        max_backoff: Duration,
    ) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            backoff_multiplier,
            max_backoff,
        }
    }

    /// A policy that never retries; the first failure is final
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Calculate backoff duration for the given zero-based attempt number
    ///
    /// Applies exponential backoff with ±10% jitter to avoid synchronised
    /// retry bursts from many displays against one issuer.
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        use rand::RngExt;

        let base_ms = self.initial_backoff.as_millis() as f32;
        let multiplier = self.backoff_multiplier.powi(attempt as i32);
        let backoff_ms = base_ms * multiplier;

        let jitter = rand::rng().random_range(0.9..=1.1);
        let jittered_ms = (backoff_ms * jitter) as u64;

        Duration::from_millis(jittered_ms).min(self.max_backoff)
    }
}

/// Retry an async issuance operation with exponential backoff
///
/// Only recoverable errors ([`RotationError::is_recoverable`]) are retried;
/// `AuthenticationMissing` and friends are returned immediately. Backoff
/// sleeps race `cancel`, so a `stop()` lands between attempts instead of
/// after the whole budget.
///
/// # Example
///
/// ```rust,ignore
/// let policy = RetryPolicy::default();
/// let cancel = CancellationToken::new();
/// let credential = retry_with_backoff(&policy, "issue", &cancel, || async {
///     issuer.issue(&subject).await
/// }).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    cancel: &CancellationToken,
    mut f: F,
) -> Result<T, RotationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RotationError>>,
{
    let mut last_error: Option<String> = None;

    for attempt in 0..policy.max_attempts {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_recoverable() => return Err(e),
            Err(e) => {
                let error_str = e.to_string();
                last_error = Some(error_str.clone());

                tracing::warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    error = %error_str,
                    "Retry attempt failed"
                );

                // Don't sleep after the last attempt
                if attempt < policy.max_attempts - 1 {
                    let backoff = policy.backoff_duration(attempt);
                    tracing::debug!(
                        operation = operation_name,
                        backoff_ms = backoff.as_millis() as u64,
                        "Backing off before next retry"
                    );
                    tokio::select! {
                        _ = sleep(backoff) => {}
                        _ = cancel.cancelled() => {
                            tracing::debug!(
                                operation = operation_name,
                                "Retry backoff interrupted by cancellation"
                            );
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    Err(RotationError::RetriesExhausted {
        operation: operation_name.to_owned(),
        attempts: policy.max_attempts,
        last_error: last_error.unwrap_or_else(|| "unknown".to_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_grows_exponentially_with_jitter() {
        let policy = RetryPolicy::default();

        // First attempt: 500ms * 2^0 = 500ms ± 10% jitter (450-550ms)
        let backoff_0 = policy.backoff_duration(0);
        assert!(
            backoff_0 >= Duration::from_millis(450) && backoff_0 <= Duration::from_millis(550),
            "Expected 450-550ms, got {:?}",
            backoff_0
        );

        // Second attempt: 500ms * 2^1 = 1000ms ± 10% jitter (900-1100ms)
        let backoff_1 = policy.backoff_duration(1);
        assert!(
            backoff_1 >= Duration::from_millis(900) && backoff_1 <= Duration::from_millis(1100),
            "Expected 900-1100ms, got {:?}",
            backoff_1
        );

        // Large attempt caps at max_backoff (5s)
        let backoff_large = policy.backoff_duration(10);
        assert_eq!(
            backoff_large,
            Duration::from_secs(5),
            "Large attempt should cap at max_backoff"
        );
    }

    #[tokio::test]
    async fn success_on_first_attempt_tries_once() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), 2.0, Duration::from_secs(1));
        let cancel = CancellationToken::new();
        let counter = AtomicU32::new(0);

        let result = retry_with_backoff(&policy, "test_op", &cancel, || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, RotationError>(42)
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recoverable_failure_is_retried() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), 2.0, Duration::from_secs(1));
        let cancel = CancellationToken::new();
        let counter = AtomicU32::new(0);

        let result = retry_with_backoff(&policy, "test_op", &cancel, || async {
            let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
            if count == 1 {
                Err(RotationError::IssuanceFailed {
                    reason: "first attempt fails".into(),
                })
            } else {
                Ok(42)
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_attempts_report_the_last_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), 2.0, Duration::from_secs(1));
        let cancel = CancellationToken::new();
        let counter = AtomicU32::new(0);

        let result = retry_with_backoff(&policy, "test_op", &cancel, || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<u32, _>(RotationError::IssuanceFailed {
                reason: "always fails".into(),
            })
        })
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            RotationError::RetriesExhausted {
                attempts,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("always fails"));
            }
            other => panic!("Expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_auth_aborts_without_retry() {
        let policy = RetryPolicy::new(5, Duration::from_millis(10), 2.0, Duration::from_secs(1));
        let cancel = CancellationToken::new();
        let counter = AtomicU32::new(0);

        let result = retry_with_backoff(&policy, "test_op", &cancel, || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<u32, _>(RotationError::AuthenticationMissing)
        })
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result.unwrap_err(),
            RotationError::AuthenticationMissing
        ));
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_backoff_sleep() {
        let policy = RetryPolicy::new(5, Duration::from_secs(60), 2.0, Duration::from_secs(120));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let counter = AtomicU32::new(0);

        // With the token already cancelled, the first backoff returns
        // immediately instead of sleeping a minute.
        let result = retry_with_backoff(&policy, "test_op", &cancel, || async {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<u32, _>(RotationError::IssuanceFailed {
                reason: "unreachable issuer".into(),
            })
        })
        .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result.unwrap_err(),
            RotationError::IssuanceFailed { .. }
        ));
    }
}
