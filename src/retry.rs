//! Retry logic with randomized backoff
//!
//! Every fetch goes through [`retry_with_backoff`], driven by a
//! [`RetryPolicy`]: a bounded number of attempts and a uniform random pause
//! between them. A policy with [`DelayRange::ZERO`](crate::config::DelayRange::ZERO)
//! backoff retries without sleeping.
//!
//! # Example
//!
//! ```no_run
//! use lyrics_harvest::config::RetryPolicy;
//! use lyrics_harvest::retry::{IsRetryable, retry_with_backoff};
//!
//! #[derive(Debug)]
//! struct Flaky;
//!
//! impl std::fmt::Display for Flaky {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "flaky")
//!     }
//! }
//!
//! impl IsRetryable for Flaky {
//!     fn is_retryable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! # async fn example() {
//! let policy = RetryPolicy::default();
//! let result = retry_with_backoff(&policy, |_attempt| async { Ok::<_, Flaky>(42) }).await;
//! assert_eq!(result.ok(), Some(42));
//! # }
//! ```

use crate::config::RetryPolicy;
use crate::error::FetchError;
use std::future::Future;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, refused or reset connections, bad statuses)
/// return `true`. Failures that cannot improve on a second try (a malformed
/// request) return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            // A request that could not be built will fail the same way again
            FetchError::Request(e) => !e.is_builder(),
            // Any non-2xx answer is treated as transient, 404 included
            FetchError::Status { .. } => true,
        }
    }
}

/// Error returned once retries are exhausted or a permanent error occurs
#[derive(Debug)]
pub struct RetryError<E> {
    /// Number of attempts made, the failing one included
    pub attempts: u32,
    /// Error from the final attempt
    pub error: E,
}

/// Execute an async operation under a retry policy
///
/// The operation receives the 1-based attempt number. At most
/// `policy.max_attempts` attempts are made; between attempts a delay is drawn
/// from `policy.backoff`. No delay follows the final attempt.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.backoff.sample();

                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis(),
                    "Attempt failed, retrying"
                );

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "Operation failed after all attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "Operation failed with non-retryable error");
                }
                return Err(RetryError { attempts: attempt, error: e });
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DelayRange;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{Duration, Instant};

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                TestError::Transient => write!(f, "transient error"),
                TestError::Permanent => write!(f, "permanent error"),
            }
        }
    }

    impl IsRetryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: DelayRange::ZERO,
        }
    }

    #[tokio::test]
    async fn success_makes_a_single_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_backoff(&instant_policy(3), |_| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_backoff(&instant_policy(3), |_| {
            let counter = counter_clone.clone();
            async move {
                let count = counter.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn always_failing_operation_is_attempted_exactly_max_attempts_times() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_backoff(&instant_policy(3), |_| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 3);
        assert!(matches!(err.error, TestError::Transient));
        assert_eq!(counter.load(Ordering::SeqCst), 3, "exactly three attempts");
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_backoff(&instant_policy(5), |_| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Permanent)
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should not retry permanent error");
    }

    #[tokio::test]
    async fn operation_receives_one_based_attempt_numbers() {
        let seen = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let _ = retry_with_backoff(&instant_policy(4), |attempt| {
            let seen = seen_clone.clone();
            async move {
                seen.lock().await.push(attempt);
                Err::<(), _>(TestError::Transient)
            }
        })
        .await;

        assert_eq!(*seen.lock().await, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn zero_max_attempts_still_makes_one_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = retry_with_backoff(&instant_policy(0), |_| {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn backoff_sleeps_between_attempts_but_not_after_the_last() {
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff: DelayRange::from_secs_f64(0.2, 0.2),
        };

        let start = Instant::now();
        let _ = retry_with_backoff(&policy, |_| async { Err::<(), _>(TestError::Transient) }).await;
        let elapsed = start.elapsed();

        // Two gaps of 200ms; a third sleep after the last attempt would reach 600ms
        assert!(elapsed >= Duration::from_millis(400), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_millis(580), "waited {elapsed:?}");
    }

    #[test]
    fn status_errors_are_retryable() {
        assert!(FetchError::Status { status: 500 }.is_retryable());
        assert!(FetchError::Status { status: 404 }.is_retryable());
        assert!(FetchError::Status { status: 429 }.is_retryable());
    }
}
