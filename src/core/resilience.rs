//! Retry with exponential backoff
//!
//! [`RetryPolicy::run`] wraps one provider fetch or one database write.
//! Retryable failures (transient provider errors, database write errors) are
//! retried after a growing, optionally jittered delay; a server-supplied
//! `Retry-After` replaces the computed delay, capped at the maximum. Every
//! other error returns immediately. Waiting and in-flight attempts are both
//! abandoned when shutdown is requested.

use crate::config::RetryConfig;
use crate::domain::{OctographError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

/// Backoff settings for one kind of call
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: usize,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.backoff_multiplier,
            jitter: config.jitter,
        }
    }

    /// A single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
            jitter: false,
        }
    }

    /// Disable jitter, mostly for tests
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Total attempts including the first
    pub fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }

    /// Un-jittered delay before retry number `retry` (1-based)
    pub fn backoff_delay(&self, retry: usize) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as usize) as i32;
        let millis = self.initial_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay before retry number `retry` after `error`
    pub fn delay_for(&self, retry: usize, error: &OctographError) -> Duration {
        if let Some(retry_after) = error.retry_after() {
            return retry_after.min(self.max_delay);
        }

        let delay = self.backoff_delay(retry);
        if self.jitter && !delay.is_zero() {
            // Uniform in [delay/2, delay]
            let half = delay / 2;
            let spread = rand::thread_rng().gen_range(0..=(delay - half).as_millis() as u64);
            half + Duration::from_millis(spread)
        } else {
            delay
        }
    }

    /// Run `operation` until it succeeds, fails fatally, runs out of
    /// attempts, or shutdown is requested
    ///
    /// `operation` is re-invoked from scratch on each attempt.
    ///
    /// # Errors
    ///
    /// Returns the last error, or [`OctographError::Cancelled`] on shutdown.
    pub async fn run<T, F, Fut>(
        &self,
        label: &str,
        shutdown: &mut watch::Receiver<bool>,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;

        loop {
            let outcome = tokio::select! {
                biased;
                _ = wait_for_shutdown(shutdown) => {
                    return Err(OctographError::Cancelled(format!("{label} abandoned")));
                }
                outcome = operation() => outcome,
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            if attempt >= self.max_attempts() {
                tracing::warn!(
                    operation = label,
                    attempts = attempt,
                    error = %error,
                    "Retries exhausted"
                );
                return Err(error);
            }

            let delay = self.delay_for(attempt, &error);
            crate::log_retry_attempt!(label, attempt, self.max_attempts(), delay, &error);

            tokio::select! {
                biased;
                _ = wait_for_shutdown(shutdown) => {
                    return Err(OctographError::Cancelled(format!("{label} abandoned")));
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Resolve once shutdown has been requested
///
/// Never resolves if the sender is dropped without requesting shutdown.
pub async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DatabaseError, ErrorKind, ProviderError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy::from_config(&RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
            jitter: false,
        })
    }

    fn transient() -> OctographError {
        ProviderError::ServerError {
            status: 503,
            message: "unavailable".to_string(),
        }
        .into()
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy::from_config(&RetryConfig {
            max_retries: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
            jitter: false,
        });

        assert_eq!(policy.backoff_delay(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(2000));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(4000));
        assert_eq!(policy.backoff_delay(4), Duration::from_millis(5000));
        assert_eq!(policy.max_attempts(), 6);
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = RetryPolicy::default();
        for _ in 0..50 {
            let delay = policy.delay_for(2, &transient());
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(2000));
        }
    }

    #[test]
    fn test_retry_after_is_honoured_and_capped() {
        let policy = RetryPolicy::default();
        let short: OctographError = ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        }
        .into();
        let long: OctographError = ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(600)),
        }
        .into();

        assert_eq!(policy.delay_for(1, &short), Duration::from_secs(3));
        assert_eq!(policy.delay_for(1, &long), Duration::from_millis(30_000));
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let (_tx, mut rx) = watch::channel(false);
        let calls = AtomicUsize::new(0);

        let result = fast_policy(3)
            .run("fetch", &mut rx, || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(transient())
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_is_not_retried() {
        let (_tx, mut rx) = watch::channel(false);
        let calls = AtomicUsize::new(0);

        let result: Result<()> = fast_policy(3)
            .run("write", &mut rx, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DatabaseError::SchemaRejected("bad line".to_string()).into())
            })
            .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Schema);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_return_last_error() {
        let (_tx, mut rx) = watch::channel(false);
        let calls = AtomicUsize::new(0);

        let result: Result<()> = fast_policy(2)
            .run("write", &mut rx, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DatabaseError::WriteFailed("502".to_string()).into())
            })
            .await;

        assert_eq!(result.unwrap_err().kind(), ErrorKind::Write);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_backoff() {
        let (tx, mut rx) = watch::channel(false);
        let policy = RetryPolicy::from_config(&RetryConfig {
            max_retries: 5,
            initial_delay_ms: 60_000,
            max_delay_ms: 60_000,
            backoff_multiplier: 1.0,
            jitter: false,
        });

        let handle = tokio::spawn(async move {
            policy
                .run("fetch", &mut rx, || async { Err::<(), _>(transient()) })
                .await
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_dropped_sender_never_cancels() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);

        let result = fast_policy(0)
            .run("fetch", &mut rx, || async { Ok::<_, OctographError>("done") })
            .await;
        assert_eq!(result.unwrap(), "done");
    }
}
