//! Request spacing for the provider API
//!
//! One limiter instance is shared by every request the client makes, across all
//! streams, so parallel stream processing never exceeds the configured rate.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Gate awaited before each provider request
#[async_trait]
pub trait RateLimiter: Send + Sync + std::fmt::Debug {
    /// Wait until the next request may be sent
    async fn acquire(&self);
}

/// Enforces a minimum interval between consecutive requests
#[derive(Debug)]
pub struct MinIntervalLimiter {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl MinIntervalLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Configured spacing
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[async_trait]
impl RateLimiter for MinIntervalLimiter {
    async fn acquire(&self) {
        // Held across the sleep so waiting callers queue up in order
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::trace!(wait_ms = wait.as_millis() as u64, "Rate limiter delaying request");
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Limiter that never waits
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLimiter;

#[async_trait]
impl RateLimiter for NoopLimiter {
    async fn acquire(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_acquire_does_not_wait() {
        let limiter = MinIntervalLimiter::new(Duration::from_secs(5));
        let started = Instant::now();
        limiter.acquire().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_consecutive_acquires_are_spaced() {
        let limiter = MinIntervalLimiter::new(Duration::from_millis(60));
        let started = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(started.elapsed() >= Duration::from_millis(120));
    }

    #[tokio::test]
    async fn test_shared_limiter_spaces_concurrent_callers() {
        let limiter = Arc::new(MinIntervalLimiter::new(Duration::from_millis(50)));
        let started = Instant::now();

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_noop_limiter() {
        let limiter = NoopLimiter;
        let started = Instant::now();
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert!(started.elapsed() < Duration::from_millis(50));
    }
}
