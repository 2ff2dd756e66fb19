//! Bounded retry with exponential backoff for transient store failures.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::ServiceError;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration, backoff_max: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff_base, backoff_max }
    }

    pub fn from_config(cfg: &configs::RetryConfig) -> Self {
        Self::new(
            cfg.max_attempts,
            Duration::from_millis(cfg.backoff_base_ms),
            Duration::from_millis(cfg.backoff_max_ms),
        )
    }

    /// One attempt, no retries.
    pub fn none() -> Self { Self::new(1, Duration::ZERO, Duration::ZERO) }

    pub fn max_attempts(&self) -> u32 { self.max_attempts }

    /// Delay before the retry that follows `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2_u32.saturating_pow(attempt - 1);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }

    /// Run `operation`, retrying while it fails with [`ServiceError::Transient`].
    ///
    /// Exhausted retries surface as a generic transient "try again" error;
    /// any other error is returned as is on the first occurrence.
    pub async fn run<F, Fut, T>(&self, op: &'static str, mut operation: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match operation().await {
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let wait = self.backoff(attempt);
                    debug!(op, attempt, wait_ms = wait.as_millis() as u64, error = %e, "retrying transient store error");
                    sleep(wait).await;
                }
                Err(e) if e.is_transient() => {
                    warn!(op, attempts = attempt, error = %e, "transient store error, retries exhausted");
                    return Err(ServiceError::Transient(format!("{op} unavailable, try again")));
                }
                other => return other,
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self { Self::from_config(&configs::RetryConfig::default()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max: u32) -> RetryPolicy { RetryPolicy::new(max, Duration::from_millis(1), Duration::from_millis(4)) }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy::new(5, Duration::from_millis(10), Duration::from_millis(25));
        assert_eq!(p.backoff(1), Duration::from_millis(10));
        assert_eq!(p.backoff(2), Duration::from_millis(20));
        assert_eq!(p.backoff(3), Duration::from_millis(25));
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let res = fast(3)
            .run("op", move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ServiceError::Transient("timeout".into()))
                } else {
                    Ok(42)
                }
            })
            .await;
        assert_eq!(res.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_try_again() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let res: Result<(), _> = fast(2)
            .run("get_booking", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ServiceError::Transient("timeout".into()))
            })
            .await;
        let err = res.unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("try again"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn business_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let res: Result<(), _> = fast(5)
            .run("op", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ServiceError::Conflict("taken".into()))
            })
            .await;
        assert!(matches!(res, Err(ServiceError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
