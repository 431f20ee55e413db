//! Bounded retry with a fixed delay
//!
//! Only wrap idempotent reads. Retrying a transaction submission can submit
//! it twice.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How many times to attempt an operation and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` below 1 is raised to 1
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    /// 3 attempts, 2 seconds apart
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds or the attempt budget is spent
    ///
    /// On exhaustion the error of the final attempt is returned as-is.
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        log::debug!("Operation succeeded on attempt {}/{}", attempt, max_attempts);
                    }
                    return Ok(value);
                }
                Err(e) if attempt < max_attempts => {
                    log::warn!(
                        "Attempt {}/{} failed ({}), retrying in {:?}",
                        attempt,
                        max_attempts,
                        e,
                        self.policy.delay
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("Operation failed after {} attempt(s): {}", max_attempts, e);
                    return Err(e);
                }
            }
        }
    }
}
