use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::RetryPolicy;
use crate::error::{GatewayError, Result};

/// Retry cursor for one submission: attempts made so far and the next delay.
///
/// Owned by a single retry loop and never shared.
#[derive(Debug, Clone)]
pub struct Backoff {
    attempts: u32,
    delay: Duration,
    policy: RetryPolicy,
}

impl Backoff {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            attempts: 0,
            delay: policy.initial_delay.min(policy.max_delay),
            policy,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn has_remaining(&self) -> bool {
        self.attempts < self.policy.max_attempts
    }

    /// Register a failed attempt.
    ///
    /// Returns how long to wait before the next attempt, or `None` once the
    /// attempt budget is spent.
    pub fn record_failure(&mut self) -> Option<Duration> {
        self.attempts += 1;
        if !self.has_remaining() {
            return None;
        }
        let delay = self.delay;
        self.delay = self
            .delay
            .saturating_mul(self.policy.backoff_multiplier)
            .min(self.policy.max_delay);
        Some(delay)
    }
}

/// Call `attempt` until it succeeds or `policy.max_attempts` calls have failed.
///
/// `attempt` receives the 1-based attempt number. Failed attempts are followed
/// by a sleep that starts at `initial_delay` and grows by `backoff_multiplier`,
/// capped at `max_delay`; no sleep follows the last attempt.
///
/// # Errors
///
/// [`GatewayError::RetriesExceeded`] when every attempt failed.
pub async fn run_with_retry<F, Fut, E>(policy: RetryPolicy, mut attempt: F) -> Result<()>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<(), E>>,
    E: Display,
{
    let mut backoff = Backoff::new(policy);

    while backoff.has_remaining() {
        let try_number = backoff.attempts() + 1;
        let error = match attempt(try_number).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        match backoff.record_failure() {
            Some(delay) => {
                tracing::warn!(
                    attempt = try_number,
                    error = %error,
                    wait = ?delay,
                    "Attempt failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            None => {
                tracing::warn!(attempt = try_number, error = %error, "Attempt failed, no retries left");
            }
        }
    }

    Err(GatewayError::RetriesExceeded {
        attempts: backoff.attempts(),
    })
}
