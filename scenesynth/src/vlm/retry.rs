//! Retry policy for provider calls.
//!
//! Transient failures are retried with capped exponential backoff; malformed
//! responses are returned unchanged. The policy is an explicit value so the
//! discipline is visible at every call site instead of being threaded
//! through loops.

use crate::error::ClassifierError;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// None retries transient failures indefinitely.
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            initial_delay: Duration::from_secs(1),
            multiplier: 1.1,
            max_delay: Duration::from_secs(20),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following failure number `failures` (0-based).
    pub fn delay_for(&self, failures: u32) -> Duration {
        let delay = self.initial_delay.as_secs_f64() * self.multiplier.powi(failures as i32);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Runs `call` until it succeeds or fails non-transiently.
///
/// `what` names the operation in log lines.
pub async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut call: F,
) -> Result<T, ClassifierError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifierError>>,
{
    let mut attempt: u32 = 1;
    loop {
        match call().await {
            Ok(value) => {
                if attempt > 1 {
                    info!("{} succeeded on attempt {}", what, attempt);
                }
                return Ok(value);
            }
            Err(e) if e.is_transient() => {
                if let Some(max) = policy.max_attempts {
                    if attempt >= max {
                        return Err(e);
                    }
                }
                let delay = policy.delay_for(attempt - 1);
                warn!(
                    "Transient failure in {} (attempt {}): {}. Retrying in {:.1}s",
                    what,
                    attempt,
                    e,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
