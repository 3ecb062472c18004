//! Bounded retry for "backend not ready yet" failures.

use std::thread;
use std::time::Duration;

use crate::errors::Result;

/// How often and how patiently to retry a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between two consecutive attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or runs out of attempts.
///
/// `op` receives the 1-based attempt number.  Only errors for which
/// `ButlerError::is_transient` holds are retried; the error of the last
/// attempt is returned unchanged.  Blocks the calling thread while waiting.
pub fn retry_transient<T, F>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Result<T>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts,
                    error = %e,
                    "Database not ready, retrying"
                );
                thread::sleep(policy.backoff);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
