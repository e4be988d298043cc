use crate::errors::AnalysisError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Bounded exponential backoff policy.
///
/// A fixed delay hammers the server at the exact moment it is asking us to
/// slow down. Doubling the wait gives the API breathing room while the first
/// retry still happens quickly, and the random jitter keeps concurrently
/// retrying clients from lining up.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1500,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows failed attempt `attempt` (0-based):
    /// `base * 2^attempt` plus up to 500ms of jitter.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let jitter_ms = rand::thread_rng().gen_range(0..500);
        let backoff_ms = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(backoff_ms + jitter_ms)
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. The last error is propagated; no wait happens
/// after the final attempt.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if !err.is_retryable() || attempt >= max_attempts {
                    return Err(err);
                }

                let delay = policy.backoff_delay(attempt - 1);
                tracing::debug!(
                    "retry {}/{} in {}ms: {}",
                    attempt,
                    max_attempts - 1,
                    delay.as_millis(),
                    err
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
