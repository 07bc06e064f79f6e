/// Retry policy with linear or exponential backoff
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How the delay grows between attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffStrategy {
    /// `initial_backoff * attempt` (1s, 2s, 3s, ...)
    Linear,
    /// `initial_backoff * multiplier^(attempt - 1)`
    Exponential { multiplier: f64 },
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_backoff: Duration,
    /// Upper bound for any single delay
    pub max_backoff: Duration,
    pub strategy: BackoffStrategy,
    /// Add random jitter to backoff (±30%)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            strategy: BackoffStrategy::Exponential { multiplier: 2.0 },
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Fixed-step policy: waits `base * n` after the n-th failed attempt
    pub fn linear(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts,
            initial_backoff: base,
            max_backoff: base.saturating_mul(max_attempts.max(1)),
            strategy: BackoffStrategy::Linear,
            jitter: false,
        }
    }

    /// Delay to wait after `failed_attempt` (1-based) has failed, before jitter
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let attempt = failed_attempt.max(1);
        let raw = match self.strategy {
            BackoffStrategy::Linear => self.initial_backoff.saturating_mul(attempt),
            BackoffStrategy::Exponential { multiplier } => {
                let factor = multiplier.powi(attempt as i32 - 1);
                Duration::from_millis(
                    (self.initial_backoff.as_millis() as f64 * factor)
                        .min(self.max_backoff.as_millis() as f64) as u64,
                )
            }
        };
        raw.min(self.max_backoff)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    #[error("gave up after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: E },
    /// The operation failed with an error that must not be retried
    #[error("operation failed: {0}")]
    Aborted(E),
}

/// Execute a future with retry logic, retrying only errors accepted by `is_retryable`
///
/// The first error rejected by the predicate is returned immediately as
/// [`RetryError::Aborted`]; it never consumes a backoff delay.
pub async fn with_retry_if<F, Fut, T, E, P>(
    config: RetryConfig,
    mut f: F,
    is_retryable: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if !is_retryable(&e) => return Err(RetryError::Aborted(e)),
            Err(e) => {
                if attempt >= max_attempts {
                    warn!(error = %e, "Max attempts ({}) reached", max_attempts);
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }

                let delay = calculate_backoff(config.delay_for(attempt), config.jitter);

                warn!(
                    error = %e,
                    "Attempt {}/{} failed, retrying in {:?}",
                    attempt, max_attempts, delay
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn calculate_backoff(base: Duration, jitter: bool) -> Duration {
    if jitter {
        let mut rng = rand::thread_rng();
        let jitter_factor = 1.0 + rng.gen_range(-0.3..0.3); // ±30%
        Duration::from_millis((base.as_millis() as f64 * jitter_factor) as u64)
    } else {
        base
    }
}
