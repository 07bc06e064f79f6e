/// Per-attempt time limits for async operations
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub duration: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    #[error("timed out after {0:?}")]
    Elapsed(Duration),
    #[error("{0}")]
    OperationFailed(E),
}

/// Execute a fallible future with timeout, keeping the operation's own error
pub async fn with_timeout_result<F, T, E>(duration: Duration, future: F) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    timeout(duration, future)
        .await
        .map_err(|_| TimeoutError::Elapsed(duration))?
        .map_err(TimeoutError::OperationFailed)
}
