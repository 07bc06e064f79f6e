/// Resilience patterns for store and service calls
///
/// - **Retry**: linear or exponential backoff, with a predicate deciding which
///   errors are transient
/// - **Timeout**: bounds a single attempt
/// - **Presets**: the policy used for relational store calls
///
/// # Example: Database Query with Retry
///
/// ```rust,no_run
/// use resilience::{presets, with_retry_if};
///
/// #[tokio::main]
/// async fn main() {
///     let config = presets::database_config();
///
///     let result = with_retry_if(
///         config.retry,
///         || async {
///             // Your database query
///             Ok::<_, String>(())
///         },
///         |e: &String| e.contains("connection"),
///     )
///     .await;
/// }
/// ```

pub mod presets;
pub mod retry;
pub mod timeout;

pub use presets::{database_config, ServiceConfig};
pub use retry::{with_retry_if, BackoffStrategy, RetryConfig, RetryError};
pub use timeout::{with_timeout_result, TimeoutConfig, TimeoutError};
