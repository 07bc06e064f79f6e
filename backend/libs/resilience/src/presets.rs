/// Preset configurations for common dependency types
use crate::retry::RetryConfig;
use crate::timeout::TimeoutConfig;
use std::time::Duration;

/// Configuration bundle for a dependency type
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub timeout: TimeoutConfig,
    pub retry: RetryConfig,
}

/// Relational store calls (PostgreSQL)
///
/// - Timeout: 10s per attempt
/// - Retry: 3 attempts total, linear backoff (1s, then 2s), no jitter
pub fn database_config() -> ServiceConfig {
    ServiceConfig {
        timeout: TimeoutConfig {
            duration: Duration::from_secs(10),
        },
        retry: RetryConfig::linear(3, Duration::from_millis(1000)),
    }
}
