/// Thought Service Library
///
/// Persistence gateway for Free Fall: anonymous posts with a mood, comments
/// and like counters, served over a small REST surface.
///
/// # Modules
///
/// - `config`: Environment-driven configuration
/// - `db`: Store seam with PostgreSQL and in-memory implementations
/// - `error`: Error types and HTTP mapping
/// - `handlers`: HTTP request handlers
/// - `models`: Data structures
/// - `services`: Validation and retried store operations
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
