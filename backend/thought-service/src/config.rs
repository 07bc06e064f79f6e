/// Configuration management for thought-service
///
/// Loaded once at startup from environment variables (a `.env` file is read
/// first by `main`). Unparsable numbers are errors, never silent defaults.
use resilience::{RetryConfig, ServiceConfig, TimeoutConfig};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
    /// Public URL of the storefront
    pub site_url: String,
    /// Where the storefront reaches this service
    pub api_base_url: String,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins, or `*`
    pub allowed_origins: String,
}

impl CorsConfig {
    pub fn origins(&self) -> Vec<&str> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .collect()
    }

    pub fn allows_any(&self) -> bool {
        self.origins().contains(&"*")
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub attempt_timeout_ms: u64,
}

impl StoreConfig {
    /// Retry/timeout policy applied to every store call
    pub fn policy(&self) -> ServiceConfig {
        ServiceConfig {
            timeout: TimeoutConfig {
                duration: Duration::from_millis(self.attempt_timeout_ms),
            },
            retry: RetryConfig::linear(
                self.retry_max_attempts,
                Duration::from_millis(self.retry_base_delay_ms),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = env_string("APP_ENV", "development");
        let production = app_env.eq_ignore_ascii_case("production");
        let site_url = env_string("SITE_URL", "http://localhost:3000");

        let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
            Ok(value) => value,
            Err(_) if production => {
                return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
            }
            Err(_) => site_url.clone(),
        };
        let cors = CorsConfig { allowed_origins };
        if production && cors.allows_any() {
            return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
        }

        let retry_max_attempts = parse_env_or_default("STORE_RETRY_MAX_ATTEMPTS", 3u32)?;
        if retry_max_attempts == 0 {
            return Err("STORE_RETRY_MAX_ATTEMPTS must be at least 1".to_string());
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: env_string("THOUGHT_SERVICE_HOST", "0.0.0.0"),
                port: parse_env_or_default("THOUGHT_SERVICE_PORT", 3000u16)?,
                api_base_url: env_string("API_BASE_URL", "http://localhost:3000/api"),
                site_url,
            },
            cors,
            database: DatabaseConfig {
                url: env_string("DATABASE_URL", "postgresql://localhost/freefall"),
            },
            store: StoreConfig {
                backend: parse_env_or_default("THOUGHT_STORE", StoreBackend::Postgres)?,
                retry_max_attempts,
                retry_base_delay_ms: parse_env_or_default("STORE_RETRY_BASE_DELAY_MS", 1000u64)?,
                attempt_timeout_ms: parse_env_or_default("STORE_ATTEMPT_TIMEOUT_MS", 10_000u64)?,
            },
            log: LogConfig {
                format: log_format_from_env()?,
            },
        })
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| format!("Invalid value for {}='{}': {}", key, value, e)),
        Err(_) => Ok(default),
    }
}

fn log_format_from_env() -> Result<LogFormat, String> {
    match std::env::var("LOG_FORMAT") {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "" => Ok(LogFormat::Text),
            other => Err(format!("Invalid value for LOG_FORMAT='{}'", other)),
        },
        Err(_) => Ok(LogFormat::Text),
    }
}
