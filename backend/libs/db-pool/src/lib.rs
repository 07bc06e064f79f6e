//! Database connection pool management
//!
//! Provides PostgreSQL pool creation and configuration for the Free Fall services

mod metrics;

use metrics::update_pool_metrics;

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info};

const METRICS_REFRESH: Duration = Duration::from_secs(30);

/// Database connection pool configuration
#[derive(Clone)]
pub struct DbConfig {
    /// Service name for metrics labeling
    pub service_name: String,
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection creation timeout (new connection to PostgreSQL)
    pub connect_timeout_secs: u64,
    /// Connection acquisition timeout (get connection from pool)
    pub acquire_timeout_secs: u64,
    /// Connection idle timeout
    pub idle_timeout_secs: u64,
    /// Connection maximum lifetime
    pub max_lifetime_secs: u64,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("service_name", &self.service_name)
            .field("database_url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("max_lifetime_secs", &self.max_lifetime_secs)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            service_name: String::from("unknown"),
            database_url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 5,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl DbConfig {
    /// Read `DATABASE_URL` and the `DB_*` pool overrides
    ///
    /// A missing URL is left empty for the caller to fill in. A present but
    /// unparsable number is an error.
    pub fn from_env(service_name: &str) -> Result<Self, String> {
        let defaults = Self::default();

        Ok(Self {
            service_name: service_name.to_string(),
            database_url: std::env::var("DATABASE_URL").unwrap_or_default(),
            max_connections: env_or("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: env_or("DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs)?,
            acquire_timeout_secs: env_or("DB_ACQUIRE_TIMEOUT_SECS", defaults.acquire_timeout_secs)?,
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", defaults.idle_timeout_secs)?,
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", defaults.max_lifetime_secs)?,
        })
    }

    /// One line summary for startup logs, never includes the URL
    pub fn log_config(&self) {
        info!(
            service = %self.service_name,
            max = self.max_connections,
            min = self.min_connections,
            connect_timeout_secs = self.connect_timeout_secs,
            acquire_timeout_secs = self.acquire_timeout_secs,
            "Database pool configuration"
        );
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
            .test_before_acquire(true)
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

/// Connect, prove the database answers, then start refreshing pool gauges
pub async fn create_pool(config: DbConfig) -> Result<PgPool, sqlx::Error> {
    let pool = config.pool_options().connect(&config.database_url).await?;
    verify(&pool, &config).await?;

    info!(service = %config.service_name, "Database pool ready");
    spawn_metrics_refresh(pool.clone(), config.service_name);

    Ok(pool)
}

/// `SELECT 1` bounded by the connect timeout
async fn verify(pool: &PgPool, config: &DbConfig) -> Result<(), sqlx::Error> {
    let limit = Duration::from_secs(config.connect_timeout_secs);

    match tokio::time::timeout(limit, sqlx::query("SELECT 1").execute(pool)).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => {
            error!(service = %config.service_name, error = %e, "Database did not answer SELECT 1");
            Err(e)
        }
        Err(_) => {
            error!(
                service = %config.service_name,
                timeout_secs = config.connect_timeout_secs,
                "Database verification timed out"
            );
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}

fn spawn_metrics_refresh(pool: PgPool, service: String) {
    update_pool_metrics(&pool, &service);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(METRICS_REFRESH);
        loop {
            tick.tick().await;
            if pool.is_closed() {
                break;
            }
            update_pool_metrics(&pool, &service);
        }
    });
}
