/// Configuration for relay-service, read from the environment at startup
use crate::error::RelayError;
use crate::relay::{FanoutMode, HeartbeatConfig};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_FALLBACK_PORTS: &str = "3002,3003,3004,3005";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Tried in order when `port` is taken
    pub fallback_ports: Vec<u16>,
    /// Comma-separated origins, `*` for any
    pub allowed_origins: String,
    pub fanout: FanoutMode,
    pub heartbeat: HeartbeatConfig,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> Result<Self, RelayError> {
        let fallback_ports = parse_port_list(
            &std::env::var("RELAY_FALLBACK_PORTS")
                .unwrap_or_else(|_| DEFAULT_FALLBACK_PORTS.to_string()),
        )?;

        let interval_secs: u64 = parse_env_or_default("RELAY_HEARTBEAT_INTERVAL_SECS", 5)?;
        let timeout_secs: u64 = parse_env_or_default("RELAY_CLIENT_TIMEOUT_SECS", 60)?;
        if interval_secs == 0 || timeout_secs <= interval_secs {
            return Err(RelayError::Config(format!(
                "RELAY_CLIENT_TIMEOUT_SECS ({}) must exceed RELAY_HEARTBEAT_INTERVAL_SECS ({}), which must be non-zero",
                timeout_secs, interval_secs
            )));
        }

        Ok(Config {
            host: std::env::var("RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env_or_default("RELAY_PORT", 3001)?,
            fallback_ports,
            allowed_origins: std::env::var("RELAY_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
            fanout: parse_env_or_default("RELAY_FANOUT", FanoutMode::ExcludeSender)?,
            heartbeat: HeartbeatConfig {
                interval: Duration::from_secs(interval_secs),
                client_timeout: Duration::from_secs(timeout_secs),
            },
            log_format: parse_env_or_default("LOG_FORMAT", LogFormat::Text)?,
        })
    }

    /// Primary port first, then fallbacks, without repeats
    pub fn candidate_ports(&self) -> Vec<u16> {
        let mut ports = vec![self.port];
        for port in &self.fallback_ports {
            if !ports.contains(port) {
                ports.push(*port);
            }
        }
        ports
    }

    pub fn origins(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, RelayError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|e| {
            RelayError::Config(format!("Invalid value for {}='{}': {}", key, value, e))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_port_list(raw: &str) -> Result<Vec<u16>, RelayError> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<u16>().map_err(|e| {
                RelayError::Config(format!("Invalid port '{}' in RELAY_FALLBACK_PORTS: {}", p, e))
            })
        })
        .collect()
}
