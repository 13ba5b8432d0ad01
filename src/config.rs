use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub stats_cache_ttl_secs: u64,
    pub stats_retry_attempts: u32,
    pub stats_retry_backoff_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            stats_cache_ttl_secs: parse_or_default("STATS_CACHE_TTL_SECS", 30)?,
            stats_retry_attempts: parse_or_default("STATS_RETRY_ATTEMPTS", 3)?,
            stats_retry_backoff_ms: parse_or_default("STATS_RETRY_BACKOFF_MS", 250)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 1024,
            stats_cache_ttl_secs: 30,
            stats_retry_attempts: 3,
            stats_retry_backoff_ms: 250,
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
