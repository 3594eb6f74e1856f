// ============================================================================
// Sensorgate Config - Centralized configuration management
// ============================================================================
//
// Configuration for the Sensorgate authorization gateway. All options load
// from environment variables with sensible defaults; only the database
// connection strings are mandatory.
//
// ============================================================================

mod constants;
mod database;
mod logging;
mod mqtt;

pub use database::{DatabaseConfig, MongoConfig, PgSqlConfig};
pub use logging::LoggingConfig;
pub use mqtt::{BrokerConfig, MqttConfig};

use anyhow::Result;
use constants::*;

/// Main configuration structure for the authorization gateway.
#[derive(Clone, Debug)]
pub struct Config {
    /// Tick period of the processing loop, in milliseconds.
    pub interval_ms: u64,

    /// Number of ingress shards; one worker task per shard per tick.
    pub workers: usize,

    /// Maximum number of records per outbound publish. Larger authorized
    /// batches are split.
    pub internal_batch_size: usize,

    /// Lifetime of a cache entry before it must be re-validated against the
    /// repositories.
    pub cache_ttl_secs: u64,

    /// Period between bulk cache reloads.
    pub reload_secs: u64,

    /// Per-tick budget for the expired-entry sweep, in milliseconds.
    pub cleanup_budget_ms: u64,

    pub mqtt: MqttConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            interval_ms: env_parse_or("INTERVAL_MS", DEFAULT_INTERVAL_MS),
            workers: env_parse_or("WORKERS", DEFAULT_WORKERS).max(1),
            internal_batch_size: env_parse_or("INTERNAL_BATCH_SIZE", DEFAULT_INTERNAL_BATCH_SIZE)
                .max(1),
            cache_ttl_secs: env_parse_or("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS),
            reload_secs: env_parse_or("RELOAD_SECS", DEFAULT_RELOAD_SECS),
            cleanup_budget_ms: env_parse_or("CLEANUP_BUDGET_MS", DEFAULT_CLEANUP_BUDGET_MS),
            mqtt: MqttConfig::from_env(),
            database: DatabaseConfig::from_env()?,
            logging: LoggingConfig::from_env(),
        })
    }
}

pub(crate) fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
