// ============================================================================
// Database Configuration
// ============================================================================

use anyhow::{Context, Result};

use crate::env_parse_or;

/// PostgreSQL settings (users and API keys).
#[derive(Clone, Debug)]
pub struct PgSqlConfig {
    pub connection_string: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Timeout for acquiring a connection from the pool (seconds)
    pub acquire_timeout_secs: u64,
}

/// MongoDB settings (sensor documents).
#[derive(Clone, Debug)]
pub struct MongoConfig {
    pub connection_string: String,
    pub database_name: String,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub pgsql: PgSqlConfig,
    pub mongodb: MongoConfig,
}

impl DatabaseConfig {
    pub(crate) fn from_env() -> Result<Self> {
        Ok(Self {
            pgsql: PgSqlConfig {
                connection_string: std::env::var("DATABASE_URL")
                    .context("DATABASE_URL is required")?,
                max_connections: env_parse_or("DB_MAX_CONNECTIONS", 10),
                acquire_timeout_secs: env_parse_or("DB_ACQUIRE_TIMEOUT_SECS", 30),
            },
            mongodb: MongoConfig {
                connection_string: std::env::var("MONGODB_CONNECTION_STRING")
                    .context("MONGODB_CONNECTION_STRING is required")?,
                database_name: std::env::var("MONGODB_DATABASE_NAME")
                    .unwrap_or_else(|_| "sensorgate".to_string()),
            },
        })
    }
}
