//! Configuration loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

/// Kernel configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Data version assigned to freshly created accounts (default: "1.0.0").
    pub default_data_version: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let default_data_version =
            env::var("DEFAULT_DATA_VERSION").unwrap_or_else(|_| "1.0.0".to_string());

        Ok(Self {
            database_url,
            database_max_connections,
            default_data_version,
        })
    }
}
