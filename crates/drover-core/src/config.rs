// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration loading from environment variables.

/// Drover Core configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Maximum connections in the database pool
    pub max_db_connections: u32,
    /// Default page size for listings when the caller gives none
    pub default_page_size: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `DROVER_DATABASE_URL`: PostgreSQL connection string
    ///
    /// Optional (with defaults):
    /// - `DROVER_MAX_DB_CONNECTIONS`: Max pool connections (default: 10)
    /// - `DROVER_DEFAULT_PAGE_SIZE`: Default listing page size (default: 100)
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DROVER_DATABASE_URL")
            .map_err(|_| ConfigError::Missing("DROVER_DATABASE_URL"))?;

        let max_db_connections: u32 = std::env::var("DROVER_MAX_DB_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("DROVER_MAX_DB_CONNECTIONS", "must be a positive integer")
            })?;

        let default_page_size: i64 = std::env::var("DROVER_DEFAULT_PAGE_SIZE")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .map_err(|_| {
                ConfigError::Invalid("DROVER_DEFAULT_PAGE_SIZE", "must be an integer")
            })?;

        if max_db_connections == 0 {
            return Err(ConfigError::Invalid(
                "DROVER_MAX_DB_CONNECTIONS",
                "must be at least 1",
            ));
        }

        Ok(Self {
            database_url,
            max_db_connections,
            default_page_size,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable has an invalid value.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}
