//! Profile service configuration.

use std::env;

use common::DatabaseConfig;

/// Profile service configuration.
#[derive(Debug, Clone, Default)]
pub struct ProfileServiceConfig {
    pub database: DatabaseConfig,
}

impl ProfileServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = DatabaseConfig::default();
        Self {
            database: DatabaseConfig {
                url: env::var("PROFILE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.url),
                max_connections: env::var("PROFILE_DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.max_connections),
                min_connections: env::var("PROFILE_DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.min_connections),
            },
        }
    }
}
