//! Application configuration.

use std::env;

use auth_service_lib::config::AuthServiceConfig;
use common::WalletConfig;
use profile_service_lib::config::ProfileServiceConfig;

/// Configuration for every component the application wires together.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub auth: AuthServiceConfig,
    pub profile: ProfileServiceConfig,
    pub wallet: WalletConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            auth: AuthServiceConfig::from_env(),
            profile: ProfileServiceConfig::from_env(),
            wallet: wallet_from_env(),
        }
    }
}

fn wallet_from_env() -> WalletConfig {
    let defaults = WalletConfig::default();
    WalletConfig {
        create_delay_ms: env_millis("WALLET_CREATE_DELAY_MS").unwrap_or(defaults.create_delay_ms),
        connect_delay_ms: env_millis("WALLET_CONNECT_DELAY_MS").unwrap_or(defaults.connect_delay_ms),
        mint_delay_ms: env_millis("MINT_DELAY_MS").unwrap_or(defaults.mint_delay_ms),
    }
}

fn env_millis(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
