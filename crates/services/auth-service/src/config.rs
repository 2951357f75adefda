//! Auth service configuration.

use std::env;
use std::path::PathBuf;

use common::{IdentityConfig, SessionConfig};

/// Default session file name inside the application data directory
const SESSION_FILE_NAME: &str = "session.json";

/// Application directory name
const APP_DIR_NAME: &str = "aquarights";

/// Auth service configuration.
#[derive(Debug, Clone, Default)]
pub struct AuthServiceConfig {
    /// Identity service endpoint and key
    pub identity: IdentityConfig,
    /// Local session persistence
    pub session: SessionConfig,
}

impl AuthServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = IdentityConfig::default();

        Self {
            identity: IdentityConfig {
                url: env::var("IDENTITY_SERVICE_URL")
                    .or_else(|_| env::var("SUPABASE_URL"))
                    .unwrap_or(defaults.url),
                api_key: env::var("IDENTITY_SERVICE_API_KEY")
                    .or_else(|_| env::var("SUPABASE_ANON_KEY"))
                    .unwrap_or(defaults.api_key),
                site_origin: env::var("SITE_ORIGIN").unwrap_or(defaults.site_origin),
            },
            session: SessionConfig {
                persist: env::var("PERSIST_SESSION")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(true),
                file: env::var("SESSION_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| default_session_file()),
            },
        }
    }
}

/// `<data_dir>/aquarights/session.json`, or the working directory when the
/// platform has no data directory.
fn default_session_file() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(SESSION_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(SESSION_FILE_NAME))
}
