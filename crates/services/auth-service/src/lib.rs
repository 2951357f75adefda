//! Auth Service Library
//!
//! Client-side authentication against an external identity service:
//! the HTTP client, local session storage, the auth event hub, the
//! gateway used by forms, and the session monitor the rest of the
//! application reads.

pub mod client;
pub mod config;
pub mod service;
pub mod storage;

use std::sync::Arc;

use tracing::info;

use common::AppResult;

use crate::client::GoTrueClient;
use crate::config::AuthServiceConfig;
use crate::service::{AuthClient, Authenticator};
use crate::storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};

pub use crate::service::{AuthGateway, SessionMonitor, SessionState};

/// Build the auth client and gateway from configuration.
pub fn build(config: &AuthServiceConfig) -> AppResult<(Arc<AuthClient>, Arc<Authenticator>)> {
    let provider = Arc::new(GoTrueClient::new(&config.identity)?);

    let storage: Arc<dyn SessionStorage> = if config.session.persist {
        info!("Persisting session to {}", config.session.file.display());
        Arc::new(FileSessionStorage::new(config.session.file.clone()))
    } else {
        Arc::new(MemorySessionStorage::new())
    };

    let client = Arc::new(AuthClient::new(provider, storage));
    let gateway = Arc::new(Authenticator::new(
        Arc::clone(&client),
        &config.identity.site_origin,
    )?);

    Ok((client, gateway))
}
