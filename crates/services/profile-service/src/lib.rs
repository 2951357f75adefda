//! Profile Service Library
//!
//! Reads and writes the per-user profile record that holds the linked
//! external account identifier.

pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use common::AppResult;

use crate::config::ProfileServiceConfig;
use crate::infra::Database;
use crate::repository::ProfileStore;
use crate::service::ProfileSync;

pub use crate::service::ProfileSynchronizer;

/// Connect to the profile database and build the synchronizer.
pub async fn build(config: &ProfileServiceConfig) -> AppResult<Arc<ProfileSync>> {
    let db = Database::connect(&config.database).await?;
    let repo = Arc::new(ProfileStore::new(db.into_connection()));
    Ok(Arc::new(ProfileSync::new(repo)))
}
