//! Profile synchronizer - loads and updates the linked account identifier.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use common::AppResult;

use crate::repository::ProfileRepository;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Profile synchronizer trait for dependency injection.
///
/// Writes are not retried; concurrent writes for one user are
/// last-write-wins at the store.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProfileSynchronizer: Send + Sync {
    /// Linked account identifier for the user, if any
    async fn load(&self, user_id: Uuid) -> AppResult<Option<String>>;

    /// Link (`Some`) or unlink (`None`) an account
    async fn set_account_identifier(&self, user_id: Uuid, value: Option<String>) -> AppResult<()>;
}

/// Concrete implementation of ProfileSynchronizer using repository.
pub struct ProfileSync {
    repo: Arc<dyn ProfileRepository>,
}

impl ProfileSync {
    pub fn new(repo: Arc<dyn ProfileRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ProfileSynchronizer for ProfileSync {
    async fn load(&self, user_id: Uuid) -> AppResult<Option<String>> {
        let account = self.repo.find_account_id(user_id).await?;
        debug!("Loaded profile {} (linked: {})", user_id, account.is_some());
        Ok(account)
    }

    async fn set_account_identifier(&self, user_id: Uuid, value: Option<String>) -> AppResult<()> {
        self.repo
            .update_account_id(user_id, value)
            .await
            .inspect_err(|e| warn!("Profile write for {} failed: {}", user_id, e))
    }
}
