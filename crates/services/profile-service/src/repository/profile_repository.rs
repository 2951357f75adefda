//! Profile repository over the `profiles` table.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;
use uuid::Uuid;

use super::entities::profile::{self, Entity as ProfileEntity};
use common::{AppError, AppResult};
use domain::Profile;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Profile repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Linked account identifier; None if there is no row or it is unset
    async fn find_account_id(&self, id: Uuid) -> AppResult<Option<String>>;

    /// Set or clear the linked account identifier
    async fn update_account_id(&self, id: Uuid, account_id: Option<String>) -> AppResult<()>;
}

/// Concrete implementation of ProfileRepository
pub struct ProfileStore {
    db: DatabaseConnection,
}

impl ProfileStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileRepository for ProfileStore {
    async fn find_account_id(&self, id: Uuid) -> AppResult<Option<String>> {
        let result = ProfileEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Profile::from).and_then(|p| p.external_account_id))
    }

    async fn update_account_id(&self, id: Uuid, account_id: Option<String>) -> AppResult<()> {
        let result = ProfileEntity::update_many()
            .col_expr(profile::Column::ExternalAccountId, Expr::value(account_id))
            .filter(profile::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        // Rows are created with the account; a missing one is a rejected write
        if result.rows_affected == 0 {
            return Err(AppError::persistence(format!("no profile row for user {}", id)));
        }

        debug!("Updated account identifier for profile {}", id);
        Ok(())
    }
}
