//! Profile database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::Profile;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    /// Same identifier as the identity-service user
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub external_account_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Profile {
    fn from(model: Model) -> Self {
        Profile {
            id: model.id,
            external_account_id: model.external_account_id,
        }
    }
}
