use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participation_member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub participation_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    #[sea_orm(belongs_to, from = "participation_id", to = "id")]
    pub participation: HasOne<super::event_participation::Entity>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// Copied from the participation so `(event_id, user_id)` can be unique.
    pub event_id: i32,

    pub joined_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
