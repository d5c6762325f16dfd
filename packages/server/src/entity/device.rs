use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A push-capable device, keyed by its APNs token.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "device")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub token: String,
    pub name: Option<String>,
    pub system_name: Option<String>,
    pub system_version: Option<String>,
    pub model: Option<String>,
    pub localized_model: Option<String>,

    #[sea_orm(has_many)]
    pub notifications: HasMany<super::notification_history::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
