use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub device_id: i32,
    #[sea_orm(belongs_to, from = "device_id", to = "id")]
    pub device: HasOne<super::device::Entity>,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    /// `Success` or the APNs failure reason.
    pub apns_status: String,
    pub destination: Option<String>,
    pub sound: Option<String>,

    pub sent_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
