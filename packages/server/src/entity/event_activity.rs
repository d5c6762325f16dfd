use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event_activity")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub event_id: i32,
    #[sea_orm(belongs_to, from = "event_id", to = "id")]
    pub event: HasOne<super::event::Entity>,

    pub name: String,
    pub icon: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub is_scoreable: bool,
    pub max_score: Option<i32>,
    pub start_dt: Option<DateTimeUtc>,
    pub end_dt: Option<DateTimeUtc>,
    /// Head-to-head activity between two participations.
    pub is_versus: bool,

    #[sea_orm(has_many)]
    pub scores: HasMany<super::score::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
