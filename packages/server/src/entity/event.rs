use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: Option<String>,
    pub date: Date,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,

    pub is_team: bool,
    /// Individual events: participant cap. Team events: per-team member cap.
    pub max_members: i32,
    /// Only set for team events.
    pub max_teams: Option<i32>,

    #[sea_orm(has_many)]
    pub media: HasMany<super::event_media::Entity>,

    #[sea_orm(has_many)]
    pub activities: HasMany<super::event_activity::Entity>,

    #[sea_orm(has_many)]
    pub participations: HasMany<super::event_participation::Entity>,

    #[sea_orm(has_many)]
    pub judges: HasMany<super::event_judge::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
