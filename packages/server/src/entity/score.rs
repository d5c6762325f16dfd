use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "score")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub participation_id: i32,
    #[sea_orm(belongs_to, from = "participation_id", to = "id")]
    pub participation: HasOne<super::event_participation::Entity>,

    /// NULL for bonus points awarded outside any activity.
    pub activity_id: Option<i32>,
    #[sea_orm(belongs_to, from = "activity_id", to = "id")]
    pub activity: Option<super::event_activity::Entity>,

    pub value: i32,

    /// Who recorded the score.
    pub judge_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "judge_id", to = "id")]
    pub judge: Option<super::user::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
