use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::score;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateScoreRequest {
    pub participation_id: i32,
    /// Omit for a bonus score (organizers and admins only).
    pub activity_id: Option<i32>,
    #[schema(example = 42)]
    pub score: i32,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScoreResponse {
    pub id: i32,
    pub participation_id: i32,
    pub activity_id: Option<i32>,
    pub score: i32,
    pub judge_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<score::Model> for ScoreResponse {
    fn from(m: score::Model) -> Self {
        Self {
            id: m.id,
            participation_id: m.participation_id,
            activity_id: m.activity_id,
            score: m.value,
            judge_id: m.judge_id,
            created_at: m.created_at,
        }
    }
}

/// One row of an event's scoreboard.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ScoreboardEntry {
    pub participation_id: i32,
    pub team_name: Option<String>,
    pub captain_id: Uuid,
    pub total: i64,
    pub score_count: u64,
}
