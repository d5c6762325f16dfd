use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{event_judge, user};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddJudgeRequest {
    pub user_id: Uuid,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct JudgeResponse {
    pub event_id: i32,
    pub user_id: Uuid,
    pub handle: String,
    pub full_name: String,
    pub assigned_at: DateTime<Utc>,
}

impl JudgeResponse {
    pub fn build(judge: event_judge::Model, user: user::Model) -> Self {
        Self {
            event_id: judge.event_id,
            user_id: judge.user_id,
            handle: user.handle,
            full_name: user.full_name,
            assigned_at: judge.assigned_at,
        }
    }
}
