use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::event_participation::{self, ParticipantType};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateParticipationRequest {
    pub participant_type: ParticipantType,
    /// Required for team participations (1-100 characters).
    #[schema(example = "Byte Busters")]
    pub team_name: Option<String>,
}

/// Returns the trimmed team name to store.
pub fn validate_create_participation(
    payload: &CreateParticipationRequest,
) -> Result<Option<String>, AppError> {
    match payload.participant_type {
        ParticipantType::Individual => Ok(None),
        ParticipantType::Team => {
            let name = payload.team_name.as_deref().map(str::trim).unwrap_or("");
            if name.is_empty() || name.chars().count() > 100 {
                return Err(AppError::Validation(
                    "team_name must be 1-100 characters for team participations".into(),
                ));
            }
            Ok(Some(name.to_string()))
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub handle: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub is_captain: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ParticipationResponse {
    pub id: i32,
    pub event_id: i32,
    pub participant_type: ParticipantType,
    pub team_name: Option<String>,
    pub avatar_url: Option<String>,
    /// The creator; for teams, the current captain.
    pub captain_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// In join order.
    pub members: Vec<MemberResponse>,
}

impl ParticipationResponse {
    pub fn build(p: event_participation::Model, members: Vec<MemberResponse>) -> Self {
        Self {
            id: p.id,
            event_id: p.event_id,
            participant_type: p.participant_type,
            team_name: p.team_name,
            avatar_url: p.avatar_url,
            captain_id: p.creator_id,
            created_at: p.created_at,
            members,
        }
    }
}

/// Returned by `POST /events/{id}/participate`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ParticipationCreated {
    pub id: i32,
    pub event_id: i32,
    pub participant_type: ParticipantType,
    pub team_name: Option<String>,
    pub captain_id: Uuid,
}

impl From<event_participation::Model> for ParticipationCreated {
    fn from(p: event_participation::Model) -> Self {
        Self {
            id: p.id,
            event_id: p.event_id,
            participant_type: p.participant_type,
            team_name: p.team_name,
            captain_id: p.creator_id,
        }
    }
}
