use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{event_activity, event_participation, score};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::score::{CreateScoreRequest, ScoreResponse, ScoreboardEntry};
use crate::services::scoring;
use crate::state::AppState;
use crate::utils::lookup::{find_event, find_participation, is_judge};

#[utoipa::path(
    post,
    path = "/",
    tag = "Scores",
    operation_id = "createScore",
    summary = "Record a score",
    description = "Activity scores may be recorded by the event's judges, organizers and admins; \
        bonus scores (no `activity_id`) by organizers and admins only. The value must lie in `0..=max_score`.",
    request_body = CreateScoreRequest,
    responses(
        (status = 201, description = "Score recorded", body = ScoreResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller may not score this event (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Participation or activity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(participation_id = payload.participation_id, user_id = %auth_user.user_id))]
pub async fn create_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    let participation = find_participation(&state.db, payload.participation_id).await?;

    let activity = match payload.activity_id {
        Some(activity_id) => Some(
            event_activity::Entity::find_by_id(activity_id)
                .one(&state.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Activity not found".into()))?,
        ),
        None => None,
    };

    let judge = is_judge(&state.db, participation.event_id, auth_user.user_id).await?;
    scoring::authorize(auth_user.is_staff(), judge, activity.is_none())?;
    scoring::validate_score(payload.score, participation.event_id, activity.as_ref())?;

    let model = score::ActiveModel {
        participation_id: Set(participation.id),
        activity_id: Set(payload.activity_id),
        value: Set(payload.score),
        judge_id: Set(Some(auth_user.user_id)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    tracing::info!(
        score_id = model.id,
        participation_id = participation.id,
        value = model.value,
        "Score recorded"
    );
    Ok((StatusCode::CREATED, Json(ScoreResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}/scores",
    tag = "Scores",
    operation_id = "eventScoreboard",
    summary = "Score totals per participation",
    description = "Every participation of the event with the sum of its scores, highest first.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Scoreboard", body = Vec<ScoreboardEntry>),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn event_scoreboard(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ScoreboardEntry>>, AppError> {
    find_event(&state.db, id).await?;

    let participations = event_participation::Entity::find()
        .filter(event_participation::Column::EventId.eq(id))
        .all(&state.db)
        .await?;

    let scores = score::Entity::find()
        .filter(score::Column::ParticipationId.is_in(participations.iter().map(|p| p.id)))
        .all(&state.db)
        .await?;

    let mut totals: HashMap<i32, (i64, u64)> = HashMap::new();
    for s in scores {
        let entry = totals.entry(s.participation_id).or_default();
        entry.0 += i64::from(s.value);
        entry.1 += 1;
    }

    let mut board: Vec<ScoreboardEntry> = participations
        .into_iter()
        .map(|p| {
            let (total, score_count) = totals.get(&p.id).copied().unwrap_or_default();
            ScoreboardEntry {
                participation_id: p.id,
                team_name: p.team_name,
                captain_id: p.creator_id,
                total,
                score_count,
            }
        })
        .collect();
    board.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then(a.participation_id.cmp(&b.participation_id))
    });

    Ok(Json(board))
}
