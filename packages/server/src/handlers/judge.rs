use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::database::begin_write;
use crate::entity::{event_judge, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::judge::{AddJudgeRequest, JudgeResponse};
use crate::state::AppState;
use crate::utils::lookup::{find_event, find_event_for_update, find_event_membership, find_user};

#[utoipa::path(
    get,
    path = "/{id}/judges",
    tag = "Judges",
    operation_id = "listJudges",
    summary = "List an event's judges",
    description = "Requires organizer or admin.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Judges", body = Vec<JudgeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn list_judges(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<JudgeResponse>>, AppError> {
    auth_user.require_staff()?;
    find_event(&state.db, id).await?;

    let judges = event_judge::Entity::find()
        .filter(event_judge::Column::EventId.eq(id))
        .order_by_asc(event_judge::Column::AssignedAt)
        .find_also_related(user::Entity)
        .all(&state.db)
        .await?;

    Ok(Json(
        judges
            .into_iter()
            .filter_map(|(judge, user)| user.map(|u| JudgeResponse::build(judge, u)))
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/{id}/judges",
    tag = "Judges",
    operation_id = "addJudge",
    summary = "Assign a judge to an event",
    description = "Participants of the event cannot be assigned. Requires organizer or admin.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = AddJudgeRequest,
    responses(
        (status = 201, description = "Judge assigned", body = JudgeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event or user not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already a judge or a participant (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = %payload.user_id))]
pub async fn add_judge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<AddJudgeRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;

    let txn = begin_write(&state.db).await?;
    find_event_for_update(&txn, id).await?;
    let user = find_user(&txn, payload.user_id).await?;

    if find_event_membership(&txn, id, user.id).await?.is_some() {
        return Err(AppError::Conflict(
            "A participant of the event cannot judge it".into(),
        ));
    }

    let judge = event_judge::ActiveModel {
        event_id: Set(id),
        user_id: Set(user.id),
        assigned_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("User is already a judge of this event".into())
        }
        _ => AppError::from(e),
    })?;
    txn.commit().await?;

    tracing::info!(event_id = id, user_id = %user.id, "Judge assigned");
    Ok((StatusCode::CREATED, Json(JudgeResponse::build(judge, user))))
}

#[utoipa::path(
    delete,
    path = "/{id}/judges/{user_id}",
    tag = "Judges",
    operation_id = "removeJudge",
    summary = "Remove a judge from an event",
    description = "Scores already recorded by the judge are kept. Requires organizer or admin.",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("user_id" = Uuid, Path, description = "Judge's user ID"),
    ),
    responses(
        (status = 204, description = "Judge removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Judge not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = %user_id))]
pub async fn remove_judge(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;

    let res = event_judge::Entity::delete_by_id((id, user_id))
        .exec(&state.db)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound("Judge not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
