use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{event_activity, score};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::activity::{
    ActivityResponse, CreateActivityRequest, UpdateActivityRequest, validate_create_activity,
};
use crate::state::AppState;
use crate::utils::lookup::{find_activity, find_event};

/// Insertable row for a validated activity.
pub(crate) fn new_activity(
    event_id: i32,
    payload: CreateActivityRequest,
) -> event_activity::ActiveModel {
    event_activity::ActiveModel {
        event_id: Set(event_id),
        name: Set(payload.name.trim().to_string()),
        icon: Set(payload.icon),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        is_scoreable: Set(payload.is_scoreable),
        max_score: Set(payload.max_score),
        start_dt: Set(payload.start_dt),
        end_dt: Set(payload.end_dt),
        is_versus: Set(payload.is_versus),
        ..Default::default()
    }
}

#[utoipa::path(
    get,
    path = "/{id}/activities",
    tag = "Activities",
    operation_id = "listActivities",
    summary = "List an event's activities",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Activities", body = Vec<ActivityResponse>),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn list_activities(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ActivityResponse>>, AppError> {
    find_event(&state.db, id).await?;
    let rows = event_activity::Entity::find()
        .filter(event_activity::Column::EventId.eq(id))
        .order_by_asc(event_activity::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/{id}/activities",
    tag = "Activities",
    operation_id = "createActivity",
    summary = "Add an activity to an event",
    description = "Scoreable activities need `max_score`; the others need `start_dt < end_dt`. Requires organizer or admin.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = CreateActivityRequest,
    responses(
        (status = 201, description = "Activity created", body = ActivityResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn create_activity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateActivityRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;
    validate_create_activity(&payload)?;
    find_event(&state.db, id).await?;

    let model = new_activity(id, payload).insert(&state.db).await?;
    tracing::info!(event_id = id, activity_id = model.id, "Activity created");
    Ok((StatusCode::CREATED, Json(ActivityResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}/activities/{activity_id}",
    tag = "Activities",
    operation_id = "updateActivity",
    summary = "Update an activity",
    description = "PATCH semantics; the merged activity must still satisfy the scoring and scheduling rules. Requires organizer or admin.",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("activity_id" = i32, Path, description = "Activity ID"),
    ),
    request_body = UpdateActivityRequest,
    responses(
        (status = 200, description = "Activity updated", body = ActivityResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event or activity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, activity_id))]
pub async fn update_activity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, activity_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateActivityRequest>,
) -> Result<Json<ActivityResponse>, AppError> {
    auth_user.require_staff()?;

    let txn = state.db.begin().await?;
    let existing = find_activity(&txn, id, activity_id).await?;
    let merged = payload.merge_into(existing.clone())?;

    let mut active: event_activity::ActiveModel = existing.into();
    active.name = Set(merged.name);
    active.icon = Set(merged.icon);
    active.latitude = Set(merged.latitude);
    active.longitude = Set(merged.longitude);
    active.is_scoreable = Set(merged.is_scoreable);
    active.max_score = Set(merged.max_score);
    active.start_dt = Set(merged.start_dt);
    active.end_dt = Set(merged.end_dt);
    active.is_versus = Set(merged.is_versus);

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}/activities/{activity_id}",
    tag = "Activities",
    operation_id = "deleteActivity",
    summary = "Delete an activity",
    description = "Deletes the activity and the scores recorded for it. Requires organizer or admin.",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("activity_id" = i32, Path, description = "Activity ID"),
    ),
    responses(
        (status = 204, description = "Activity deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event or activity not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, activity_id))]
pub async fn delete_activity(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, activity_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;

    let txn = state.db.begin().await?;
    find_activity(&txn, id, activity_id).await?;
    score::Entity::delete_many()
        .filter(score::Column::ActivityId.eq(activity_id))
        .exec(&txn)
        .await?;
    event_activity::Entity::delete_by_id(activity_id)
        .exec(&txn)
        .await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
