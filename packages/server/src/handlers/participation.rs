use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::storage::StorageKey;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::database::begin_write;
use crate::entity::event_participation::{self, ParticipantType};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::multipart::AppMultipart;
use crate::models::participation::{
    CreateParticipationRequest, ParticipationCreated, ParticipationResponse,
    validate_create_participation,
};
use crate::models::user::AvatarUpload;
use crate::services::participation::{ParticipationService, load_members, lock_participation};
use crate::state::AppState;
use crate::utils::lookup::{find_event, find_event_for_update, find_participation};
use crate::utils::upload::{
    discard_file, extension, require_image, store_file, validate_upload_filename,
};

async fn participation_response<C: ConnectionTrait>(
    conn: &C,
    participation: event_participation::Model,
) -> Result<ParticipationResponse, AppError> {
    let mut members = load_members(conn, std::slice::from_ref(&participation)).await?;
    let members = members.remove(&participation.id).unwrap_or_default();
    Ok(ParticipationResponse::build(participation, members))
}

#[utoipa::path(
    post,
    path = "/{id}/participate",
    tag = "Participations",
    operation_id = "participate",
    summary = "Enter an event",
    description = "Creates an individual entry (non-team events) or a new team captained by the caller (team events). \
        A user holds at most one participation per event, and judges of the event cannot enter it.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = CreateParticipationRequest,
    responses(
        (status = 201, description = "Participation created", body = ParticipationCreated),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already participating, judging, or event full (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, user_id = %auth_user.user_id))]
pub async fn participate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CreateParticipationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let team_name = validate_create_participation(&payload)?;

    let txn = begin_write(&state.db).await?;
    let event = find_event_for_update(&txn, id).await?;
    let participation = ParticipationService::new(&txn)
        .create(&event, auth_user.user_id, payload.participant_type, team_name)
        .await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(ParticipationCreated::from(participation)),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}/participations",
    tag = "Participations",
    operation_id = "listEventParticipations",
    summary = "List an event's participations with members",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Participations", body = Vec<ParticipationResponse>),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn list_event_participations(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<ParticipationResponse>>, AppError> {
    find_event(&state.db, id).await?;

    let participations = event_participation::Entity::find()
        .filter(event_participation::Column::EventId.eq(id))
        .order_by_asc(event_participation::Column::Id)
        .all(&state.db)
        .await?;
    let mut members = load_members(&state.db, &participations).await?;

    Ok(Json(
        participations
            .into_iter()
            .map(|p| {
                let m = members.remove(&p.id).unwrap_or_default();
                ParticipationResponse::build(p, m)
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Participations",
    operation_id = "getParticipation",
    summary = "Get a participation with its members",
    params(("id" = i32, Path, description = "Participation ID")),
    responses(
        (status = 200, description = "Participation", body = ParticipationResponse),
        (status = 404, description = "Participation not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_participation(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ParticipationResponse>, AppError> {
    let participation = find_participation(&state.db, id).await?;
    Ok(Json(participation_response(&state.db, participation).await?))
}

#[utoipa::path(
    post,
    path = "/{id}/join",
    tag = "Participations",
    operation_id = "joinTeam",
    summary = "Join a team",
    description = "Adds the caller to a team while it has fewer than the event's `max_members` members.",
    params(("id" = i32, Path, description = "Participation ID")),
    responses(
        (status = 204, description = "Joined"),
        (status = 400, description = "Not a team (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Participation not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Team full, already participating, or judging (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = %auth_user.user_id))]
pub async fn join_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = begin_write(&state.db).await?;
    let (event, participation) = lock_participation(&txn, id).await?;
    ParticipationService::new(&txn)
        .join(&event, &participation, auth_user.user_id)
        .await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Participations",
    operation_id = "deleteParticipation",
    summary = "Delete a participation",
    description = "Only the creator (captain) may delete it. Members and scores go with it.",
    params(("id" = i32, Path, description = "Participation ID")),
    responses(
        (status = 204, description = "Participation deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not the creator (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Participation not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = %auth_user.user_id))]
pub async fn delete_participation(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = begin_write(&state.db).await?;
    let (_, participation) = lock_participation(&txn, id).await?;
    let avatar = participation.avatar_url.clone();
    ParticipationService::new(&txn)
        .disband(&participation, auth_user.user_id)
        .await?;
    txn.commit().await?;

    if let Some(url) = avatar {
        discard_file(&state, &url).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/{id}/members/{user_id}",
    tag = "Participations",
    operation_id = "removeMember",
    summary = "Leave a team or remove a member",
    description = "Members may remove themselves; the captain may remove anyone. A captain who leaves hands \
        captaincy to the longest-standing member, or dissolves the participation when alone.",
    params(
        ("id" = i32, Path, description = "Participation ID"),
        ("user_id" = Uuid, Path, description = "Member to remove"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller may not remove this member (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Participation or member not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = %user_id, actor = %auth_user.user_id))]
pub async fn remove_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let txn = begin_write(&state.db).await?;
    let (_, participation) = lock_participation(&txn, id).await?;
    ParticipationService::new(&txn)
        .remove_member(&participation, auth_user.user_id, user_id)
        .await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/{id}/transfer-captaincy/{user_id}",
    tag = "Participations",
    operation_id = "transferCaptaincy",
    summary = "Hand captaincy to another member",
    params(
        ("id" = i32, Path, description = "Participation ID"),
        ("user_id" = Uuid, Path, description = "New captain"),
    ),
    responses(
        (status = 204, description = "Captaincy transferred"),
        (status = 400, description = "Target already captain (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not the captain (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Participation or member not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, user_id = %user_id, actor = %auth_user.user_id))]
pub async fn transfer_captaincy(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, user_id)): Path<(i32, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let txn = begin_write(&state.db).await?;
    let (_, participation) = lock_participation(&txn, id).await?;
    ParticipationService::new(&txn)
        .transfer_captaincy(&participation, auth_user.user_id, user_id)
        .await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/avatar",
    tag = "Participations",
    operation_id = "uploadTeamAvatar",
    summary = "Upload a team avatar",
    description = "Captain only. Multipart field `file` must be an image.",
    params(("id" = i32, Path, description = "Participation ID")),
    request_body(content_type = "multipart/form-data", description = "Image in field `file`"),
    responses(
        (status = 200, description = "Updated participation", body = ParticipationResponse),
        (status = 400, description = "Not a team or not an image (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Caller is not the captain (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Participation not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, upload), fields(id, user_id = %auth_user.user_id))]
pub async fn upload_team_avatar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppMultipart(upload): AppMultipart<AvatarUpload>,
) -> Result<Json<ParticipationResponse>, AppError> {
    let participation = find_participation(&state.db, id).await?;
    if participation.creator_id != auth_user.user_id {
        return Err(AppError::PermissionDenied);
    }
    if participation.participant_type != ParticipantType::Team {
        return Err(AppError::Validation(
            "Only team participations have avatars".into(),
        ));
    }

    let filename = upload.file.metadata.file_name.as_deref().unwrap_or_default();
    let filename = validate_upload_filename(filename)?;
    require_image(filename)?;

    let key = StorageKey::team_avatar(id, extension(filename));
    let url = store_file(&state, &key, &upload.file.contents).await?;

    let previous = participation.avatar_url.clone();
    let mut active: event_participation::ActiveModel = participation.into();
    active.avatar_url = Set(Some(url.clone()));
    let model = active.update(&state.db).await?;

    if let Some(previous) = previous
        && previous != url
    {
        discard_file(&state, &previous).await;
    }

    Ok(Json(participation_response(&state.db, model).await?))
}
