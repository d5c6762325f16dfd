use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::push::{PushMessage, PushSender};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{device, notification_history};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::push::*;
use crate::services::push::{delete_devices, deliver};
use crate::state::AppState;
use crate::utils::lookup::find_device_by_token;

fn sender(state: &AppState) -> Result<Arc<dyn PushSender>, AppError> {
    state.push.clone().ok_or(AppError::PushDisabled)
}

fn message(
    title: String,
    body: String,
    sound: Option<String>,
    destination: Option<String>,
) -> PushMessage {
    let mut message = PushMessage::new(title, body);
    if let Some(sound) = sound.filter(|s| !s.trim().is_empty()) {
        message.sound = Some(sound);
    }
    message.destination = destination;
    message
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Pushes",
    operation_id = "registerDevice",
    summary = "Register a device for push notifications",
    description = "Creates the device, or refreshes the metadata of an already registered token.",
    request_body = RegisterDeviceRequest,
    responses(
        (status = 200, description = "Device registered", body = DeviceResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn register_device(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterDeviceRequest>,
) -> Result<Json<DeviceResponse>, AppError> {
    validate_register_device(&payload)?;

    let token = payload.token.trim().to_string();
    let now = Utc::now();
    let row = device::ActiveModel {
        token: Set(token.clone()),
        name: Set(payload.name),
        system_name: Set(payload.system_name),
        system_version: Set(payload.system_version),
        model: Set(payload.model),
        localized_model: Set(payload.localized_model),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    device::Entity::insert(row)
        .on_conflict(
            OnConflict::column(device::Column::Token)
                .update_columns([
                    device::Column::Name,
                    device::Column::SystemName,
                    device::Column::SystemVersion,
                    device::Column::Model,
                    device::Column::LocalizedModel,
                    device::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    let model = find_device_by_token(&state.db, &token).await?;
    tracing::info!(device_id = model.id, "Device registered");
    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/devices/{token}",
    tag = "Pushes",
    operation_id = "unregisterDevice",
    summary = "Unregister a device",
    description = "Removes the device and its notification history.",
    params(("token" = String, Path, description = "Device token")),
    responses(
        (status = 204, description = "Device removed"),
        (status = 404, description = "Device not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, token))]
pub async fn unregister_device(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    let device = find_device_by_token(&txn, &token).await?;
    delete_devices(&txn, &[device.id]).await?;
    txn.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/devices",
    tag = "Pushes",
    operation_id = "listDevices",
    summary = "List registered devices",
    description = "Requires organizer or admin.",
    responses(
        (status = 200, description = "Devices", body = Vec<DeviceResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn list_devices(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<DeviceResponse>>, AppError> {
    auth_user.require_staff()?;
    let devices = device::Entity::find()
        .order_by_asc(device::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(devices.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    delete,
    path = "/devices",
    tag = "Pushes",
    operation_id = "clearDevices",
    summary = "Remove every registered device",
    description = "Also clears all notification history. Requires organizer or admin.",
    responses(
        (status = 200, description = "Devices removed", body = ClearDevicesResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user))]
pub async fn clear_devices(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ClearDevicesResponse>, AppError> {
    auth_user.require_staff()?;

    let txn = state.db.begin().await?;
    notification_history::Entity::delete_many()
        .exec(&txn)
        .await?;
    let res = device::Entity::delete_many().exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(deleted = res.rows_affected, "Device registry cleared");
    Ok(Json(ClearDevicesResponse {
        deleted_count: res.rows_affected,
    }))
}

#[utoipa::path(
    post,
    path = "/send",
    tag = "Pushes",
    operation_id = "sendPush",
    summary = "Send a notification to selected devices",
    description = "Returns a status per token: `Success`, `TokenNotFoundInDB`, an APNs reason such as \
        `BadDeviceToken`, or `ConnectionFailed: ...`. Requires organizer or admin.",
    request_body = SendPushRequest,
    responses(
        (status = 200, description = "Delivery results", body = SendPushResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 503, description = "Push delivery not configured (PUSH_DISABLED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(recipients = payload.recipients.len()))]
pub async fn send_push(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SendPushRequest>,
) -> Result<Json<SendPushResponse>, AppError> {
    auth_user.require_staff()?;
    validate_send_push(&payload)?;
    let sender = sender(&state)?;

    let message = message(
        payload.title,
        payload.body,
        payload.sound,
        payload.destination,
    );
    let results = deliver(
        &state.db,
        sender.as_ref(),
        &payload.recipients,
        &message,
        state.config.push.prune_invalid_tokens,
    )
    .await?;

    Ok(Json(SendPushResponse { results }))
}

#[utoipa::path(
    post,
    path = "/send-to-all",
    tag = "Pushes",
    operation_id = "sendPushToAll",
    summary = "Send a notification to every registered device",
    description = "Requires organizer or admin.",
    request_body = SendToAllRequest,
    responses(
        (status = 200, description = "Delivery results", body = SendPushResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 503, description = "Push delivery not configured (PUSH_DISABLED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload))]
pub async fn send_push_to_all(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SendToAllRequest>,
) -> Result<Json<SendPushResponse>, AppError> {
    auth_user.require_staff()?;
    validate_send_to_all(&payload)?;
    let sender = sender(&state)?;

    let tokens: Vec<String> = device::Entity::find()
        .select_only()
        .column(device::Column::Token)
        .into_tuple()
        .all(&state.db)
        .await?;

    let message = message(
        payload.title,
        payload.body,
        payload.sound,
        payload.destination,
    );
    let results = deliver(
        &state.db,
        sender.as_ref(),
        &tokens,
        &message,
        state.config.push.prune_invalid_tokens,
    )
    .await?;

    Ok(Json(SendPushResponse { results }))
}

#[utoipa::path(
    get,
    path = "/history/{token}",
    tag = "Pushes",
    operation_id = "deviceHistory",
    summary = "Notification history of a device",
    description = "Newest first. Requires organizer or admin.",
    params(
        ("token" = String, Path, description = "Device token"),
        HistoryQuery,
    ),
    responses(
        (status = 200, description = "History entries", body = Vec<HistoryResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Device not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, token, query))]
pub async fn device_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryResponse>>, AppError> {
    auth_user.require_staff()?;
    let (limit, offset) = query.window()?;
    let device = find_device_by_token(&state.db, &token).await?;

    let rows = notification_history::Entity::find()
        .filter(notification_history::Column::DeviceId.eq(device.id))
        .order_by_desc(notification_history::Column::SentAt)
        .order_by_desc(notification_history::Column::Id)
        .offset(Some(offset))
        .limit(Some(limit))
        .all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    delete,
    path = "/history/entries/{id}",
    tag = "Pushes",
    operation_id = "deleteHistoryEntry",
    summary = "Delete a notification history entry",
    description = "Requires organizer or admin.",
    params(("id" = i32, Path, description = "History entry ID")),
    responses(
        (status = 204, description = "Entry deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Entry not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_history_entry(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;
    let res = notification_history::Entity::delete_by_id(id)
        .exec(&state.db)
        .await?;
    if res.rows_affected == 0 {
        return Err(AppError::NotFound("History entry not found".into()));
    }
    Ok(StatusCode::NO_CONTENT)
}
