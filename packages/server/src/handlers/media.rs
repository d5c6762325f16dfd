use axum::Json;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::storage::StorageKey;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::event_media::{self, MediaType};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::multipart::AppMultipart;
use crate::models::event::{
    MediaResponse, MediaUpload, ReorderMediaRequest, parse_media_type, validate_reorder_media,
};
use crate::state::AppState;
use crate::utils::lookup::{find_event, find_event_for_update};
use crate::utils::upload::{
    discard_file, extension, require_image, store_file, validate_upload_filename,
};

/// Request body limit for upload routes: the configured file limit plus form overhead.
pub fn upload_body_limit(max_upload_size: u64) -> DefaultBodyLimit {
    let limit = usize::try_from(max_upload_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(limit.saturating_add(64 * 1024))
}

async fn media_of_event<C: ConnectionTrait>(
    conn: &C,
    event_id: i32,
) -> Result<Vec<event_media::Model>, DbErr> {
    event_media::Entity::find()
        .filter(event_media::Column::EventId.eq(event_id))
        .order_by_asc(event_media::Column::Position)
        .order_by_asc(event_media::Column::Id)
        .all(conn)
        .await
}

#[utoipa::path(
    post,
    path = "/{id}/media",
    tag = "Event Media",
    operation_id = "uploadEventMedia",
    summary = "Upload a media file for an event",
    description = "Multipart fields: `file` (required), `media_type` (`image` or `document`, default `image`), `name`. \
        Image media must be image files. The new item is appended after the current last one. Requires organizer or admin.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body(content_type = "multipart/form-data", description = "Media upload"),
    responses(
        (status = 201, description = "Media stored", body = MediaResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, upload), fields(id))]
pub async fn upload_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppMultipart(upload): AppMultipart<MediaUpload>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;
    find_event(&state.db, id).await?;

    let media_type = parse_media_type(upload.media_type.as_deref())?;
    let filename = upload.file.metadata.file_name.as_deref().unwrap_or_default();
    let filename = validate_upload_filename(filename)?;
    if media_type == MediaType::Image {
        require_image(filename)?;
    }
    let name = upload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| filename.to_string());

    let key = StorageKey::event_media(id, extension(filename));
    let url = store_file(&state, &key, &upload.file.contents).await?;

    let inserted = async {
        let txn = state.db.begin().await?;
        find_event_for_update(&txn, id).await?;
        let next_position = media_of_event(&txn, id)
            .await?
            .iter()
            .map(|m| m.position + 1)
            .max()
            .unwrap_or(0);
        let model = event_media::ActiveModel {
            event_id: Set(id),
            media_type: Set(media_type),
            url: Set(url.clone()),
            name: Set(Some(name)),
            position: Set(next_position),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;
        Ok::<_, AppError>(model)
    }
    .await;

    let model = match inserted {
        Ok(model) => model,
        Err(e) => {
            discard_file(&state, &url).await;
            return Err(e);
        }
    };

    tracing::info!(event_id = id, media_id = model.id, "Media uploaded");
    Ok((StatusCode::CREATED, Json(MediaResponse::from(model))))
}

#[utoipa::path(
    patch,
    path = "/{id}/media/reorder",
    tag = "Event Media",
    operation_id = "reorderEventMedia",
    summary = "Reorder an event's media",
    description = "Each listed media item gets `order` equal to its index in `media_ids`. \
        Every id must belong to the event, otherwise nothing changes. Requires organizer or admin.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = ReorderMediaRequest,
    responses(
        (status = 200, description = "Media in their new order", body = Vec<MediaResponse>),
        (status = 400, description = "Unknown or duplicate media id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn reorder_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ReorderMediaRequest>,
) -> Result<Json<Vec<MediaResponse>>, AppError> {
    auth_user.require_staff()?;
    validate_reorder_media(&payload)?;

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, id).await?;

    let owned: Vec<i32> = event_media::Entity::find()
        .select_only()
        .column(event_media::Column::Id)
        .filter(event_media::Column::EventId.eq(id))
        .filter(event_media::Column::Id.is_in(payload.media_ids.iter().copied()))
        .into_tuple()
        .all(&txn)
        .await?;
    if let Some(stray) = payload.media_ids.iter().find(|m| !owned.contains(m)) {
        return Err(AppError::Validation(format!(
            "Media {stray} does not belong to event {id}"
        )));
    }

    for (index, media_id) in payload.media_ids.iter().enumerate() {
        event_media::Entity::update_many()
            .col_expr(event_media::Column::Position, Expr::value(index as i32))
            .filter(event_media::Column::Id.eq(*media_id))
            .exec(&txn)
            .await?;
    }

    let media = media_of_event(&txn, id).await?;
    txn.commit().await?;

    Ok(Json(media.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    delete,
    path = "/{id}/media/{media_id}",
    tag = "Event Media",
    operation_id = "deleteEventMedia",
    summary = "Delete a media item",
    description = "Removes the media row and, for uploaded files, the stored file. Requires organizer or admin.",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("media_id" = i32, Path, description = "Media ID"),
    ),
    responses(
        (status = 204, description = "Media deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event or media not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id, media_id))]
pub async fn delete_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, media_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;
    find_event(&state.db, id).await?;

    let media = event_media::Entity::find_by_id(media_id)
        .filter(event_media::Column::EventId.eq(id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Media not found".into()))?;

    event_media::Entity::delete_by_id(media.id)
        .exec(&state.db)
        .await?;
    discard_file(&state, &media.url).await;

    Ok(StatusCode::NO_CONTENT)
}
