use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use common::storage::StorageKey;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::multipart::AppMultipart;
use crate::models::auth::validate_password;
use crate::models::user::{
    AvatarUpload, ChangePasswordRequest, PublicUserResponse, UpdateProfileRequest,
    UserResponse, validate_update_profile,
};
use crate::state::AppState;
use crate::utils::hash;
use crate::utils::lookup::find_user;
use crate::utils::upload::{
    discard_file, extension, require_image, store_file, validate_upload_filename,
};

#[utoipa::path(
    get,
    path = "/me",
    tag = "Users",
    operation_id = "getMe",
    summary = "Get the current user's profile",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_me(auth_user: AuthUser) -> Json<UserResponse> {
    Json(auth_user.user.into())
}

#[utoipa::path(
    patch,
    path = "/me",
    tag = "Users",
    operation_id = "updateMe",
    summary = "Update the current user's profile",
    description = "PATCH semantics: absent fields are untouched, `null` clears `height_cm` and `weight_kg`.",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    validate_update_profile(&payload)?;

    let mut active: user::ActiveModel = auth_user.user.into();
    if let Some(name) = payload.full_name {
        active.full_name = Set(name.trim().to_string());
    }
    if let Some(birthday) = payload.birthday {
        active.birthday = Set(birthday);
    }
    if let Some(gender) = payload.gender {
        active.gender = Set(gender);
    }
    if let Some(height) = payload.height_cm {
        active.height_cm = Set(height);
    }
    if let Some(weight) = payload.weight_kg {
        active.weight_kg = Set(weight);
    }

    let model = active.update(&state.db).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/me/password",
    tag = "Users",
    operation_id = "changePassword",
    summary = "Change the current user's password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Old password wrong or new password invalid (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_password("new_password", &payload.new_password)?;

    let matches = hash::verify_password_blocking(
        payload.old_password,
        auth_user.user.hashed_password.clone(),
    )
    .await?;
    if !matches {
        return Err(AppError::Validation("Old password is incorrect".into()));
    }

    let hashed = hash::hash_password_blocking(payload.new_password).await?;
    let mut active: user::ActiveModel = auth_user.user.into();
    active.hashed_password = Set(hashed);
    active.update(&state.db).await?;

    tracing::info!(user_id = %auth_user.user_id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/me/avatar",
    tag = "Users",
    operation_id = "uploadAvatar",
    summary = "Upload the current user's avatar",
    description = "Multipart field `file` must be an image. Replaces any previous avatar.",
    request_body(content_type = "multipart/form-data", description = "Image in field `file`"),
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Not an image (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, upload), fields(user_id = %auth_user.user_id))]
pub async fn upload_avatar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppMultipart(upload): AppMultipart<AvatarUpload>,
) -> Result<Json<UserResponse>, AppError> {
    let filename = upload.file.metadata.file_name.as_deref().unwrap_or_default();
    let filename = validate_upload_filename(filename)?;
    require_image(filename)?;

    let key = StorageKey::user_avatar(auth_user.user_id, extension(filename));
    let url = store_file(&state, &key, &upload.file.contents).await?;

    let previous = auth_user.user.avatar_url.clone();
    let mut active: user::ActiveModel = auth_user.user.into();
    active.avatar_url = Set(Some(url.clone()));
    let model = active.update(&state.db).await?;

    if let Some(previous) = previous
        && previous != url
    {
        discard_file(&state, &previous).await;
    }

    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get another user's public profile",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Public profile", body = PublicUserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id = %id))]
pub async fn get_user(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUserResponse>, AppError> {
    let user = find_user(&state.db, id).await?;
    Ok(Json(user.into()))
}
