use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user::{self, Role};
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, RegisterRequest, TokenResponse, validate_login_request,
    validate_register_request,
};
use crate::models::user::UserResponse;
use crate::state::AppState;
use crate::utils::handle::generate_unique_handle;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Register a new account",
    description = "Creates a user with role `user` and a random ten-digit handle. Email and phone must both be unused.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Email or phone already registered (USER_EXISTS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register_request(&payload)?;

    let email = payload.email.trim().to_lowercase();
    let phone = payload.phone.trim().to_string();

    let taken = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Email.eq(&email))
                .add(user::Column::Phone.eq(&phone)),
        )
        .count(&state.db)
        .await?
        > 0;
    if taken {
        return Err(AppError::UserExists);
    }

    let hashed_password = hash::hash_password_blocking(payload.password).await?;
    let handle = generate_unique_handle(&state.db).await?;

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        handle: Set(handle),
        email: Set(email),
        phone: Set(phone),
        hashed_password: Set(hashed_password),
        full_name: Set(payload.full_name.trim().to_string()),
        avatar_url: Set(None),
        birthday: Set(payload.birthday),
        gender: Set(payload.gender),
        height_cm: Set(None),
        weight_kg: Set(None),
        is_verified: Set(false),
        is_2fa_enabled: Set(false),
        role: Set(Role::User),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let user = new_user.insert(&state.db).await.map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Registration race condition: unique constraint caught on insert");
            AppError::UserExists
        }
        _ => AppError::from(e),
    })?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Exchange credentials for an access token",
    description = "`login_identifier` is the account's email or phone number.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong login or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    validate_login_request(&payload)?;

    let identifier = payload.login_identifier.trim();
    let column_match = if identifier.contains('@') {
        user::Column::Email.eq(identifier.to_lowercase())
    } else {
        user::Column::Phone.eq(identifier)
    };

    let user = user::Entity::find()
        .filter(column_match)
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid =
        hash::verify_password_blocking(payload.password, user.hashed_password.clone()).await?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let issued = jwt::sign(
        user.id,
        &state.config.auth.jwt_secret,
        state.config.auth.token_ttl_minutes,
    )
    .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    tracing::debug!(user_id = %user.id, "Token issued");
    Ok(Json(TokenResponse {
        access_token: issued.token,
        token_type: "bearer",
        expires_in: issued.expires_in,
    }))
}
