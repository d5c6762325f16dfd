use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::entity::user::{self, Role};
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt::{self, TokenError};

/// Authenticated user resolved from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. The user row is
/// loaded on every request, so role changes take effect immediately and tokens
/// of deleted users stop working.
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    pub user: user::Model,
}

impl AuthUser {
    /// Organizer or admin.
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Returns `Ok(())` for organizers and admins, `Err(PermissionDenied)` otherwise.
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::PermissionDenied)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let user_id = jwt::verify(token, &state.config.auth.jwt_secret).map_err(|e| match e {
            TokenError::Expired => AppError::TokenExpired,
            _ => AppError::TokenInvalid,
        })?;

        let user = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id,
            role: user.role,
            user,
        })
    }
}
