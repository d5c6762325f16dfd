use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::push::PushError;
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::roster::RosterError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_EXPIRED`, `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PERMISSION_DENIED`,
    /// `NOT_FOUND`, `CONFLICT`, `USER_EXISTS`, `PAYLOAD_TOO_LARGE`, `PUSH_DISABLED`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "max_members must be divisible by max_teams")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenExpired,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    UserExists,
    PayloadTooLarge(String),
    PushDisabled,
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_EXPIRED",
                    message: "Token has expired".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Incorrect login or password".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::UserExists => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "USER_EXISTS",
                    message: "A user with this email or phone already exists".into(),
                },
            ),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    code: "PAYLOAD_TOO_LARGE",
                    message: msg,
                },
            ),
            AppError::PushDisabled => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    code: "PUSH_DISABLED",
                    message: "Push notifications are not configured".into(),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { limit, .. } => {
                AppError::PayloadTooLarge(format!("File exceeds the {limit} byte limit"))
            }
            StorageError::InvalidKey(msg) => AppError::Validation(msg.into()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<PushError> for AppError {
    fn from(err: PushError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<RosterError> for AppError {
    fn from(err: RosterError) -> Self {
        match err {
            RosterError::NotCaptain | RosterError::NotAllowed => AppError::PermissionDenied,
            RosterError::NotMember => {
                AppError::NotFound("User is not a member of this participation".into())
            }
            RosterError::AlreadyMember => {
                AppError::Conflict("User is already a member of this participation".into())
            }
            RosterError::Full { capacity } => {
                AppError::Conflict(format!("Team is full ({capacity} members)"))
            }
            RosterError::AlreadyCaptain => {
                AppError::Validation("User is already the captain".into())
            }
            RosterError::Dissolved => AppError::NotFound("Participation not found".into()),
        }
    }
}
