use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user::{self, Gender, Role};
use crate::error::AppError;
use crate::models::shared::double_option;

/// Full profile of the authenticated user.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "4815162342")]
    pub handle: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[schema(example = "+79991234567")]
    pub phone: String,
    #[schema(example = "Alice Wonder")]
    pub full_name: String,
    pub avatar_url: Option<String>,
    #[schema(value_type = String, format = Date, example = "2000-01-01")]
    pub birthday: NaiveDate,
    pub gender: Gender,
    pub height_cm: Option<i32>,
    pub weight_kg: Option<f64>,
    pub is_verified: bool,
    pub is_2fa_enabled: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            handle: m.handle,
            email: m.email,
            phone: m.phone,
            full_name: m.full_name,
            avatar_url: m.avatar_url,
            birthday: m.birthday,
            gender: m.gender,
            height_cm: m.height_cm,
            weight_kg: m.weight_kg,
            is_verified: m.is_verified,
            is_2fa_enabled: m.is_2fa_enabled,
            role: m.role,
            created_at: m.created_at,
        }
    }
}

/// Profile visible to other users.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicUserResponse {
    pub id: Uuid,
    pub handle: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
}

impl From<user::Model> for PublicUserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            handle: m.handle,
            full_name: m.full_name,
            avatar_url: m.avatar_url,
            role: m.role,
        }
    }
}

/// Partial profile update. Absent fields are left unchanged; `null` clears
/// nullable fields.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    #[schema(value_type = Option<String>, format = Date)]
    pub birthday: Option<NaiveDate>,
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub height_cm: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub weight_kg: Option<Option<f64>>,
}

pub fn validate_update_profile(payload: &UpdateProfileRequest) -> Result<(), AppError> {
    if let Some(ref name) = payload.full_name {
        crate::models::auth::validate_full_name(name)?;
    }
    if let Some(birthday) = payload.birthday
        && birthday > Utc::now().date_naive()
    {
        return Err(AppError::Validation(
            "birthday must not be in the future".into(),
        ));
    }
    if let Some(Some(height)) = payload.height_cm
        && !(1..=300).contains(&height)
    {
        return Err(AppError::Validation(
            "height_cm must be between 1 and 300".into(),
        ));
    }
    if let Some(Some(weight)) = payload.weight_kg
        && !(weight > 0.0 && weight <= 500.0)
    {
        return Err(AppError::Validation(
            "weight_kg must be between 0 and 500".into(),
        ));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    /// New password (6-50 characters).
    pub new_password: String,
}

/// Multipart body for avatar uploads (user and team avatars).
#[derive(TryFromMultipart)]
pub struct AvatarUpload {
    #[form_data(limit = "unlimited")]
    pub file: FieldData<Bytes>,
}
