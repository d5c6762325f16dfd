use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::user::Gender;
use crate::error::AppError;

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Display name (1-100 characters).
    #[schema(example = "Alice Wonder")]
    pub full_name: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Phone number in E.164 format.
    #[schema(example = "+79991234567")]
    pub phone: String,
    /// Password (6-50 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    #[schema(value_type = String, format = Date, example = "2000-01-01")]
    pub birthday: NaiveDate,
    pub gender: Gender,
}

/// Accepts `+` followed by up to 15 digits, the first non-zero.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let mut chars = digits.chars();
    matches!(chars.next(), Some('1'..='9'))
        && (2..=15).contains(&digits.len())
        && chars.all(|c| c.is_ascii_digit())
}

pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

pub fn validate_password(field: &str, password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(6..=50).contains(&len) {
        return Err(AppError::Validation(format!(
            "{field} must be 6-50 characters"
        )));
    }
    Ok(())
}

pub fn validate_full_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 100 {
        return Err(AppError::Validation(
            "full_name must be 1-100 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    validate_full_name(&payload.full_name)?;
    if !is_valid_email(payload.email.trim()) {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    if !is_valid_phone(payload.phone.trim()) {
        return Err(AppError::Validation(
            "Invalid phone number format. Use E.164 format, e.g. +79991234567".into(),
        ));
    }
    validate_password("password", &payload.password)?;
    if payload.birthday > Utc::now().date_naive() {
        return Err(AppError::Validation(
            "birthday must not be in the future".into(),
        ));
    }
    Ok(())
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Email or phone of the account.
    #[schema(example = "alice@example.com")]
    pub login_identifier: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.login_identifier.trim().is_empty() {
        return Err(AppError::Validation(
            "login_identifier must not be empty".into(),
        ));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    /// HS256 bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: &'static str,
    /// Lifetime of the token in seconds.
    #[schema(example = 1800)]
    pub expires_in: i64,
}
