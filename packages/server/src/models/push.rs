use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{device, notification_history};
use crate::error::AppError;
use crate::models::shared::validate_optional_text;

/// Register a device or update the metadata of an already known token.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterDeviceRequest {
    /// APNs device token (hex).
    #[schema(example = "a1b2c3d4e5f6...")]
    pub token: String,
    #[schema(example = "Alice's iPhone")]
    pub name: Option<String>,
    #[schema(example = "iOS")]
    pub system_name: Option<String>,
    #[schema(example = "18.1")]
    pub system_version: Option<String>,
    #[schema(example = "iPhone")]
    pub model: Option<String>,
    pub localized_model: Option<String>,
}

pub fn validate_register_device(payload: &RegisterDeviceRequest) -> Result<(), AppError> {
    let token = payload.token.trim();
    if token.is_empty() || token.len() > 255 {
        return Err(AppError::Validation("token must be 1-255 characters".into()));
    }
    for (field, value) in [
        ("name", &payload.name),
        ("system_name", &payload.system_name),
        ("system_version", &payload.system_version),
        ("model", &payload.model),
        ("localized_model", &payload.localized_model),
    ] {
        validate_optional_text(field, value.as_deref(), 255)?;
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeviceResponse {
    pub id: i32,
    pub token: String,
    pub name: Option<String>,
    pub system_name: Option<String>,
    pub system_version: Option<String>,
    pub model: Option<String>,
    pub localized_model: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<device::Model> for DeviceResponse {
    fn from(m: device::Model) -> Self {
        Self {
            id: m.id,
            token: m.token,
            name: m.name,
            system_name: m.system_name,
            system_version: m.system_version,
            model: m.model,
            localized_model: m.localized_model,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SendPushRequest {
    /// Device tokens to deliver to.
    pub recipients: Vec<String>,
    pub title: String,
    pub body: String,
    /// Defaults to `default`.
    pub sound: Option<String>,
    /// App route opened on tap, sent as the `destination` payload key.
    pub destination: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SendToAllRequest {
    pub title: String,
    pub body: String,
    pub sound: Option<String>,
    pub destination: Option<String>,
}

fn validate_message(title: &str, body: &str) -> Result<(), AppError> {
    if title.trim().is_empty() || title.chars().count() > 200 {
        return Err(AppError::Validation("title must be 1-200 characters".into()));
    }
    if body.trim().is_empty() || body.chars().count() > 2000 {
        return Err(AppError::Validation("body must be 1-2000 characters".into()));
    }
    Ok(())
}

pub fn validate_send_push(payload: &SendPushRequest) -> Result<(), AppError> {
    if payload.recipients.is_empty() {
        return Err(AppError::Validation("recipients must not be empty".into()));
    }
    if payload.recipients.len() > 1000 {
        return Err(AppError::Validation(
            "At most 1000 recipients per request".into(),
        ));
    }
    validate_message(&payload.title, &payload.body)
}

pub fn validate_send_to_all(payload: &SendToAllRequest) -> Result<(), AppError> {
    validate_message(&payload.title, &payload.body)
}

/// Delivery outcome per token: `Success`, `TokenNotFoundInDB`, an APNs reason,
/// or `ConnectionFailed: ...`.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SendPushResponse {
    pub results: HashMap<String, String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct HistoryQuery {
    /// 1-1000, default 100.
    #[param(example = 100)]
    pub limit: Option<u64>,
    #[param(example = 0)]
    pub offset: Option<u64>,
}

impl HistoryQuery {
    pub fn window(&self) -> Result<(u64, u64), AppError> {
        let limit = self.limit.unwrap_or(100);
        if !(1..=1000).contains(&limit) {
            return Err(AppError::Validation("limit must be between 1 and 1000".into()));
        }
        Ok((limit, self.offset.unwrap_or(0)))
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HistoryResponse {
    pub id: i32,
    pub device_id: i32,
    pub title: String,
    pub body: String,
    pub apns_status: String,
    pub destination: Option<String>,
    pub sound: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl From<notification_history::Model> for HistoryResponse {
    fn from(m: notification_history::Model) -> Self {
        Self {
            id: m.id,
            device_id: m.device_id,
            title: m.title,
            body: m.body,
            apns_status: m.apns_status,
            destination: m.destination,
            sound: m.sound,
            sent_at: m.sent_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClearDevicesResponse {
    pub deleted_count: u64,
}
