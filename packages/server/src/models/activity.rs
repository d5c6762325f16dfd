use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::event_activity;
use crate::error::AppError;
use crate::models::shared::{double_option, validate_optional_text, validate_title};
use crate::rules::validate_activity;

/// Request body for creating an activity, standalone or inline with an event.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateActivityRequest {
    #[schema(example = "Sprint 100m")]
    pub name: String,
    #[schema(example = "figure.run")]
    pub icon: Option<String>,
    #[schema(example = 55.7558)]
    pub latitude: Option<f64>,
    #[schema(example = 37.6173)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub is_scoreable: bool,
    /// Required when `is_scoreable`.
    #[schema(example = 100)]
    pub max_score: Option<i32>,
    /// Required when not `is_scoreable`.
    pub start_dt: Option<DateTime<Utc>>,
    /// Required when not `is_scoreable`; must be after `start_dt`.
    pub end_dt: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_versus: bool,
}

fn validate_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), AppError> {
    if let Some(lat) = latitude
        && !(-90.0..=90.0).contains(&lat)
    {
        return Err(AppError::Validation(
            "latitude must be between -90 and 90".into(),
        ));
    }
    if let Some(lon) = longitude
        && !(-180.0..=180.0).contains(&lon)
    {
        return Err(AppError::Validation(
            "longitude must be between -180 and 180".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_activity(payload: &CreateActivityRequest) -> Result<(), AppError> {
    validate_title("name", &payload.name)?;
    validate_optional_text("icon", payload.icon.as_deref(), 255)?;
    validate_coordinates(payload.latitude, payload.longitude)?;
    validate_activity(
        payload.is_scoreable,
        payload.max_score,
        payload.start_dt,
        payload.end_dt,
    )
}

/// Partial activity update. The merged result is validated as a whole.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateActivityRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub icon: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<f64>)]
    pub longitude: Option<Option<f64>>,
    pub is_scoreable: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub max_score: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub start_dt: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<DateTime<Utc>>)]
    pub end_dt: Option<Option<DateTime<Utc>>>,
    pub is_versus: Option<bool>,
}

impl UpdateActivityRequest {
    /// Apply the patch on top of the stored row and validate the result.
    pub fn merge_into(
        self,
        current: event_activity::Model,
    ) -> Result<event_activity::Model, AppError> {
        let mut merged = current;
        if let Some(name) = self.name {
            validate_title("name", &name)?;
            merged.name = name.trim().to_string();
        }
        if let Some(icon) = self.icon {
            merged.icon = icon;
        }
        if let Some(lat) = self.latitude {
            merged.latitude = lat;
        }
        if let Some(lon) = self.longitude {
            merged.longitude = lon;
        }
        if let Some(is_scoreable) = self.is_scoreable {
            merged.is_scoreable = is_scoreable;
        }
        if let Some(max_score) = self.max_score {
            merged.max_score = max_score;
        }
        if let Some(start_dt) = self.start_dt {
            merged.start_dt = start_dt;
        }
        if let Some(end_dt) = self.end_dt {
            merged.end_dt = end_dt;
        }
        if let Some(is_versus) = self.is_versus {
            merged.is_versus = is_versus;
        }

        validate_optional_text("icon", merged.icon.as_deref(), 255)?;
        validate_coordinates(merged.latitude, merged.longitude)?;
        validate_activity(
            merged.is_scoreable,
            merged.max_score,
            merged.start_dt,
            merged.end_dt,
        )?;
        Ok(merged)
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ActivityResponse {
    pub id: i32,
    pub event_id: i32,
    pub name: String,
    pub icon: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_scoreable: bool,
    pub max_score: Option<i32>,
    pub start_dt: Option<DateTime<Utc>>,
    pub end_dt: Option<DateTime<Utc>>,
    pub is_versus: bool,
}

impl From<event_activity::Model> for ActivityResponse {
    fn from(m: event_activity::Model) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            name: m.name,
            icon: m.icon,
            latitude: m.latitude,
            longitude: m.longitude,
            is_scoreable: m.is_scoreable,
            max_score: m.max_score,
            start_dt: m.start_dt,
            end_dt: m.end_dt,
            is_versus: m.is_versus,
        }
    }
}
