use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::event;
use crate::entity::event_media::{self, MediaType};
use crate::error::AppError;
use crate::event_state::EventState;
use crate::models::activity::{ActivityResponse, CreateActivityRequest, validate_create_activity};
use crate::models::shared::{
    Pagination, double_option, validate_optional_text, validate_reorder_ids, validate_title,
};
use crate::rules::validate_limits;

/// Media attached by URL when creating an event.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct MediaInput {
    pub media_type: MediaType,
    #[schema(example = "https://cdn.example.com/poster.jpg")]
    pub url: String,
    pub name: Option<String>,
    /// Position in the gallery. Defaults to the index in the request list.
    pub order: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEventRequest {
    #[schema(example = "Robotics Championship")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "2026-11-20")]
    pub date: NaiveDate,
    #[schema(example = "09:00:00")]
    pub start_time: Option<NaiveTime>,
    #[schema(example = "18:00:00")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub is_team: bool,
    /// Individual events: participant cap. Team events: per-team member cap.
    #[schema(example = 20)]
    pub max_members: Option<i32>,
    /// Required for team events, forbidden otherwise.
    #[schema(example = 5)]
    pub max_teams: Option<i32>,
    #[serde(default)]
    pub media: Vec<MediaInput>,
    #[serde(default)]
    pub activities: Vec<CreateActivityRequest>,
}

fn validate_time_window(
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (start_time, end_time)
        && start >= end
    {
        return Err(AppError::Validation(
            "start_time must be before end_time".into(),
        ));
    }
    Ok(())
}

fn validate_media_input(media: &MediaInput) -> Result<(), AppError> {
    let url = media.url.trim();
    if url.is_empty() || url.len() > 2048 {
        return Err(AppError::Validation("media url must be 1-2048 characters".into()));
    }
    validate_optional_text("media name", media.name.as_deref(), 255)?;
    if let Some(order) = media.order
        && order < 0
    {
        return Err(AppError::Validation("media order must be non-negative".into()));
    }
    Ok(())
}

pub fn validate_create_event(payload: &CreateEventRequest) -> Result<(), AppError> {
    validate_title("title", &payload.title)?;
    validate_optional_text("description", payload.description.as_deref(), 10_000)?;
    validate_time_window(payload.start_time, payload.end_time)?;
    validate_limits(payload.is_team, payload.max_members, payload.max_teams)?;
    for media in &payload.media {
        validate_media_input(media)?;
    }
    for activity in &payload.activities {
        validate_create_activity(activity)?;
    }
    Ok(())
}

/// Partial event update. Limits are validated on the merged values.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveTime>)]
    pub start_time: Option<Option<NaiveTime>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveTime>)]
    pub end_time: Option<Option<NaiveTime>>,
    pub is_team: Option<bool>,
    pub max_members: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub max_teams: Option<Option<i32>>,
}

/// Column values of an event after a patch is applied.
pub struct EffectiveEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_team: bool,
    pub max_members: i32,
    pub max_teams: Option<i32>,
}

impl UpdateEventRequest {
    /// Merge the patch with the stored row and validate the outcome.
    ///
    /// Switching `is_team` off without an explicit `max_teams` clears it.
    pub fn merge(&self, current: &event::Model) -> Result<EffectiveEvent, AppError> {
        if let Some(ref title) = self.title {
            validate_title("title", title)?;
        }
        let description = match &self.description {
            Some(d) => d.clone(),
            None => current.description.clone(),
        };
        validate_optional_text("description", description.as_deref(), 10_000)?;

        let is_team = self.is_team.unwrap_or(current.is_team);
        let max_members = self.max_members.unwrap_or(current.max_members);
        let max_teams = match self.max_teams {
            Some(v) => v,
            None if !is_team => None,
            None => current.max_teams,
        };
        validate_limits(is_team, Some(max_members), max_teams)?;

        let start_time = self.start_time.unwrap_or(current.start_time);
        let end_time = self.end_time.unwrap_or(current.end_time);
        validate_time_window(start_time, end_time)?;

        Ok(EffectiveEvent {
            title: self
                .title
                .as_deref()
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| current.title.clone()),
            description,
            date: self.date.unwrap_or(current.date),
            start_time,
            end_time,
            is_team,
            max_members,
            max_teams,
        })
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MediaResponse {
    pub id: i32,
    pub event_id: i32,
    pub media_type: MediaType,
    pub url: String,
    pub name: Option<String>,
    pub order: i32,
}

impl From<event_media::Model> for MediaResponse {
    fn from(m: event_media::Model) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            media_type: m.media_type,
            url: m.url,
            name: m.name,
            order: m.position,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_team: bool,
    pub max_members: i32,
    pub max_teams: Option<i32>,
    /// Derived from the current time and the event's date window.
    pub state: EventState,
    /// Sorted by `order`.
    pub media: Vec<MediaResponse>,
    pub activities: Vec<ActivityResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventResponse {
    pub fn build(
        event: event::Model,
        media: Vec<MediaResponse>,
        activities: Vec<ActivityResponse>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            state: event.state_at(now),
            id: event.id,
            title: event.title,
            description: event.description,
            date: event.date,
            start_time: event.start_time,
            end_time: event.end_time,
            is_team: event.is_team,
            max_members: event.max_members,
            max_teams: event.max_teams,
            media,
            activities,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Query parameters for event listing.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct EventListQuery {
    #[param(example = 1)]
    pub page: Option<u64>,
    #[param(example = 20)]
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on title.
    #[param(example = "hackathon")]
    pub search: Option<String>,
    /// Filter by derived state.
    pub state: Option<EventState>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListResponse {
    pub data: Vec<EventResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReorderMediaRequest {
    /// Media IDs in their new order; each gets `order` equal to its index.
    #[schema(example = json!([3, 1, 2]))]
    pub media_ids: Vec<i32>,
}

pub fn validate_reorder_media(payload: &ReorderMediaRequest) -> Result<(), AppError> {
    validate_reorder_ids(&payload.media_ids, "media_id")
}

/// Multipart body for media uploads.
#[derive(TryFromMultipart)]
pub struct MediaUpload {
    #[form_data(limit = "unlimited")]
    pub file: FieldData<Bytes>,
    /// `image` (default) or `document`.
    pub media_type: Option<String>,
    pub name: Option<String>,
}

pub fn parse_media_type(raw: Option<&str>) -> Result<MediaType, AppError> {
    match raw.map(str::trim) {
        None | Some("") | Some("image") => Ok(MediaType::Image),
        Some("document") => Ok(MediaType::Document),
        Some(other) => Err(AppError::Validation(format!(
            "media_type must be 'image' or 'document', got '{other}'"
        ))),
    }
}
