use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{event, event_activity, event_judge, event_media, event_participation};
use crate::error::{AppError, ErrorBody};
use crate::event_state::EventState;
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::activity::ActivityResponse;
use crate::models::event::*;
use crate::models::shared::{Pagination, escape_like};
use crate::services::participation::delete_participations;
use crate::state::AppState;
use crate::utils::lookup::{find_event, find_event_for_update};
use crate::utils::upload::discard_file;

/// Media (by `order`) and activities (by id) for each event, one query per collection.
pub(crate) async fn load_children<C: ConnectionTrait>(
    conn: &C,
    event_ids: &[i32],
) -> Result<
    (
        HashMap<i32, Vec<MediaResponse>>,
        HashMap<i32, Vec<ActivityResponse>>,
    ),
    AppError,
> {
    let mut media: HashMap<i32, Vec<MediaResponse>> = HashMap::new();
    let mut activities: HashMap<i32, Vec<ActivityResponse>> = HashMap::new();
    if event_ids.is_empty() {
        return Ok((media, activities));
    }

    let media_rows = event_media::Entity::find()
        .filter(event_media::Column::EventId.is_in(event_ids.iter().copied()))
        .order_by_asc(event_media::Column::Position)
        .order_by_asc(event_media::Column::Id)
        .all(conn)
        .await?;
    for row in media_rows {
        media.entry(row.event_id).or_default().push(row.into());
    }

    let activity_rows = event_activity::Entity::find()
        .filter(event_activity::Column::EventId.is_in(event_ids.iter().copied()))
        .order_by_asc(event_activity::Column::Id)
        .all(conn)
        .await?;
    for row in activity_rows {
        activities.entry(row.event_id).or_default().push(row.into());
    }

    Ok((media, activities))
}

async fn build_responses<C: ConnectionTrait>(
    conn: &C,
    events: Vec<event::Model>,
    now: DateTime<Utc>,
) -> Result<Vec<EventResponse>, AppError> {
    let ids: Vec<i32> = events.iter().map(|e| e.id).collect();
    let (mut media, mut activities) = load_children(conn, &ids).await?;
    Ok(events
        .into_iter()
        .map(|e| {
            let m = media.remove(&e.id).unwrap_or_default();
            let a = activities.remove(&e.id).unwrap_or_default();
            EventResponse::build(e, m, a, now)
        })
        .collect())
}

pub(crate) async fn event_response<C: ConnectionTrait>(
    conn: &C,
    event: event::Model,
) -> Result<EventResponse, AppError> {
    let mut responses = build_responses(conn, vec![event], Utc::now()).await?;
    responses
        .pop()
        .ok_or_else(|| AppError::Internal("Event response missing".into()))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List events",
    description = "Paginated list of events ordered by date, with media, activities and derived `state`. \
        `search` matches the title case-insensitively; `state` filters by `past`, `current` or `future`.",
    params(EventListQuery),
    responses(
        (status = 200, description = "List of events", body = EventListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventListQuery>,
) -> Result<Json<EventListResponse>, AppError> {
    let (page, per_page) = Pagination::clamp(query.page, query.per_page);
    let now = Utc::now();
    let today = now.date_naive();

    let mut select = event::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(event::Column::Title)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    select = select
        .order_by_asc(event::Column::Date)
        .order_by_asc(event::Column::StartTime)
        .order_by_asc(event::Column::Id);

    let (events, total) = match query.state {
        None => {
            let total = select.clone().count(&state.db).await?;
            let events = select
                .offset(Some((page - 1) * per_page))
                .limit(Some(per_page))
                .all(&state.db)
                .await?;
            (events, total)
        }
        Some(wanted) => {
            // Narrow by date in SQL; the exact state depends on the time window.
            select = match wanted {
                EventState::Past => select.filter(event::Column::Date.lte(today)),
                EventState::Current => select.filter(event::Column::Date.eq(today)),
                EventState::Future => select.filter(event::Column::Date.gte(today)),
            };
            let matching: Vec<event::Model> = select
                .all(&state.db)
                .await?
                .into_iter()
                .filter(|e| e.state_at(now) == wanted)
                .collect();
            let total = matching.len() as u64;
            let events = matching
                .into_iter()
                .skip(((page - 1) * per_page) as usize)
                .take(per_page as usize)
                .collect();
            (events, total)
        }
    };

    let data = build_responses(&state.db, events, now).await?;
    Ok(Json(EventListResponse {
        data,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create an event",
    description = "Creates an event with optional inline media (by URL) and activities. Requires organizer or admin. \
        Media without an explicit `order` take their index in the list.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;
    validate_create_event(&payload)?;

    let now = Utc::now();
    let txn = state.db.begin().await?;

    let event = event::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        date: Set(payload.date),
        start_time: Set(payload.start_time),
        end_time: Set(payload.end_time),
        is_team: Set(payload.is_team),
        max_members: Set(payload.max_members.unwrap_or_default()),
        max_teams: Set(payload.max_teams),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for (index, media) in payload.media.into_iter().enumerate() {
        event_media::ActiveModel {
            event_id: Set(event.id),
            media_type: Set(media.media_type),
            url: Set(media.url.trim().to_string()),
            name: Set(media.name),
            position: Set(media.order.unwrap_or(index as i32)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    for activity in payload.activities {
        super::activity::new_activity(event.id, activity)
            .insert(&txn)
            .await?;
    }

    let response = event_response(&txn, event).await?;
    txn.commit().await?;

    tracing::info!(event_id = response.id, "Event created");
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Get an event by ID",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventResponse>, AppError> {
    let event = find_event(&state.db, id).await?;
    Ok(Json(event_response(&state.db, event).await?))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an event",
    description = "PATCH semantics. Capacity rules are checked against the merged values; \
        switching `is_team` off without sending `max_teams` clears it. Requires organizer or admin.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    auth_user.require_staff()?;

    if payload == UpdateEventRequest::default() {
        let existing = find_event(&state.db, id).await?;
        return Ok(Json(event_response(&state.db, existing).await?));
    }

    let txn = state.db.begin().await?;
    let existing = find_event_for_update(&txn, id).await?;
    let merged = payload.merge(&existing)?;

    let mut active: event::ActiveModel = existing.into();
    active.title = Set(merged.title);
    active.description = Set(merged.description);
    active.date = Set(merged.date);
    active.start_time = Set(merged.start_time);
    active.end_time = Set(merged.end_time);
    active.is_team = Set(merged.is_team);
    active.max_members = Set(merged.max_members);
    active.max_teams = Set(merged.max_teams);
    active.updated_at = Set(Utc::now());

    let model = active.update(&txn).await?;
    let response = event_response(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event",
    description = "Deletes the event with its media, activities, judges, participations and scores. Requires organizer or admin.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_EXPIRED, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_staff()?;

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, id).await?;

    let participation_ids: Vec<i32> = event_participation::Entity::find()
        .select_only()
        .column(event_participation::Column::Id)
        .filter(event_participation::Column::EventId.eq(id))
        .into_tuple()
        .all(&txn)
        .await?;
    delete_participations(&txn, &participation_ids).await?;

    event_judge::Entity::delete_many()
        .filter(event_judge::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    event_activity::Entity::delete_many()
        .filter(event_activity::Column::EventId.eq(id))
        .exec(&txn)
        .await?;

    let media = event_media::Entity::find()
        .filter(event_media::Column::EventId.eq(id))
        .all(&txn)
        .await?;
    event_media::Entity::delete_many()
        .filter(event_media::Column::EventId.eq(id))
        .exec(&txn)
        .await?;

    event::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    for m in media {
        discard_file(&state, &m.url).await;
    }

    tracing::info!(event_id = id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}
