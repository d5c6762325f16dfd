use sea_orm::sea_query::LockType;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::entity::{
    device, event, event_activity, event_judge, event_participation, participation_member, user,
};
use crate::error::AppError;

/// Look up a user by ID, returning 404 if not found.
pub async fn find_user<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// Look up an event by ID, returning 404 if not found.
pub async fn find_event<C: ConnectionTrait>(db: &C, id: i32) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Look up an event and lock its row until the transaction ends.
///
/// Every write that changes an event's participations takes this lock first.
pub async fn find_event_for_update<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

pub async fn find_activity<C: ConnectionTrait>(
    db: &C,
    event_id: i32,
    activity_id: i32,
) -> Result<event_activity::Model, AppError> {
    event_activity::Entity::find_by_id(activity_id)
        .filter(event_activity::Column::EventId.eq(event_id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Activity not found".into()))
}

pub async fn find_participation<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<event_participation::Model, AppError> {
    event_participation::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Participation not found".into()))
}

pub async fn find_device_by_token<C: ConnectionTrait>(
    db: &C,
    token: &str,
) -> Result<device::Model, AppError> {
    device::Entity::find()
        .filter(device::Column::Token.eq(token))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Device not found".into()))
}

pub async fn is_judge<C: ConnectionTrait>(
    db: &C,
    event_id: i32,
    user_id: Uuid,
) -> Result<bool, AppError> {
    Ok(event_judge::Entity::find_by_id((event_id, user_id))
        .one(db)
        .await?
        .is_some())
}

/// The user's membership in any participation of the event, if one exists.
pub async fn find_event_membership<C: ConnectionTrait>(
    db: &C,
    event_id: i32,
    user_id: Uuid,
) -> Result<Option<participation_member::Model>, AppError> {
    Ok(participation_member::Entity::find()
        .filter(participation_member::Column::EventId.eq(event_id))
        .filter(participation_member::Column::UserId.eq(user_id))
        .one(db)
        .await?)
}
