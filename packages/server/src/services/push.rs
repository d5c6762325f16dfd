//! Notification fan-out over the device registry.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use common::push::{PushMessage, PushSender};
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};

use crate::entity::{device, notification_history};

/// Reported for recipients that were never registered.
pub const TOKEN_NOT_FOUND: &str = "TokenNotFoundInDB";

/// Deliver `message` to `tokens`, record history and optionally prune dead tokens.
///
/// Returns one status string per requested token.
pub async fn deliver<C: ConnectionTrait>(
    conn: &C,
    sender: &dyn PushSender,
    tokens: &[String],
    message: &PushMessage,
    prune_invalid: bool,
) -> Result<HashMap<String, String>, DbErr> {
    let mut seen = HashSet::new();
    let requested: Vec<&String> = tokens.iter().filter(|t| seen.insert(*t)).collect();

    let devices: HashMap<String, device::Model> = device::Entity::find()
        .filter(device::Column::Token.is_in(requested.iter().map(|t| t.as_str())))
        .all(conn)
        .await?
        .into_iter()
        .map(|d| (d.token.clone(), d))
        .collect();

    let mut results = HashMap::with_capacity(requested.len());
    let mut deliverable = Vec::with_capacity(devices.len());
    for token in requested {
        if devices.contains_key(token) {
            deliverable.push(token.clone());
        } else {
            tracing::debug!(token = %token, "Skipping unregistered token");
            results.insert(token.clone(), TOKEN_NOT_FOUND.to_string());
        }
    }

    let statuses = sender.send_batch(&deliverable, message).await;
    let now = Utc::now();

    let mut history = Vec::with_capacity(statuses.len());
    let mut invalid = Vec::new();
    for (token, status) in &statuses {
        let Some(device) = devices.get(token) else {
            continue;
        };
        history.push(notification_history::ActiveModel {
            device_id: Set(device.id),
            title: Set(message.title.clone()),
            body: Set(message.body.clone()),
            apns_status: Set(status.to_string()),
            destination: Set(message.destination.clone()),
            sound: Set(message.sound.clone()),
            sent_at: Set(now),
            ..Default::default()
        });
        if status.is_invalid_token() {
            invalid.push(device.id);
        }
        results.insert(token.clone(), status.to_string());
    }

    if !history.is_empty() {
        notification_history::Entity::insert_many(history)
            .exec_without_returning(conn)
            .await?;
    }

    let delivered = statuses.values().filter(|s| s.is_success()).count();
    tracing::info!(
        requested = results.len(),
        delivered,
        failed = statuses.len() - delivered,
        "Push batch finished"
    );

    if prune_invalid && !invalid.is_empty() {
        delete_devices(conn, &invalid).await?;
        tracing::info!(count = invalid.len(), "Pruned invalid device tokens");
    }

    Ok(results)
}

/// Delete devices together with their notification history.
pub async fn delete_devices<C: ConnectionTrait>(conn: &C, ids: &[i32]) -> Result<u64, DbErr> {
    notification_history::Entity::delete_many()
        .filter(notification_history::Column::DeviceId.is_in(ids.iter().copied()))
        .exec(conn)
        .await?;
    let res = device::Entity::delete_many()
        .filter(device::Column::Id.is_in(ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(res.rows_affected)
}

