//! Transactional persistence of [`Roster`] transitions.
//!
//! Every method expects to run inside a transaction that already holds the
//! event row lock (see [`lock_participation`]).

use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::entity::event_participation::{self, ParticipantType};
use crate::entity::{event, participation_member, score, user};
use crate::error::AppError;
use crate::models::participation::MemberResponse;
use crate::roster::{Roster, RosterChange};
use crate::utils::lookup::{
    find_event_for_update, find_event_membership, find_participation, is_judge,
};

/// Lock the owning event, then re-read the participation under the lock.
pub async fn lock_participation<C: ConnectionTrait>(
    conn: &C,
    participation_id: i32,
) -> Result<(event::Model, event_participation::Model), AppError> {
    let unlocked = find_participation(conn, participation_id).await?;
    let event = find_event_for_update(conn, unlocked.event_id).await?;
    let participation = find_participation(conn, participation_id).await?;
    Ok((event, participation))
}

fn membership_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            tracing::debug!("Membership race caught by unique key");
            AppError::Conflict("User already participates in this event".into())
        }
        _ => AppError::from(err),
    }
}

pub struct ParticipationService<'a, C: ConnectionTrait> {
    conn: &'a C,
}

impl<'a, C: ConnectionTrait> ParticipationService<'a, C> {
    pub fn new(conn: &'a C) -> Self {
        Self { conn }
    }

    /// A user may hold one membership per event and may not judge it at the same time.
    async fn ensure_eligible(&self, event_id: i32, user_id: Uuid) -> Result<(), AppError> {
        if is_judge(self.conn, event_id, user_id).await? {
            return Err(AppError::Conflict(
                "Judges cannot participate in the event they judge".into(),
            ));
        }
        if find_event_membership(self.conn, event_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "User already participates in this event".into(),
            ));
        }
        Ok(())
    }

    async fn count_of(&self, event_id: i32, kind: ParticipantType) -> Result<u64, AppError> {
        Ok(event_participation::Entity::find()
            .filter(event_participation::Column::EventId.eq(event_id))
            .filter(event_participation::Column::ParticipantType.eq(kind))
            .count(self.conn)
            .await?)
    }

    async fn insert_member(
        &self,
        participation_id: i32,
        event_id: i32,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        participation_member::ActiveModel {
            participation_id: Set(participation_id),
            user_id: Set(user_id),
            event_id: Set(event_id),
            joined_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.conn)
        .await
        .map_err(membership_conflict)?;
        Ok(())
    }

    /// Create an individual entry or a team captained by `user_id`.
    pub async fn create(
        &self,
        event: &event::Model,
        user_id: Uuid,
        kind: ParticipantType,
        team_name: Option<String>,
    ) -> Result<event_participation::Model, AppError> {
        self.ensure_eligible(event.id, user_id).await?;

        match kind {
            ParticipantType::Individual => {
                if event.is_team {
                    return Err(AppError::Validation(
                        "This is a team event; create a team participation".into(),
                    ));
                }
                let count = self.count_of(event.id, kind).await?;
                if count >= event.max_members as u64 {
                    return Err(AppError::Conflict(format!(
                        "Event is full ({} participants)",
                        event.max_members
                    )));
                }
            }
            ParticipantType::Team => {
                if !event.is_team {
                    return Err(AppError::Validation(
                        "This event does not accept team participations".into(),
                    ));
                }
                let max_teams = event.max_teams.unwrap_or(0);
                let count = self.count_of(event.id, kind).await?;
                if count >= max_teams as u64 {
                    return Err(AppError::Conflict(format!(
                        "Event already has the maximum number of teams ({max_teams})"
                    )));
                }
            }
        }

        let participation = event_participation::ActiveModel {
            event_id: Set(event.id),
            participant_type: Set(kind),
            team_name: Set(team_name),
            avatar_url: Set(None),
            creator_id: Set(user_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        self.insert_member(participation.id, event.id, user_id).await?;

        tracing::info!(
            participation_id = participation.id,
            event_id = event.id,
            %user_id,
            "Participation created"
        );
        Ok(participation)
    }

    /// Stored roster, members in join order.
    pub async fn roster(
        &self,
        participation: &event_participation::Model,
    ) -> Result<Roster, AppError> {
        let members = participation_member::Entity::find()
            .filter(participation_member::Column::ParticipationId.eq(participation.id))
            .order_by_asc(participation_member::Column::JoinedAt)
            .all(self.conn)
            .await?;
        Ok(Roster::from_rows(
            participation.creator_id,
            members.into_iter().map(|m| m.user_id).collect(),
        ))
    }

    pub async fn join(
        &self,
        event: &event::Model,
        participation: &event_participation::Model,
        user_id: Uuid,
    ) -> Result<(), AppError> {
        if participation.participant_type != ParticipantType::Team {
            return Err(AppError::Validation(
                "Only team participations can be joined".into(),
            ));
        }
        self.ensure_eligible(event.id, user_id).await?;

        let capacity = usize::try_from(event.max_members).unwrap_or(0);
        let (_, change) = self.roster(participation).await?.join(user_id, capacity)?;
        self.apply(participation, change).await
    }

    /// Leave (actor == target) or kick (actor is captain).
    pub async fn remove_member(
        &self,
        participation: &event_participation::Model,
        actor: Uuid,
        target: Uuid,
    ) -> Result<(), AppError> {
        let (_, change) = self.roster(participation).await?.remove(actor, target)?;
        self.apply(participation, change).await
    }

    pub async fn transfer_captaincy(
        &self,
        participation: &event_participation::Model,
        actor: Uuid,
        target: Uuid,
    ) -> Result<(), AppError> {
        let (_, change) = self.roster(participation).await?.transfer(actor, target)?;
        self.apply(participation, change).await
    }

    pub async fn disband(
        &self,
        participation: &event_participation::Model,
        actor: Uuid,
    ) -> Result<(), AppError> {
        let (_, change) = self.roster(participation).await?.disband(actor)?;
        self.apply(participation, change).await
    }

    async fn set_captain(
        &self,
        participation: &event_participation::Model,
        captain: Uuid,
    ) -> Result<(), AppError> {
        let mut active: event_participation::ActiveModel = participation.clone().into();
        active.creator_id = Set(captain);
        active.update(self.conn).await?;
        Ok(())
    }

    async fn delete_membership(&self, participation_id: i32, user_id: Uuid) -> Result<(), AppError> {
        participation_member::Entity::delete_by_id((participation_id, user_id))
            .exec(self.conn)
            .await?;
        Ok(())
    }

    /// Write the rows a transition calls for.
    async fn apply(
        &self,
        participation: &event_participation::Model,
        change: RosterChange,
    ) -> Result<(), AppError> {
        let pid = participation.id;
        match change {
            RosterChange::Joined { user } => {
                self.insert_member(pid, participation.event_id, user).await?;
                tracing::info!(participation_id = pid, %user, "Member joined");
            }
            RosterChange::Left { user } => {
                self.delete_membership(pid, user).await?;
                tracing::info!(participation_id = pid, %user, "Member left");
            }
            RosterChange::CaptainLeft { user, successor } => {
                self.delete_membership(pid, user).await?;
                self.set_captain(participation, successor).await?;
                tracing::info!(participation_id = pid, %user, %successor, "Captain left, captaincy handed over");
            }
            RosterChange::CaptainTransferred { from, to } => {
                self.set_captain(participation, to).await?;
                tracing::info!(participation_id = pid, %from, %to, "Captaincy transferred");
            }
            RosterChange::Dissolved => {
                delete_participations(self.conn, &[pid]).await?;
                tracing::info!(participation_id = pid, "Participation dissolved");
            }
        }
        Ok(())
    }
}

/// Delete participations with their scores and memberships.
pub async fn delete_participations<C: ConnectionTrait>(
    conn: &C,
    ids: &[i32],
) -> Result<(), DbErr> {
    if ids.is_empty() {
        return Ok(());
    }
    score::Entity::delete_many()
        .filter(score::Column::ParticipationId.is_in(ids.iter().copied()))
        .exec(conn)
        .await?;
    participation_member::Entity::delete_many()
        .filter(participation_member::Column::ParticipationId.is_in(ids.iter().copied()))
        .exec(conn)
        .await?;
    event_participation::Entity::delete_many()
        .filter(event_participation::Column::Id.is_in(ids.iter().copied()))
        .exec(conn)
        .await?;
    Ok(())
}

/// Members of each participation in join order, loaded with two queries.
pub async fn load_members<C: ConnectionTrait>(
    conn: &C,
    participations: &[event_participation::Model],
) -> Result<HashMap<i32, Vec<MemberResponse>>, DbErr> {
    let mut grouped: HashMap<i32, Vec<MemberResponse>> = HashMap::new();
    if participations.is_empty() {
        return Ok(grouped);
    }
    let captains: HashMap<i32, Uuid> = participations
        .iter()
        .map(|p| (p.id, p.creator_id))
        .collect();

    let rows = participation_member::Entity::find()
        .filter(
            participation_member::Column::ParticipationId.is_in(captains.keys().copied()),
        )
        .order_by_asc(participation_member::Column::JoinedAt)
        .all(conn)
        .await?;

    let users: HashMap<Uuid, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(rows.iter().map(|r| r.user_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    for row in rows {
        let Some(user) = users.get(&row.user_id) else {
            continue;
        };
        grouped
            .entry(row.participation_id)
            .or_default()
            .push(MemberResponse {
                user_id: row.user_id,
                handle: user.handle.clone(),
                full_name: user.full_name.clone(),
                avatar_url: user.avatar_url.clone(),
                is_captain: captains.get(&row.participation_id) == Some(&row.user_id),
                joined_at: row.joined_at,
            });
    }
    Ok(grouped)
}
