//! Membership and captaincy rules for a single participation.
//!
//! A [`Roster`] is rebuilt from stored rows, a transition is applied, and the
//! returned [`RosterChange`] tells the caller which rows to write. Nothing in
//! here touches the database.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Roster {
    /// The participation no longer exists.
    Dissolved,
    /// `members` is in join order and always contains `captain`.
    Active { captain: Uuid, members: Vec<Uuid> },
}

/// The storage effect of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterChange {
    Joined { user: Uuid },
    /// A non-captain membership row goes away.
    Left { user: Uuid },
    /// The captain's row goes away and `successor` becomes the creator.
    CaptainLeft { user: Uuid, successor: Uuid },
    CaptainTransferred { from: Uuid, to: Uuid },
    /// The participation and everything hanging off it goes away.
    Dissolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("user is not a member")]
    NotMember,
    #[error("user is already a member")]
    AlreadyMember,
    #[error("roster is full ({capacity} members)")]
    Full { capacity: usize },
    #[error("only the captain may do this")]
    NotCaptain,
    #[error("only the member themselves or the captain may remove a member")]
    NotAllowed,
    #[error("user is already the captain")]
    AlreadyCaptain,
    #[error("participation has been dissolved")]
    Dissolved,
}

pub type Transition = Result<(Roster, RosterChange), RosterError>;

impl Roster {
    /// A fresh roster whose founder is both captain and sole member.
    pub fn founded_by(user: Uuid) -> Self {
        Roster::Active {
            captain: user,
            members: vec![user],
        }
    }

    /// Rebuild a roster from the stored creator and membership rows (join order).
    pub fn from_rows(captain: Uuid, members: Vec<Uuid>) -> Self {
        if members.is_empty() {
            return Roster::Dissolved;
        }
        Roster::Active { captain, members }
    }

    pub fn captain(&self) -> Option<Uuid> {
        match self {
            Roster::Active { captain, .. } => Some(*captain),
            Roster::Dissolved => None,
        }
    }

    pub fn members(&self) -> &[Uuid] {
        match self {
            Roster::Active { members, .. } => members,
            Roster::Dissolved => &[],
        }
    }

    pub fn contains(&self, user: Uuid) -> bool {
        self.members().contains(&user)
    }

    /// Add `user`, provided fewer than `capacity` members are present.
    pub fn join(&self, user: Uuid, capacity: usize) -> Transition {
        let Roster::Active { captain, members } = self else {
            return Err(RosterError::Dissolved);
        };
        if members.contains(&user) {
            return Err(RosterError::AlreadyMember);
        }
        if members.len() >= capacity {
            return Err(RosterError::Full { capacity });
        }
        let mut members = members.clone();
        members.push(user);
        Ok((
            Roster::Active {
                captain: *captain,
                members,
            },
            RosterChange::Joined { user },
        ))
    }

    /// Leave (actor == target) or kick (actor is captain).
    ///
    /// A captain leaving hands captaincy to the earliest remaining member, or
    /// dissolves the roster when nobody remains.
    pub fn remove(&self, actor: Uuid, target: Uuid) -> Transition {
        let Roster::Active { captain, members } = self else {
            return Err(RosterError::Dissolved);
        };
        if actor != target && actor != *captain {
            return Err(RosterError::NotAllowed);
        }
        if !members.contains(&target) {
            return Err(RosterError::NotMember);
        }

        let remaining: Vec<Uuid> = members.iter().copied().filter(|m| *m != target).collect();

        if target != *captain {
            return Ok((
                Roster::Active {
                    captain: *captain,
                    members: remaining,
                },
                RosterChange::Left { user: target },
            ));
        }

        match remaining.first().copied() {
            Some(successor) => Ok((
                Roster::Active {
                    captain: successor,
                    members: remaining,
                },
                RosterChange::CaptainLeft {
                    user: target,
                    successor,
                },
            )),
            None => Ok((Roster::Dissolved, RosterChange::Dissolved)),
        }
    }

    pub fn transfer(&self, actor: Uuid, target: Uuid) -> Transition {
        let Roster::Active { captain, members } = self else {
            return Err(RosterError::Dissolved);
        };
        if actor != *captain {
            return Err(RosterError::NotCaptain);
        }
        if target == *captain {
            return Err(RosterError::AlreadyCaptain);
        }
        if !members.contains(&target) {
            return Err(RosterError::NotMember);
        }
        Ok((
            Roster::Active {
                captain: target,
                members: members.clone(),
            },
            RosterChange::CaptainTransferred {
                from: *captain,
                to: target,
            },
        ))
    }

    pub fn disband(&self, actor: Uuid) -> Transition {
        match self {
            Roster::Active { captain, .. } if *captain == actor => {
                Ok((Roster::Dissolved, RosterChange::Dissolved))
            }
            Roster::Active { .. } => Err(RosterError::NotCaptain),
            Roster::Dissolved => Err(RosterError::Dissolved),
        }
    }
}
