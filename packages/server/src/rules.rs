//! Field-consistency invariants shared by create and edit paths.

use chrono::{DateTime, Utc};

use crate::error::AppError;

/// Capacity rules for an event.
///
/// Edits must pass the effective values (stored row merged with the patch).
pub fn validate_limits(
    is_team: bool,
    max_members: Option<i32>,
    max_teams: Option<i32>,
) -> Result<(), AppError> {
    let max_members = match max_members {
        Some(n) if n > 0 => n,
        _ => {
            return Err(AppError::Validation(
                "max_members must be a positive integer".into(),
            ));
        }
    };

    if is_team {
        let max_teams = max_teams.ok_or_else(|| {
            AppError::Validation("max_teams required when is_team=True".into())
        })?;
        if max_teams <= 0 {
            return Err(AppError::Validation(
                "max_teams must be a positive integer".into(),
            ));
        }
        if max_members % max_teams != 0 {
            return Err(AppError::Validation(
                "max_members must be divisible by max_teams".into(),
            ));
        }
    } else if max_teams.is_some() {
        return Err(AppError::Validation(
            "max_teams not allowed when is_team=False".into(),
        ));
    }

    Ok(())
}

/// Scoring and scheduling rules for an activity.
pub fn validate_activity(
    is_scoreable: bool,
    max_score: Option<i32>,
    start_dt: Option<DateTime<Utc>>,
    end_dt: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    if is_scoreable {
        match max_score {
            None => {
                return Err(AppError::Validation(
                    "max_score is required for scoreable activities".into(),
                ));
            }
            Some(score) if score <= 0 => {
                return Err(AppError::Validation(
                    "max_score must be a positive integer".into(),
                ));
            }
            Some(_) => {}
        }
    } else if start_dt.is_none() || end_dt.is_none() {
        return Err(AppError::Validation(
            "start_dt and end_dt are required for non-scoreable activities".into(),
        ));
    }

    if let (Some(start), Some(end)) = (start_dt, end_dt)
        && start >= end
    {
        return Err(AppError::Validation(
            "start_dt must be before end_dt".into(),
        ));
    }

    Ok(())
}
