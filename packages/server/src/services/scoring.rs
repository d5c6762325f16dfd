//! Who may record a score, and which values are acceptable.

use crate::entity::event_activity;
use crate::error::AppError;

/// Bonus scores (no activity) are staff-only; activity scores also accept
/// the event's judges.
pub fn authorize(is_staff: bool, is_judge: bool, is_bonus: bool) -> Result<(), AppError> {
    let allowed = if is_bonus {
        is_staff
    } else {
        is_staff || is_judge
    };
    if allowed {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}

/// The activity, when present, must belong to the participation's event and
/// accept scores up to its `max_score`.
pub fn validate_score(
    value: i32,
    event_id: i32,
    activity: Option<&event_activity::Model>,
) -> Result<(), AppError> {
    let Some(activity) = activity else {
        if value < 0 {
            return Err(AppError::Validation(
                "Bonus score must be non-negative".into(),
            ));
        }
        return Ok(());
    };
    if activity.event_id != event_id {
        return Err(AppError::Validation(
            "Activity does not belong to the participation's event".into(),
        ));
    }
    if !activity.is_scoreable {
        return Err(AppError::Validation("Activity is not scoreable".into()));
    }
    let max_score = activity.max_score.unwrap_or(0);
    if !(0..=max_score).contains(&value) {
        return Err(AppError::Validation(format!(
            "score must be between 0 and {max_score}"
        )));
    }
    Ok(())
}
