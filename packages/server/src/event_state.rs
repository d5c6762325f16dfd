use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::event;

/// Where an event sits relative to now. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventState {
    Past,
    Current,
    Future,
}

/// Compare `now` against `[date + start, date + end]`, both interpreted as UTC.
///
/// An unset start means midnight and an unset end means the last instant of the day.
pub fn event_state(
    date: NaiveDate,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    now: DateTime<Utc>,
) -> EventState {
    let start = date.and_time(start_time.unwrap_or(NaiveTime::MIN)).and_utc();
    let end = match end_time {
        Some(t) => date.and_time(t).and_utc(),
        None => {
            date.and_time(NaiveTime::MIN).and_utc() + TimeDelta::days(1)
                - TimeDelta::nanoseconds(1)
        }
    };

    if now < start {
        EventState::Future
    } else if now > end {
        EventState::Past
    } else {
        EventState::Current
    }
}

impl event::Model {
    pub fn state_at(&self, now: DateTime<Utc>) -> EventState {
        event_state(self.date, self.start_time, self.end_time, now)
    }
}
