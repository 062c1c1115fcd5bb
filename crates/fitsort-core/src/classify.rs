//! Qualification of decoded activities as manual single-sport sessions.

use std::fmt;

use chrono::{DateTime, FixedOffset, TimeZone};

use crate::activity::{ActivityType, DecodedActivity};

/// A qualifying activity, ready to be named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySession {
    /// Profile name of the sole sport.
    pub sport: String,
    /// Start of the session in the naming time zone.
    pub start: DateTime<FixedOffset>,
    pub duration_ms: u64,
}

/// Why a decoded activity does not qualify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotQualifying {
    /// The sport was not set manually.
    WrongType(ActivityType),
    /// Exactly one sport entry is required.
    SportCountMismatch(usize),
}

impl fmt::Display for NotQualifying {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongType(found) => write!(f, "sport type not set manually ({found})"),
            Self::SportCountMismatch(count) => write!(f, "expected exactly 1 sport, got {count}"),
        }
    }
}

/// Classifies `activity`, expressing its start time in `tz`.
pub fn classify_in<Tz: TimeZone>(
    activity: &DecodedActivity,
    tz: &Tz,
) -> Result<ActivitySession, NotQualifying> {
    if activity.activity_type != ActivityType::Manual {
        return Err(NotQualifying::WrongType(activity.activity_type.clone()));
    }

    let [sport] = activity.sports.as_slice() else {
        return Err(NotQualifying::SportCountMismatch(activity.sports.len()));
    };

    Ok(ActivitySession {
        sport: sport.to_string(),
        start: activity.timestamp.with_timezone(tz).fixed_offset(),
        duration_ms: activity.total_timer_time_ms,
    })
}
