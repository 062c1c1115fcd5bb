//! Canonical destination names for qualifying sessions.
//!
//! Names have the form `<year>/<timestamp> <sport> <duration>.<ext>`, e.g.
//! `2023/2023-06-01T10:00:00+02:00 running 1h30m0s.fit`. The timestamp is RFC
//! 3339 at second precision in the session's offset, the year is taken from
//! the UTC instant, and the duration is rounded to whole minutes.
//!
//! Nothing here touches the filesystem and nothing is deduplicated: two
//! sessions with the same start, sport and rounded duration get the same name.

use std::path::PathBuf;

use chrono::{DateTime, Datelike, FixedOffset, SecondsFormat, Utc};

use crate::classify::ActivitySession;

const MILLIS_PER_MINUTE: u64 = 60_000;

/// Rounds a duration to the nearest whole minute, halfway values rounding up.
pub const fn round_to_minutes(duration_ms: u64) -> u64 {
    duration_ms.saturating_add(MILLIS_PER_MINUTE / 2) / MILLIS_PER_MINUTE
}

/// Formats whole minutes the way Go prints a `time.Duration`.
///
/// `0s`, `45m0s`, `1h0m0s`, `1h30m0s`.
pub fn format_minutes(minutes: u64) -> String {
    match (minutes / 60, minutes % 60) {
        (0, 0) => "0s".to_string(),
        (0, m) => format!("{m}m0s"),
        (h, m) => format!("{h}h{m}m0s"),
    }
}

/// Computes the destination path of a session relative to the output root.
pub fn canonical_name(
    start: &DateTime<FixedOffset>,
    sport: &str,
    duration_ms: u64,
    extension: &str,
) -> PathBuf {
    let year = start.with_timezone(&Utc).year();
    let timestamp = start.to_rfc3339_opts(SecondsFormat::Secs, true);
    let duration = format_minutes(round_to_minutes(duration_ms));

    PathBuf::from(format!("{year:04}")).join(format!("{timestamp} {sport} {duration}.{extension}"))
}

/// [`canonical_name`] for a classified session.
pub fn session_name(session: &ActivitySession, extension: &str) -> PathBuf {
    canonical_name(&session.start, &session.sport, session.duration_ms, extension)
}
