//! Civil time <-> UTC conversion for user-facing timestamps.
//!
//! Reminder due times are entered in the user's local zone and stored in
//! UTC; everything shown back to the user is converted through the
//! profile's zone again.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ApiError;

/// Wire format for user-entered date/times.
pub const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Display format for due times in notifications and listings.
pub const DISPLAY_FORMAT: &str = "%b %d, %Y %H:%M";

/// Resolve a stored timezone name, falling back to `default` when the
/// name is unrecognized. Profile zones are free text from an older
/// schema, so a bad value must never take down a request.
pub fn resolve_tz(name: &str, default: Tz) -> Tz {
    name.parse().unwrap_or(default)
}

/// Convert a civil wall-clock time in `tz` to UTC.
///
/// Returns `None` for wall times that do not exist in the zone (the
/// spring-forward gap). Ambiguous times (the fall-back hour) map to the
/// earliest instant.
pub fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Convert a UTC instant to civil time in `tz` for display.
pub fn utc_to_local(t: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    t.with_timezone(&tz)
}

/// Parse a user-supplied `YYYY-MM-DD HH:MM` string in `tz` into UTC.
///
/// Unlike profile-zone resolution, a malformed string here is an error:
/// the user explicitly typed it and silently guessing would schedule the
/// reminder at the wrong moment.
pub fn parse_local_datetime(s: &str, tz: Tz) -> Result<DateTime<Utc>, ApiError> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), LOCAL_FORMAT)
        .map_err(|_| ApiError::invalid_input(format!("invalid date/time '{}', expected YYYY-MM-DD HH:MM", s.trim())))?;
    local_to_utc(naive, tz).ok_or_else(|| {
        ApiError::invalid_input(format!("'{}' does not exist in timezone {}", s.trim(), tz))
    })
}
