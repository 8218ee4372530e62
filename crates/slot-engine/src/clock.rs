//! Zoned wall-clock arithmetic.
//!
//! Every conversion between an absolute instant and calendar fields goes
//! through [`chrono_tz::Tz`], re-deriving the zone's UTC offset for the
//! instant's actual date on every call — offsets are never cached, because
//! they change across DST boundaries. All functions take explicit inputs
//! (no system clock access); the caller provides the "now" anchor where one
//! is needed, keeping these functions testable and deterministic.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

/// Calendar/wall-clock fields of an instant as seen in a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZonedFields {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    /// Day of week, `0` = Sunday through `6` = Saturday.
    pub weekday: u8,
}

/// Decompose an instant into the wall-clock fields of `tz`.
pub fn zoned_fields(instant: DateTime<Utc>, tz: Tz) -> ZonedFields {
    let local = instant.with_timezone(&tz);
    ZonedFields {
        year: local.year(),
        month: local.month(),
        day: local.day(),
        hour: local.hour(),
        minute: local.minute(),
        second: local.second(),
        weekday: local.weekday().num_days_from_sunday() as u8,
    }
}

/// Parse a `"HH:MM"` string leniently.
///
/// Missing or malformed components parse to zero rather than failing, and
/// the `"24:00"` end-of-day sentinel maps to `23:59`.
pub fn parse_hm(s: &str) -> (u32, u32) {
    let mut parts = s.split(':');
    let hour: u32 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0);
    let minute: u32 = parts
        .next()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(0);
    if hour == 24 {
        (23, 59)
    } else {
        (hour, minute)
    }
}

/// Resolve a naive local datetime in `tz` to an absolute instant.
///
/// DST fold picks the earlier of the two candidate instants; a spring-forward
/// gap resolves to the same wall-clock time one hour later (the first valid
/// reading after the gap). This is the zone database's standard resolution.
fn resolve_local(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = naive + Duration::hours(1);
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    dt.with_timezone(&Utc)
                }
                LocalResult::None => Utc.from_utc_datetime(&naive),
            }
        }
    }
}

/// The instant whose wall clock in `tz` reads `hm` on the calendar date that
/// `date` falls on in `tz`.
pub fn instant_at_hm(date: DateTime<Utc>, hm: &str, tz: Tz) -> DateTime<Utc> {
    let (hour, minute) = parse_hm(hm);
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
    let naive = date.with_timezone(&tz).date_naive().and_time(time);
    resolve_local(naive, tz)
}

/// Zone-local midnight of the calendar date that `instant` falls on in `tz`.
pub fn start_of_day(instant: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let naive = instant
        .with_timezone(&tz)
        .date_naive()
        .and_time(NaiveTime::default());
    resolve_local(naive, tz)
}

/// Step `days` forward from `instant` and land on zone-local midnight.
///
/// Steps the local calendar date rather than adding absolute 24-hour
/// periods, so a 23- or 25-hour DST day still advances by exactly one
/// calendar day.
pub fn add_days(instant: DateTime<Utc>, days: i64, tz: Tz) -> DateTime<Utc> {
    let date = instant.with_timezone(&tz).date_naive() + Duration::days(days);
    resolve_local(date.and_time(NaiveTime::default()), tz)
}

/// Round an instant to the nearest whole minute.
pub fn round_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
    let secs = instant.timestamp();
    let rounded = (secs + 30).div_euclid(60) * 60;
    DateTime::from_timestamp(rounded, 0).unwrap_or(instant)
}

/// Day of week of `instant` in `tz`, `0` = Sunday through `6` = Saturday.
pub fn weekday_index(instant: DateTime<Utc>, tz: Tz) -> u8 {
    instant
        .with_timezone(&tz)
        .weekday()
        .num_days_from_sunday() as u8
}

/// Whether two instants fall on the same calendar date in `tz`.
pub fn is_same_day(a: DateTime<Utc>, b: DateTime<Utc>, tz: Tz) -> bool {
    a.with_timezone(&tz).date_naive() == b.with_timezone(&tz).date_naive()
}

/// Whether `end` reads 23:59 and `next_start` reads 00:00 in `tz` — the
/// signature of a shift that runs through midnight into the next day.
pub fn is_midnight_transition(end: DateTime<Utc>, next_start: DateTime<Utc>, tz: Tz) -> bool {
    let zoned_end = end.with_timezone(&tz);
    let zoned_start = next_start.with_timezone(&tz);
    zoned_end.hour() == 23
        && zoned_end.minute() == 59
        && zoned_start.hour() == 0
        && zoned_start.minute() == 0
}
