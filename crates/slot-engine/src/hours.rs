//! Business-hours resolution.
//!
//! Answers "which shifts apply on date D?" from the weekly shift table, the
//! annually-recurring date overrides, and an optional temporary override.
//! Resolution never fails: absent data yields an empty shift list, which the
//! rest of the engine reads as "closed".

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock;

/// A single open interval within a weekly recurring day.
///
/// `weekday` runs `0` = Sunday through `6` = Saturday. `start`/`end` are
/// `"HH:MM"` wall-clock strings; `"24:00"` is an end-of-day sentinel read as
/// `23:59`. A shift whose `end` reads earlier than its `start` is overnight
/// and closes on the following calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub weekday: u8,
    pub start: String,
    pub end: String,
}

/// A date-specific replacement of the weekly hours, matched by (month, day)
/// only — overrides recur annually.
///
/// Both bounds `None` means the day is fully closed. Partial bounds default
/// the missing side to full-day (`00:00` / `23:59`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateOverride {
    pub month: u32,
    pub day: u32,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateOverride {
    /// Whether this override closes the day entirely.
    pub fn is_closed(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether this override applies to the given zoned (month, day).
    pub fn matches(&self, month: u32, day: u32) -> bool {
        self.month == month && self.day == day
    }
}

/// A pre-sale shift window that, when supplied, fully replaces both weekly
/// hours and date overrides for every scanned date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryShift {
    pub start: String,
    pub end: String,
}

/// A shift resolved against a concrete date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedShift {
    pub weekday: u8,
    pub start: String,
    pub end: String,
    /// End falls before start on the wall clock; the shift closes on the
    /// next calendar day.
    pub overnight: bool,
}

impl ResolvedShift {
    fn new(weekday: u8, start: &str, end: &str) -> Self {
        ResolvedShift {
            weekday,
            start: start.to_string(),
            end: end.to_string(),
            overnight: is_overnight(start, end),
        }
    }
}

/// Whether a shift bounded by these wall-clock strings runs past midnight.
fn is_overnight(start: &str, end: &str) -> bool {
    let (sh, sm) = clock::parse_hm(start);
    let (eh, em) = clock::parse_hm(end);
    eh < sh || (eh == sh && em < sm)
}

/// The ordered list of shifts effective on the date `date` falls on in `tz`.
///
/// Resolution order:
/// 1. A temporary override, when supplied, wins outright — each window is
///    tagged with the date's weekday and returned verbatim.
/// 2. A matching date override with both bounds absent → closed (empty list).
/// 3. A matching date override with explicit bounds → one synthetic shift,
///    missing bounds defaulting to full-day.
/// 4. Otherwise the weekly table entries for the date's weekday, order
///    preserved as given.
pub fn resolve_hours_for_date(
    date: DateTime<Utc>,
    tz: Tz,
    weekly_hours: &[Shift],
    overrides: &[DateOverride],
    temp_override: Option<&[TemporaryShift]>,
) -> Vec<ResolvedShift> {
    let local = date.with_timezone(&tz);
    let weekday = local.weekday().num_days_from_sunday() as u8;

    if let Some(windows) = temp_override {
        return windows
            .iter()
            .map(|w| ResolvedShift::new(weekday, &w.start, &w.end))
            .collect();
    }

    if let Some(ov) = overrides
        .iter()
        .find(|ov| ov.matches(local.month(), local.day()))
    {
        if ov.is_closed() {
            return Vec::new();
        }
        let start = ov.start.as_deref().unwrap_or("00:00");
        let end = ov.end.as_deref().unwrap_or("23:59");
        return vec![ResolvedShift::new(weekday, start, end)];
    }

    weekly_hours
        .iter()
        .filter(|s| s.weekday == weekday)
        .map(|s| ResolvedShift::new(weekday, &s.start, &s.end))
        .collect()
}
