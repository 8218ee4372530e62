//! Forward date scanning.
//!
//! Walks day-by-day from a start instant and collects up to `count` open
//! calendar dates, each returned as zone-local midnight. Windowed (pre-sale)
//! scans enumerate a contiguous calendar range up to an explicit end date;
//! unwindowed scans skip naturally-closed weekdays.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

use crate::clock;
use crate::hours::{DateOverride, Shift};

/// Upper bound on candidate days examined per scan. A location closed for
/// longer than this yields fewer dates than requested rather than an error;
/// callers must check the returned length.
pub const MAX_SCAN_CANDIDATE_DAYS: usize = 30;

/// Scan parameters beyond the weekly hours and overrides.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Number of open dates to collect.
    pub count: usize,
    /// Windowed (pre-sale) mode: stop once a candidate passes this instant.
    /// Windowed scans keep naturally-closed weekdays in the output, because
    /// the window must enumerate a contiguous calendar range.
    pub end_date: Option<DateTime<Utc>>,
    /// Pre-sale day-of-month allow-list; active only together with
    /// `weekday_allow`.
    pub day_of_month_allow: Vec<u32>,
    /// Pre-sale weekday allow-list (`0` = Sunday), paired with
    /// `day_of_month_allow`.
    pub weekday_allow: Vec<u8>,
    /// DAY-cadence prep: additionally skip a candidate whose last shift has
    /// already closed relative to the scan start, so multi-day prep windows
    /// never anchor to an already-finished day.
    pub day_cadence: bool,
    /// Safety cap on candidates examined; defaults to
    /// [`MAX_SCAN_CANDIDATE_DAYS`].
    pub max_candidate_days: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            count: 1,
            end_date: None,
            day_of_month_allow: Vec::new(),
            weekday_allow: Vec::new(),
            day_cadence: false,
            max_candidate_days: MAX_SCAN_CANDIDATE_DAYS,
        }
    }
}

/// Collect the next open calendar dates after `start`, as zone-local
/// midnights, ascending.
///
/// Per-candidate rules, in order: same-day dedup, end-date cutoff, closed
/// override skip, DAY-cadence already-closed skip, naturally-closed skip
/// (unwindowed mode only), then the pre-sale day-of-month/weekday pair when
/// both lists are non-empty.
pub fn next_available_dates(
    start: DateTime<Utc>,
    tz: Tz,
    weekly_hours: &[Shift],
    overrides: &[DateOverride],
    opts: &ScanOptions,
) -> Vec<DateTime<Utc>> {
    let mut dates: Vec<DateTime<Utc>> = Vec::new();
    let mut candidate = clock::start_of_day(start, tz);

    for _ in 0..=opts.max_candidate_days {
        if dates.len() >= opts.count {
            break;
        }

        let date = candidate;
        candidate = clock::add_days(candidate, 1, tz);

        // Never collect the same calendar day twice.
        if let Some(&last) = dates.last() {
            if clock::is_same_day(last, date, tz) {
                continue;
            }
        }

        if let Some(end) = opts.end_date {
            if date > end {
                break;
            }
        }

        let local = date.with_timezone(&tz);
        let weekday = local.weekday().num_days_from_sunday() as u8;

        let matching_overrides: Vec<&DateOverride> = overrides
            .iter()
            .filter(|ov| ov.matches(local.month(), local.day()))
            .collect();

        // Closed overrides exclude the day in every mode.
        if matching_overrides.iter().any(|ov| ov.is_closed()) {
            continue;
        }

        let day_hours: Vec<&Shift> = weekly_hours
            .iter()
            .filter(|s| s.weekday == weekday)
            .collect();

        if opts.day_cadence {
            if let Some(last_shift) = day_hours.last() {
                let shift_end = clock::instant_at_hm(date, &last_shift.end, tz);
                if start > shift_end {
                    continue;
                }
            }
        }

        // Naturally closed: no weekly hours and nothing overrides the day
        // open. Windowed scans keep these days.
        if opts.end_date.is_none() && day_hours.is_empty() && matching_overrides.is_empty() {
            continue;
        }

        if !opts.day_of_month_allow.is_empty() && !opts.weekday_allow.is_empty() {
            if opts.day_of_month_allow.contains(&local.day())
                && opts.weekday_allow.contains(&weekday)
            {
                dates.push(date);
            }
        } else {
            dates.push(date);
        }
    }

    dates
}
