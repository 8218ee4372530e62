//! Orchestration: wires the location hours selector, the date scanner, and
//! the slot synthesizer into one call, plus the opening/closing-time lookup
//! built on the same scan.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::clock;
use crate::error::Result;
use crate::hours::{self, DateOverride, Shift, TemporaryShift};
use crate::location::{business_hours_for_fulfillment, FulfillmentType, Location};
use crate::prep::{PrepTimeCadence, PrepTimeConfig, DEFAULT_GAP_IN_MINUTES};
use crate::scan::{next_available_dates, ScanOptions};
use crate::synth::{synthesize_schedule, Schedule};

/// Pre-sale scheduling options: a bounded calendar window, the pickup
/// day/weekday pair, and an optional hours override replacing store hours.
#[derive(Debug, Clone, Default)]
pub struct PreSaleOptions {
    pub end_date: Option<DateTime<Utc>>,
    pub day_of_month: Vec<u32>,
    pub pickup_weekdays: Vec<u8>,
    pub hours_override: Option<Vec<TemporaryShift>>,
}

/// Parameters for [`generate_fulfillment_schedule`].
#[derive(Debug, Clone)]
pub struct ScheduleRequest<'a> {
    pub location: &'a Location,
    pub fulfillment: FulfillmentType,
    /// Injected reference instant; never read from the wall clock.
    pub now: DateTime<Utc>,
    /// Scan anchor; defaults to `now`.
    pub start_date: Option<DateTime<Utc>>,
    pub prep: &'a PrepTimeConfig,
    pub overrides: &'a [DateOverride],
    /// Slot spacing; defaults to [`DEFAULT_GAP_IN_MINUTES`].
    pub gap_minutes: Option<u32>,
    pub days_count: usize,
    pub is_catering: bool,
    pub pre_sale: Option<&'a PreSaleOptions>,
}

/// Generate the bookable schedule for a location and fulfillment type.
///
/// Selects the fulfillment hours table, scans forward for open dates, then
/// synthesizes slots. DAY-cadence prep is applied here by dropping the first
/// `frequency` scanned dates rather than inside slot synthesis.
///
/// # Errors
///
/// Returns [`crate::ScheduleError::InvalidTimezone`] when the location's
/// timezone is not a valid IANA name.
pub fn generate_fulfillment_schedule(request: &ScheduleRequest<'_>) -> Result<Schedule> {
    let tz = request.location.tz()?;
    let weekly_hours =
        business_hours_for_fulfillment(request.location, request.fulfillment, request.is_catering);
    let day_cadence = request.prep.cadence == PrepTimeCadence::Day;

    let scan_opts = ScanOptions {
        count: request.days_count,
        end_date: request.pre_sale.and_then(|p| p.end_date),
        day_of_month_allow: request
            .pre_sale
            .map(|p| p.day_of_month.clone())
            .unwrap_or_default(),
        weekday_allow: request
            .pre_sale
            .map(|p| p.pickup_weekdays.clone())
            .unwrap_or_default(),
        day_cadence,
        ..ScanOptions::default()
    };

    let dates = next_available_dates(
        request.start_date.unwrap_or(request.now),
        tz,
        &weekly_hours,
        request.overrides,
        &scan_opts,
    );

    // Multi-day prep consumes whole opening dates from the front.
    let dates = if day_cadence {
        let skip = (request.prep.frequency as usize).min(dates.len());
        &dates[skip..]
    } else {
        &dates[..]
    };

    let temp_override = request
        .pre_sale
        .and_then(|p| p.hours_override.as_deref());

    Ok(synthesize_schedule(
        clock::round_to_minute(request.now),
        dates,
        tz,
        &weekly_hours,
        request.overrides,
        request.prep,
        request.gap_minutes.unwrap_or(DEFAULT_GAP_IN_MINUTES),
        temp_override,
    ))
}

/// A store's effective opening and closing instants around a query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpeningClosing {
    pub opening_time: DateTime<Utc>,
    pub closing_time: DateTime<Utc>,
}

/// Absolute open windows of one date, overnight ends anchored to the next
/// day, degenerate windows dropped, ascending by start.
fn day_windows(
    date: DateTime<Utc>,
    tz: Tz,
    weekly_hours: &[Shift],
    overrides: &[DateOverride],
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut windows: Vec<(DateTime<Utc>, DateTime<Utc>)> =
        hours::resolve_hours_for_date(date, tz, weekly_hours, overrides, None)
            .iter()
            .filter_map(|shift| {
                let start = clock::instant_at_hm(date, &shift.start, tz);
                let end_date = if shift.overnight {
                    clock::add_days(date, 1, tz)
                } else {
                    date
                };
                let end = clock::instant_at_hm(end_date, &shift.end, tz);
                (start < end).then_some((start, end))
            })
            .collect();
    windows.sort_by_key(|w| w.0);
    windows
}

/// Opening and closing times in effect at (or next after) `date`.
///
/// Scans up to seven upcoming open dates, picks the first window still
/// closing after the query instant, and extends today's close across a
/// 23:59 → 00:00 midnight continuation into the following open day. Returns
/// `None` when nothing answers — callers must treat that as "no answer", not
/// as a specific fault.
pub fn opening_closing_time_on_date(
    date: DateTime<Utc>,
    weekly_hours: &[Shift],
    overrides: &[DateOverride],
    tz: Tz,
) -> Option<OpeningClosing> {
    let open_dates = next_available_dates(
        date,
        tz,
        weekly_hours,
        overrides,
        &ScanOptions {
            count: 7,
            ..ScanOptions::default()
        },
    );

    for (index, &open_date) in open_dates.iter().enumerate() {
        let windows = day_windows(open_date, tz, weekly_hours, overrides);
        let Some(&first) = windows.first() else {
            continue;
        };

        let mut current = windows
            .iter()
            .copied()
            .find(|&(_, end)| date < end)
            .unwrap_or(first);

        if current.1 < date {
            continue;
        }

        // A shift running to 23:59 that resumes at 00:00 the next open day
        // is one continuous window from the caller's perspective.
        if clock::is_same_day(open_date, date, tz) {
            if let Some(&next_date) = open_dates.get(index + 1) {
                if let Some(&(next_start, next_end)) =
                    day_windows(next_date, tz, weekly_hours, overrides).first()
                {
                    if clock::is_midnight_transition(current.1, next_start, tz) {
                        current.1 = next_end;
                    }
                }
            }
        }

        return Some(OpeningClosing {
            opening_time: current.0,
            closing_time: current.1,
        });
    }

    None
}

/// Location-level opening/closing lookup for a fulfillment type.
///
/// An unknown timezone or an all-closed calendar both answer `None`.
pub fn opening_closing_time(
    location: &Location,
    fulfillment: FulfillmentType,
    overrides_by_location: &HashMap<String, Vec<DateOverride>>,
    now: DateTime<Utc>,
) -> Option<OpeningClosing> {
    let tz = location.tz().ok()?;
    let weekly_hours = business_hours_for_fulfillment(location, fulfillment, false);
    let overrides = overrides_by_location
        .get(&location.location_id)
        .map(Vec::as_slice)
        .unwrap_or_default();
    opening_closing_time_on_date(now, &weekly_hours, overrides, tz)
}

/// Upcoming weekly pre-sale pickup dates, as zone-local midnights ascending.
///
/// Empty when today is already a pickup day, or when ordering is not open
/// today; otherwise the next occurrence of each pickup weekday.
pub fn pre_sale_pickup_dates(
    pickup_weekdays: &[u8],
    ordering_weekdays: &[u8],
    now: DateTime<Utc>,
    tz: Tz,
) -> Vec<DateTime<Utc>> {
    let today = clock::weekday_index(now, tz);

    if pickup_weekdays.contains(&today) || !ordering_weekdays.contains(&today) {
        return Vec::new();
    }

    let mut dates: Vec<DateTime<Utc>> = pickup_weekdays
        .iter()
        .map(|&target| {
            let days_until = (i64::from(target) - i64::from(today)).rem_euclid(7);
            clock::add_days(now, days_until, tz)
        })
        .collect();
    dates.sort_unstable();
    dates
}
