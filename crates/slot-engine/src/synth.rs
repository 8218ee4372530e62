//! Prep-time slot synthesis.
//!
//! Expands each scanned date's resolved shifts into concrete slot instants,
//! honoring the gap cadence, the prep-time behaviour, "today" cutoffs, and
//! the minute-cadence carry-over floor that propagates prep time from a
//! shift that could not absorb it into the next shift or date.

use std::cmp::max;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::clock;
use crate::hours::{self, DateOverride, ResolvedShift, Shift, TemporaryShift};
use crate::prep::{PrepTimeBehaviour, PrepTimeCadence, PrepTimeConfig};

/// One day's bookable slots.
///
/// `day_opening_time`/`day_closing_time` reflect the unfiltered shift union
/// (store hours), so callers can distinguish "the store is open" from "slots
/// remain bookable"; `slots` has already been trimmed to instants not earlier
/// than the synthesis "now".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySchedule {
    pub date: DateTime<Utc>,
    pub day_opening_time: Option<DateTime<Utc>>,
    pub day_closing_time: Option<DateTime<Utc>>,
    pub first_available_slot: Option<DateTime<Utc>>,
    pub slots: Vec<DateTime<Utc>>,
}

/// Ordered-by-date sequence of non-empty [`DaySchedule`]s.
pub type Schedule = Vec<DaySchedule>;

/// Fixed-interval grid over `[start, end]`, both endpoints included.
fn slot_grid(start: DateTime<Utc>, end: DateTime<Utc>, gap_minutes: u32) -> Vec<DateTime<Utc>> {
    let step = Duration::minutes(max(gap_minutes, 1) as i64);
    let mut slots = Vec::new();
    let mut t = start;
    while t <= end {
        slots.push(t);
        t += step;
    }
    slots
}

/// Whether `shift` opens at 00:00 right after the previous date's hours ran
/// to end-of-day, making it a seamless continuation for prep accounting.
fn continues_from_midnight(prev_shifts: &[ResolvedShift], shift: &ResolvedShift) -> bool {
    if prev_shifts.is_empty() || shift.start != "00:00" {
        return false;
    }
    let prev_weekday = (shift.weekday + 6) % 7;
    prev_shifts
        .iter()
        .any(|s| s.weekday == prev_weekday && (s.end == "24:00" || s.end == "23:59"))
}

/// Expand `dates` into a materialized [`Schedule`].
///
/// Each date's shifts are re-resolved via [`hours::resolve_hours_for_date`]
/// (the previous date's shifts too, for the midnight-continuity rule). Days
/// left without slots after the trailing "now" trim are dropped entirely.
#[allow(clippy::too_many_arguments)]
pub fn synthesize_schedule(
    now: DateTime<Utc>,
    dates: &[DateTime<Utc>],
    tz: Tz,
    weekly_hours: &[Shift],
    overrides: &[DateOverride],
    prep: &PrepTimeConfig,
    gap_minutes: u32,
    temp_override: Option<&[TemporaryShift]>,
) -> Schedule {
    let minute_cadence = prep.cadence == PrepTimeCadence::Minute;
    // Prep-anchored instant a shift failed to absorb; consumed by the next
    // shift or date under minute cadence.
    let mut carried_floor: Option<DateTime<Utc>> = None;

    let mut schedule = Vec::new();

    for (index, &date) in dates.iter().enumerate() {
        let shifts = hours::resolve_hours_for_date(date, tz, weekly_hours, overrides, temp_override);
        let prev_shifts = match index.checked_sub(1) {
            Some(i) => {
                hours::resolve_hours_for_date(dates[i], tz, weekly_hours, overrides, temp_override)
            }
            None => Vec::new(),
        };

        let weekday = clock::weekday_index(date, tz);
        let prep_minutes = Duration::minutes(prep.minutes_for_weekday(weekday) as i64);
        let today = clock::is_same_day(date, now, tz);
        let last_index = shifts.len().saturating_sub(1);

        let mut day_opening: Option<DateTime<Utc>> = None;
        let mut day_closing: Option<DateTime<Utc>> = None;
        let mut prev_shift_was_continuation = false;
        let mut slots: Vec<DateTime<Utc>> = Vec::new();

        for (i, shift) in shifts.iter().enumerate() {
            let raw_start = clock::instant_at_hm(date, &shift.start, tz);
            let shift_start = match carried_floor {
                Some(floor) if minute_cadence => max(floor, raw_start),
                _ => raw_start,
            };
            let end_date = if shift.overnight {
                clock::add_days(date, 1, tz)
            } else {
                date
            };
            let shift_end = clock::instant_at_hm(end_date, &shift.end, tz);

            if i == 0 {
                day_opening = Some(shift_start);
            }
            if i == last_index {
                day_closing = Some(shift_end);
            }

            // Degenerate shift: the carried floor (or bad bounds) consumed it
            // entirely.
            if shift_start >= shift_end {
                if minute_cadence {
                    carried_floor = None;
                }
                continue;
            }

            let grid = slot_grid(shift_start, shift_end, gap_minutes);

            if today {
                let opening = day_opening.unwrap_or(shift_start);
                let cutoff = max(now, opening)
                    + max(
                        Duration::minutes(prep.default_minutes as i64),
                        prep_minutes,
                    );

                if cutoff > shift_end {
                    if minute_cadence {
                        carried_floor = Some(cutoff);
                    }
                    continue;
                }

                if cutoff < shift_start {
                    if prep.behaviour == PrepTimeBehaviour::EveryShift {
                        let anchor = shift_start + prep_minutes;
                        if anchor > shift_end {
                            continue;
                        }
                        slots.push(anchor);
                        slots.extend(grid.into_iter().filter(|&d| d > anchor));
                    } else {
                        slots.extend(grid);
                    }
                    continue;
                }

                slots.push(cutoff);
                slots.extend(grid.into_iter().filter(|&d| d > cutoff));
                continue;
            }

            // Future date.
            if prep.behaviour == PrepTimeBehaviour::FirstShift && i != 0 {
                slots.extend(grid);
                continue;
            }

            let zero_prep = continues_from_midnight(&prev_shifts, shift);
            let base = if prep.behaviour == PrepTimeBehaviour::RollFromFirstShift
                && !prev_shift_was_continuation
            {
                day_opening.unwrap_or(shift_start)
            } else {
                shift_start
            };
            let anchor = base + if zero_prep { Duration::zero() } else { prep_minutes };
            prev_shift_was_continuation = zero_prep;

            if anchor > shift_end {
                if minute_cadence {
                    carried_floor = Some(anchor);
                }
                continue;
            }

            if anchor < shift_start {
                slots.extend(grid);
                continue;
            }

            slots.push(anchor);
            slots.extend(grid.into_iter().filter(|&d| d > anchor));
            carried_floor = None;
        }

        slots.sort_unstable();
        slots.dedup();
        let available: Vec<DateTime<Utc>> = slots.into_iter().filter(|&s| s >= now).collect();
        if available.is_empty() {
            continue;
        }

        schedule.push(DaySchedule {
            date,
            day_opening_time: day_opening,
            day_closing_time: day_closing,
            first_available_slot: available.first().copied(),
            slots: available,
        });
    }

    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;
    use std::collections::HashMap;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn shift(weekday: u8, start: &str, end: &str) -> Shift {
        Shift {
            weekday,
            start: start.into(),
            end: end.into(),
        }
    }

    fn every_day(start: &str, end: &str) -> Vec<Shift> {
        (0..7).map(|d| shift(d, start, end)).collect()
    }

    #[test]
    fn grid_includes_both_endpoints() {
        let grid = slot_grid(utc("2024-01-01T08:00:00Z"), utc("2024-01-01T20:00:00Z"), 60);
        assert_eq!(grid.len(), 13);
        assert_eq!(grid[0], utc("2024-01-01T08:00:00Z"));
        assert_eq!(grid[12], utc("2024-01-01T20:00:00Z"));
    }

    #[test]
    fn today_cutoff_becomes_first_slot() {
        let weekly = every_day("08:00", "20:00");
        let prep = PrepTimeConfig {
            per_weekday_minutes: HashMap::from([(1u8, 30u32)]),
            ..PrepTimeConfig::default()
        };
        // Monday 2024-01-01, now 10:00 inside the shift.
        let schedule = synthesize_schedule(
            utc("2024-01-01T10:00:00Z"),
            &[utc("2024-01-01T00:00:00Z")],
            UTC,
            &weekly,
            &[],
            &prep,
            60,
            None,
        );
        assert_eq!(schedule.len(), 1);
        // cutoff = max(now, opening) + max(5, 30) = 10:30
        assert_eq!(schedule[0].slots[0], utc("2024-01-01T10:30:00Z"));
        assert_eq!(schedule[0].slots[1], utc("2024-01-01T11:00:00Z"));
        assert_eq!(
            schedule[0].first_available_slot,
            Some(utc("2024-01-01T10:30:00Z"))
        );
    }

    #[test]
    fn today_past_close_yields_no_day() {
        let weekly = every_day("08:00", "20:00");
        let schedule = synthesize_schedule(
            utc("2024-01-01T20:30:00Z"),
            &[utc("2024-01-01T00:00:00Z")],
            UTC,
            &weekly,
            &[],
            &PrepTimeConfig::default(),
            60,
            None,
        );
        assert!(schedule.is_empty());
    }

    #[test]
    fn minute_cadence_carries_floor_into_next_shift() {
        // Two shifts; prep pushes past the first shift's close, so the floor
        // carries into the second.
        let weekly = vec![shift(1, "08:00", "09:00"), shift(1, "09:30", "20:00")];
        let prep = PrepTimeConfig {
            cadence: PrepTimeCadence::Minute,
            per_weekday_minutes: HashMap::from([(1u8, 90u32)]),
            ..PrepTimeConfig::default()
        };
        let schedule = synthesize_schedule(
            utc("2024-01-01T08:00:00Z"),
            &[utc("2024-01-01T00:00:00Z")],
            UTC,
            &weekly,
            &[],
            &prep,
            30,
            None,
        );
        assert_eq!(schedule.len(), 1);
        // First shift: cutoff 08:00 + 90m = 09:30 > 09:00 close, floor carries.
        // Second shift: effective start max(09:30, 09:30), today cutoff
        // max(now, opening=08:00) + 90m = 09:30, within shift.
        assert_eq!(schedule[0].slots[0], utc("2024-01-01T09:30:00Z"));
    }

    #[test]
    fn first_shift_behaviour_leaves_later_shifts_unpadded() {
        let weekly = vec![shift(2, "08:00", "10:00"), shift(2, "14:00", "16:00")];
        let prep = PrepTimeConfig {
            behaviour: PrepTimeBehaviour::FirstShift,
            per_weekday_minutes: HashMap::from([(2u8, 60u32)]),
            ..PrepTimeConfig::default()
        };
        // Future date (Tuesday 2024-01-02), now the day before.
        let schedule = synthesize_schedule(
            utc("2024-01-01T12:00:00Z"),
            &[utc("2024-01-02T00:00:00Z")],
            UTC,
            &weekly,
            &[],
            &prep,
            60,
            None,
        );
        let slots = &schedule[0].slots;
        // First shift anchored at 09:00; second shift full grid from 14:00.
        assert_eq!(slots[0], utc("2024-01-02T09:00:00Z"));
        assert!(slots.contains(&utc("2024-01-02T14:00:00Z")));
    }

    #[test]
    fn every_shift_behaviour_anchors_each_shift() {
        let weekly = vec![shift(2, "08:00", "10:00"), shift(2, "14:00", "16:00")];
        let prep = PrepTimeConfig {
            behaviour: PrepTimeBehaviour::EveryShift,
            per_weekday_minutes: HashMap::from([(2u8, 30u32)]),
            ..PrepTimeConfig::default()
        };
        let schedule = synthesize_schedule(
            utc("2024-01-01T12:00:00Z"),
            &[utc("2024-01-02T00:00:00Z")],
            UTC,
            &weekly,
            &[],
            &prep,
            60,
            None,
        );
        let slots = &schedule[0].slots;
        assert!(slots.contains(&utc("2024-01-02T08:30:00Z")));
        assert!(slots.contains(&utc("2024-01-02T14:30:00Z")));
        assert!(!slots.contains(&utc("2024-01-02T08:00:00Z")));
        assert!(!slots.contains(&utc("2024-01-02T14:00:00Z")));
    }

    #[test]
    fn overnight_shift_closes_next_day() {
        let weekly = vec![shift(2, "22:00", "02:00")];
        let schedule = synthesize_schedule(
            utc("2024-01-01T12:00:00Z"),
            &[utc("2024-01-02T00:00:00Z")],
            UTC,
            &weekly,
            &[],
            &PrepTimeConfig::default(),
            60,
            None,
        );
        assert_eq!(schedule.len(), 1);
        let slots = &schedule[0].slots;
        assert!(slots.contains(&utc("2024-01-03T02:00:00Z")));
        assert_eq!(
            schedule[0].day_closing_time,
            Some(utc("2024-01-03T02:00:00Z"))
        );
    }

    #[test]
    fn store_hours_survive_the_now_trim() {
        let weekly = every_day("08:00", "20:00");
        let schedule = synthesize_schedule(
            utc("2024-01-01T15:00:00Z"),
            &[utc("2024-01-01T00:00:00Z")],
            UTC,
            &weekly,
            &[],
            &PrepTimeConfig::default(),
            60,
            None,
        );
        assert_eq!(
            schedule[0].day_opening_time,
            Some(utc("2024-01-01T08:00:00Z"))
        );
        assert_eq!(
            schedule[0].day_closing_time,
            Some(utc("2024-01-01T20:00:00Z"))
        );
        assert!(schedule[0].slots.iter().all(|&s| s >= utc("2024-01-01T15:00:00Z")));
    }
}
