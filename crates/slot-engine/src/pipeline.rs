//! Composable schedule transforms.
//!
//! Each transform is a pure filter over a materialized [`Schedule`]: it
//! preserves ascending slot order, drops any day left empty, and never
//! touches the store-hours fields. Composition is left-to-right function
//! application via [`pipe`] or [`apply_transforms`]; every transform is
//! idempotent, so re-running a filtered schedule through the same chain is a
//! no-op.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::synth::{DaySchedule, Schedule};

/// Context shared by every schedule-level transform.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleContext {
    pub tz: Tz,
    pub now: DateTime<Utc>,
}

/// A pure schedule filter, applied left to right.
pub type ScheduleTransform = Box<dyn Fn(Schedule, &ScheduleContext) -> Schedule>;

/// Context for a single shift's slot list.
#[derive(Debug, Clone, Copy)]
pub struct ShiftContext {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

/// A transform over one shift's slots, usable to rebuild the synthesizer's
/// anchor logic compositionally in custom pipelines.
pub type ShiftTransform = Box<dyn Fn(Vec<DateTime<Utc>>, &ShiftContext) -> Vec<DateTime<Utc>>>;

/// Apply transforms in order.
pub fn apply_transforms(
    schedule: Schedule,
    ctx: &ScheduleContext,
    transforms: &[ScheduleTransform],
) -> Schedule {
    transforms
        .iter()
        .fold(schedule, |acc, transform| transform(acc, ctx))
}

/// Fuse a list of transforms into one.
pub fn pipe(transforms: Vec<ScheduleTransform>) -> ScheduleTransform {
    Box::new(move |schedule, ctx| apply_transforms(schedule, ctx, &transforms))
}

/// Trim a day's slot list in place and recompute its first available slot.
fn retain_slots(day: DaySchedule, keep: impl Fn(DateTime<Utc>) -> bool) -> DaySchedule {
    let slots: Vec<DateTime<Utc>> = day.slots.into_iter().filter(|&s| keep(s)).collect();
    DaySchedule {
        first_available_slot: slots.first().copied(),
        slots,
        ..day
    }
}

/// Keep only days whose zoned weekday (`0` = Sunday) is in the allow-set.
pub fn filter_by_weekday(allowed_days: Vec<u8>) -> ScheduleTransform {
    let allowed: HashSet<u8> = allowed_days.into_iter().collect();
    Box::new(move |schedule, ctx| {
        schedule
            .into_iter()
            .filter(|day| allowed.contains(&clock::weekday_index(day.date, ctx.tz)))
            .collect()
    })
}

/// A (month, day) pair naming an excluded calendar date, annually recurring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictedDate {
    pub month: u32,
    pub day: u32,
}

/// A restricted-date input: either a pre-normalized (month, day) pair or a
/// literal instant, read in the pipeline's zone.
#[derive(Debug, Clone, Copy)]
pub enum RestrictedDateSpec {
    MonthDay(RestrictedDate),
    Instant(DateTime<Utc>),
}

impl From<RestrictedDate> for RestrictedDateSpec {
    fn from(value: RestrictedDate) -> Self {
        RestrictedDateSpec::MonthDay(value)
    }
}

impl From<DateTime<Utc>> for RestrictedDateSpec {
    fn from(value: DateTime<Utc>) -> Self {
        RestrictedDateSpec::Instant(value)
    }
}

/// Drop entire days matching any restricted date.
pub fn restrict_dates(dates: Vec<RestrictedDateSpec>) -> ScheduleTransform {
    Box::new(move |schedule, ctx| {
        let restricted: Vec<RestrictedDate> = dates
            .iter()
            .map(|spec| match *spec {
                RestrictedDateSpec::MonthDay(md) => md,
                RestrictedDateSpec::Instant(instant) => {
                    let local = instant.with_timezone(&ctx.tz);
                    RestrictedDate {
                        month: local.month(),
                        day: local.day(),
                    }
                }
            })
            .collect();

        schedule
            .into_iter()
            .filter(|day| {
                let local = day.date.with_timezone(&ctx.tz);
                !restricted
                    .iter()
                    .any(|r| r.month == local.month() && r.day == local.day())
            })
            .collect()
    })
}

/// A busy interval during which no slot is bookable.
///
/// A window scoped to category ids applies only when the caller's active
/// category ids intersect it; a window with no ids applies unconditionally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub category_ids: Vec<String>,
}

/// Slots falling in `(start, end]` of a busy window are removed.
fn in_window(slot: DateTime<Utc>, window: &BusyWindow) -> bool {
    slot > window.start && slot <= window.end
}

/// Remove slots claimed by applicable busy windows; the schedule passes
/// through unchanged when no window applies.
pub fn filter_busy_times(
    busy_times: Vec<BusyWindow>,
    cart_category_ids: Vec<String>,
) -> ScheduleTransform {
    Box::new(move |schedule, _ctx| {
        if busy_times.is_empty() {
            return schedule;
        }

        let cart_ids: HashSet<&str> = cart_category_ids
            .iter()
            .filter(|id| !id.is_empty())
            .map(String::as_str)
            .collect();

        let applicable: Vec<&BusyWindow> = busy_times
            .iter()
            .filter(|window| {
                window.category_ids.is_empty()
                    || window
                        .category_ids
                        .iter()
                        .any(|id| cart_ids.contains(id.as_str()))
            })
            .collect();

        if applicable.is_empty() {
            return schedule;
        }

        schedule
            .into_iter()
            .map(|day| {
                retain_slots(day, |slot| !applicable.iter().any(|w| in_window(slot, w)))
            })
            .filter(|day| !day.slots.is_empty())
            .collect()
    })
}

/// Remove slots earlier than `cutoff` (defaulting to the pipeline's "now").
pub fn filter_past(cutoff: Option<DateTime<Utc>>) -> ScheduleTransform {
    Box::new(move |schedule, ctx| {
        let threshold = cutoff.unwrap_or(ctx.now);
        schedule
            .into_iter()
            .map(|day| retain_slots(day, |slot| slot >= threshold))
            .filter(|day| !day.slots.is_empty())
            .collect()
    })
}

/// Shift-level prep-time transform: offsets the first bookable slot of one
/// shift by `minutes`.
///
/// For a shift already underway (`now` past its start) the cutoff counts
/// from `now`; otherwise from the shift start. A cutoff past the shift end
/// empties the shift. The cutoff itself becomes the first slot when the
/// remaining grid does not already begin there.
pub fn apply_prep_time(minutes: u32) -> ShiftTransform {
    Box::new(move |slots, ctx| {
        if slots.is_empty() || minutes == 0 {
            return slots;
        }

        let base = if ctx.now > ctx.start { ctx.now } else { ctx.start };
        let cutoff = base + chrono::Duration::minutes(minutes as i64);

        if cutoff > ctx.end {
            return Vec::new();
        }

        let mut filtered: Vec<DateTime<Utc>> =
            slots.into_iter().filter(|&s| s >= cutoff).collect();
        if filtered.is_empty() {
            return filtered;
        }
        if filtered[0] != cutoff {
            filtered.insert(0, cutoff);
        }
        filtered
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn day(date: &str, slots: &[&str]) -> DaySchedule {
        let slots: Vec<DateTime<Utc>> = slots.iter().map(|s| utc(s)).collect();
        DaySchedule {
            date: utc(date),
            day_opening_time: slots.first().copied(),
            day_closing_time: slots.last().copied(),
            first_available_slot: slots.first().copied(),
            slots,
        }
    }

    fn ctx() -> ScheduleContext {
        ScheduleContext {
            tz: UTC,
            now: utc("2024-01-01T00:00:00Z"),
        }
    }

    #[test]
    fn weekday_filter_keeps_allowed_days() {
        // Jan 1 2024 is a Monday (1), Jan 2 a Tuesday (2).
        let schedule = vec![
            day("2024-01-01T00:00:00Z", &["2024-01-01T10:00:00Z"]),
            day("2024-01-02T00:00:00Z", &["2024-01-02T10:00:00Z"]),
        ];
        let filtered = filter_by_weekday(vec![2])(schedule, &ctx());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].date, utc("2024-01-02T00:00:00Z"));
    }

    #[test]
    fn restricted_dates_drop_whole_days() {
        let schedule = vec![
            day("2024-01-01T00:00:00Z", &["2024-01-01T10:00:00Z"]),
            day("2024-01-02T00:00:00Z", &["2024-01-02T10:00:00Z"]),
        ];
        let transform = restrict_dates(vec![
            RestrictedDate { month: 1, day: 1 }.into(),
        ]);
        let filtered = transform(schedule, &ctx());
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].date, utc("2024-01-02T00:00:00Z"));
    }

    #[test]
    fn busy_window_boundaries_are_half_open() {
        let schedule = vec![day(
            "2024-01-01T00:00:00Z",
            &[
                "2024-01-01T10:00:00Z",
                "2024-01-01T11:00:00Z",
                "2024-01-01T12:00:00Z",
            ],
        )];
        let transform = filter_busy_times(
            vec![BusyWindow {
                start: utc("2024-01-01T10:00:00Z"),
                end: utc("2024-01-01T11:00:00Z"),
                category_ids: Vec::new(),
            }],
            Vec::new(),
        );
        let filtered = transform(schedule, &ctx());
        // (start, end]: 10:00 survives, 11:00 removed.
        assert_eq!(
            filtered[0].slots,
            vec![utc("2024-01-01T10:00:00Z"), utc("2024-01-01T12:00:00Z")]
        );
        assert_eq!(
            filtered[0].first_available_slot,
            Some(utc("2024-01-01T10:00:00Z"))
        );
    }

    #[test]
    fn category_scoped_window_needs_intersection() {
        let schedule = vec![day("2024-01-01T00:00:00Z", &["2024-01-01T10:30:00Z"])];
        let window = BusyWindow {
            start: utc("2024-01-01T10:00:00Z"),
            end: utc("2024-01-01T11:00:00Z"),
            category_ids: vec!["catering".into()],
        };

        let miss = filter_busy_times(vec![window.clone()], vec!["retail".into()]);
        assert_eq!(miss(schedule.clone(), &ctx()).len(), 1);

        let hit = filter_busy_times(vec![window], vec!["catering".into()]);
        assert!(hit(schedule, &ctx()).is_empty());
    }

    #[test]
    fn past_filter_defaults_to_now_and_drops_empty_days() {
        let schedule = vec![
            day("2024-01-01T00:00:00Z", &["2024-01-01T10:00:00Z"]),
            day("2024-01-02T00:00:00Z", &["2024-01-02T10:00:00Z"]),
        ];
        let context = ScheduleContext {
            tz: UTC,
            now: utc("2024-01-01T12:00:00Z"),
        };
        let filtered = filter_past(None)(schedule, &context);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].date, utc("2024-01-02T00:00:00Z"));
    }

    #[test]
    fn pipeline_composition_is_idempotent() {
        let schedule = vec![
            day("2024-01-01T00:00:00Z", &["2024-01-01T10:00:00Z"]),
            day("2024-01-02T00:00:00Z", &["2024-01-02T10:00:00Z"]),
        ];
        let chain = pipe(vec![
            filter_by_weekday(vec![1, 2]),
            filter_past(Some(utc("2024-01-01T09:00:00Z"))),
        ]);
        let once = chain(schedule, &ctx());
        let twice = chain(once.clone(), &ctx());
        assert_eq!(once, twice);
    }

    #[test]
    fn prep_transform_inserts_cutoff_as_first_slot() {
        let slots = vec![
            utc("2024-01-01T10:00:00Z"),
            utc("2024-01-01T11:00:00Z"),
            utc("2024-01-01T12:00:00Z"),
        ];
        let shift_ctx = ShiftContext {
            start: utc("2024-01-01T10:00:00Z"),
            end: utc("2024-01-01T12:00:00Z"),
            now: utc("2024-01-01T09:00:00Z"),
        };
        let transformed = apply_prep_time(30)(slots, &shift_ctx);
        assert_eq!(transformed[0], utc("2024-01-01T10:30:00Z"));
        assert_eq!(transformed[1], utc("2024-01-01T11:00:00Z"));
    }

    #[test]
    fn prep_transform_past_end_empties_shift() {
        let slots = vec![utc("2024-01-01T10:00:00Z")];
        let shift_ctx = ShiftContext {
            start: utc("2024-01-01T10:00:00Z"),
            end: utc("2024-01-01T12:00:00Z"),
            now: utc("2024-01-01T11:50:00Z"),
        };
        assert!(apply_prep_time(30)(slots, &shift_ctx).is_empty());
    }
}
