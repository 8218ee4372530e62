//! # slot-engine
//!
//! Deterministic fulfillment slot scheduling for pickup, delivery, and
//! curbside orders.
//!
//! Given recurring weekly business hours, date-specific overrides, a
//! prep-time policy, and a target IANA time zone, the engine computes the
//! set of bookable time slots across a rolling date window — correct across
//! daylight-saving transitions, multi-shift days, overnight shifts, and
//! "today" partial-availability cutoffs.
//!
//! Every operation is a pure function over its inputs plus an explicitly
//! passed "now" reference; nothing reads the system clock, touches the
//! network or disk, or persists between calls.
//!
//! ## Modules
//!
//! - [`clock`] — Zoned wall-clock arithmetic (instant ↔ calendar fields)
//! - [`hours`] — Weekly shifts, date overrides, per-date hours resolution
//! - [`scan`] — Forward scanning for the next open calendar dates
//! - [`prep`] — Prep-time behaviour/cadence policy and derivation helpers
//! - [`synth`] — Prep-time slot synthesis state machine
//! - [`pipeline`] — Composable schedule and shift transforms
//! - [`location`] — Location hour tables and override normalization
//! - [`schedule`] — Orchestration and opening/closing-time lookup
//! - [`error`] — Error types

pub mod clock;
pub mod error;
pub mod hours;
pub mod location;
pub mod pipeline;
pub mod prep;
pub mod scan;
pub mod schedule;
pub mod synth;

pub use error::ScheduleError;
pub use hours::{resolve_hours_for_date, DateOverride, ResolvedShift, Shift, TemporaryShift};
pub use location::{
    business_hours_for_fulfillment, overrides_by_location, BusinessHourRecord, FulfillmentType,
    Location, OverrideRecord,
};
pub use pipeline::{
    apply_prep_time, apply_transforms, filter_busy_times, filter_by_weekday, filter_past, pipe,
    restrict_dates, BusyWindow, RestrictedDate, RestrictedDateSpec, ScheduleContext,
    ScheduleTransform, ShiftContext, ShiftTransform,
};
pub use prep::{
    cadence_and_frequency, catering_prep_config, pad_for_delivery, ItemPrepTime, PrepTimeBehaviour,
    PrepTimeCadence, PrepTimeConfig, DEFAULT_GAP_IN_MINUTES, DEFAULT_PREP_TIME_IN_MINUTES,
};
pub use scan::{next_available_dates, ScanOptions, MAX_SCAN_CANDIDATE_DAYS};
pub use schedule::{
    generate_fulfillment_schedule, opening_closing_time, opening_closing_time_on_date,
    pre_sale_pickup_dates, OpeningClosing, PreSaleOptions, ScheduleRequest,
};
pub use synth::{synthesize_schedule, DaySchedule, Schedule};
