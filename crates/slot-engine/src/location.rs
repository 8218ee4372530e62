//! Location inputs: fulfillment hour tables, raw API record shapes, and
//! business-hours-override normalization and fan-out.
//!
//! These are the call-boundary shapes the scheduling core consumes; the
//! records mirror the upstream API's snake_case wire format.

use std::collections::HashMap;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::hours::{DateOverride, Shift};

/// Fulfillment types for pickup, delivery, curbside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillmentType {
    Pickup,
    Delivery,
    Curbside,
}

/// Raw weekly business-hour record (`day` is `0` = Sunday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHourRecord {
    pub day: u8,
    pub start_time: String,
    pub end_time: String,
}

impl BusinessHourRecord {
    fn to_shift(&self) -> Shift {
        Shift {
            weekday: self.day,
            start: self.start_time.clone(),
            end: self.end_time.clone(),
        }
    }
}

/// Curbside hours either borrow the pickup table or carry their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurbsideHours {
    #[serde(default)]
    pub use_pickup_hours: bool,
    #[serde(default)]
    pub times: Vec<BusinessHourRecord>,
}

/// A single catering service window, substituted onto every open weekday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CateringWindow {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CateringConfig {
    #[serde(default)]
    pub enabled: bool,
    pub pickup: Option<CateringWindow>,
    pub delivery: Option<CateringWindow>,
}

/// A fulfillment location with its per-type hour tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: String,
    pub timezone: String,
    #[serde(default)]
    pub pickup_hours: Vec<BusinessHourRecord>,
    #[serde(default)]
    pub delivery_hours: Vec<BusinessHourRecord>,
    pub curbside_hours: Option<CurbsideHours>,
    pub catering: Option<CateringConfig>,
}

impl Location {
    /// Parse the location's IANA timezone.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidTimezone`] when the name is not a
    /// valid IANA timezone.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ScheduleError::InvalidTimezone(self.timezone.clone()))
    }
}

/// Select the weekly hours table for a fulfillment type.
///
/// Curbside borrows the pickup table when `use_pickup_hours` is set. In
/// catering mode the catering window's bounds replace each weekly record's
/// times (keeping the open weekdays); catering enabled with no window for
/// the fulfillment type means catering is not offered — empty table.
pub fn business_hours_for_fulfillment(
    location: &Location,
    fulfillment: FulfillmentType,
    is_catering: bool,
) -> Vec<Shift> {
    let records: &[BusinessHourRecord] = match fulfillment {
        FulfillmentType::Pickup => &location.pickup_hours,
        FulfillmentType::Delivery => &location.delivery_hours,
        FulfillmentType::Curbside => match &location.curbside_hours {
            Some(curbside) if curbside.use_pickup_hours => &location.pickup_hours,
            Some(curbside) => &curbside.times,
            None => &[],
        },
    };

    let catering_window = if is_catering && catering_enabled(location) {
        match fulfillment {
            FulfillmentType::Pickup => location.catering.as_ref().and_then(|c| c.pickup.as_ref()),
            FulfillmentType::Delivery => {
                location.catering.as_ref().and_then(|c| c.delivery.as_ref())
            }
            FulfillmentType::Curbside => None,
        }
    } else {
        None
    };

    if is_catering && catering_window.is_none() {
        return Vec::new();
    }

    records
        .iter()
        .map(|record| match catering_window {
            Some(window) => Shift {
                weekday: record.day,
                start: window.start_time.clone(),
                end: window.end_time.clone(),
            },
            None => record.to_shift(),
        })
        .collect()
}

fn catering_enabled(location: &Location) -> bool {
    location.catering.as_ref().is_some_and(|c| c.enabled)
}

/// Raw business-hours override from the API, possibly spanning locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    #[serde(default)]
    pub all_locations: bool,
    #[serde(default)]
    pub location_ids: Vec<String>,
    pub month: u32,
    pub day: u32,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default = "default_true")]
    pub is_open: bool,
}

fn default_true() -> bool {
    true
}

/// Normalize a raw override: a not-open record closes the day regardless of
/// its time bounds.
pub fn normalize_override(record: &OverrideRecord) -> DateOverride {
    DateOverride {
        month: record.month,
        day: record.day,
        start: record.is_open.then(|| record.start_time.clone()).flatten(),
        end: record.is_open.then(|| record.end_time.clone()).flatten(),
    }
}

/// Fan raw override records out to per-location override lists.
///
/// `all_locations` records reach every known location; otherwise only the
/// listed location ids that actually exist.
pub fn overrides_by_location(
    records: &[OverrideRecord],
    locations: &[Location],
) -> HashMap<String, Vec<DateOverride>> {
    let mut result: HashMap<String, Vec<DateOverride>> = HashMap::new();

    for record in records {
        let normalized = normalize_override(record);
        if record.all_locations {
            for location in locations {
                result
                    .entry(location.location_id.clone())
                    .or_default()
                    .push(normalized.clone());
            }
        } else {
            for id in &record.location_ids {
                if locations.iter().any(|loc| &loc.location_id == id) {
                    result.entry(id.clone()).or_default().push(normalized.clone());
                }
            }
        }
    }

    result
}
