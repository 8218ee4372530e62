//! Prep-time policy: behaviour and cadence enums, the threaded configuration
//! struct, and the cart-facing derivation helpers that produce one.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock;

/// Default minimum lead time before the first bookable slot.
pub const DEFAULT_PREP_TIME_IN_MINUTES: u32 = 5;
/// Default spacing between consecutive slots.
pub const DEFAULT_GAP_IN_MINUTES: u32 = 15;
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Which shift(s) of a multi-shift day absorb the prep-time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrepTimeBehaviour {
    /// Prep minutes apply only to the day's first shift.
    FirstShift,
    /// Every shift independently anchors at its own start plus prep.
    EveryShift,
    /// Prep rolls from the day's opening time, carrying across shifts.
    #[default]
    RollFromFirstShift,
}

/// Unit in which prep time is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrepTimeCadence {
    #[default]
    Minute,
    Hour,
    Day,
}

/// Prep-time policy threaded through date scanning and slot synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepTimeConfig {
    pub behaviour: PrepTimeBehaviour,
    pub cadence: PrepTimeCadence,
    /// Magnitude in `cadence` units. DAY-cadence frequency is consumed
    /// upstream by skipping scanned opening dates, not inside slot synthesis.
    pub frequency: u32,
    /// Per-weekday prep minutes, keyed `0` = Sunday through `6` = Saturday.
    pub per_weekday_minutes: HashMap<u8, u32>,
    /// Fallback for weekdays absent from `per_weekday_minutes`.
    pub default_minutes: u32,
}

impl Default for PrepTimeConfig {
    fn default() -> Self {
        PrepTimeConfig {
            behaviour: PrepTimeBehaviour::default(),
            cadence: PrepTimeCadence::default(),
            frequency: 0,
            per_weekday_minutes: HashMap::new(),
            default_minutes: DEFAULT_PREP_TIME_IN_MINUTES,
        }
    }
}

impl PrepTimeConfig {
    /// Prep minutes for a weekday, falling back to the default.
    pub fn minutes_for_weekday(&self, weekday: u8) -> u32 {
        self.per_weekday_minutes
            .get(&weekday)
            .copied()
            .unwrap_or(self.default_minutes)
    }
}

/// Per-item prep time attached to a catering cart item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPrepTime {
    pub cadence: PrepTimeCadence,
    pub frequency: u32,
}

/// Resolve cadence and frequency when a caller supplies raw minutes instead
/// of an explicit pair: a fulfil-at-day-start flag selects DAY cadence with
/// the whole-day count, otherwise MINUTE cadence with the raw minutes.
pub fn cadence_and_frequency(
    prep_time_in_minutes: u32,
    fulfill_at_business_day_start: bool,
) -> (PrepTimeCadence, u32) {
    if fulfill_at_business_day_start {
        (PrepTimeCadence::Day, prep_time_in_minutes / MINUTES_PER_DAY)
    } else {
        (PrepTimeCadence::Minute, prep_time_in_minutes)
    }
}

fn build_catering_config(
    cadence: PrepTimeCadence,
    frequency: u32,
    now: DateTime<Utc>,
    tz: Tz,
) -> PrepTimeConfig {
    let mut per_weekday_minutes = HashMap::new();
    if cadence != PrepTimeCadence::Day {
        let minutes = match cadence {
            PrepTimeCadence::Hour => frequency * 60,
            _ => frequency,
        };
        per_weekday_minutes.insert(clock::weekday_index(now, tz), minutes);
    }
    PrepTimeConfig {
        cadence,
        frequency,
        per_weekday_minutes,
        ..PrepTimeConfig::default()
    }
}

/// Aggregate per-item catering prep times into one config.
///
/// DAY cadence wins with the maximum day frequency across items; otherwise
/// HOUR cadence with the maximum hour frequency. Items without a prep time
/// are ignored; when nothing usable remains, the fallback pair applies
/// (defaulting to one hour). Non-DAY cadences pin the derived minutes onto
/// the current zoned weekday, since catering lead times count from "now".
pub fn catering_prep_config(
    items: &[Option<ItemPrepTime>],
    fallback: Option<(PrepTimeCadence, u32)>,
    now: DateTime<Utc>,
    tz: Tz,
) -> PrepTimeConfig {
    let mut day_frequencies: Vec<u32> = Vec::new();
    let mut hour_frequencies: Vec<u32> = Vec::new();

    for item in items.iter().flatten() {
        match item.cadence {
            PrepTimeCadence::Day => day_frequencies.push(item.frequency),
            PrepTimeCadence::Hour => hour_frequencies.push(item.frequency),
            PrepTimeCadence::Minute => {}
        }
    }

    if let Some(&max) = day_frequencies.iter().max() {
        return build_catering_config(PrepTimeCadence::Day, max, now, tz);
    }
    if let Some(&max) = hour_frequencies.iter().max() {
        return build_catering_config(PrepTimeCadence::Hour, max, now, tz);
    }

    let (cadence, frequency) = fallback.unwrap_or((PrepTimeCadence::Hour, 1));
    build_catering_config(cadence, frequency, now, tz)
}

/// Delivery fulfillment pads every weekday's prep minutes with the estimated
/// delivery time, so slots reflect when the order is received.
pub fn pad_for_delivery(
    per_weekday_minutes: &HashMap<u8, u32>,
    estimated_delivery_minutes: u32,
) -> HashMap<u8, u32> {
    (0..7)
        .map(|day| {
            let base = per_weekday_minutes.get(&day).copied().unwrap_or(0);
            (day, base + estimated_delivery_minutes)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::UTC;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn day_cadence_wins_with_max_frequency() {
        let items = vec![
            Some(ItemPrepTime {
                cadence: PrepTimeCadence::Hour,
                frequency: 48,
            }),
            Some(ItemPrepTime {
                cadence: PrepTimeCadence::Day,
                frequency: 2,
            }),
            Some(ItemPrepTime {
                cadence: PrepTimeCadence::Day,
                frequency: 3,
            }),
            None,
        ];
        let config = catering_prep_config(&items, None, utc("2024-01-01T00:00:00Z"), UTC);
        assert_eq!(config.cadence, PrepTimeCadence::Day);
        assert_eq!(config.frequency, 3);
        assert!(config.per_weekday_minutes.is_empty());
    }

    #[test]
    fn hour_cadence_converts_to_minutes_on_current_weekday() {
        let items = vec![Some(ItemPrepTime {
            cadence: PrepTimeCadence::Hour,
            frequency: 2,
        })];
        // 2024-01-01 is a Monday (weekday 1).
        let config = catering_prep_config(&items, None, utc("2024-01-01T00:00:00Z"), UTC);
        assert_eq!(config.cadence, PrepTimeCadence::Hour);
        assert_eq!(config.per_weekday_minutes.get(&1), Some(&120));
    }

    #[test]
    fn empty_items_use_fallback_then_default() {
        let config = catering_prep_config(
            &[],
            Some((PrepTimeCadence::Day, 2)),
            utc("2024-01-01T00:00:00Z"),
            UTC,
        );
        assert_eq!(config.cadence, PrepTimeCadence::Day);
        assert_eq!(config.frequency, 2);

        let config = catering_prep_config(&[None], None, utc("2024-01-01T00:00:00Z"), UTC);
        assert_eq!(config.cadence, PrepTimeCadence::Hour);
        assert_eq!(config.frequency, 1);
    }

    #[test]
    fn cadence_fallback_from_raw_minutes() {
        assert_eq!(
            cadence_and_frequency(2880, true),
            (PrepTimeCadence::Day, 2)
        );
        assert_eq!(
            cadence_and_frequency(45, false),
            (PrepTimeCadence::Minute, 45)
        );
    }

    #[test]
    fn delivery_padding_covers_all_weekdays() {
        let mut base = HashMap::new();
        base.insert(1u8, 10u32);
        let padded = pad_for_delivery(&base, 30);
        assert_eq!(padded.len(), 7);
        assert_eq!(padded.get(&1), Some(&40));
        assert_eq!(padded.get(&0), Some(&30));
    }
}
