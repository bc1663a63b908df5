//! Wrapping 24-hour day clock
//!
//! The day factor is a pure function of the hour; nothing caches it.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Brightness proxy in [0, 1] for a given hour
///
/// Night before dawn and after dusk, linear ramps across dawn and dusk.
pub fn day_factor(hour: f32) -> f32 {
    let factor = if hour < DAWN_START {
        0.0
    } else if hour < DAWN_END {
        (hour - DAWN_START) / (DAWN_END - DAWN_START)
    } else if hour < DUSK_START {
        1.0
    } else if hour < DUSK_END {
        1.0 - (hour - DUSK_START) / (DUSK_END - DUSK_START)
    } else {
        0.0
    };
    factor.clamp(0.0, 1.0)
}

/// Wrap an hour into [0, 24)
#[inline]
pub fn wrap_hour(hour: f32) -> f32 {
    let wrapped = hour.rem_euclid(HOURS_PER_DAY);
    // rem_euclid can round up to exactly 24.0 for tiny negative inputs
    if wrapped >= HOURS_PER_DAY { 0.0 } else { wrapped }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayNightCycle {
    hour: f32,
    day_length_secs: f32,
}

impl Default for DayNightCycle {
    fn default() -> Self {
        Self::new(DEFAULT_DAY_LENGTH_SECS, DEFAULT_START_HOUR)
    }
}

impl DayNightCycle {
    /// Non-positive day lengths fall back to the default
    pub fn new(day_length_secs: f32, start_hour: f32) -> Self {
        let day_length_secs = if day_length_secs > 0.0 {
            day_length_secs
        } else {
            log::warn!(
                "Invalid day length {}s, using {}s",
                day_length_secs,
                DEFAULT_DAY_LENGTH_SECS
            );
            DEFAULT_DAY_LENGTH_SECS
        };
        Self {
            hour: wrap_hour(start_hour),
            day_length_secs,
        }
    }

    /// Hours advanced per scaled second
    pub fn base_speed(&self) -> f32 {
        HOURS_PER_DAY / self.day_length_secs
    }

    pub fn hour(&self) -> f32 {
        self.hour
    }

    pub fn day_length_secs(&self) -> f32 {
        self.day_length_secs
    }

    pub fn set_hour(&mut self, hour: f32) {
        self.hour = wrap_hour(hour);
    }

    /// Advance by a scaled delta
    pub fn update(&mut self, scaled_delta: f32) {
        self.hour = wrap_hour(self.hour + self.base_speed() * scaled_delta);
    }

    pub fn day_factor(&self) -> f32 {
        day_factor(self.hour)
    }

    pub fn is_night(&self) -> bool {
        self.day_factor() == 0.0
    }
}
