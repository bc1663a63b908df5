//! Dune Runner - runtime core of a side-scrolling 3D desert runner
//!
//! Core modules:
//! - `sim`: Frame simulation (game clock, day-night cycle, lighting, recycling)
//! - `settings`: Data-driven tuning loaded from JSON
//! - `highscores`: Distance leaderboard
//! - `error`: Setup-time error type

pub mod error;
pub mod highscores;
pub mod settings;
pub mod sim;

pub use error::{RunnerError, RunnerResult};
pub use highscores::HighScores;
pub use settings::Settings;
pub use sim::FamilyConfig;

use glam::Vec3;
use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Nominal frame delta used by the headless driver (60 Hz)
    pub const FRAME_DT: f32 = 1.0 / 60.0;
    /// Longest wall-clock step one frame may simulate (stalls, tab switches)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Hours in one simulated day
    pub const HOURS_PER_DAY: f32 = 24.0;
    /// Real seconds for one full day-night cycle
    pub const DEFAULT_DAY_LENGTH_SECS: f32 = 60.0;
    /// Hour the clock starts at on a fresh run
    pub const DEFAULT_START_HOUR: f32 = 12.0;

    /// Day factor schedule (hours)
    pub const DAWN_START: f32 = 5.0;
    pub const DAWN_END: f32 = 7.0;
    pub const DUSK_START: f32 = 17.0;
    pub const DUSK_END: f32 = 19.0;

    /// Smoothstep window applied to the day factor before color blending
    pub const LIGHT_BLEND_MIN: f32 = 0.3;
    pub const LIGHT_BLEND_MAX: f32 = 0.7;

    /// World units per second at time scale 1.0
    pub const BASE_SCROLL_SPEED: f32 = 12.0;
    /// Overlap probes per relocation before placing anyway
    pub const RELOCATION_ATTEMPTS: u32 = 10;
    /// Minimum x gap enforced between registered obstacles on reset
    pub const REGISTRY_MIN_GAP: f32 = 8.0;
}

/// Linear interpolation between `a` and `b`; exact at both endpoints
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// Component-wise linear interpolation between two colors
#[inline]
pub fn lerp_color(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

/// Hermite smoothstep of `v` over `[min, max]`
///
/// A degenerate window (`min >= max`) acts as a hard step at `min`.
#[inline]
pub fn smoothstep(min: f32, max: f32, v: f32) -> f32 {
    if max <= min {
        return if v < min { 0.0 } else { 1.0 };
    }
    let x = ((v - min) / (max - min)).clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Both bounds finite and `max - min` representable
#[inline]
pub fn is_finite_span(min: f32, max: f32) -> bool {
    min.is_finite() && max.is_finite() && (max - min).is_finite()
}

/// Sample uniformly from `[min, max)`
///
/// Returns `min` for an empty range or one whose width overflows.
#[inline]
pub fn sample_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min && is_finite_span(min, max) {
        rng.random_range(min..max)
    } else {
        min
    }
}

/// Sample a symmetric jitter in `[-amount, amount)`
#[inline]
pub fn sample_jitter<R: Rng + ?Sized>(rng: &mut R, amount: f32) -> f32 {
    sample_range(rng, -amount.abs(), amount.abs())
}
