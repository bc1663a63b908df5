//! Runner settings
//!
//! Data-driven tuning for a run, persisted as JSON. Missing fields fall back
//! to the defaults so partial files stay valid.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{RunnerError, RunnerResult};
use crate::sim::{Family, FamilyConfig, LightingConfig, ZoneTuning};

/// Runner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// World RNG seed
    pub seed: u64,

    // === Day-night cycle ===
    /// Real seconds per full 24h cycle at time scale 1.0
    pub day_length_secs: f32,
    /// Hour the clock shows at the start of a run
    pub start_hour: f32,

    // === Scrolling ===
    /// World units per second before family factors
    pub base_scroll_speed: f32,
    /// Overlap probes per relocation
    pub relocation_attempts: u32,
    /// Minimum x spacing between obstacles after a reset
    pub registry_min_gap: f32,

    // === World ===
    pub zone: ZoneTuning,
    pub lighting: LightingConfig,
    pub families: Vec<FamilyConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0x5eed,

            day_length_secs: DEFAULT_DAY_LENGTH_SECS,
            start_hour: DEFAULT_START_HOUR,

            base_scroll_speed: BASE_SCROLL_SPEED,
            relocation_attempts: RELOCATION_ATTEMPTS,
            registry_min_gap: REGISTRY_MIN_GAP,

            zone: ZoneTuning::default(),
            lighting: LightingConfig::default(),
            families: Family::ALL.iter().map(|&f| FamilyConfig::preset(f)).collect(),
        }
    }
}

impl Settings {
    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> RunnerResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> RunnerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> RunnerResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Using default settings ({})", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> RunnerResult<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }

    pub fn family(&self, family: Family) -> Option<&FamilyConfig> {
        self.families.iter().find(|f| f.family == family)
    }

    pub fn validate(&self) -> RunnerResult<()> {
        if !(self.day_length_secs > 0.0 && self.day_length_secs.is_finite()) {
            return Err(RunnerError::invalid("day_length_secs", "must be finite and > 0"));
        }
        if !self.start_hour.is_finite() {
            return Err(RunnerError::invalid("start_hour", "must be finite"));
        }
        if !(self.base_scroll_speed >= 0.0 && self.base_scroll_speed.is_finite()) {
            return Err(RunnerError::invalid("base_scroll_speed", "must be finite and >= 0"));
        }
        if self.relocation_attempts == 0 {
            return Err(RunnerError::invalid("relocation_attempts", "must be at least 1"));
        }
        if !(self.registry_min_gap >= 0.0 && self.registry_min_gap.is_finite()) {
            return Err(RunnerError::invalid("registry_min_gap", "must be finite and >= 0"));
        }
        if !self.zone.offset_factor.is_finite() {
            return Err(RunnerError::invalid("zone.offset_factor", "must be finite"));
        }
        if !(self.zone.scale.cmpgt(Vec3::ZERO).all() && self.zone.scale.is_finite()) {
            return Err(RunnerError::invalid(
                "zone.scale",
                "must be finite and positive on every axis",
            ));
        }
        self.lighting.validate()?;
        for (i, config) in self.families.iter().enumerate() {
            if self.families[..i].iter().any(|f| f.family == config.family) {
                return Err(RunnerError::invalid(
                    format!("families.{}", config.family),
                    "listed more than once",
                ));
            }
            config.validate()?;
        }
        Ok(())
    }
}
