//! Ambient/directional light synchronized to the day factor
//!
//! Consumers never reach into the rig: they read a `LightingSnapshot` once
//! per frame and apply it to whatever materials they own.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{RunnerError, RunnerResult};
use crate::{lerp, lerp_color, smoothstep};

/// Endpoint colors and intensities for the light blend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub night_ambient: Vec3,
    pub day_ambient: Vec3,
    pub night_ambient_intensity: f32,
    pub day_ambient_intensity: f32,
    pub night_directional: Vec3,
    pub day_directional: Vec3,
    pub night_directional_intensity: f32,
    pub day_directional_intensity: f32,
    /// Point the directional light looks at (middle of the track)
    pub target: Vec3,
    /// Radius of the sun's arc around `target`
    pub sun_distance: f32,
    /// Half extent of the orthographic shadow volume
    pub shadow_extent: f32,
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            night_ambient: Vec3::new(0.18, 0.2, 0.38),
            day_ambient: Vec3::new(1.0, 0.96, 0.88),
            night_ambient_intensity: 0.35,
            day_ambient_intensity: 0.8,
            night_directional: Vec3::new(0.4, 0.45, 0.7),
            day_directional: Vec3::new(1.0, 0.92, 0.78),
            night_directional_intensity: 0.2,
            day_directional_intensity: 1.0,
            target: Vec3::ZERO,
            sun_distance: 60.0,
            shadow_extent: 40.0,
        }
    }
}

impl LightingConfig {
    pub fn validate(&self) -> RunnerResult<()> {
        let colors = [
            ("night_ambient", self.night_ambient),
            ("day_ambient", self.day_ambient),
            ("night_directional", self.night_directional),
            ("day_directional", self.day_directional),
            ("target", self.target),
        ];
        for (name, value) in colors {
            if !value.is_finite() {
                return Err(RunnerError::invalid(format!("lighting.{name}"), "must be finite"));
            }
        }
        let scalars = [
            ("night_ambient_intensity", self.night_ambient_intensity),
            ("day_ambient_intensity", self.day_ambient_intensity),
            ("night_directional_intensity", self.night_directional_intensity),
            ("day_directional_intensity", self.day_directional_intensity),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(RunnerError::invalid(format!("lighting.{name}"), "must be finite"));
            }
        }
        let extents = [
            ("sun_distance", self.sun_distance),
            ("shadow_extent", self.shadow_extent),
        ];
        for (name, value) in extents {
            if !(value > 0.0 && value.is_finite()) {
                return Err(RunnerError::invalid(
                    format!("lighting.{name}"),
                    "must be finite and > 0",
                ));
            }
        }
        Ok(())
    }
}

/// Blended ambient and directional colors for one day factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightColor {
    pub ambient: Vec3,
    pub directional: Vec3,
}

/// Read-only view of the current lighting state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingSnapshot {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub directional_color: Vec3,
    pub directional_intensity: f32,
    pub directional_position: Vec3,
    /// Shadow view-projection for the directional light
    pub directional_matrix: Mat4,
}

/// GPU layout of a `LightingSnapshot` (rgb + intensity packed in vec4s)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightingUniform {
    pub ambient: [f32; 4],
    pub directional: [f32; 4],
    pub directional_position: [f32; 4],
    pub directional_matrix: [[f32; 4]; 4],
}

impl From<&LightingSnapshot> for LightingUniform {
    fn from(s: &LightingSnapshot) -> Self {
        Self {
            ambient: s.ambient_color.extend(s.ambient_intensity).to_array(),
            directional: s.directional_color.extend(s.directional_intensity).to_array(),
            directional_position: s.directional_position.extend(1.0).to_array(),
            directional_matrix: s.directional_matrix.to_cols_array_2d(),
        }
    }
}

impl LightingUniform {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

/// Light blend weight for a day factor
#[inline]
pub fn light_blend(day_factor: f32) -> f32 {
    smoothstep(LIGHT_BLEND_MIN, LIGHT_BLEND_MAX, day_factor)
}

#[derive(Debug, Clone)]
pub struct LightingRig {
    config: LightingConfig,
    last: Option<LightingSnapshot>,
}

impl Default for LightingRig {
    fn default() -> Self {
        Self::new(LightingConfig::default())
    }
}

impl LightingRig {
    pub fn new(config: LightingConfig) -> Self {
        Self { config, last: None }
    }

    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    /// Blend night and day colors for a day factor
    pub fn color_at(&self, day_factor: f32) -> LightColor {
        let t = light_blend(day_factor);
        LightColor {
            ambient: lerp_color(self.config.night_ambient, self.config.day_ambient, t),
            directional: lerp_color(self.config.night_directional, self.config.day_directional, t),
        }
    }

    /// Sun (or moon, below the horizon) position for an hour of day
    ///
    /// Rises at 06:00 on +x, overhead at noon, sets at 18:00 on -x. At night
    /// the arc is mirrored above the horizon so shadows stay sensible.
    pub fn light_position(&self, hour: f32) -> Vec3 {
        let theta = (hour - 6.0) / 12.0 * PI;
        let d = self.config.sun_distance;
        // z offset keeps the view direction off the up axis at noon
        self.config.target + Vec3::new(theta.cos() * d, theta.sin().abs() * d + 1.0, d * 0.5)
    }

    fn light_matrix(&self, position: Vec3) -> Mat4 {
        let e = self.config.shadow_extent;
        let far = self.config.sun_distance * 3.0;
        let view = Mat4::look_at_rh(position, self.config.target, Vec3::Y);
        let proj = Mat4::orthographic_rh(-e, e, -e, e, 0.1, far);
        proj * view
    }

    /// Full lighting state for a day factor and hour, without caching
    pub fn compute(&self, day_factor: f32, hour: f32) -> LightingSnapshot {
        let color = self.color_at(day_factor);
        let t = light_blend(day_factor);
        let position = self.light_position(hour);
        LightingSnapshot {
            ambient_color: color.ambient,
            ambient_intensity: lerp(
                self.config.night_ambient_intensity,
                self.config.day_ambient_intensity,
                t,
            ),
            directional_color: color.directional,
            directional_intensity: lerp(
                self.config.night_directional_intensity,
                self.config.day_directional_intensity,
                t,
            ),
            directional_position: position,
            directional_matrix: self.light_matrix(position),
        }
    }

    /// Recompute for this frame; a zero delta returns the last snapshot unchanged
    pub fn update(&mut self, scaled_delta: f32, day_factor: f32, hour: f32) -> LightingSnapshot {
        if scaled_delta == 0.0 {
            if let Some(last) = self.last {
                return last;
            }
        }
        let snapshot = self.compute(day_factor, hour);
        self.last = Some(snapshot);
        snapshot
    }

    /// Last snapshot produced by `update`
    pub fn snapshot(&self) -> Option<LightingSnapshot> {
        self.last
    }

    /// Drop the cached snapshot (new run)
    pub fn clear(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        LightingConfig::default().validate().unwrap();
        let config = LightingConfig {
            sun_distance: f32::INFINITY,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = LightingConfig {
            day_ambient: Vec3::new(1.0, f32::NAN, 1.0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_full_day_is_day_color() {
        let rig = LightingRig::default();
        let color = rig.color_at(1.0);
        assert_eq!(color.ambient, rig.config().day_ambient);
        assert_eq!(color.directional, rig.config().day_directional);
    }

    #[test]
    fn test_night_is_night_color() {
        let rig = LightingRig::default();
        let color = rig.color_at(0.0);
        assert_eq!(color.ambient, rig.config().night_ambient);
        // Below the blend window is still full night
        assert_eq!(rig.color_at(0.25).ambient, rig.config().night_ambient);
    }

    #[test]
    fn test_midpoint_blend() {
        let rig = LightingRig::default();
        let c = rig.config();
        let mid = (c.night_ambient + c.day_ambient) * 0.5;
        assert!(rig.color_at(0.5).ambient.abs_diff_eq(mid, 1e-5));
    }

    #[test]
    fn test_zero_delta_returns_cached() {
        let mut rig = LightingRig::default();
        let noon = rig.update(0.1, 1.0, 12.0);
        let held = rig.update(0.0, 0.0, 0.0);
        assert_eq!(noon, held);

        let night = rig.update(0.1, 0.0, 0.0);
        assert_eq!(night.ambient_color, rig.config().night_ambient);
    }

    #[test]
    fn test_zero_delta_without_cache_computes() {
        let mut rig = LightingRig::default();
        let snap = rig.update(0.0, 1.0, 12.0);
        assert_eq!(snap.ambient_intensity, rig.config().day_ambient_intensity);
        assert_eq!(rig.snapshot(), Some(snap));
    }

    #[test]
    fn test_light_above_track() {
        let rig = LightingRig::default();
        for hour in [0.0, 3.0, 6.0, 12.0, 18.0, 23.0] {
            assert!(rig.light_position(hour).y > 0.0);
        }
        let noon = rig.light_position(12.0);
        assert!(noon.x.abs() < 1e-3);
    }

    #[test]
    fn test_matrix_finite() {
        let rig = LightingRig::default();
        let snap = rig.compute(1.0, 12.0);
        assert!(snap.directional_matrix.is_finite());
    }

    #[test]
    fn test_uniform_packing() {
        let rig = LightingRig::default();
        let snap = rig.compute(1.0, 12.0);
        let uniform = LightingUniform::from(&snap);
        assert_eq!(uniform.as_bytes().len(), 112);
        assert_eq!(uniform.ambient[3], snap.ambient_intensity);
        assert_eq!(uniform.directional_position[3], 1.0);
    }
}
