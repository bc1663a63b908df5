//! Bounding boxes and the despawn zone
//!
//! Objects scroll toward -x. The despawn zone sits past the left edge of the
//! display surface; anything that reaches it is eligible for relocation.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Overlap depth below which two boxes count as touching
pub const CONTACT_EPSILON: f32 = 1e-4;

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Same box moved so its center sits at `center`
    pub fn translated_to(&self, center: Vec3) -> Self {
        Self::from_center_size(center, self.size())
    }

    /// Strict overlap test; boxes sharing only a face do not intersect
    ///
    /// Overlaps thinner than `CONTACT_EPSILON` are treated as touching so
    /// float drift on abutting boxes doesn't read as a collision.
    pub fn intersects(&self, other: &Aabb) -> bool {
        let e = CONTACT_EPSILON;
        self.min.x < other.max.x - e
            && self.max.x > other.min.x + e
            && self.min.y < other.max.y - e
            && self.max.y > other.min.y + e
            && self.min.z < other.max.z - e
            && self.max.z > other.min.z + e
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }
}

/// Source of the visible display rectangle in world space
pub trait DisplaySurface {
    fn bounds(&self) -> Aabb;
}

impl DisplaySurface for Aabb {
    fn bounds(&self) -> Aabb {
        *self
    }
}

/// Placement of the despawn zone relative to the display surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneTuning {
    /// Zone center shift toward -x, in display widths
    pub offset_factor: f32,
    /// Zone size relative to the display size
    pub scale: Vec3,
}

impl Default for ZoneTuning {
    fn default() -> Self {
        Self {
            offset_factor: 1.5,
            scale: Vec3::new(1.0, 4.0, 4.0),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollisionZone {
    tuning: ZoneTuning,
    display: Option<Aabb>,
    despawn: Option<Aabb>,
}

impl CollisionZone {
    pub fn new(tuning: ZoneTuning) -> Self {
        Self {
            tuning,
            display: None,
            despawn: None,
        }
    }

    pub fn display_bounds(&self) -> Option<Aabb> {
        self.display
    }

    pub fn despawn_zone(&self) -> Option<Aabb> {
        self.despawn
    }

    /// Derive the despawn region from the display bounds
    pub fn set_zone(&mut self, display: Aabb) {
        let size = display.size();
        let width = size.x;
        let center = display.center() - Vec3::X * width * self.tuning.offset_factor;
        let scaled = size * self.tuning.scale;
        // At least twice the display width on y/z so jittered and background
        // objects still pass through it
        let yz = Vec2::new(scaled.y, scaled.z).max(Vec2::splat(width * 2.0));
        let despawn = Aabb::from_center_size(center, Vec3::new(scaled.x, yz.x, yz.y));

        log::debug!("Despawn zone {:?} from display {:?}", despawn, display);
        self.display = Some(display);
        self.despawn = Some(despawn);
    }

    /// Recompute only if the surface moved or resized. Returns true on change.
    pub fn sync<S: DisplaySurface + ?Sized>(&mut self, surface: &S) -> bool {
        let bounds = surface.bounds();
        if self.display == Some(bounds) {
            return false;
        }
        self.set_zone(bounds);
        true
    }

    pub fn clear(&mut self) {
        self.display = None;
        self.despawn = None;
    }

    /// Box overlaps the despawn region. False until a zone is set.
    pub fn is_in_despawn_zone(&self, bounds: &Aabb) -> bool {
        self.despawn.is_some_and(|zone| zone.intersects(bounds))
    }

    /// Box has already scrolled entirely beyond the despawn region
    pub fn is_past_despawn_zone(&self, bounds: &Aabb) -> bool {
        self.despawn.is_some_and(|zone| bounds.max.x <= zone.min.x)
    }

    /// Box pokes outside the display's left/right/top/bottom edges
    pub fn is_out_of_display_bounds(&self, bounds: &Aabb) -> bool {
        self.display.is_some_and(|d| {
            bounds.min.x < d.min.x
                || bounds.max.x > d.max.x
                || bounds.min.y < d.min.y
                || bounds.max.y > d.max.y
        })
    }
}
