//! Pooled world objects
//!
//! Objects are created once per family and only ever repositioned.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;

/// Object family; each family has its own pool and recycler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    Terrain,
    Cactus,
    Crow,
    Cloud,
    /// Generic obstacle (rocks, tumbleweeds)
    Obstacle,
}

impl Family {
    pub const ALL: [Family; 5] = [
        Family::Terrain,
        Family::Cactus,
        Family::Crow,
        Family::Cloud,
        Family::Obstacle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Terrain => "terrain",
            Family::Cactus => "cactus",
            Family::Crow => "crow",
            Family::Cloud => "cloud",
            Family::Obstacle => "obstacle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "terrain" => Some(Family::Terrain),
            "cactus" | "cacti" => Some(Family::Cactus),
            "crow" => Some(Family::Crow),
            "cloud" => Some(Family::Cloud),
            "obstacle" | "generic" => Some(Family::Obstacle),
            _ => None,
        }
    }

    /// Whether the player can collide with this family
    pub fn is_obstacle(&self) -> bool {
        matches!(self, Family::Cactus | Family::Crow | Family::Obstacle)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family-scoped identity of a pooled object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    pub family: Family,
    pub index: u32,
}

impl ObjectId {
    pub fn new(family: Family, index: usize) -> Self {
        Self {
            family,
            index: index as u32,
        }
    }
}

/// What the external asset factory hands back for one pool slot
#[derive(Debug, Clone)]
pub struct Mesh<H> {
    /// Opaque renderer handle, never inspected here
    pub handle: H,
    /// Bounding box size of the mesh
    pub size: Vec3,
}

impl<H> Mesh<H> {
    pub fn new(handle: H, size: Vec3) -> Self {
        Self { handle, size }
    }
}

/// One recycled world object
#[derive(Debug, Clone)]
pub struct PooledObject<H> {
    id: ObjectId,
    position: Vec3,
    size: Vec3,
    /// Cached box, refreshed whenever the position changes
    bounds: Aabb,
    handle: H,
}

impl<H> PooledObject<H> {
    pub fn new(id: ObjectId, mesh: Mesh<H>, position: Vec3) -> Self {
        Self {
            id,
            position,
            size: mesh.size,
            bounds: Aabb::from_center_size(position, mesh.size),
            handle: mesh.handle,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn family(&self) -> Family {
        self.id.family
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn size(&self) -> Vec3 {
        self.size
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub(crate) fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.refresh_bounds();
    }

    pub(crate) fn scroll(&mut self, dx: f32) {
        self.position.x -= dx;
        self.refresh_bounds();
    }

    fn refresh_bounds(&mut self) {
        self.bounds = Aabb::from_center_size(self.position, self.size);
    }
}
