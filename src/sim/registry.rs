//! Flat cross-family index of obstacles
//!
//! The registry never owns objects. It stores ids and reaches the pools
//! through `ObstacleStore` for player hits and whole-run resets.

use glam::Vec3;
use rand::Rng;

use super::collision::Aabb;
use super::pool::{Family, ObjectId, PooledObject};
use super::recycler::{FamilyConfig, Recycler};

/// Access to pooled objects by id
pub trait ObstacleStore {
    type Handle;

    fn object(&self, id: ObjectId) -> Option<&PooledObject<Self::Handle>>;

    fn family_config(&self, family: Family) -> Option<&FamilyConfig>;

    /// Move an object; returns false for unknown ids
    fn place(&mut self, id: ObjectId, position: Vec3) -> bool;
}

impl<H> ObstacleStore for Recycler<H> {
    type Handle = H;

    fn object(&self, id: ObjectId) -> Option<&PooledObject<H>> {
        if id.family != self.family() {
            return None;
        }
        self.get(id.index as usize)
    }

    fn family_config(&self, family: Family) -> Option<&FamilyConfig> {
        (family == self.family()).then(|| self.config())
    }

    fn place(&mut self, id: ObjectId, position: Vec3) -> bool {
        id.family == self.family() && Recycler::place(self, id.index as usize, position)
    }
}

impl<H> ObstacleStore for [Recycler<H>] {
    type Handle = H;

    fn object(&self, id: ObjectId) -> Option<&PooledObject<H>> {
        self.iter().find_map(|r| r.object(id))
    }

    fn family_config(&self, family: Family) -> Option<&FamilyConfig> {
        self.iter().find_map(|r| r.family_config(family))
    }

    fn place(&mut self, id: ObjectId, position: Vec3) -> bool {
        self.iter_mut()
            .find(|r| r.family() == id.family)
            .is_some_and(|r| ObstacleStore::place(r, id, position))
    }
}

#[derive(Debug, Clone, Default)]
pub struct ObstacleRegistry {
    entries: Vec<ObjectId>,
}

impl ObstacleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one id. Duplicates are not filtered.
    pub fn register(&mut self, id: ObjectId) {
        self.entries.push(id);
    }

    pub fn register_all<I: IntoIterator<Item = ObjectId>>(&mut self, ids: I) {
        self.entries.extend(ids);
    }

    pub fn entries(&self) -> &[ObjectId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_family(&self, family: Family) -> Vec<ObjectId> {
        self.entries
            .iter()
            .copied()
            .filter(|id| id.family == family)
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// First registered obstacle whose box intersects `bounds`
    pub fn first_hit<S>(&self, store: &S, bounds: &Aabb) -> Option<ObjectId>
    where
        S: ObstacleStore + ?Sized,
    {
        self.entries.iter().copied().find(|&id| {
            store
                .object(id)
                .is_some_and(|obj| obj.bounds().intersects(bounds))
        })
    }

    /// Scatter every obstacle to a fresh start, then enforce `min_gap` along x
    ///
    /// Single left-to-right sweep over the x-sorted list: anything closer
    /// than `min_gap` to its predecessor is pushed to predecessor + gap.
    /// Returns the number of objects placed.
    pub fn reset_all<S, R>(&self, store: &mut S, min_gap: f32, rng: &mut R) -> usize
    where
        S: ObstacleStore + ?Sized,
        R: Rng + ?Sized,
    {
        let mut placed: Vec<(ObjectId, Vec3)> = self
            .entries
            .iter()
            .filter_map(|&id| {
                let config = store.family_config(id.family)?;
                store.object(id)?;
                Some((id, config.spawn_position(rng)))
            })
            .collect();

        placed.sort_by(|a, b| a.1.x.total_cmp(&b.1.x));
        let min_gap = min_gap.max(0.0);
        for i in 1..placed.len() {
            let floor = placed[i - 1].1.x + min_gap;
            if placed[i].1.x < floor {
                placed[i].1.x = floor;
            }
        }

        for &(id, position) in &placed {
            store.place(id, position);
        }
        log::info!(
            "Reset {} obstacles (min gap {:.1}), last at x={:.1}",
            placed.len(),
            min_gap,
            placed.last().map(|p| p.1.x).unwrap_or(0.0)
        );
        placed.len()
    }
}
