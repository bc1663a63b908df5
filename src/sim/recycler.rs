//! Generic scroll-and-recycle pool
//!
//! One algorithm for every family: scroll all members toward -x, then move
//! any member that reached the despawn zone to just past the frontmost
//! member, probing for a slot that doesn't overlap its siblings.

use std::ops::AddAssign;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, CollisionZone};
use super::pool::{Family, Mesh, ObjectId, PooledObject};
use crate::consts::*;
use crate::error::{RunnerError, RunnerResult};
use crate::{is_finite_span, sample_jitter, sample_range};

/// Per-family tuning for a recycler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub family: Family,
    pub pool_size: usize,
    /// Multiplier on the base scroll speed (parallax)
    pub scroll_speed_factor: f32,
    /// Random spacing added past the frontmost member, `(min, max)`
    pub gap_range: (f32, f32),
    /// Step applied to the candidate x after each overlapping probe
    pub min_distance: f32,
    /// Half-range of random y offset around `base_y`
    pub vertical_jitter: f32,
    /// Half-range of random z offset around `base_z`
    pub depth_jitter: f32,
    pub base_y: f32,
    pub base_z: f32,
    /// Range for the first member's x on layout and for registry resets
    pub spawn_x: (f32, f32),
}

impl FamilyConfig {
    /// Contiguous ground blocks, 10 units long
    pub fn terrain() -> Self {
        Self {
            family: Family::Terrain,
            pool_size: 12,
            scroll_speed_factor: 1.0,
            gap_range: (10.0, 10.0),
            min_distance: 10.0,
            vertical_jitter: 0.0,
            depth_jitter: 0.0,
            base_y: -0.5,
            base_z: 0.0,
            spawn_x: (-40.0, -40.0),
        }
    }

    pub fn cactus() -> Self {
        Self {
            family: Family::Cactus,
            pool_size: 10,
            scroll_speed_factor: 1.0,
            gap_range: (14.0, 28.0),
            min_distance: 4.0,
            vertical_jitter: 0.0,
            depth_jitter: 0.0,
            base_y: 1.0,
            base_z: 0.0,
            spawn_x: (40.0, 60.0),
        }
    }

    /// Crows fly slightly faster than the ground
    pub fn crow() -> Self {
        Self {
            family: Family::Crow,
            pool_size: 4,
            scroll_speed_factor: 1.25,
            gap_range: (40.0, 80.0),
            min_distance: 6.0,
            vertical_jitter: 1.5,
            depth_jitter: 0.0,
            base_y: 4.0,
            base_z: 0.0,
            spawn_x: (80.0, 120.0),
        }
    }

    /// Background clouds drift slowly for parallax
    pub fn cloud() -> Self {
        Self {
            family: Family::Cloud,
            pool_size: 8,
            scroll_speed_factor: 0.3,
            gap_range: (12.0, 30.0),
            min_distance: 8.0,
            vertical_jitter: 3.0,
            depth_jitter: 6.0,
            base_y: 14.0,
            base_z: -20.0,
            spawn_x: (-20.0, 40.0),
        }
    }

    pub fn obstacle() -> Self {
        Self {
            family: Family::Obstacle,
            pool_size: 6,
            scroll_speed_factor: 1.0,
            gap_range: (30.0, 60.0),
            min_distance: 5.0,
            vertical_jitter: 0.0,
            depth_jitter: 0.0,
            base_y: 0.75,
            base_z: 0.0,
            spawn_x: (60.0, 100.0),
        }
    }

    pub fn preset(family: Family) -> Self {
        match family {
            Family::Terrain => Self::terrain(),
            Family::Cactus => Self::cactus(),
            Family::Crow => Self::crow(),
            Family::Cloud => Self::cloud(),
            Family::Obstacle => Self::obstacle(),
        }
    }

    /// Randomized baseline position with x drawn from `spawn_x`
    pub fn spawn_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        Vec3::new(
            sample_range(rng, self.spawn_x.0, self.spawn_x.1),
            self.base_y + sample_jitter(rng, self.vertical_jitter),
            self.base_z + sample_jitter(rng, self.depth_jitter),
        )
    }

    pub fn validate(&self) -> RunnerResult<()> {
        let field = |name: &str| format!("families.{}.{}", self.family, name);
        if self.pool_size == 0 {
            return Err(RunnerError::invalid(field("pool_size"), "must be at least 1"));
        }
        if !(self.scroll_speed_factor >= 0.0 && self.scroll_speed_factor.is_finite()) {
            return Err(RunnerError::invalid(
                field("scroll_speed_factor"),
                "must be finite and >= 0",
            ));
        }
        let (gap_min, gap_max) = self.gap_range;
        if !(gap_min >= 0.0 && gap_min <= gap_max && is_finite_span(gap_min, gap_max)) {
            return Err(RunnerError::invalid(
                field("gap_range"),
                "expected finite 0 <= min <= max",
            ));
        }
        if !(self.min_distance > 0.0 && self.min_distance.is_finite()) {
            return Err(RunnerError::invalid(field("min_distance"), "must be finite and > 0"));
        }
        let jitters = [
            ("vertical_jitter", self.vertical_jitter),
            ("depth_jitter", self.depth_jitter),
        ];
        for (name, jitter) in jitters {
            if !is_finite_span(-jitter.abs(), jitter.abs()) {
                return Err(RunnerError::invalid(field(name), "must be finite"));
            }
        }
        for (name, value) in [("base_y", self.base_y), ("base_z", self.base_z)] {
            if !value.is_finite() {
                return Err(RunnerError::invalid(field(name), "must be finite"));
            }
        }
        let (spawn_min, spawn_max) = self.spawn_x;
        if !(spawn_min <= spawn_max && is_finite_span(spawn_min, spawn_max)) {
            return Err(RunnerError::invalid(field("spawn_x"), "expected finite min <= max"));
        }
        Ok(())
    }
}

/// Outcome of one relocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Found a slot clear of every sibling after `attempts` probes
    Clean { attempts: u32 },
    /// Every probe overlapped; placed at the last candidate anyway
    Exhausted,
}

impl Placement {
    pub fn is_clean(&self) -> bool {
        matches!(self, Placement::Clean { .. })
    }
}

/// Per-tick counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub relocated: u32,
    pub exhausted: u32,
}

impl AddAssign for TickReport {
    fn add_assign(&mut self, rhs: Self) {
        self.relocated += rhs.relocated;
        self.exhausted += rhs.exhausted;
    }
}

#[derive(Debug, Clone)]
pub struct Recycler<H> {
    config: FamilyConfig,
    objects: Vec<PooledObject<H>>,
    /// Base speed times the family factor
    scroll_speed: f32,
    attempts: u32,
}

impl<H> Recycler<H> {
    /// Build the pool through the external mesh factory and lay it out
    ///
    /// The first factory error aborts population and is returned as-is.
    pub fn spawn<F, R>(
        config: FamilyConfig,
        base_scroll_speed: f32,
        mut factory: F,
        rng: &mut R,
    ) -> RunnerResult<Self>
    where
        F: FnMut(ObjectId) -> RunnerResult<Mesh<H>>,
        R: Rng + ?Sized,
    {
        let mut objects = Vec::with_capacity(config.pool_size);
        for index in 0..config.pool_size {
            let id = ObjectId::new(config.family, index);
            let mesh = factory(id)?;
            let position = Vec3::new(0.0, config.base_y, config.base_z);
            objects.push(PooledObject::new(id, mesh, position));
        }

        let mut recycler = Self::from_objects(config, base_scroll_speed, objects);
        let exhausted = recycler.layout(rng);
        log::info!(
            "Spawned {} pool: {} objects, scroll speed {:.2}, {} crowded",
            recycler.family(),
            recycler.len(),
            recycler.scroll_speed,
            exhausted
        );
        Ok(recycler)
    }

    /// Wrap already-positioned objects without touching their layout
    pub fn from_objects(
        config: FamilyConfig,
        base_scroll_speed: f32,
        objects: Vec<PooledObject<H>>,
    ) -> Self {
        let scroll_speed = base_scroll_speed * config.scroll_speed_factor;
        Self {
            config,
            objects,
            scroll_speed,
            attempts: RELOCATION_ATTEMPTS,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn family(&self) -> Family {
        self.config.family
    }

    pub fn config(&self) -> &FamilyConfig {
        &self.config
    }

    pub fn scroll_speed(&self) -> f32 {
        self.scroll_speed
    }

    pub fn set_base_scroll_speed(&mut self, base: f32) {
        self.scroll_speed = base.max(0.0) * self.config.scroll_speed_factor;
    }

    pub fn objects(&self) -> &[PooledObject<H>] {
        &self.objects
    }

    pub fn get(&self, index: usize) -> Option<&PooledObject<H>> {
        self.objects.get(index)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.iter().map(|o| o.id())
    }

    /// Move one member to an explicit position
    pub fn place(&mut self, index: usize, position: Vec3) -> bool {
        match self.objects.get_mut(index) {
            Some(obj) => {
                obj.set_position(position);
                true
            }
            None => false,
        }
    }

    /// Fresh run layout: first member inside `spawn_x`, the rest chained
    /// behind it with the relocation algorithm
    ///
    /// Returns how many members were placed without a clear slot.
    pub fn layout<R: Rng + ?Sized>(&mut self, rng: &mut R) -> u32 {
        if self.objects.is_empty() {
            return 0;
        }
        let start = self.config.spawn_position(rng);
        self.objects[0].set_position(start);
        for index in 1..self.objects.len() {
            // Park outside the search so it can't be picked as frontmost
            let parked = Vec3::new(f32::NEG_INFINITY, start.y, start.z);
            self.objects[index].set_position(parked);
        }
        let mut exhausted = 0;
        for index in 1..self.objects.len() {
            if !self.relocate(index, rng).is_clean() {
                exhausted += 1;
            }
        }
        exhausted
    }

    /// Index of the member with the largest x, ignoring `skip`
    pub fn frontmost(&self, skip: Option<usize>) -> Option<usize> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(i, o)| Some(*i) != skip && o.position().x.is_finite())
            .max_by(|(_, a), (_, b)| a.position().x.total_cmp(&b.position().x))
            .map(|(i, _)| i)
    }

    /// Scroll every member, then relocate those that reached the despawn zone
    ///
    /// A zero (paused) delta leaves every position and box untouched.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        scaled_delta: f32,
        zone: &CollisionZone,
        rng: &mut R,
    ) -> TickReport {
        let mut report = TickReport::default();
        if !(scaled_delta > 0.0) {
            return report;
        }

        let dx = self.scroll_speed * scaled_delta;
        for obj in &mut self.objects {
            obj.scroll(dx);
        }

        for index in 0..self.objects.len() {
            let bounds = *self.objects[index].bounds();
            if zone.is_in_despawn_zone(&bounds) || zone.is_past_despawn_zone(&bounds) {
                report.relocated += 1;
                if !self.relocate(index, rng).is_clean() {
                    report.exhausted += 1;
                }
            }
        }
        report
    }

    /// Move one member past the frontmost sibling, avoiding overlaps
    pub fn relocate<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) -> Placement {
        let Some(current) = self.objects.get(index) else {
            return Placement::Exhausted;
        };
        let front_x = match self.frontmost(Some(index)) {
            Some(front) => self.objects[front].position().x,
            None => current.position().x,
        };

        let (gap_min, gap_max) = self.config.gap_range;
        let mut candidate_x = front_x + sample_range(rng, gap_min, gap_max);
        let y = self.config.base_y + sample_jitter(rng, self.config.vertical_jitter);
        let z = self.config.base_z + sample_jitter(rng, self.config.depth_jitter);
        let size = current.size();

        let mut placement = Placement::Exhausted;
        for attempt in 1..=self.attempts {
            let probe = Aabb::from_center_size(Vec3::new(candidate_x, y, z), size);
            let clear = self
                .objects
                .iter()
                .enumerate()
                .all(|(i, other)| i == index || !probe.intersects(other.bounds()));
            if clear {
                placement = Placement::Clean { attempts: attempt };
                break;
            }
            candidate_x += self.config.min_distance;
        }

        if placement == Placement::Exhausted {
            log::warn!(
                "{} #{}: no clear slot after {} probes, placing at x={:.2}",
                self.config.family,
                index,
                self.attempts,
                candidate_x
            );
        } else {
            log::debug!("{} #{} relocated to x={:.2}", self.config.family, index, candidate_x);
        }

        self.objects[index].set_position(Vec3::new(candidate_x, y, z));
        placement
    }

    /// Any pair of members whose boxes intersect
    pub fn has_overlaps(&self) -> bool {
        self.objects.iter().enumerate().any(|(i, a)| {
            self.objects[i + 1..]
                .iter()
                .any(|b| a.bounds().intersects(b.bounds()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn flat_config(gap: (f32, f32), min_distance: f32) -> FamilyConfig {
        FamilyConfig {
            family: Family::Cactus,
            pool_size: 3,
            scroll_speed_factor: 1.0,
            gap_range: gap,
            min_distance,
            vertical_jitter: 0.0,
            depth_jitter: 0.0,
            base_y: 0.0,
            base_z: 0.0,
            spawn_x: (0.0, 0.0),
        }
    }

    fn pool_at(config: FamilyConfig, xs: &[f32], size: Vec3) -> Recycler<()> {
        let family = config.family;
        let objects = xs
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                PooledObject::new(
                    ObjectId::new(family, i),
                    Mesh::new((), size),
                    Vec3::new(x, 0.0, 0.0),
                )
            })
            .collect();
        Recycler::from_objects(config, 10.0, objects)
    }

    fn zone() -> CollisionZone {
        let mut zone = CollisionZone::default();
        zone.set_zone(Aabb::new(Vec3::new(-20.0, 0.0, 0.0), Vec3::new(20.0, 20.0, 0.0)));
        zone
    }

    fn xs(recycler: &Recycler<()>) -> Vec<f32> {
        recycler.objects().iter().map(|o| o.position().x).collect()
    }

    #[test]
    fn test_relocate_past_frontmost() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut recycler = pool_at(flat_config((4.0, 4.0), 2.0), &[0.0, 5.0, 10.0], Vec3::ONE);
        let placement = recycler.relocate(0, &mut rng);
        assert_eq!(placement, Placement::Clean { attempts: 1 });
        assert_eq!(xs(&recycler), vec![14.0, 5.0, 10.0]);
    }

    #[test]
    fn test_relocate_steps_past_overlap() {
        let mut rng = Pcg32::seed_from_u64(7);
        // 6-wide boxes: x=14 overlaps the box at 10, x=16 just touches
        let mut recycler = pool_at(
            flat_config((4.0, 4.0), 2.0),
            &[0.0, 3.0, 10.0],
            Vec3::new(6.0, 1.0, 1.0),
        );
        let placement = recycler.relocate(0, &mut rng);
        assert_eq!(placement, Placement::Clean { attempts: 2 });
        assert_eq!(recycler.objects()[0].position().x, 16.0);
        assert!(!recycler.has_overlaps());
    }

    #[test]
    fn test_relocate_exhausted_places_anyway() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut recycler = pool_at(
            flat_config((0.0, 0.0), 0.1),
            &[0.0, 5.0, 10.0],
            Vec3::new(50.0, 1.0, 1.0),
        )
        .with_attempts(3);
        let placement = recycler.relocate(0, &mut rng);
        assert_eq!(placement, Placement::Exhausted);
        assert!((recycler.objects()[0].position().x - 10.3).abs() < 1e-4);
    }

    #[test]
    fn test_single_member_relocates_past_itself() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut recycler = pool_at(flat_config((4.0, 4.0), 2.0), &[-50.0], Vec3::ONE);
        assert!(recycler.relocate(0, &mut rng).is_clean());
        assert_eq!(recycler.objects()[0].position().x, -46.0);
    }

    #[test]
    fn test_zero_delta_changes_nothing() {
        let mut rng = Pcg32::seed_from_u64(3);
        // First member already sits inside the despawn zone
        let mut recycler = pool_at(flat_config((4.0, 4.0), 2.0), &[-45.0, 5.0, 10.0], Vec3::ONE);
        let before: Vec<_> = recycler.objects().iter().map(|o| *o.bounds()).collect();
        let report = recycler.tick(0.0, &zone(), &mut rng);
        let after: Vec<_> = recycler.objects().iter().map(|o| *o.bounds()).collect();
        assert_eq!(report, TickReport::default());
        assert_eq!(before, after);
    }

    #[test]
    fn test_tick_scrolls_and_recycles() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut recycler = pool_at(flat_config((4.0, 4.0), 2.0), &[-39.0, 5.0, 10.0], Vec3::ONE);
        // 10 units/s * 0.1s = 1 unit: first member enters the zone
        let report = recycler.tick(0.1, &zone(), &mut rng);
        assert_eq!(report.relocated, 1);
        assert_eq!(report.exhausted, 0);
        assert_eq!(xs(&recycler), vec![13.0, 4.0, 9.0]);
    }

    #[test]
    fn test_tick_without_zone_never_recycles() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut recycler = pool_at(flat_config((4.0, 4.0), 2.0), &[-1000.0, 5.0, 10.0], Vec3::ONE);
        let report = recycler.tick(1.0, &CollisionZone::default(), &mut rng);
        assert_eq!(report.relocated, 0);
        assert_eq!(recycler.objects()[0].position().x, -1010.0);
    }

    #[test]
    fn test_spawn_propagates_factory_error() {
        let mut rng = Pcg32::seed_from_u64(3);
        let result = Recycler::<u32>::spawn(
            FamilyConfig::crow(),
            10.0,
            |id| {
                if id.index == 2 {
                    Err(RunnerError::AssetLoad {
                        family: id.family,
                        slot: id.index as usize,
                        reason: "missing crow.glb".into(),
                    })
                } else {
                    Ok(Mesh::new(id.index, Vec3::ONE))
                }
            },
            &mut rng,
        );
        match result {
            Err(RunnerError::AssetLoad { slot, .. }) => assert_eq!(slot, 2),
            other => panic!("expected asset error, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn test_spawn_layout_is_ordered_and_clear() {
        let mut rng = Pcg32::seed_from_u64(11);
        let recycler = Recycler::spawn(
            FamilyConfig::cactus(),
            12.0,
            |id| Ok(Mesh::new(id, Vec3::new(1.0, 2.0, 1.0))),
            &mut rng,
        )
        .unwrap();
        assert_eq!(recycler.len(), 10);
        assert!(!recycler.has_overlaps());
        let xs: Vec<f32> = recycler.objects().iter().map(|o| o.position().x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert!((40.0..60.0).contains(&xs[0]));
    }

    #[test]
    fn test_terrain_layout_is_contiguous() {
        let mut rng = Pcg32::seed_from_u64(5);
        let recycler = Recycler::spawn(
            FamilyConfig::terrain(),
            12.0,
            |_| Ok(Mesh::new((), Vec3::new(10.0, 1.0, 6.0))),
            &mut rng,
        )
        .unwrap();
        for pair in recycler.objects().windows(2) {
            assert_eq!(pair[1].position().x - pair[0].position().x, 10.0);
        }
    }

    #[test]
    fn test_layout_reports_crowding() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut clear = pool_at(flat_config((4.0, 4.0), 2.0), &[0.0; 3], Vec3::ONE);
        assert_eq!(clear.layout(&mut rng), 0);
        assert_eq!(xs(&clear), vec![0.0, 4.0, 8.0]);

        // 50-wide boxes stepped 0.1 at a time can never clear each other
        let mut crowded = pool_at(
            flat_config((0.0, 0.0), 0.1),
            &[0.0; 3],
            Vec3::new(50.0, 1.0, 1.0),
        )
        .with_attempts(2);
        assert_eq!(crowded.layout(&mut rng), 2);
        assert!(crowded.has_overlaps());
    }

    #[test]
    fn test_base_scroll_speed_keeps_parallax() {
        let config = FamilyConfig {
            scroll_speed_factor: 0.5,
            ..flat_config((4.0, 4.0), 2.0)
        };
        let mut recycler = pool_at(config, &[0.0], Vec3::ONE);
        assert_eq!(recycler.scroll_speed(), 5.0);
        recycler.set_base_scroll_speed(30.0);
        assert_eq!(recycler.scroll_speed(), 15.0);
        recycler.set_base_scroll_speed(-4.0);
        assert_eq!(recycler.scroll_speed(), 0.0);
    }

    #[test]
    fn test_config_validation() {
        for family in Family::ALL {
            FamilyConfig::preset(family).validate().unwrap();
        }
        let mut bad = FamilyConfig::cactus();
        bad.gap_range = (5.0, 1.0);
        assert!(bad.validate().is_err());
        let mut bad = FamilyConfig::cactus();
        bad.pool_size = 0;
        assert!(bad.validate().is_err());
        let mut bad = FamilyConfig::cactus();
        bad.min_distance = f32::NAN;
        assert!(bad.validate().is_err());
        let mut bad = FamilyConfig::cloud();
        bad.depth_jitter = f32::INFINITY;
        assert!(bad.validate().is_err());
        let mut bad = FamilyConfig::cloud();
        bad.base_z = f32::NEG_INFINITY;
        assert!(bad.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_relocations_never_overlap_unless_exhausted(
            seed in any::<u64>(),
            pool_size in 2usize..16,
            gap_min in 0.0f32..6.0,
            gap_extra in 0.0f32..10.0,
            min_distance in 0.5f32..4.0,
            width in 0.5f32..6.0,
            frames in 1usize..200,
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let config = FamilyConfig {
                pool_size,
                gap_range: (gap_min, gap_min + gap_extra),
                min_distance,
                vertical_jitter: 1.0,
                ..flat_config((0.0, 0.0), 1.0)
            };
            let mut recycler = pool_at(config, &vec![0.0; pool_size], Vec3::new(width, 1.0, 1.0));
            let zone = zone();

            let mut exhausted = recycler.layout(&mut rng) > 0;
            if !exhausted {
                prop_assert!(!recycler.has_overlaps());
            }
            for _ in 0..frames {
                let report = recycler.tick(1.0 / 30.0, &zone, &mut rng);
                exhausted |= report.exhausted > 0;
                // Overlap is only acceptable once a placement gave up
                if !exhausted {
                    prop_assert!(!recycler.has_overlaps());
                }
            }
        }
    }
}
