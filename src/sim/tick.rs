//! Per-frame orchestration
//!
//! Runs every component once per frame in a fixed order:
//! clock -> day-night -> lighting -> family recyclers -> registry checks.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::{Aabb, CollisionZone, DisplaySurface};
use super::day_night::DayNightCycle;
use super::lighting::{LightingRig, LightingSnapshot};
use super::pool::{Family, Mesh, ObjectId};
use super::recycler::{Recycler, TickReport};
use super::registry::ObstacleRegistry;
use super::state::{GameClock, SimPhase};
use crate::consts::MAX_FRAME_DT;
use crate::error::RunnerResult;
use crate::highscores::HighScores;
use crate::settings::Settings;

/// Payload-free commands from the input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    TogglePause,
    /// Start a new run after game over
    Reset,
    /// Snap the camera back to its home pose
    ResetCamera,
}

/// Camera placement; orbiting is driven externally
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub eye: Vec3,
    pub target: Vec3,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 6.0, 30.0),
            target: Vec3::new(0.0, 3.0, 0.0),
        }
    }
}

/// What happened during one frame
#[derive(Debug, Clone, Copy)]
pub struct FrameReport {
    pub scaled_delta: f32,
    pub lighting: LightingSnapshot,
    pub recycled: TickReport,
    /// Obstacle the player ran into this frame
    pub hit: Option<ObjectId>,
}

pub struct Runner<H> {
    settings: Settings,
    clock: GameClock,
    day_night: DayNightCycle,
    lighting: LightingRig,
    zone: CollisionZone,
    pools: Vec<Recycler<H>>,
    registry: ObstacleRegistry,
    rng: Pcg32,
    /// Distance covered this run, in world units
    distance: f32,
    high_scores: HighScores,
    last_rank: Option<usize>,
    camera: CameraPose,
    home_camera: CameraPose,
}

impl<H> Runner<H> {
    /// Validate settings, populate every family pool and lay out the world
    ///
    /// The clock stays in `Loading` until `run()`.
    pub fn new<F>(settings: Settings, mut factory: F) -> RunnerResult<Self>
    where
        F: FnMut(ObjectId) -> RunnerResult<Mesh<H>>,
    {
        settings.validate()?;
        let mut rng = Pcg32::seed_from_u64(settings.seed);

        let mut pools = Vec::with_capacity(settings.families.len());
        let mut registry = ObstacleRegistry::new();
        for config in &settings.families {
            let pool = Recycler::spawn(
                config.clone(),
                settings.base_scroll_speed,
                &mut factory,
                &mut rng,
            )?
            .with_attempts(settings.relocation_attempts);
            if config.family.is_obstacle() {
                registry.register_all(pool.ids());
            }
            pools.push(pool);
        }

        let mut runner = Self {
            clock: GameClock::new(),
            day_night: DayNightCycle::new(settings.day_length_secs, settings.start_hour),
            lighting: LightingRig::new(settings.lighting.clone()),
            zone: CollisionZone::new(settings.zone.clone()),
            pools,
            registry,
            rng,
            distance: 0.0,
            high_scores: HighScores::new(),
            last_rank: None,
            camera: CameraPose::default(),
            home_camera: CameraPose::default(),
            settings,
        };
        runner.space_obstacles();
        log::info!(
            "Runner ready: {} pools, {} obstacles, seed {}",
            runner.pools.len(),
            runner.registry.len(),
            runner.settings.seed
        );
        Ok(runner)
    }

    pub fn with_high_scores(mut self, high_scores: HighScores) -> Self {
        self.high_scores = high_scores;
        self
    }

    pub fn with_camera(mut self, home: CameraPose) -> Self {
        self.home_camera = home;
        self.camera = home;
        self
    }

    // === Accessors ===

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// For subscriptions and time-scale changes
    pub fn clock_mut(&mut self) -> &mut GameClock {
        &mut self.clock
    }

    pub fn phase(&self) -> SimPhase {
        self.clock.phase()
    }

    pub fn time_scale(&self) -> f32 {
        self.clock.time_scale()
    }

    pub fn day_night(&self) -> &DayNightCycle {
        &self.day_night
    }

    pub fn lighting(&self) -> Option<LightingSnapshot> {
        self.lighting.snapshot()
    }

    pub fn zone(&self) -> &CollisionZone {
        &self.zone
    }

    pub fn pools(&self) -> &[Recycler<H>] {
        &self.pools
    }

    pub fn pool(&self, family: Family) -> Option<&Recycler<H>> {
        self.pools.iter().find(|p| p.family() == family)
    }

    pub fn registry(&self) -> &ObstacleRegistry {
        &self.registry
    }

    /// Distance score for the current run
    pub fn score(&self) -> u64 {
        self.distance.max(0.0).floor() as u64
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    /// Rank achieved by the last finished run, if it made the board
    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    pub fn camera(&self) -> CameraPose {
        self.camera
    }

    pub fn set_camera(&mut self, pose: CameraPose) {
        self.camera = pose;
    }

    // === Display surface ===

    pub fn set_display(&mut self, bounds: Aabb) {
        self.zone.set_zone(bounds);
    }

    /// Re-derive the despawn zone if the surface moved or resized
    pub fn sync_display<S: DisplaySurface + ?Sized>(&mut self, surface: &S) -> bool {
        self.zone.sync(surface)
    }

    /// Player box fully inside the visible display
    pub fn is_player_visible(&self, player: &Aabb) -> bool {
        !self.zone.is_out_of_display_bounds(player)
    }

    // === Phase control ===

    /// Loading -> Running
    pub fn run(&mut self) -> bool {
        self.clock.start()
    }

    /// End the run; the score is recorded only on the transition itself
    pub fn end_run(&mut self) -> bool {
        if !self.clock.set_game_over() {
            return false;
        }
        let score = self.score();
        self.last_rank = self
            .high_scores
            .add_score(score, self.day_night.hour(), self.settings.seed);
        match self.last_rank {
            Some(rank) => log::info!("Run over: {} (rank #{})", score, rank),
            None => log::info!("Run over: {}", score),
        }
        true
    }

    /// Game over -> fresh layout -> Running. No-op unless game over.
    pub fn restart(&mut self) -> bool {
        if !self.clock.reset() {
            return false;
        }
        self.distance = 0.0;
        self.last_rank = None;
        self.day_night.set_hour(self.settings.start_hour);
        self.lighting.clear();
        for pool in self.pools.iter_mut().filter(|p| !p.family().is_obstacle()) {
            pool.layout(&mut self.rng);
        }
        self.space_obstacles();
        self.clock.start()
    }

    pub fn handle(&mut self, command: InputCommand) -> bool {
        match command {
            InputCommand::TogglePause => self.clock.toggle_pause(),
            InputCommand::Reset => self.restart(),
            InputCommand::ResetCamera => {
                self.camera = self.home_camera;
                true
            }
        }
    }

    // === Frame ===

    /// Advance one frame of `dt` wall-clock seconds, capped at `MAX_FRAME_DT`
    ///
    /// `player` is the player's box this frame; a hit on any registered
    /// obstacle while running ends the run.
    pub fn frame(&mut self, dt: f32, player: Option<&Aabb>) -> FrameReport {
        let dt = dt.min(MAX_FRAME_DT);
        let scaled_delta = self.clock.scaled_delta(dt);

        self.day_night.update(scaled_delta);
        let lighting = self.lighting.update(
            scaled_delta,
            self.day_night.day_factor(),
            self.day_night.hour(),
        );

        let mut recycled = TickReport::default();
        for pool in &mut self.pools {
            recycled += pool.tick(scaled_delta, &self.zone, &mut self.rng);
        }
        if recycled.exhausted > 0 {
            log::debug!("{} relocations placed without a clear slot", recycled.exhausted);
        }
        self.distance += self.settings.base_scroll_speed * scaled_delta;

        let mut hit = None;
        if let Some(player) = player {
            if self.clock.is_running() {
                hit = self.registry.first_hit(self.pools.as_slice(), player);
                if let Some(id) = hit {
                    log::info!("Player hit {} #{}", id.family, id.index);
                    self.end_run();
                }
            }
        }

        FrameReport {
            scaled_delta,
            lighting,
            recycled,
            hit,
        }
    }

    fn space_obstacles(&mut self) {
        self.registry.reset_all(
            self.pools.as_mut_slice(),
            self.settings.registry_min_gap,
            &mut self.rng,
        );
    }
}
