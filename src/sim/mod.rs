//! Frame simulation module
//!
//! All runtime logic lives here. Rules:
//! - Motion only ever consumes the clock's scaled delta
//! - Seeded RNG only
//! - No rendering, asset or platform dependencies (handles are opaque)

pub mod collision;
pub mod day_night;
pub mod lighting;
pub mod pool;
pub mod recycler;
pub mod registry;
pub mod state;
pub mod tick;

pub use collision::{Aabb, CollisionZone, DisplaySurface, ZoneTuning};
pub use day_night::{DayNightCycle, day_factor, wrap_hour};
pub use lighting::{LightColor, LightingConfig, LightingRig, LightingSnapshot, LightingUniform};
pub use pool::{Family, Mesh, ObjectId, PooledObject};
pub use recycler::{FamilyConfig, Placement, Recycler, TickReport};
pub use registry::{ObstacleRegistry, ObstacleStore};
pub use state::{GameClock, PhaseChange, PhaseEvent, SimPhase, SubscriptionId};
pub use tick::{CameraPose, FrameReport, InputCommand, Runner};
