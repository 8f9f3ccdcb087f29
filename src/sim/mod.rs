//! Simulation module
//!
//! All gameplay logic lives here:
//! - Time is an explicit millisecond argument, never read from a clock
//! - Seeded RNG only
//! - No audio, storage or platform dependencies

pub mod ai;
pub mod collision;
pub mod levels;
pub mod movement;
pub mod outcome;
pub mod pool;
pub mod spawn;
pub mod state;
pub mod tick;
pub mod tutorial;

pub use collision::{Aabb, Hitbox, overlaps};
pub use levels::{LevelConfig, LevelSetup, ObstacleKind, Planet, Upgrades};
pub use pool::{Handle, Pool};
pub use spawn::{Band, place_non_overlapping};
pub use state::{
    Alien, Boss, Bullet, Direction, GameEvent, GameState, Obstacle, Player, Playfield, Plot,
    PlotState, PowerUp, PowerUpKind, SessionPhase, Shovel, Tween,
};
pub use tick::{move_step, set_direction, start_level, throw_shovel, tick};
pub use tutorial::{Controls, TutorialCursor, TutorialStep};
