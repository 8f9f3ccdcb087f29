//! Space Farmer - a 2D arcade farming/shooter simulation core
//!
//! Core modules:
//! - `sim`: Fixed-tick simulation (pools, collisions, AI, outcomes, tutorial)
//! - `game`: Host driver that schedules ticks and movement and routes outcomes
//! - `progression`: Persistent score/upgrade/unlock store
//! - `settings`: Playfield geometry, cadences and audio preferences
//! - `audio`: Fire-and-forget sound cues

pub mod audio;
pub mod error;
pub mod game;
pub mod progression;
pub mod settings;
pub mod sim;

pub use audio::{AudioSink, SoundCue};
pub use error::SaveError;
pub use game::{Game, Signal, Snapshot};
pub use progression::{Progression, ProgressionStore, UpgradeCategory};
pub use settings::Settings;

use rand::Rng;

/// Game configuration constants
pub mod consts {
    /// Simulation tick cadence (~30 Hz)
    pub const TICK_MS: u64 = 33;
    /// Held-direction movement cadence
    pub const MOVE_STEP_MS: u64 = 50;
    /// Maximum catch-up steps per timer per host update
    pub const MAX_CATCHUP_STEPS: u32 = 8;

    /// Level ids
    pub const LAST_REGULAR_LEVEL: u32 = 15;
    pub const BOSS_LEVEL: u32 = 16;
    pub const TUTORIAL_LEVEL: u32 = 99;

    /// Player defaults
    pub const PLAYER_WIDTH: f32 = 100.0;
    pub const PLAYER_HEIGHT: f32 = 100.0;
    pub const PLAYER_BASE_HEALTH: u32 = 3;
    pub const PLAYER_BASE_SPEED: f32 = 30.0;
    pub const SPEED_PER_UPGRADE: f32 = 5.0;
    /// Fraction of the player's size trimmed from each side of its hitbox
    pub const PLAYER_HITBOX_INSET: f32 = 0.2;
    /// Gap between the player and the control margin at level start
    pub const PLAYER_START_GAP: f32 = 40.0;

    /// Entity sizes (square)
    pub const ALIEN_SIZE: f32 = 100.0;
    pub const BOSS_SIZE: f32 = 150.0;
    pub const PLOT_SIZE: f32 = 80.0;
    pub const OBSTACLE_SIZE: f32 = 120.0;
    pub const BULLET_SIZE: f32 = 40.0;
    pub const SHOVEL_SIZE: f32 = 50.0;
    pub const POWERUP_SIZE: f32 = 70.0;

    /// Pool capacities
    pub const MAX_BULLETS: usize = 20;
    pub const MAX_SHOVELS: usize = 5;
    pub const MAX_POWERUPS: usize = 5;

    /// Projectile speeds (pixels per tick)
    pub const BULLET_SPEED: f32 = 12.0;
    pub const SHOVEL_SPEED: f32 = 20.0;
    /// Shovels spawn this far above the player
    pub const SHOVEL_LAUNCH_OFFSET: f32 = 30.0;

    /// Placement
    pub const SAFE_PADDING: f32 = 120.0;
    pub const MAX_PLACEMENT_ATTEMPTS: u32 = 500;

    /// Alien timing
    pub const ALIEN_MOVE_DURATION_MS: u64 = 2500;
    pub const ALIEN_SHOOT_BASE_MS: u64 = 2500;
    pub const ALIEN_SHOOT_JITTER_MS: u64 = 1500;
    pub const ALIEN_RESPAWN_DELAY_MS: u64 = 5000;

    /// Boss behaviour
    pub const BOSS_TOP: f32 = 50.0;
    pub const BOSS_TRACKING_RATE: f32 = 0.02;
    pub const BOSS_ENRAGE_FACTOR: f32 = 1.5;
    pub const BOSS_SPREAD: f32 = 150.0;
    pub const BOSS_FIRST_SHOT_MS: u64 = 2000;
    pub const BOSS_SHOOT_BASE_MS: u64 = 1800;
    pub const BOSS_SHOOT_JITTER_MS: u64 = 1000;
    pub const BOSS_MIN_SHOOT_MS: u64 = 800;

    /// Power-ups
    pub const POWERUP_DURATION_MS: u64 = 5000;
    pub const POWERUP_DROP_CHANCE: f64 = 0.15;
    pub const SPEED_BOOST_FACTOR: f32 = 1.5;

    /// Scoring
    pub const PLANT_SCORE: u64 = 1;
    pub const HARVEST_SCORE: u64 = 50;
    pub const BOSS_KILL_BONUS: u64 = 10_000;
}

/// Uniform sample in `[lo, hi)`, collapsing to `lo` when the range is empty
#[inline]
pub fn sample_span<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Uniform jitter in `[0, max)` milliseconds, zero when `max` is zero
#[inline]
pub fn jitter_ms<R: Rng + ?Sized>(rng: &mut R, max: u64) -> u64 {
    if max == 0 { 0 } else { rng.random_range(0..max) }
}
