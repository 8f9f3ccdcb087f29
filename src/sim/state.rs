//! Game state and core simulation types
//!
//! The simulation owns every entity collection exclusively. Projectiles,
//! shovels and power-ups live in fixed pools; everything else is a plain `Vec`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Hitbox};
use super::levels::{LevelConfig, ObstacleKind};
use super::pool::Pool;
use super::tutorial::TutorialCursor;
use crate::consts::*;

/// Where the session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No level loaded
    #[default]
    Idle,
    /// Regular or boss level in progress
    Playing,
    /// Tutorial level in progress, at the given script position
    Tutorial(TutorialCursor),
    /// Level cleared (terminal)
    Won,
    /// Player ran out of health (terminal)
    Lost,
}

impl SessionPhase {
    /// Whether ticks should advance the world
    pub fn is_simulating(&self) -> bool {
        match self {
            SessionPhase::Playing => true,
            SessionPhase::Tutorial(cursor) => !cursor.is_victory(),
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Won | SessionPhase::Lost)
    }

    pub fn tutorial(&self) -> Option<TutorialCursor> {
        match self {
            SessionPhase::Tutorial(cursor) => Some(*cursor),
            _ => None,
        }
    }
}

/// Playable area in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
    /// Bottom of the HUD; nothing is placed above this line
    pub top: f32,
    /// Top of the control pad; nothing is placed below this line
    pub bottom: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self {
            width: 1080.0,
            height: 2340.0,
            top: 220.0,
            bottom: 1800.0,
        }
    }
}

impl Playfield {
    /// Whether a projectile anchored at `pos` is still on screen
    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.width && pos.y >= 0.0 && pos.y <= self.height
    }

    /// Where the player stands at level start
    pub fn player_start(&self) -> Vec2 {
        Vec2::new(
            self.width / 2.0 - PLAYER_WIDTH / 2.0,
            self.bottom - PLAYER_HEIGHT - PLAYER_START_GAP,
        )
    }
}

/// Directional input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Unit step in screen space (y down)
    pub fn vector(self) -> Vec2 {
        match self {
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
        }
    }
}

/// The farmer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub health: u32,
    pub shovels: u32,
    /// Pixels per movement step before multipliers
    pub speed: f32,
    /// Current multiplier (terrain, speed boost)
    pub movement_factor: f32,
    /// Multiplier to restore when a speed boost ends
    pub base_movement_factor: f32,
    /// Shield expiry (simulation ms); `Some` while shielded
    pub shield_until: Option<u64>,
    /// Speed boost expiry (simulation ms); `Some` while boosted
    pub speed_boost_until: Option<u64>,
    /// Direction currently held, if any
    pub intent: Option<Direction>,
    /// Hidden players cannot collide (early tutorial steps)
    pub visible: bool,
}

impl Player {
    pub fn new(field: &Playfield) -> Self {
        Self {
            pos: field.player_start(),
            health: PLAYER_BASE_HEALTH,
            shovels: 0,
            speed: PLAYER_BASE_SPEED,
            movement_factor: 1.0,
            base_movement_factor: 1.0,
            shield_until: None,
            speed_boost_until: None,
            intent: None,
            visible: true,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT))
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::player(self.aabb(), self.visible)
    }

    pub fn center(&self) -> Vec2 {
        self.aabb().center()
    }

    pub fn shield_active(&self) -> bool {
        self.shield_until.is_some()
    }

    pub fn speed_boost_active(&self) -> bool {
        self.speed_boost_until.is_some()
    }
}

/// Linear interpolation between two positions over a fixed window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween {
    pub from: Vec2,
    pub to: Vec2,
    pub start_ms: u64,
    pub duration_ms: u64,
}

impl Tween {
    /// Position at `now_ms` (clamped to the endpoints)
    pub fn sample(&self, now_ms: u64) -> Vec2 {
        if self.duration_ms == 0 || now_ms >= self.start_ms + self.duration_ms {
            return self.to;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms);
        let t = elapsed as f32 / self.duration_ms as f32;
        self.from.lerp(self.to, t)
    }

    pub fn is_finished(&self, now_ms: u64) -> bool {
        now_ms >= self.start_ms + self.duration_ms
    }
}

/// A regular enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alien {
    pub id: u32,
    pub pos: Vec2,
    /// Shovel hits taken so far (always below `max_hits` while alive)
    pub hits: u32,
    pub max_hits: u32,
    pub next_move_ms: u64,
    pub next_shoot_ms: u64,
    /// Active glide toward the last chosen target
    pub tween: Option<Tween>,
    /// Shows the damaged sprite after a non-lethal hit
    pub damaged: bool,
}

impl Alien {
    pub fn aabb(&self) -> Aabb {
        Aabb::square(self.pos, ALIEN_SIZE)
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::of(self.aabb())
    }

    /// Needs more than one hit (drawn as the tougher variant)
    pub fn is_tough(&self) -> bool {
        self.max_hits > 1
    }

    pub fn is_dead(&self) -> bool {
        self.hits >= self.max_hits
    }
}

/// The boss-level enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub pos: Vec2,
    pub health: u32,
    pub max_health: u32,
    pub next_shoot_ms: u64,
}

impl Boss {
    pub fn aabb(&self) -> Aabb {
        Aabb::square(self.pos, BOSS_SIZE)
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::of(self.aabb())
    }

    /// Remaining health as a fraction in `[0, 1]`
    pub fn health_fraction(&self) -> f32 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f32 / self.max_health as f32
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Enemy projectile; `step` is fixed at spawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub step: Vec2,
}

impl Bullet {
    pub fn hitbox(&self) -> Hitbox {
        Hitbox::of(Aabb::square(self.pos, BULLET_SIZE))
    }
}

/// Thrown shovel, travels straight up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shovel {
    pub pos: Vec2,
}

impl Shovel {
    pub fn hitbox(&self) -> Hitbox {
        Hitbox::of(Aabb::square(self.pos, SHOVEL_SIZE))
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Shield,
    SpeedBoost,
}

/// A power-up waiting to be picked up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub pos: Vec2,
    pub kind: PowerUpKind,
}

impl PowerUp {
    pub fn hitbox(&self) -> Hitbox {
        Hitbox::of(Aabb::square(self.pos, POWERUP_SIZE))
    }
}

/// Plot progression; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlotState {
    #[default]
    Empty,
    Planted,
    Harvested,
}

impl PlotState {
    /// The state an entry by the player moves this plot to, if any
    pub fn next(self) -> Option<PlotState> {
        match self {
            PlotState::Empty => Some(PlotState::Planted),
            PlotState::Planted => Some(PlotState::Harvested),
            PlotState::Harvested => None,
        }
    }

    /// Counts toward the level's planting quota
    pub fn is_filled(self) -> bool {
        self != PlotState::Empty
    }
}

/// A planting site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plot {
    pub id: u32,
    pub pos: Vec2,
    pub state: PlotState,
    /// Player was overlapping this plot after the last movement step
    pub occupied: bool,
}

impl Plot {
    pub fn aabb(&self) -> Aabb {
        Aabb::square(self.pos, PLOT_SIZE)
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::of(self.aabb())
    }
}

/// Immovable terrain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub pos: Vec2,
    pub kind: ObstacleKind,
}

impl Obstacle {
    pub fn aabb(&self) -> Aabb {
        Aabb::square(self.pos, OBSTACLE_SIZE)
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::of(self.aabb())
    }
}

/// Things that happened during a tick or input step, drained by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStarted { level: u32 },
    PlayerMoved,
    BulletFired,
    PlayerHit { health: u32 },
    ShieldBlocked,
    ShovelThrown { remaining: u32 },
    OutOfShovels,
    Planted { plot: u32 },
    Harvested { plot: u32 },
    PlotsFilled,
    AlienSpawned { id: u32 },
    AlienDamaged { id: u32, hits: u32 },
    AlienKilled { id: u32 },
    PowerUpDropped { kind: PowerUpKind },
    PowerUpCollected { kind: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    BossDamaged { health: u32, max_health: u32 },
    BossDefeated,
    LevelWon { level: u32, score: u64 },
    LevelLost { level: u32, was_tutorial: bool },
    TutorialStep { step: u8 },
    TutorialVictory,
    TutorialFinished,
}

/// Complete simulation state for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed
    pub seed: u64,
    /// RNG (seeded; all randomness flows through here)
    pub rng: Pcg32,
    pub field: Playfield,
    pub phase: SessionPhase,
    /// Current level id
    pub level: u32,
    pub config: LevelConfig,
    /// Score earned this level
    pub score: u64,
    /// Simulation time of the last tick or input step
    pub time_ms: u64,
    pub player: Player,
    pub aliens: Vec<Alien>,
    pub boss: Option<Boss>,
    pub plots: Vec<Plot>,
    pub obstacles: Vec<Obstacle>,
    pub bullets: Pool<Bullet>,
    pub shovels: Pool<Shovel>,
    pub power_ups: Pool<PowerUp>,
    /// Pending alien respawn (armed on population deficit)
    pub respawn_at_ms: Option<u64>,
    /// Events since the host last drained them
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create an idle session with the given seed and playfield
    pub fn new(seed: u64, field: Playfield) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            field,
            phase: SessionPhase::Idle,
            level: 0,
            config: LevelConfig::default(),
            score: 0,
            time_ms: 0,
            player: Player::new(&field),
            aliens: Vec::new(),
            boss: None,
            plots: Vec::new(),
            obstacles: Vec::new(),
            bullets: Pool::with_capacity(MAX_BULLETS),
            shovels: Pool::with_capacity(MAX_SHOVELS),
            power_ups: Pool::with_capacity(MAX_POWERUPS),
            respawn_at_ms: None,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every pending event
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_tutorial(&self) -> bool {
        self.level == TUTORIAL_LEVEL
    }

    /// Plots that are planted or harvested
    pub fn filled_plots(&self) -> usize {
        self.plots.iter().filter(|p| p.state.is_filled()).count()
    }

    /// Boss health as a fraction, when a boss is present
    pub fn boss_health_fraction(&self) -> Option<f32> {
        self.boss.as_ref().map(Boss::health_fraction)
    }

    /// Remove every level entity and return pooled instances to idle
    pub fn clear_entities(&mut self) {
        self.aliens.clear();
        self.boss = None;
        self.plots.clear();
        self.obstacles.clear();
        self.bullets.release_all();
        self.shovels.release_all();
        self.power_ups.release_all();
        self.respawn_at_ms = None;
        self.player.pos = self.field.player_start();
        self.player.intent = None;
    }
}
