//! Space Farmer headless runner
//!
//! Plays one level with a simple autopilot and logs the outcome. The level id
//! comes from the first argument (default 1; 99 runs the tutorial script).

use std::path::Path;

use glam::Vec2;

use space_farmer::audio::LogAudio;
use space_farmer::consts::*;
use space_farmer::progression::{Progression, ProgressionStore};
use space_farmer::sim::{Direction, GameState, PlotState, SessionPhase};
use space_farmer::{Game, Settings, Signal};

const SETTINGS_FILE: &str = "space_farmer_settings.json";
const PROGRESS_FILE: &str = "space_farmer_progress.json";
/// Host frame length
const FRAME_MS: u64 = 16;
/// Give up after this much simulated time
const TIME_LIMIT_MS: u64 = 180_000;

/// Greedy player: plant, harvest, throw at whatever is overhead
#[derive(Default)]
struct Autopilot {
    held: Option<Direction>,
    last_pos: Vec2,
    stuck_frames: u32,
    detour: Option<(Direction, u32)>,
}

impl Autopilot {
    fn target(state: &GameState) -> Option<Vec2> {
        let me = state.player.center();
        let nearest = |wanted: PlotState| {
            state
                .plots
                .iter()
                .filter(|p| p.state == wanted)
                .map(|p| p.aabb().center())
                .min_by(|a, b| a.distance_squared(me).total_cmp(&b.distance_squared(me)))
        };
        if let Some(boss) = &state.boss {
            return Some(Vec2::new(boss.aabb().center().x, me.y));
        }
        nearest(PlotState::Empty).or_else(|| nearest(PlotState::Planted))
    }

    fn steer(&mut self, state: &GameState) -> Option<Direction> {
        let pos = state.player.pos;
        if pos == self.last_pos {
            self.stuck_frames += 1;
        } else {
            self.stuck_frames = 0;
        }
        self.last_pos = pos;

        if let Some((direction, frames)) = self.detour {
            if frames > 0 {
                self.detour = Some((direction, frames - 1));
                return Some(direction);
            }
            self.detour = None;
        }
        if self.stuck_frames > 12 {
            self.stuck_frames = 0;
            let sideways = match self.held {
                Some(Direction::Left | Direction::Right) => Direction::Up,
                _ => Direction::Left,
            };
            self.detour = Some((sideways, 20));
            return Some(sideways);
        }

        let delta = Self::target(state)? - state.player.center();
        if delta.length() < 8.0 {
            return None;
        }
        let direction = if delta.x.abs() > delta.y.abs() {
            if delta.x < 0.0 { Direction::Left } else { Direction::Right }
        } else if delta.y < 0.0 {
            Direction::Up
        } else {
            Direction::Down
        };
        Some(direction)
    }

    fn should_throw(state: &GameState) -> bool {
        if state.player.shovels == 0 {
            return false;
        }
        let x = state.player.center().x;
        let top = state.player.pos.y;
        let overhead = |center: Vec2, half: f32| (center.x - x).abs() < half && center.y < top;
        state.aliens.iter().any(|a| overhead(a.aabb().center(), ALIEN_SIZE / 2.0))
            || state
                .boss
                .as_ref()
                .is_some_and(|b| overhead(b.aabb().center(), BOSS_SIZE / 2.0))
    }
}

fn main() {
    env_logger::init();
    log::info!("Space Farmer (headless) starting...");

    let level = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<u32>().ok())
        .unwrap_or(1);

    let settings = Settings::load(Path::new(SETTINGS_FILE));
    let progression = Progression::load(PROGRESS_FILE);
    log::info!(
        "Banked score {}, highest level {}",
        progression.total_score(),
        progression.highest_level_unlocked()
    );

    let audio = LogAudio::from_settings(&settings);
    let mut game = Game::new(&settings, progression).with_audio(audio);
    let mut autopilot = Autopilot::default();

    let mut now = 0;
    let mut signals = if level == TUTORIAL_LEVEL {
        game.start_tutorial(now)
    } else {
        game.start_level(level, now)
    };

    let mut last_throw = 0;
    while signals.is_empty() && now < TIME_LIMIT_MS {
        now += FRAME_MS;

        if let SessionPhase::Tutorial(cursor) = game.phase() {
            if cursor.can_advance() {
                signals.extend(game.tutorial_next(now));
                continue;
            }
        }

        let wanted = autopilot.steer(game.state());
        if wanted != autopilot.held {
            if let Some(old) = autopilot.held.take() {
                signals.extend(game.handle_directional_input(old, false, now));
            }
            if let Some(new) = wanted {
                signals.extend(game.handle_directional_input(new, true, now));
                autopilot.held = Some(new);
            }
        }

        if now - last_throw >= 300 && Autopilot::should_throw(game.state()) {
            last_throw = now;
            signals.extend(game.handle_throw());
        }

        signals.extend(game.update(now));
    }

    let snapshot = game.snapshot();
    match signals.first() {
        Some(Signal::Won { level, score }) => {
            log::info!("Level {} won with score {}", level, score);
            println!("✓ Level {} won (score {})", level, score);
        }
        Some(Signal::Lost { level, .. }) => {
            log::info!("Level {} lost with score {}", level, snapshot.score);
            println!("✗ Level {} lost (score {})", level, snapshot.score);
        }
        Some(Signal::TutorialFinished) => println!("✓ Tutorial finished"),
        None => println!(
            "… Gave up after {} s: {}/{} plots, health {}",
            TIME_LIMIT_MS / 1000,
            snapshot.plots_filled,
            snapshot.plots_total,
            snapshot.health
        ),
    }
    println!(
        "Banked score {}, highest level {}",
        game.store().total_score(),
        game.store().highest_level_unlocked()
    );
}
