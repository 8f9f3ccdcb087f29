//! Session host
//!
//! Owns the simulation state, drives the tick and movement timers from a
//! single `update(now)` call and routes outcomes to progression, audio and
//! navigation signals.

use rand::Rng;

use crate::audio::{AudioSink, SilentAudio, SoundCue};
use crate::consts::*;
use crate::progression::ProgressionStore;
use crate::settings::Settings;
use crate::sim::tutorial::{self, Controls};
use crate::sim::{self, Direction, GameEvent, GameState, LevelSetup, SessionPhase};

/// Navigation requests for the surrounding app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Won { level: u32, score: u64 },
    Lost { level: u32, was_tutorial: bool },
    TutorialFinished,
}

/// Tutorial overlay contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TutorialPrompt {
    pub step: u8,
    pub text: &'static str,
    pub controls: Controls,
    pub can_advance: bool,
}

/// Read-only HUD view of the session
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub phase: SessionPhase,
    pub level: u32,
    pub score: u64,
    pub health: u32,
    pub shovels: u32,
    pub boss_health_fraction: Option<f32>,
    pub shield_active: bool,
    pub speed_boost_active: bool,
    pub plots_filled: usize,
    pub plots_total: usize,
    pub tutorial: Option<TutorialPrompt>,
}

/// One play session on top of a progression store
pub struct Game<S: ProgressionStore> {
    state: GameState,
    store: S,
    audio: Box<dyn AudioSink>,
    tick_ms: u64,
    move_step_ms: u64,
    /// Next simulation tick (None = disarmed)
    next_tick_ms: Option<u64>,
    /// Next held-direction step (None = disarmed)
    next_move_ms: Option<u64>,
    /// Last outcome, used to pick what a retry restarts
    last_lost_tutorial: bool,
}

impl<S: ProgressionStore> Game<S> {
    pub fn new(settings: &Settings, store: S) -> Self {
        let seed = settings.seed.unwrap_or_else(|| rand::rng().random());
        let (tick_ms, move_step_ms) = settings.cadences();
        log::info!("New session (seed {})", seed);
        Self {
            state: GameState::new(seed, settings.playfield()),
            store,
            audio: Box::new(SilentAudio),
            tick_ms,
            move_step_ms,
            next_tick_ms: None,
            next_move_ms: None,
            last_lost_tutorial: false,
        }
    }

    /// Replace the audio sink
    pub fn with_audio(mut self, audio: impl AudioSink + 'static) -> Self {
        self.audio = Box::new(audio);
        self
    }

    /// Load `level` with the store's upgrades applied and start the clock
    pub fn start_level(&mut self, level: u32, now_ms: u64) -> Vec<Signal> {
        let setup = LevelSetup::resolve(level, self.store.upgrades());
        sim::start_level(&mut self.state, &setup, now_ms);
        self.next_tick_ms = Some(now_ms + self.tick_ms);
        self.next_move_ms = None;
        self.process_events()
    }

    pub fn start_tutorial(&mut self, now_ms: u64) -> Vec<Signal> {
        self.start_level(TUTORIAL_LEVEL, now_ms)
    }

    /// Restart after a loss: the tutorial if that is what was lost
    pub fn retry(&mut self, now_ms: u64) -> Vec<Signal> {
        if self.last_lost_tutorial {
            self.start_tutorial(now_ms)
        } else {
            let level = self.state.level.max(1);
            self.start_level(level, now_ms)
        }
    }

    /// Continue to the level after the current one
    ///
    /// The tutorial leads into level 1. Nothing follows the boss level, so
    /// this is a no-op there.
    pub fn next_level(&mut self, now_ms: u64) -> Vec<Signal> {
        let level = match self.state.level {
            TUTORIAL_LEVEL => 1,
            BOSS_LEVEL => return Vec::new(),
            level => (level + 1).clamp(1, BOSS_LEVEL),
        };
        self.start_level(level, now_ms)
    }

    /// Disarm both timers; the state is left as is
    pub fn stop(&mut self) {
        self.next_tick_ms = None;
        self.next_move_ms = None;
        self.state.player.intent = None;
    }

    /// Press or release a direction
    ///
    /// A press moves one step immediately and then repeats on the movement
    /// cadence until released.
    pub fn handle_directional_input(
        &mut self,
        direction: Direction,
        pressed: bool,
        now_ms: u64,
    ) -> Vec<Signal> {
        if sim::set_direction(&mut self.state, direction, pressed) {
            sim::move_step(&mut self.state, now_ms);
            self.next_move_ms = Some(now_ms + self.move_step_ms);
        } else if self.state.player.intent.is_none() {
            self.next_move_ms = None;
        }
        self.process_events()
    }

    pub fn handle_throw(&mut self) -> Vec<Signal> {
        sim::throw_shovel(&mut self.state);
        self.process_events()
    }

    /// The tutorial's "next" / "end" button
    pub fn tutorial_next(&mut self, now_ms: u64) -> Vec<Signal> {
        if tutorial::advance(&mut self.state) && self.state.phase.is_simulating() {
            // Script steps keep the clock running
            self.next_tick_ms.get_or_insert(now_ms + self.tick_ms);
        }
        self.process_events()
    }

    /// Run every tick and movement step due by `now_ms`, oldest first
    ///
    /// Each timer runs at most [`MAX_CATCHUP_STEPS`] times per call; any
    /// backlog beyond that is dropped.
    pub fn update(&mut self, now_ms: u64) -> Vec<Signal> {
        let mut ticks = 0;
        let mut moves = 0;

        loop {
            if !self.state.phase.is_simulating() {
                self.next_tick_ms = None;
                self.next_move_ms = None;
                break;
            }
            if self.state.player.intent.is_none() {
                self.next_move_ms = None;
            }

            let tick_due = self
                .next_tick_ms
                .filter(|&at| at <= now_ms && ticks < MAX_CATCHUP_STEPS);
            let move_due = self
                .next_move_ms
                .filter(|&at| at <= now_ms && moves < MAX_CATCHUP_STEPS);

            match (tick_due, move_due) {
                (None, None) => break,
                (Some(tick_at), Some(move_at)) if move_at < tick_at => {
                    self.run_move(move_at);
                    moves += 1;
                }
                (Some(tick_at), _) => {
                    self.run_tick(tick_at);
                    ticks += 1;
                }
                (None, Some(move_at)) => {
                    self.run_move(move_at);
                    moves += 1;
                }
            }
        }

        if let Some(at) = self.next_tick_ms.filter(|&at| at <= now_ms) {
            log::debug!("Dropping {} ms of tick backlog", now_ms - at);
            self.next_tick_ms = Some(now_ms + self.tick_ms);
        }
        if let Some(at) = self.next_move_ms.filter(|&at| at <= now_ms) {
            log::debug!("Dropping {} ms of movement backlog", now_ms - at);
            self.next_move_ms = Some(now_ms + self.move_step_ms);
        }

        self.process_events()
    }

    fn run_tick(&mut self, at: u64) {
        sim::tick(&mut self.state, at);
        self.next_tick_ms = Some(at + self.tick_ms);
    }

    fn run_move(&mut self, at: u64) {
        sim::move_step(&mut self.state, at);
        self.next_move_ms = Some(at + self.move_step_ms);
    }

    fn process_events(&mut self) -> Vec<Signal> {
        let mut signals = Vec::new();
        for event in self.state.drain_events() {
            if let Some(cue) = SoundCue::for_event(&event) {
                self.audio.play(cue);
            }
            match event {
                GameEvent::LevelWon { level, score } => {
                    self.bank_win(level, score);
                    signals.push(Signal::Won { level, score });
                }
                GameEvent::LevelLost {
                    level,
                    was_tutorial,
                } => {
                    self.last_lost_tutorial = was_tutorial;
                    self.stop();
                    signals.push(Signal::Lost {
                        level,
                        was_tutorial,
                    });
                }
                GameEvent::TutorialFinished => {
                    self.stop();
                    signals.push(Signal::TutorialFinished);
                }
                _ => {}
            }
        }
        signals
    }

    fn bank_win(&mut self, level: u32, score: u64) {
        self.stop();
        self.last_lost_tutorial = false;
        match level {
            TUTORIAL_LEVEL => return,
            BOSS_LEVEL => self.store.add_score(score),
            _ => {
                self.store.add_score(score);
                self.store.unlock_level(level + 1);
            }
        }
        if let Err(e) = self.store.persist() {
            log::warn!("Failed to save progression: {}", e);
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        Snapshot {
            phase: state.phase,
            level: state.level,
            score: state.score,
            health: state.player.health,
            shovels: state.player.shovels,
            boss_health_fraction: state.boss_health_fraction(),
            shield_active: state.player.shield_active(),
            speed_boost_active: state.player.speed_boost_active(),
            plots_filled: state.filled_plots(),
            plots_total: state.plots.len(),
            tutorial: state.phase.tutorial().map(|cursor| {
                let script = cursor.script();
                TutorialPrompt {
                    step: cursor.step.number(),
                    text: script.text,
                    controls: script.controls,
                    can_advance: cursor.can_advance(),
                }
            }),
        }
    }

    pub fn score(&self) -> u64 {
        self.state.score
    }

    pub fn health(&self) -> u32 {
        self.state.player.health
    }

    pub fn shovels(&self) -> u32 {
        self.state.player.shovels
    }

    pub fn boss_health_fraction(&self) -> Option<f32> {
        self.state.boss_health_fraction()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
