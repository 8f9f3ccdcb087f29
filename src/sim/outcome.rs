//! Level outcome transitions
//!
//! `Playing` (or an active tutorial) moves to `Won` or `Lost` at most once.
//! Every entry point here is guarded so repeated triggers in the same tick,
//! or after the fact, change nothing and emit nothing.

use super::state::{GameEvent, GameState, SessionPhase};
use super::tutorial::{self, Gate};
use crate::consts::*;

/// Apply one point of damage to the player unless shielded
pub fn damage_player(state: &mut GameState) {
    if !state.phase.is_simulating() || state.player.health == 0 {
        return;
    }
    if state.player.shield_active() {
        state.emit(GameEvent::ShieldBlocked);
        return;
    }

    state.player.health -= 1;
    let health = state.player.health;
    state.emit(GameEvent::PlayerHit { health });
    log::debug!("Player hit, health {}", health);
    if health == 0 {
        fail_level(state);
    }
}

/// Enter `Won` for a regular or boss level
pub fn complete_level(state: &mut GameState) {
    if state.phase != SessionPhase::Playing {
        return;
    }
    state.phase = SessionPhase::Won;
    state.player.intent = None;
    state.bullets.release_all();
    state.shovels.release_all();

    let (level, score) = (state.level, state.score);
    state.emit(GameEvent::LevelWon { level, score });
    log::info!("Level {} complete, score {}", level, score);
}

/// Enter `Lost`
pub fn fail_level(state: &mut GameState) {
    if !state.phase.is_simulating() {
        return;
    }
    let was_tutorial = state.phase.tutorial().is_some();
    state.phase = SessionPhase::Lost;
    state.player.intent = None;

    let level = state.level;
    state.emit(GameEvent::LevelLost { level, was_tutorial });
    log::info!("Level {} lost (tutorial: {})", level, was_tutorial);
}

/// Finish the level when every plot is planted or harvested
///
/// In the tutorial a full field only unlocks the script's next step.
pub fn check_plot_quota(state: &mut GameState) {
    if state.plots.is_empty() || state.filled_plots() < state.plots.len() {
        return;
    }
    if state.phase.tutorial().is_some() {
        state.emit(GameEvent::PlotsFilled);
        tutorial::open_gate(state, Gate::PlotsFilled);
        return;
    }
    complete_level(state);
}

/// Award the boss bonus and win
pub fn defeat_boss(state: &mut GameState) {
    if state.phase != SessionPhase::Playing {
        return;
    }
    state.score += BOSS_KILL_BONUS;
    state.emit(GameEvent::BossDefeated);
    log::info!("Boss defeated");
    complete_level(state);
}
