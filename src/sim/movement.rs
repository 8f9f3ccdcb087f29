//! Player movement and plot interaction

use super::collision::overlaps;
use super::outcome;
use super::state::{GameEvent, GameState, PlotState};
use super::tutorial::{self, Gate};
use crate::consts::*;

/// Move the player one step in the held direction
///
/// The step is clamped to the playfield band and reverted entirely when it
/// would overlap an obstacle or the boss. Returns whether the player moved.
pub fn step_player(state: &mut GameState) -> bool {
    if !state.phase.is_simulating() {
        return false;
    }
    let Some(direction) = state.player.intent else {
        return false;
    };

    let player = &state.player;
    let delta = direction.vector() * player.speed * player.movement_factor;
    let previous = player.pos;
    let mut next = previous + delta;
    next.x = next.x.clamp(0.0, (state.field.width - PLAYER_WIDTH).max(0.0));
    next.y = next
        .y
        .clamp(state.field.top, (state.field.bottom - PLAYER_HEIGHT).max(state.field.top));

    state.player.pos = next;
    let hitbox = state.player.hitbox();
    let blocked = state
        .obstacles
        .iter()
        .any(|obstacle| overlaps(&hitbox, &obstacle.hitbox()))
        || state
            .boss
            .as_ref()
            .is_some_and(|boss| overlaps(&hitbox, &boss.hitbox()));
    if blocked {
        state.player.pos = previous;
        return false;
    }
    if next == previous {
        return false;
    }

    state.emit(GameEvent::PlayerMoved);
    tutorial::open_gate(state, Gate::Moved);
    update_plots(state);
    true
}

/// Transition plots the player has just stepped onto
///
/// Only the rising edge of an overlap counts, so standing still on a plot
/// never advances it twice.
pub fn update_plots(state: &mut GameState) {
    let hitbox = state.player.hitbox();
    let mut planted = false;
    let mut gained = 0;
    let mut events = Vec::new();

    for plot in state.plots.iter_mut() {
        let inside = overlaps(&hitbox, &plot.hitbox());
        let entered = inside && !plot.occupied;
        plot.occupied = inside;
        if !entered {
            continue;
        }
        match plot.state.next() {
            Some(PlotState::Planted) => {
                plot.state = PlotState::Planted;
                gained += PLANT_SCORE;
                planted = true;
                events.push(GameEvent::Planted { plot: plot.id });
            }
            Some(PlotState::Harvested) => {
                plot.state = PlotState::Harvested;
                gained += HARVEST_SCORE;
                events.push(GameEvent::Harvested { plot: plot.id });
            }
            _ => {}
        }
    }

    state.score += gained;
    state.events.extend(events);
    if planted {
        outcome::check_plot_quota(state);
    }
}
