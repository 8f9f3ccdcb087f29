//! Scripted tutorial overlay
//!
//! The tutorial runs on level 99 with the regular simulation underneath. Each
//! step decides which controls exist, what the overlay says and what lets the
//! player continue.

use serde::{Deserialize, Serialize};

use super::spawn;
use super::state::{GameEvent, GameState, SessionPhase};

/// Script position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TutorialStep {
    Welcome,
    Status,
    Movement,
    Planting,
    Harvesting,
    Obstacles,
    PowerUps,
    Combat,
    /// Scripted alien defeated; simulation halted until the player leaves
    Victory,
}

impl TutorialStep {
    /// 1-based step number shown to the player (victory shares step 8)
    pub fn number(self) -> u8 {
        match self {
            TutorialStep::Welcome => 1,
            TutorialStep::Status => 2,
            TutorialStep::Movement => 3,
            TutorialStep::Planting => 4,
            TutorialStep::Harvesting => 5,
            TutorialStep::Obstacles => 6,
            TutorialStep::PowerUps => 7,
            TutorialStep::Combat | TutorialStep::Victory => 8,
        }
    }

    /// The step a "next" tap leads to; `None` past the end
    pub fn next(self) -> Option<TutorialStep> {
        match self {
            TutorialStep::Welcome => Some(TutorialStep::Status),
            TutorialStep::Status => Some(TutorialStep::Movement),
            TutorialStep::Movement => Some(TutorialStep::Planting),
            TutorialStep::Planting => Some(TutorialStep::Harvesting),
            TutorialStep::Harvesting => Some(TutorialStep::Obstacles),
            TutorialStep::Obstacles => Some(TutorialStep::PowerUps),
            TutorialStep::PowerUps => Some(TutorialStep::Combat),
            TutorialStep::Combat | TutorialStep::Victory => None,
        }
    }
}

/// Gameplay milestones that unlock the "next" button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gate {
    Moved,
    PlotsFilled,
}

/// How a step is left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// "Next" is available immediately
    Tap,
    /// "Next" appears once the gate opens
    TapAfter(Gate),
    /// No button; a gameplay event moves the script on
    AlienDefeated,
    /// "End tutorial" button
    Finish,
}

/// Which controls are on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Controls {
    pub dpad: bool,
    pub throw: bool,
    pub player: bool,
}

/// Static description of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepScript {
    pub text: &'static str,
    pub controls: Controls,
    pub advance: Advance,
}

const HIDDEN: Controls = Controls {
    dpad: false,
    throw: false,
    player: false,
};
const WALKING: Controls = Controls {
    dpad: true,
    throw: false,
    player: true,
};
const ARMED: Controls = Controls {
    dpad: true,
    throw: true,
    player: true,
};

/// Script table
pub fn script(step: TutorialStep) -> StepScript {
    let (text, controls, advance) = match step {
        TutorialStep::Welcome => (
            "Welcome, farmer! Plant every plot on the field and stay clear of alien fire.",
            HIDDEN,
            Advance::Tap,
        ),
        TutorialStep::Status => (
            "Up top are your health and your shovels. Run out of health and the mission is over. Shovels keep you safe.",
            HIDDEN,
            Advance::Tap,
        ),
        TutorialStep::Movement => (
            "Use the arrows to walk around. Give it a try!",
            WALKING,
            Advance::TapAfter(Gate::Moved),
        ),
        TutorialStep::Planting => (
            "Walk onto the brown plots to plant seeds. Plant both to continue.",
            WALKING,
            Advance::TapAfter(Gate::PlotsFilled),
        ),
        TutorialStep::Harvesting => (
            "Step back onto a planted crop to harvest it for bonus points.",
            WALKING,
            Advance::Tap,
        ),
        TutorialStep::Obstacles => (
            "Boulders and icebergs block both you and alien bullets. Plan your route around them.",
            WALKING,
            Advance::Tap,
        ),
        TutorialStep::PowerUps => (
            "Defeated aliens sometimes leave a shield or a speed boost behind. Walk over it to pick it up.",
            ARMED,
            Advance::Tap,
        ),
        TutorialStep::Combat => (
            "Tap throw to hurl a shovel straight up. An alien is coming, take it down!",
            ARMED,
            Advance::AlienDefeated,
        ),
        TutorialStep::Victory => (
            "Threat eliminated. You are ready for the real thing.",
            ARMED,
            Advance::Finish,
        ),
    };
    StepScript {
        text,
        controls,
        advance,
    }
}

/// Where the tutorial is and whether "next" is currently offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorialCursor {
    pub step: TutorialStep,
    /// Gate for the current step has opened
    pub gate_open: bool,
}

impl TutorialCursor {
    pub fn at(step: TutorialStep) -> Self {
        Self {
            step,
            gate_open: false,
        }
    }

    pub fn is_victory(&self) -> bool {
        self.step == TutorialStep::Victory
    }

    pub fn script(&self) -> StepScript {
        script(self.step)
    }

    pub fn controls(&self) -> Controls {
        self.script().controls
    }

    /// Whether the "next" (or "end") button is available
    pub fn can_advance(&self) -> bool {
        match self.script().advance {
            Advance::Tap | Advance::Finish => true,
            Advance::TapAfter(_) => self.gate_open,
            Advance::AlienDefeated => false,
        }
    }
}

/// Put the session on the first step; the level must already be populated
pub fn begin(state: &mut GameState) {
    enter(state, TutorialStep::Welcome);
}

fn enter(state: &mut GameState, step: TutorialStep) {
    let mut cursor = TutorialCursor::at(step);
    let controls = cursor.controls();
    state.player.visible = controls.player;
    if !controls.dpad {
        state.player.intent = None;
    }

    // A field filled early still counts
    if cursor.script().advance == Advance::TapAfter(Gate::PlotsFilled) {
        cursor.gate_open =
            !state.plots.is_empty() && state.filled_plots() == state.plots.len();
    }
    state.phase = SessionPhase::Tutorial(cursor);
    state.emit(GameEvent::TutorialStep {
        step: step.number(),
    });
    log::debug!("Tutorial step {} ({:?})", step.number(), step);

    if step == TutorialStep::Combat && spawn::spawn_alien(state).is_none() {
        log::warn!("No room for the tutorial alien, retrying next tick");
    }
}

/// Place the scripted alien if entering `Combat` found no room for it
///
/// `Combat` only ends on an alien death, so the step needs one on screen.
pub fn ensure_combat_alien(state: &mut GameState) {
    let in_combat = state
        .phase
        .tutorial()
        .is_some_and(|cursor| cursor.step == TutorialStep::Combat);
    if in_combat && state.aliens.is_empty() && spawn::spawn_alien(state).is_some() {
        log::info!("Tutorial alien placed on retry");
    }
}

/// Handle a "next" tap. Returns whether anything changed.
pub fn advance(state: &mut GameState) -> bool {
    let Some(cursor) = state.phase.tutorial() else {
        return false;
    };
    if !cursor.can_advance() {
        return false;
    }
    match cursor.step.next() {
        Some(step) => enter(state, step),
        None => finish(state),
    }
    true
}

/// Mark a gameplay milestone; opens the current step's gate if it matches
pub fn open_gate(state: &mut GameState, gate: Gate) {
    if let SessionPhase::Tutorial(cursor) = &mut state.phase {
        if cursor.script().advance == Advance::TapAfter(gate) && !cursor.gate_open {
            cursor.gate_open = true;
            log::debug!("Tutorial gate {:?} opened", gate);
        }
    }
}

/// React to an alien death. Returns true when the tutorial consumed it.
pub fn alien_defeated(state: &mut GameState) -> bool {
    match state.phase.tutorial() {
        Some(cursor) if cursor.step == TutorialStep::Combat => {
            state.phase = SessionPhase::Tutorial(TutorialCursor::at(TutorialStep::Victory));
            state.player.intent = None;
            state.bullets.release_all();
            state.shovels.release_all();
            state.respawn_at_ms = None;
            state.emit(GameEvent::TutorialVictory);
            log::info!("Tutorial alien defeated");
            true
        }
        Some(_) => true,
        None => false,
    }
}

fn finish(state: &mut GameState) {
    state.clear_entities();
    state.player.visible = true;
    state.phase = SessionPhase::Idle;
    state.emit(GameEvent::TutorialFinished);
    log::info!("Tutorial finished");
}
