//! Game settings and preferences
//!
//! Stored as JSON beside the progression file. A missing or broken file is
//! never fatal: the defaults are used instead.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{MOVE_STEP_MS, TICK_MS};
use crate::error::SaveError;
use crate::sim::Playfield;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Screen ===
    /// Playfield width in pixels
    pub width: f32,
    /// Playfield height in pixels
    pub height: f32,
    /// Height of the HUD strip at the top
    pub top_margin: f32,
    /// Height of the control pad area at the bottom
    pub bottom_margin: f32,

    // === Timing ===
    /// Simulation tick cadence (ms)
    pub tick_ms: u64,
    /// Held-direction movement cadence (ms)
    pub move_step_ms: u64,
    /// Fixed RNG seed; random per run when unset
    pub seed: Option<u64>,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let field = Playfield::default();
        Self {
            width: field.width,
            height: field.height,
            top_margin: field.top,
            bottom_margin: field.height - field.bottom,

            tick_ms: TICK_MS,
            move_step_ms: MOVE_STEP_MS,
            seed: None,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    /// Playable area derived from the screen size and margins
    pub fn playfield(&self) -> Playfield {
        Playfield {
            width: self.width,
            height: self.height,
            top: self.top_margin,
            bottom: self.height - self.bottom_margin,
        }
    }

    /// Effective effects volume (0 when muted)
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            (self.master_volume * self.sfx_volume).clamp(0.0, 1.0)
        }
    }

    /// Cadences with zero replaced by the built-in defaults
    pub fn cadences(&self) -> (u64, u64) {
        let tick = if self.tick_ms == 0 { TICK_MS } else { self.tick_ms };
        let step = if self.move_step_ms == 0 {
            MOVE_STEP_MS
        } else {
            self.move_step_ms
        };
        (tick, step)
    }

    /// Read settings from `path`
    pub fn try_load(path: &Path) -> Result<Self, SaveError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load settings from `path`, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(SaveError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write settings to `path` as pretty JSON
    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
