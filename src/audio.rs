//! Sound cues
//!
//! The simulation emits events; the host maps them to cues and hands them to
//! an [`AudioSink`]. Playback is fire-and-forget.

use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Enemy fired
    Shoot,
    /// Player lost health
    Hit,
    /// Plot planted or harvested
    Plant,
    /// Level or tutorial cleared
    Victory,
    /// Player ran out of health
    GameOver,
    /// Shovel thrown
    Shovel,
}

impl SoundCue {
    /// The cue a simulation event should trigger, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::BulletFired => Some(SoundCue::Shoot),
            GameEvent::PlayerHit { .. } => Some(SoundCue::Hit),
            GameEvent::Planted { .. } | GameEvent::Harvested { .. } => Some(SoundCue::Plant),
            GameEvent::LevelWon { .. } | GameEvent::TutorialVictory => Some(SoundCue::Victory),
            GameEvent::LevelLost { .. } => Some(SoundCue::GameOver),
            GameEvent::ShovelThrown { .. } => Some(SoundCue::Shovel),
            _ => None,
        }
    }
}

/// Anything that can play cues
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
}

/// Discards every cue
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _cue: SoundCue) {}
}

/// Headless sink that logs cues at the effective volume
#[derive(Debug, Clone)]
pub struct LogAudio {
    master_volume: f32,
    sfx_volume: f32,
    muted: bool,
    played: u64,
}

impl Default for LogAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl LogAudio {
    pub fn new() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            played: 0,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut audio = Self::new();
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_muted(settings.muted);
        audio
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Cues actually played (muted cues are not counted)
    pub fn played(&self) -> u64 {
        self.played
    }
}

impl AudioSink for LogAudio {
    fn play(&mut self, cue: SoundCue) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        self.played += 1;
        log::debug!("♪ {:?} at {:.2}", cue, vol);
    }
}
