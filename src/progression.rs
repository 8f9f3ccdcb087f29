//! Persistent player progression
//!
//! Banked score, permanent upgrades and the highest unlocked level. The
//! simulation only reads upgrade levels; the host banks score and unlocks
//! levels when an outcome is reached.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PurchaseError, SaveError};
use crate::sim::Upgrades;

/// Upgrade shop categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeCategory {
    Health,
    Shovel,
    Speed,
}

impl UpgradeCategory {
    pub const ALL: [UpgradeCategory; 3] = [
        UpgradeCategory::Health,
        UpgradeCategory::Shovel,
        UpgradeCategory::Speed,
    ];

    /// Price of the first purchase
    pub fn base_cost(self) -> u64 {
        match self {
            UpgradeCategory::Health => 500,
            UpgradeCategory::Shovel => 400,
            UpgradeCategory::Speed => 500,
        }
    }

    /// Price of the next purchase when already at `level`
    pub fn cost_at(self, level: u32) -> u64 {
        let base = self.base_cost();
        base + level as u64 * (base / 2)
    }
}

/// Storage the game reads and updates between levels
pub trait ProgressionStore {
    fn upgrade_level(&self, category: UpgradeCategory) -> u32;
    fn total_score(&self) -> u64;
    fn add_score(&mut self, amount: u64);
    /// Deduct up to `amount`; the balance never drops below zero
    fn spend_score(&mut self, amount: u64);
    fn highest_level_unlocked(&self) -> u32;
    /// Raise the unlocked level; lower values are ignored
    fn unlock_level(&mut self, level: u32);
    /// Flush to durable storage
    fn persist(&mut self) -> Result<(), SaveError>;

    /// All upgrade levels at once
    fn upgrades(&self) -> Upgrades {
        Upgrades {
            health: self.upgrade_level(UpgradeCategory::Health),
            shovels: self.upgrade_level(UpgradeCategory::Shovel),
            speed: self.upgrade_level(UpgradeCategory::Speed),
        }
    }
}

/// Progression record, optionally backed by a JSON file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progression {
    pub total_score: u64,
    pub health_level: u32,
    pub shovel_level: u32,
    pub speed_level: u32,
    pub highest_level_unlocked: u32,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            total_score: 0,
            health_level: 0,
            shovel_level: 0,
            speed_level: 0,
            highest_level_unlocked: 1,
            path: None,
        }
    }
}

impl Progression {
    /// In-memory record; `persist` is a no-op
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `path`, starting fresh when the file is missing or unreadable
    ///
    /// Later `persist` calls write back to the same file.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut progression = match Self::read(&path) {
            Ok(progression) => {
                log::info!(
                    "Loaded progression: score {}, level {} unlocked",
                    progression.total_score,
                    progression.highest_level_unlocked
                );
                progression
            }
            Err(SaveError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No progression found, starting fresh");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring progression file {}: {}", path.display(), e);
                Self::default()
            }
        };
        progression.highest_level_unlocked = progression.highest_level_unlocked.max(1);
        progression.path = Some(path);
        progression
    }

    fn read(path: &Path) -> Result<Self, SaveError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write to `path` as JSON
    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::debug!("Progression saved to {}", path.display());
        Ok(())
    }

    fn level_mut(&mut self, category: UpgradeCategory) -> &mut u32 {
        match category {
            UpgradeCategory::Health => &mut self.health_level,
            UpgradeCategory::Shovel => &mut self.shovel_level,
            UpgradeCategory::Speed => &mut self.speed_level,
        }
    }

    /// Price of the next purchase in `category`
    pub fn upgrade_cost(&self, category: UpgradeCategory) -> u64 {
        category.cost_at(self.upgrade_level(category))
    }

    /// Buy one level of `category`, returning the new level
    pub fn purchase_upgrade(&mut self, category: UpgradeCategory) -> Result<u32, PurchaseError> {
        let cost = self.upgrade_cost(category);
        if self.total_score < cost {
            return Err(PurchaseError::InsufficientScore {
                cost,
                available: self.total_score,
            });
        }
        self.spend_score(cost);
        let level = self.level_mut(category);
        *level += 1;
        let level = *level;
        log::info!("Purchased {:?} upgrade level {} for {}", category, level, cost);
        Ok(level)
    }

    /// Wipe all progress (the backing file, if any, is kept)
    pub fn reset(&mut self) {
        let path = self.path.take();
        *self = Self {
            path,
            ..Self::default()
        };
        log::info!("Progression reset");
    }
}

impl ProgressionStore for Progression {
    fn upgrade_level(&self, category: UpgradeCategory) -> u32 {
        match category {
            UpgradeCategory::Health => self.health_level,
            UpgradeCategory::Shovel => self.shovel_level,
            UpgradeCategory::Speed => self.speed_level,
        }
    }

    fn total_score(&self) -> u64 {
        self.total_score
    }

    fn add_score(&mut self, amount: u64) {
        self.total_score = self.total_score.saturating_add(amount);
    }

    fn spend_score(&mut self, amount: u64) {
        self.total_score = self.total_score.saturating_sub(amount);
    }

    fn highest_level_unlocked(&self) -> u32 {
        self.highest_level_unlocked
    }

    fn unlock_level(&mut self, level: u32) {
        if level > self.highest_level_unlocked {
            self.highest_level_unlocked = level;
            log::info!("Unlocked level {}", level);
        }
    }

    fn persist(&mut self) -> Result<(), SaveError> {
        match &self.path {
            Some(path) => self.save(path),
            None => Ok(()),
        }
    }
}
