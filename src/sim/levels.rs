//! Per-level configuration table
//!
//! Pure data: level id in, base parameters out. Permanent upgrades are folded
//! in by [`LevelSetup::resolve`].

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Planet theme for a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Planet {
    #[default]
    Green,
    Purple,
    Ice,
}

/// Obstacle flavour placed on a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    #[default]
    None,
    Boulder,
    Iceberg,
}

/// Immutable per-level parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub planet: Planet,
    pub plots_to_plant: u32,
    pub number_of_aliens: u32,
    /// Shovel hits needed to kill one alien
    pub alien_health: u32,
    pub shovel_count: u32,
    pub alien_move_delay_ms: u64,
    pub alien_speed_factor: f32,
    pub obstacle: ObstacleKind,
    pub number_of_obstacles: u32,
    /// Terrain multiplier on player speed (ice < 1)
    pub movement_factor: f32,
    pub max_boss_health: u32,
    pub is_boss_level: bool,
}

impl Default for LevelConfig {
    /// Fallback record for ids that have no entry
    fn default() -> Self {
        Self {
            planet: Planet::Green,
            plots_to_plant: 5,
            number_of_aliens: 1,
            alien_health: 1,
            shovel_count: 0,
            alien_move_delay_ms: 2000,
            alien_speed_factor: 1.0,
            obstacle: ObstacleKind::None,
            number_of_obstacles: 0,
            movement_factor: 1.0,
            max_boss_health: 1,
            is_boss_level: false,
        }
    }
}

impl LevelConfig {
    /// Base parameters for `level` (unknown ids get [`LevelConfig::default`])
    pub fn for_level(level: u32) -> Self {
        let base = Self::default();
        match level {
            TUTORIAL_LEVEL => Self {
                plots_to_plant: 2,
                number_of_aliens: 0,
                shovel_count: 2,
                alien_speed_factor: 0.5,
                alien_move_delay_ms: 4000,
                ..base
            },
            1..=5 => Self::green(level),
            6..=10 => Self::purple(level),
            11..=LAST_REGULAR_LEVEL => Self::ice(level),
            BOSS_LEVEL => Self {
                planet: Planet::Ice,
                plots_to_plant: 0,
                number_of_aliens: 0,
                shovel_count: 20,
                max_boss_health: 15,
                is_boss_level: true,
                ..base
            },
            _ => base,
        }
    }

    fn green(level: u32) -> Self {
        // (plots, aliens, speed factor, move delay)
        let (plots, aliens, speed, delay) = match level {
            1 => (5, 1, 0.6, 2700),
            2 => (5, 1, 0.7, 2600),
            3 => (6, 2, 0.8, 2500),
            4 => (6, 2, 0.8, 2520),
            _ => (7, 2, 0.8, 2500),
        };
        Self {
            planet: Planet::Green,
            plots_to_plant: plots,
            number_of_aliens: aliens,
            alien_speed_factor: speed,
            alien_move_delay_ms: delay,
            ..Self::default()
        }
    }

    fn purple(level: u32) -> Self {
        // (plots, aliens, alien health, shovels, speed factor, move delay, obstacles)
        let (plots, aliens, health, shovels, speed, delay, obstacles) = match level {
            6 => (8, 2, 1, 3, 1.3, 1900, 2),
            7 => (8, 2, 1, 3, 1.3, 1800, 3),
            8 => (8, 2, 1, 3, 1.3, 1750, 3),
            9 => (9, 3, 1, 3, 1.4, 1700, 4),
            _ => (9, 3, 2, 5, 1.4, 1650, 3),
        };
        Self {
            planet: Planet::Purple,
            plots_to_plant: plots,
            number_of_aliens: aliens,
            alien_health: health,
            shovel_count: shovels,
            alien_speed_factor: speed,
            alien_move_delay_ms: delay,
            obstacle: ObstacleKind::Boulder,
            number_of_obstacles: obstacles,
            ..Self::default()
        }
    }

    fn ice(level: u32) -> Self {
        // (aliens, shovels, speed factor, move delay)
        let (aliens, shovels, speed, delay) = match level {
            11 => (3, 7, 1.1, 1500),
            12 => (4, 10, 1.1, 1450),
            13 => (4, 10, 1.1, 1370),
            14 => (4, 12, 1.0, 1300),
            _ => (5, 12, 1.0, 1200),
        };
        Self {
            planet: Planet::Ice,
            plots_to_plant: 9,
            number_of_aliens: aliens,
            alien_health: 2,
            shovel_count: shovels,
            alien_speed_factor: speed,
            alien_move_delay_ms: delay,
            obstacle: ObstacleKind::Iceberg,
            number_of_obstacles: 3,
            movement_factor: 0.8,
            ..Self::default()
        }
    }

    /// Milliseconds between an alien's moves, after the speed factor
    pub fn alien_move_interval_ms(&self) -> u64 {
        if self.alien_speed_factor > 0.0 {
            (self.alien_move_delay_ms as f32 / self.alien_speed_factor).round() as u64
        } else {
            self.alien_move_delay_ms
        }
    }
}

/// Permanent upgrade levels read from the progression store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upgrades {
    pub health: u32,
    pub shovels: u32,
    pub speed: u32,
}

/// Everything the simulation needs to start a level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSetup {
    pub level: u32,
    pub config: LevelConfig,
    pub player_health: u32,
    pub player_speed: f32,
}

impl LevelSetup {
    /// Look up `level` and apply permanent upgrades on top of its base values
    pub fn resolve(level: u32, upgrades: Upgrades) -> Self {
        let mut config = LevelConfig::for_level(level);
        config.shovel_count += upgrades.shovels;
        Self {
            level,
            config,
            player_health: PLAYER_BASE_HEALTH + upgrades.health,
            player_speed: PLAYER_BASE_SPEED + upgrades.speed as f32 * SPEED_PER_UPGRADE,
        }
    }

    pub fn is_tutorial(&self) -> bool {
        self.level == TUTORIAL_LEVEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_levels_are_defined() {
        for level in 1..=LAST_REGULAR_LEVEL {
            let config = LevelConfig::for_level(level);
            assert!(config.plots_to_plant > 0, "level {level}");
            assert!(config.number_of_aliens > 0, "level {level}");
            assert!(!config.is_boss_level);
        }
    }

    #[test]
    fn test_planets_and_obstacles() {
        assert_eq!(LevelConfig::for_level(3).planet, Planet::Green);
        assert_eq!(LevelConfig::for_level(3).obstacle, ObstacleKind::None);
        assert_eq!(LevelConfig::for_level(7).obstacle, ObstacleKind::Boulder);
        assert_eq!(LevelConfig::for_level(7).number_of_obstacles, 3);
        let ice = LevelConfig::for_level(12);
        assert_eq!(ice.obstacle, ObstacleKind::Iceberg);
        assert!((ice.movement_factor - 0.8).abs() < f32::EPSILON);
        assert_eq!(ice.alien_health, 2);
    }

    #[test]
    fn test_boss_and_tutorial() {
        let boss = LevelConfig::for_level(BOSS_LEVEL);
        assert!(boss.is_boss_level);
        assert_eq!(boss.max_boss_health, 15);
        assert_eq!(boss.plots_to_plant, 0);

        let tutorial = LevelConfig::for_level(TUTORIAL_LEVEL);
        assert_eq!(tutorial.plots_to_plant, 2);
        assert_eq!(tutorial.number_of_aliens, 0);
        assert_eq!(tutorial.shovel_count, 2);
    }

    #[test]
    fn test_unknown_level_falls_back() {
        assert_eq!(LevelConfig::for_level(0), LevelConfig::default());
        assert_eq!(LevelConfig::for_level(42), LevelConfig::default());
    }

    #[test]
    fn test_upgrades_applied() {
        let upgrades = Upgrades {
            health: 2,
            shovels: 3,
            speed: 4,
        };
        let setup = LevelSetup::resolve(6, upgrades);
        assert_eq!(setup.player_health, 5);
        assert_eq!(setup.config.shovel_count, 6);
        assert!((setup.player_speed - 50.0).abs() < f32::EPSILON);

        let plain = LevelSetup::resolve(6, Upgrades::default());
        assert_eq!(plain.player_health, 3);
        assert_eq!(plain.config.shovel_count, 3);
    }

    #[test]
    fn test_move_interval() {
        let config = LevelConfig::for_level(1);
        assert_eq!(config.alien_move_interval_ms(), 4500);
    }
}
