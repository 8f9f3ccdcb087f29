//! Entity spawning and non-overlapping placement

use glam::Vec2;
use rand::Rng;

use super::collision::Aabb;
use super::levels::ObstacleKind;
use super::state::{Alien, Boss, GameEvent, GameState, Obstacle, Plot, PlotState, PowerUp, PowerUpKind};
use crate::consts::*;
use crate::{jitter_ms, sample_span};

/// Region in which top-left corners may be sampled
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub min: Vec2,
    pub max: Vec2,
}

impl Band {
    pub fn new(x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> Self {
        Self {
            min: Vec2::new(x_min, y_min),
            max: Vec2::new(x_max, y_max),
        }
    }

    /// Uniform point inside the band (degenerate axes collapse to their minimum)
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            sample_span(rng, self.min.x, self.max.x),
            sample_span(rng, self.min.y, self.max.y),
        )
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

/// Randomly place up to `count` squares of side `size` inside `band`
///
/// A candidate is rejected when its rectangle, padded by [`SAFE_PADDING`],
/// intersects any exclusion or anything already placed in this batch. Each
/// entity gets [`MAX_PLACEMENT_ATTEMPTS`] tries; the first entity that runs
/// out ends the batch early.
pub fn place_non_overlapping<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    size: f32,
    band: Band,
    exclusions: &[Aabb],
) -> Vec<Vec2> {
    let mut placed: Vec<Aabb> = Vec::with_capacity(count);

    'entities: for _ in 0..count {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let candidate = Aabb::square(band.sample(rng), size);
            let padded = candidate.expanded(SAFE_PADDING);
            let blocked = exclusions
                .iter()
                .chain(placed.iter())
                .any(|other| padded.intersects(other));
            if !blocked {
                placed.push(candidate);
                continue 'entities;
            }
        }
        log::debug!(
            "Placement gave up after {} attempts ({} of {} placed)",
            MAX_PLACEMENT_ATTEMPTS,
            placed.len(),
            count
        );
        break;
    }

    placed.into_iter().map(|aabb| aabb.pos).collect()
}

/// Vertical band for plots
///
/// Falls back to a fixed strip near the top when the playfield is too short.
pub fn plot_band(state: &GameState) -> Band {
    let field = &state.field;
    let mut min_y = if state.is_tutorial() {
        field.height / 4.0
    } else {
        field.top
    };
    let mut max_y = field.bottom - 100.0;
    if max_y - min_y <= 50.0 {
        min_y = 100.0;
        max_y = min_y + 300.0;
    }
    Band::new(0.0, field.width - PLOT_SIZE, min_y, max_y)
}

/// Vertical band for obstacles, or `None` when there is no room for any
pub fn obstacle_band(state: &GameState) -> Option<Band> {
    let field = &state.field;
    let band = Band::new(
        0.0,
        field.width - OBSTACLE_SIZE,
        field.top + 100.0,
        field.bottom - 100.0,
    );
    (band.height() > 50.0).then_some(band)
}

/// Band aliens spawn in and wander around
pub fn alien_band(state: &GameState) -> Band {
    let field = &state.field;
    Band::new(
        0.0,
        field.width - ALIEN_SIZE,
        field.top,
        field.bottom - PLAYER_HEIGHT - 10.0,
    )
}

/// Lay out plots, obstacles and enemies for the configured level
pub fn populate_level(state: &mut GameState) {
    spawn_plots(state);
    spawn_obstacles(state);

    if state.config.is_boss_level {
        spawn_boss(state);
    }

    // The tutorial's single alien is spawned by the script
    if !state.is_tutorial() {
        for _ in 0..state.config.number_of_aliens {
            if spawn_alien(state).is_none() {
                break;
            }
        }
    }

    log::info!(
        "Level {} populated: {} plots, {} obstacles, {} aliens, boss={}",
        state.level,
        state.plots.len(),
        state.obstacles.len(),
        state.aliens.len(),
        state.boss.is_some()
    );
}

fn spawn_plots(state: &mut GameState) {
    let band = plot_band(state);
    let count = state.config.plots_to_plant as usize;
    let exclusions = [state.player.aabb()];
    let positions = place_non_overlapping(&mut state.rng, count, PLOT_SIZE, band, &exclusions);
    if positions.len() < count {
        log::warn!("Only placed {} of {} plots", positions.len(), count);
    }

    for pos in positions {
        let id = state.next_entity_id();
        state.plots.push(Plot {
            id,
            pos,
            state: PlotState::Empty,
            occupied: false,
        });
    }
}

fn spawn_obstacles(state: &mut GameState) {
    let kind = state.config.obstacle;
    if kind == ObstacleKind::None || state.config.number_of_obstacles == 0 {
        return;
    }
    let Some(band) = obstacle_band(state) else {
        log::debug!("No room for obstacles on level {}", state.level);
        return;
    };

    let mut exclusions: Vec<Aabb> = state.plots.iter().map(Plot::aabb).collect();
    exclusions.push(state.player.aabb());
    let count = state.config.number_of_obstacles as usize;
    let positions = place_non_overlapping(&mut state.rng, count, OBSTACLE_SIZE, band, &exclusions);
    state
        .obstacles
        .extend(positions.into_iter().map(|pos| Obstacle { pos, kind }));
}

/// Spawn one alien clear of the player, obstacles and the other aliens
///
/// Returns the new alien's id, or `None` when no spot was found.
pub fn spawn_alien(state: &mut GameState) -> Option<u32> {
    let band = alien_band(state);
    let mut exclusions: Vec<Aabb> = state
        .obstacles
        .iter()
        .map(Obstacle::aabb)
        .chain(state.aliens.iter().map(Alien::aabb))
        .collect();
    exclusions.push(state.player.aabb());

    let pos = place_non_overlapping(&mut state.rng, 1, ALIEN_SIZE, band, &exclusions)
        .into_iter()
        .next()?;

    let now = state.time_ms;
    let move_interval = state.config.alien_move_interval_ms();
    let shoot_delay = ALIEN_SHOOT_BASE_MS + jitter_ms(&mut state.rng, ALIEN_SHOOT_JITTER_MS);
    let next_move_ms = now + jitter_ms(&mut state.rng, move_interval);
    let next_shoot_ms = now + jitter_ms(&mut state.rng, shoot_delay);

    let id = state.next_entity_id();
    state.aliens.push(Alien {
        id,
        pos,
        hits: 0,
        max_hits: state.config.alien_health.max(1),
        next_move_ms,
        next_shoot_ms,
        tween: None,
        damaged: false,
    });
    state.emit(GameEvent::AlienSpawned { id });
    log::debug!("Alien {} spawned at ({:.0}, {:.0})", id, pos.x, pos.y);
    Some(id)
}

/// Place the boss at the top centre of the screen
pub fn spawn_boss(state: &mut GameState) {
    let health = state.config.max_boss_health.max(1);
    state.boss = Some(Boss {
        pos: Vec2::new(state.field.width / 2.0 - BOSS_SIZE / 2.0, BOSS_TOP),
        health,
        max_health: health,
        next_shoot_ms: state.time_ms + BOSS_FIRST_SHOT_MS,
    });
    log::info!("Boss spawned with {} health", health);
}

/// Roll for a power-up drop where an alien died
pub fn maybe_drop_power_up(state: &mut GameState, pos: Vec2) -> Option<PowerUpKind> {
    if !state.rng.random_bool(POWERUP_DROP_CHANCE) {
        return None;
    }
    let kind = if state.rng.random_bool(0.5) {
        PowerUpKind::Shield
    } else {
        PowerUpKind::SpeedBoost
    };
    state.power_ups.acquire(PowerUp { pos, kind })?;
    state.emit(GameEvent::PowerUpDropped { kind });
    log::debug!("Dropped {:?} at ({:.0}, {:.0})", kind, pos.x, pos.y);
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::levels::{LevelConfig, LevelSetup, Upgrades};
    use crate::sim::tick::start_level;
    use crate::sim::state::Playfield;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_placement_respects_padding() {
        let mut rng = Pcg32::seed_from_u64(7);
        let band = Band::new(0.0, 1000.0, 0.0, 1000.0);
        let positions = place_non_overlapping(&mut rng, 4, 80.0, band, &[]);
        assert_eq!(positions.len(), 4);
        for (i, a) in positions.iter().enumerate() {
            for b in positions.iter().skip(i + 1) {
                let padded = Aabb::square(*a, 80.0).expanded(SAFE_PADDING);
                assert!(!padded.intersects(&Aabb::square(*b, 80.0)));
            }
        }
    }

    #[test]
    fn test_placement_gives_up_in_tiny_band() {
        let mut rng = Pcg32::seed_from_u64(3);
        let band = Band::new(0.0, 200.0, 0.0, 60.0);
        let positions = place_non_overlapping(&mut rng, 5, 80.0, band, &[]);
        assert!(positions.len() < 5);
        assert!(!positions.is_empty());
    }

    #[test]
    fn test_placement_avoids_exclusions() {
        let mut rng = Pcg32::seed_from_u64(11);
        let band = Band::new(0.0, 1000.0, 0.0, 1000.0);
        let wall = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(1000.0, 500.0));
        let positions = place_non_overlapping(&mut rng, 1, 50.0, band, &[wall]);
        assert_eq!(positions.len(), 1);
        assert!(positions[0].y >= 500.0 + SAFE_PADDING);
    }

    #[test]
    fn test_short_playfield_uses_fallback_plot_band() {
        let field = Playfield {
            width: 1080.0,
            height: 400.0,
            top: 200.0,
            bottom: 320.0,
        };
        let state = GameState::new(1, field);
        let band = plot_band(&state);
        assert_eq!(band.min.y, 100.0);
        assert_eq!(band.max.y, 400.0);
        assert!(obstacle_band(&state).is_none());
    }

    #[test]
    fn test_tutorial_plot_band_starts_at_quarter_height() {
        let mut state = GameState::new(1, Playfield::default());
        state.level = TUTORIAL_LEVEL;
        let band = plot_band(&state);
        assert_eq!(band.min.y, state.field.height / 4.0);
    }

    #[test]
    fn test_spawned_alien_timers_are_jittered_from_now() {
        let mut state = GameState::new(5, Playfield::default());
        state.config = LevelConfig::for_level(1);
        state.time_ms = 10_000;
        let id = spawn_alien(&mut state).expect("room for an alien");
        let alien = state.aliens.iter().find(|a| a.id == id).unwrap();
        assert!(alien.next_move_ms >= 10_000);
        assert!(alien.next_move_ms < 10_000 + state.config.alien_move_interval_ms());
        assert!(alien.next_shoot_ms < 10_000 + ALIEN_SHOOT_BASE_MS + ALIEN_SHOOT_JITTER_MS);
        assert!(!alien.aabb().expanded(SAFE_PADDING).intersects(&state.player.aabb()));
    }

    #[test]
    fn test_boss_spawns_top_centre() {
        let mut state = GameState::new(5, Playfield::default());
        state.config = LevelConfig::for_level(BOSS_LEVEL);
        state.time_ms = 100;
        spawn_boss(&mut state);
        let boss = state.boss.as_ref().unwrap();
        assert_eq!(boss.pos, Vec2::new(540.0 - BOSS_SIZE / 2.0, BOSS_TOP));
        assert_eq!(boss.health, 15);
        assert_eq!(boss.next_shoot_ms, 100 + BOSS_FIRST_SHOT_MS);
    }

    fn started(level: u32, seed: u64) -> GameState {
        let mut state = GameState::new(seed, Playfield::default());
        start_level(&mut state, &LevelSetup::resolve(level, Upgrades::default()), 0);
        state
    }

    #[test]
    fn test_plots_keep_clear_of_player_start() {
        for seed in 0..200 {
            let state = started(9, seed);
            let player = state.player.aabb();
            for plot in &state.plots {
                assert!(
                    !plot.aabb().expanded(SAFE_PADDING).intersects(&player),
                    "seed {seed}: plot {} at {:?}",
                    plot.id,
                    plot.pos
                );
                assert!(!plot.occupied);
            }
        }
    }

    #[test]
    fn test_aliens_never_spawn_on_each_other() {
        for seed in 0..200 {
            let state = started(15, seed);
            for (i, a) in state.aliens.iter().enumerate() {
                for b in state.aliens.iter().skip(i + 1) {
                    assert!(
                        !a.aabb().intersects(&b.aabb()),
                        "seed {seed}: aliens {} and {} overlap",
                        a.id,
                        b.id
                    );
                }
            }
        }
    }

    #[test]
    fn test_respawned_alien_avoids_living_ones() {
        let mut state = started(15, 42);
        for _ in 0..3 {
            spawn_alien(&mut state);
        }
        let newest = state.aliens.last().unwrap();
        let padded = newest.aabb().expanded(SAFE_PADDING);
        for other in state.aliens.iter().filter(|a| a.id != newest.id) {
            assert!(!padded.intersects(&other.aabb()));
        }
    }

    #[test]
    fn test_power_up_drops_are_pooled_and_announced() {
        let mut state = GameState::new(9, Playfield::default());
        let mut drops = 0;
        for _ in 0..200 {
            if maybe_drop_power_up(&mut state, Vec2::new(300.0, 600.0)).is_some() {
                drops += 1;
                assert_eq!(state.power_ups.active_len(), 1);
                state.power_ups.release_all();
            }
        }
        assert!(drops > 0);
        assert!(drops < 100);
        let announced = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::PowerUpDropped { .. }))
            .count();
        assert_eq!(announced, drops);
    }

    #[test]
    fn test_no_drop_when_power_up_pool_is_full() {
        let mut state = GameState::new(9, Playfield::default());
        for _ in 0..MAX_POWERUPS {
            state
                .power_ups
                .acquire(PowerUp {
                    pos: Vec2::ZERO,
                    kind: PowerUpKind::Shield,
                })
                .unwrap();
        }
        state.drain_events();
        for _ in 0..200 {
            assert_eq!(maybe_drop_power_up(&mut state, Vec2::new(300.0, 600.0)), None);
        }
        assert_eq!(state.power_ups.active_len(), MAX_POWERUPS);
        assert!(
            !state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::PowerUpDropped { .. }))
        );
    }
}
