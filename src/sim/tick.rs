//! Fixed timestep simulation tick
//!
//! Core game loop. Every state transition during play happens here or in the
//! input handlers below; the host only schedules calls.

use glam::Vec2;

use super::ai;
use super::collision::overlaps;
use super::levels::LevelSetup;
use super::movement;
use super::outcome;
use super::spawn;
use super::state::{Direction, GameEvent, GameState, Player, PowerUpKind, SessionPhase, Shovel};
use super::tutorial;
use crate::consts::*;

/// Reset the session and lay out `setup`'s level
///
/// The tutorial level enters the script at its first step; every other level
/// starts `Playing`.
pub fn start_level(state: &mut GameState, setup: &LevelSetup, now_ms: u64) {
    state.clear_entities();
    state.level = setup.level;
    state.config = setup.config.clone();
    state.score = 0;
    state.time_ms = now_ms;

    let mut player = Player::new(&state.field);
    player.health = setup.player_health;
    player.shovels = setup.config.shovel_count;
    player.speed = setup.player_speed;
    player.movement_factor = setup.config.movement_factor;
    player.base_movement_factor = setup.config.movement_factor;
    state.player = player;

    spawn::populate_level(state);
    state.emit(GameEvent::LevelStarted { level: setup.level });

    if setup.is_tutorial() {
        tutorial::begin(state);
    } else {
        state.phase = SessionPhase::Playing;
    }
    log::info!(
        "Level {} started: health {}, shovels {}, speed {}",
        setup.level,
        state.player.health,
        state.player.shovels,
        state.player.speed
    );
}

/// Advance the world to `now_ms`
///
/// Does nothing unless the session is simulating. Stops as soon as an outcome
/// is decided so nothing runs after a level ends.
pub fn tick(state: &mut GameState, now_ms: u64) {
    if !state.phase.is_simulating() {
        return;
    }
    state.time_ms = now_ms;

    collect_power_ups(state, now_ms);
    expire_effects(state, now_ms);

    update_bullets(state);
    if !state.phase.is_simulating() {
        return;
    }

    update_shovels(state);
    if !state.phase.is_simulating() {
        return;
    }

    ai::update_aliens(state, now_ms);
    ai::update_boss(state, now_ms);
    boss_contact(state);
    if !state.phase.is_simulating() {
        return;
    }

    update_population(state, now_ms);
}

fn collect_power_ups(state: &mut GameState, now_ms: u64) {
    let player_box = state.player.hitbox();
    let mut collected = Vec::new();
    state.power_ups.retain(|_, power_up| {
        if overlaps(&player_box, &power_up.hitbox()) {
            collected.push(power_up.kind);
            false
        } else {
            true
        }
    });

    for kind in collected {
        let until = now_ms + POWERUP_DURATION_MS;
        let player = &mut state.player;
        match kind {
            PowerUpKind::Shield => player.shield_until = Some(until),
            PowerUpKind::SpeedBoost => {
                player.movement_factor = player.base_movement_factor * SPEED_BOOST_FACTOR;
                player.speed_boost_until = Some(until);
            }
        }
        state.emit(GameEvent::PowerUpCollected { kind });
        log::debug!("Collected {:?} until {}", kind, until);
    }
}

fn expire_effects(state: &mut GameState, now_ms: u64) {
    let player = &mut state.player;
    let shield_over = player.shield_until.is_some_and(|until| now_ms >= until);
    let boost_over = player.speed_boost_until.is_some_and(|until| now_ms >= until);

    if shield_over {
        player.shield_until = None;
    }
    if boost_over {
        player.speed_boost_until = None;
        player.movement_factor = player.base_movement_factor;
    }

    if shield_over {
        state.emit(GameEvent::PowerUpExpired {
            kind: PowerUpKind::Shield,
        });
    }
    if boost_over {
        state.emit(GameEvent::PowerUpExpired {
            kind: PowerUpKind::SpeedBoost,
        });
    }
}

fn update_bullets(state: &mut GameState) {
    let GameState {
        bullets,
        obstacles,
        player,
        field,
        ..
    } = state;
    let player_box = player.hitbox();
    let mut hits = 0;

    bullets.retain(|_, bullet| {
        bullet.pos += bullet.step;
        if !field.contains(bullet.pos) {
            return false;
        }
        let hitbox = bullet.hitbox();
        if obstacles.iter().any(|o| overlaps(&hitbox, &o.hitbox())) {
            return false;
        }
        if overlaps(&hitbox, &player_box) {
            hits += 1;
            return false;
        }
        true
    });

    for _ in 0..hits {
        outcome::damage_player(state);
    }
}

fn update_shovels(state: &mut GameState) {
    let GameState {
        shovels,
        aliens,
        boss,
        field,
        ..
    } = state;
    let mut boss_hit = false;
    let mut alien_hits = Vec::new();

    shovels.retain(|_, shovel| {
        shovel.pos.y -= SHOVEL_SPEED;
        if !field.contains(shovel.pos) {
            return false;
        }
        let hitbox = shovel.hitbox();
        if let Some(boss) = boss.as_mut() {
            if boss.is_alive() && overlaps(&hitbox, &boss.hitbox()) {
                boss.health -= 1;
                boss_hit = true;
                return false;
            }
        }
        if let Some(alien) = aliens
            .iter_mut()
            .find(|a| !a.is_dead() && overlaps(&hitbox, &a.hitbox()))
        {
            alien.hits += 1;
            alien_hits.push(alien.id);
            return false;
        }
        true
    });

    if boss_hit {
        if let Some((health, max_health)) = state.boss.as_ref().map(|b| (b.health, b.max_health)) {
            state.emit(GameEvent::BossDamaged { health, max_health });
            if health == 0 {
                outcome::defeat_boss(state);
                return;
            }
        }
    }

    for id in alien_hits {
        let Some(alien) = state.aliens.iter_mut().find(|a| a.id == id) else {
            continue;
        };
        if alien.is_dead() {
            continue;
        }
        alien.damaged = true;
        let hits = alien.hits;
        state.emit(GameEvent::AlienDamaged { id, hits });
    }

    let (dead, alive): (Vec<_>, Vec<_>) = std::mem::take(&mut state.aliens)
        .into_iter()
        .partition(|a| a.is_dead());
    state.aliens = alive;

    for alien in dead {
        state.emit(GameEvent::AlienKilled { id: alien.id });
        log::debug!("Alien {} killed", alien.id);
        spawn::maybe_drop_power_up(state, alien.pos);
        tutorial::alien_defeated(state);
    }
}

fn boss_contact(state: &mut GameState) {
    let touching = state.boss.as_ref().is_some_and(|boss| {
        boss.is_alive() && overlaps(&state.player.hitbox(), &boss.hitbox())
    });
    if touching {
        outcome::damage_player(state);
    }
}

fn update_population(state: &mut GameState, now_ms: u64) {
    if state.is_tutorial() {
        tutorial::ensure_combat_alien(state);
        return;
    }
    let wanted = state.config.number_of_aliens as usize;
    if state.aliens.len() >= wanted {
        state.respawn_at_ms = None;
        return;
    }

    match state.respawn_at_ms {
        None => {
            state.respawn_at_ms = Some(now_ms + ALIEN_RESPAWN_DELAY_MS);
            log::debug!("Alien respawn armed for {}", now_ms + ALIEN_RESPAWN_DELAY_MS);
        }
        Some(at) if now_ms >= at => {
            state.respawn_at_ms = None;
            spawn::spawn_alien(state);
        }
        Some(_) => {}
    }
}

/// Press or release a direction
///
/// Returns true when the press was accepted and held movement should begin.
/// Releasing only clears the intent if it matches the held direction.
pub fn set_direction(state: &mut GameState, direction: Direction, pressed: bool) -> bool {
    if !pressed {
        if state.player.intent == Some(direction) {
            state.player.intent = None;
        }
        return false;
    }
    if !state.phase.is_simulating() {
        return false;
    }
    if let Some(cursor) = state.phase.tutorial() {
        if !cursor.controls().dpad {
            return false;
        }
    }
    state.player.intent = Some(direction);
    true
}

/// Throw a shovel straight up from above the player's head
///
/// Returns whether a shovel left the player's hands.
pub fn throw_shovel(state: &mut GameState) -> bool {
    if !state.phase.is_simulating() {
        return false;
    }
    if let Some(cursor) = state.phase.tutorial() {
        if !cursor.controls().throw {
            return false;
        }
    }
    if state.shovels.is_exhausted() {
        return false;
    }
    if state.player.shovels == 0 {
        state.emit(GameEvent::OutOfShovels);
        return false;
    }

    let center = state.player.center();
    let shovel = Shovel {
        pos: Vec2::new(
            center.x - SHOVEL_SIZE / 2.0,
            state.player.pos.y - SHOVEL_LAUNCH_OFFSET,
        ),
    };
    if state.shovels.acquire(shovel).is_none() {
        return false;
    }
    state.player.shovels -= 1;
    let remaining = state.player.shovels;
    state.emit(GameEvent::ShovelThrown { remaining });
    true
}

/// One held-direction movement step
pub fn move_step(state: &mut GameState, now_ms: u64) -> bool {
    if !state.phase.is_simulating() {
        return false;
    }
    state.time_ms = state.time_ms.max(now_ms);
    movement::step_player(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::levels::{LevelConfig, Upgrades};
    use crate::sim::state::{Alien, Boss, Bullet, Playfield, Plot, PlotState, PowerUp};
    use crate::sim::tutorial::{TutorialCursor, TutorialStep};

    /// A quiet regular level with nothing spawned
    fn empty_level(level: u32) -> GameState {
        let mut state = GameState::new(12345, Playfield::default());
        state.level = level;
        state.config = LevelConfig {
            number_of_aliens: 0,
            ..LevelConfig::for_level(level)
        };
        state.phase = SessionPhase::Playing;
        state.player.pos = Vec2::new(500.0, 1000.0);
        state
    }

    fn idle_alien(id: u32, pos: Vec2, max_hits: u32) -> Alien {
        Alien {
            id,
            pos,
            hits: 0,
            max_hits,
            next_move_ms: u64::MAX,
            next_shoot_ms: u64::MAX,
            tween: None,
            damaged: false,
        }
    }

    fn count(state: &GameState, pred: impl Fn(&GameEvent) -> bool) -> usize {
        state.events.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_start_level_applies_upgrades() {
        let mut state = GameState::new(7, Playfield::default());
        let setup = LevelSetup::resolve(
            7,
            Upgrades {
                health: 1,
                shovels: 2,
                speed: 1,
            },
        );
        start_level(&mut state, &setup, 1_000);
        assert_eq!(state.phase, SessionPhase::Playing);
        assert_eq!(state.player.health, 4);
        assert_eq!(state.player.shovels, 5);
        assert_eq!(state.player.speed, 35.0);
        assert_eq!(state.plots.len(), 8);
        assert!(state.obstacles.len() <= 3);
        assert_eq!(state.aliens.len(), 2);
        assert!(state.plots.iter().all(|p| p.state == PlotState::Empty));
    }

    #[test]
    fn test_start_boss_level() {
        let mut state = GameState::new(7, Playfield::default());
        start_level(&mut state, &LevelSetup::resolve(BOSS_LEVEL, Upgrades::default()), 0);
        assert!(state.boss.is_some());
        assert!(state.aliens.is_empty());
        assert!(state.plots.is_empty());
        assert_eq!(state.boss_health_fraction(), Some(1.0));
    }

    #[test]
    fn test_planting_quota_wins_once() {
        let mut state = empty_level(2);
        state.plots = vec![
            Plot {
                id: 1,
                pos: Vec2::new(530.0, 920.0),
                state: PlotState::Empty,
                occupied: false,
            },
            Plot {
                id: 2,
                pos: Vec2::new(530.0, 900.0),
                state: PlotState::Empty,
                occupied: false,
            },
        ];

        set_direction(&mut state, Direction::Up, true);
        assert!(move_step(&mut state, 0));
        assert_eq!(state.score, 1);
        assert_eq!(state.phase, SessionPhase::Playing);

        assert!(move_step(&mut state, 50));
        assert_eq!(state.score, 2);
        assert_eq!(state.phase, SessionPhase::Won);
        assert_eq!(count(&state, |e| matches!(e, GameEvent::LevelWon { .. })), 1);

        // Nothing runs after the outcome
        assert!(!move_step(&mut state, 100));
        tick(&mut state, 133);
        outcome::check_plot_quota(&mut state);
        assert_eq!(count(&state, |e| matches!(e, GameEvent::LevelWon { .. })), 1);
    }

    #[test]
    fn test_two_bullets_one_tick_loses_once() {
        let mut state = empty_level(1);
        state.player.health = 1;
        let target = state.player.center() - Vec2::splat(BULLET_SIZE / 2.0);
        for _ in 0..2 {
            state.bullets.acquire(Bullet {
                pos: target,
                step: Vec2::ZERO,
            });
        }

        tick(&mut state, 33);
        assert_eq!(state.player.health, 0);
        assert_eq!(state.phase, SessionPhase::Lost);
        assert_eq!(count(&state, |e| matches!(e, GameEvent::PlayerHit { .. })), 1);
        assert_eq!(count(&state, |e| matches!(e, GameEvent::LevelLost { .. })), 1);
        assert_eq!(state.bullets.active_len(), 0);
    }

    #[test]
    fn test_obstacle_stops_bullets() {
        use crate::sim::levels::ObstacleKind;
        use crate::sim::state::Obstacle;

        let mut state = empty_level(6);
        state.obstacles.push(Obstacle {
            pos: Vec2::new(100.0, 100.0),
            kind: ObstacleKind::Boulder,
        });
        state.bullets.acquire(Bullet {
            pos: Vec2::new(140.0, 80.0),
            step: Vec2::new(0.0, BULLET_SPEED),
        });
        tick(&mut state, 33);
        assert_eq!(state.bullets.active_len(), 0);
        assert_eq!(state.player.health, PLAYER_BASE_HEALTH);
    }

    #[test]
    fn test_boss_killing_blow() {
        let mut state = empty_level(BOSS_LEVEL);
        state.boss = Some(Boss {
            pos: Vec2::new(465.0, BOSS_TOP),
            health: 1,
            max_health: 15,
            next_shoot_ms: u64::MAX,
        });
        state.shovels.acquire(Shovel {
            pos: Vec2::new(515.0, 190.0),
        });

        tick(&mut state, 33);
        assert_eq!(state.boss.as_ref().unwrap().health, 0);
        assert_eq!(state.score, BOSS_KILL_BONUS);
        assert_eq!(state.phase, SessionPhase::Won);
        assert_eq!(count(&state, |e| *e == GameEvent::BossDefeated), 1);

        tick(&mut state, 66);
        assert_eq!(state.score, BOSS_KILL_BONUS);
    }

    #[test]
    fn test_tough_alien_takes_two_hits() {
        let mut state = empty_level(10);
        state.config.number_of_aliens = 1;
        state.aliens.push(idle_alien(9, Vec2::new(400.0, 400.0), 2));

        state.shovels.acquire(Shovel {
            pos: Vec2::new(420.0, 480.0),
        });
        tick(&mut state, 33);
        let alien = &state.aliens[0];
        assert_eq!(alien.hits, 1);
        assert!(alien.damaged);
        assert!(state.respawn_at_ms.is_none());

        state.shovels.acquire(Shovel {
            pos: Vec2::new(420.0, 480.0),
        });
        tick(&mut state, 66);
        assert!(state.aliens.is_empty());
        assert_eq!(state.respawn_at_ms, Some(66 + ALIEN_RESPAWN_DELAY_MS));
        assert!(state.events.contains(&GameEvent::AlienKilled { id: 9 }));

        // Respawn fires once the timer elapses
        tick(&mut state, 66 + ALIEN_RESPAWN_DELAY_MS - 1);
        assert!(state.aliens.is_empty());
        tick(&mut state, 66 + ALIEN_RESPAWN_DELAY_MS);
        assert_eq!(state.aliens.len(), 1);
        assert!(state.respawn_at_ms.is_none());
    }

    #[test]
    fn test_shield_pickup_and_expiry() {
        let mut state = empty_level(1);
        state.power_ups.acquire(PowerUp {
            pos: state.player.pos + Vec2::splat(15.0),
            kind: PowerUpKind::Shield,
        });

        tick(&mut state, 1_000);
        assert_eq!(state.player.shield_until, Some(1_000 + POWERUP_DURATION_MS));
        assert_eq!(state.power_ups.active_len(), 0);

        // Shielded bullet hits are absorbed
        let target = state.player.center() - Vec2::splat(BULLET_SIZE / 2.0);
        state.bullets.acquire(Bullet {
            pos: target,
            step: Vec2::ZERO,
        });
        tick(&mut state, 1_033);
        assert_eq!(state.player.health, PLAYER_BASE_HEALTH);
        assert!(state.events.contains(&GameEvent::ShieldBlocked));

        tick(&mut state, 1_000 + POWERUP_DURATION_MS);
        assert!(!state.player.shield_active());
    }

    #[test]
    fn test_speed_boost_restores_terrain_factor() {
        let mut state = empty_level(12);
        state.player.movement_factor = 0.8;
        state.player.base_movement_factor = 0.8;
        state.power_ups.acquire(PowerUp {
            pos: state.player.pos + Vec2::splat(15.0),
            kind: PowerUpKind::SpeedBoost,
        });

        tick(&mut state, 0);
        assert!((state.player.movement_factor - 1.2).abs() < 1e-5);
        tick(&mut state, POWERUP_DURATION_MS);
        assert!((state.player.movement_factor - 0.8).abs() < 1e-6);
        assert!(!state.player.speed_boost_active());
    }

    #[test]
    fn test_throw_shovel() {
        let mut state = empty_level(6);
        state.player.shovels = 1;
        assert!(throw_shovel(&mut state));
        assert_eq!(state.player.shovels, 0);
        let (_, shovel) = state.shovels.iter().next().unwrap();
        assert_eq!(shovel.pos.y, state.player.pos.y - SHOVEL_LAUNCH_OFFSET);

        assert!(!throw_shovel(&mut state));
        assert!(state.events.contains(&GameEvent::OutOfShovels));
    }

    #[test]
    fn test_throw_limited_by_pool() {
        let mut state = empty_level(15);
        state.player.shovels = 20;
        for _ in 0..MAX_SHOVELS {
            assert!(throw_shovel(&mut state));
        }
        assert!(!throw_shovel(&mut state));
        assert_eq!(state.player.shovels, 20 - MAX_SHOVELS as u32);
    }

    #[test]
    fn test_shovel_retired_off_screen_is_reusable() {
        let mut state = empty_level(6);
        state.shovels.acquire(Shovel {
            pos: Vec2::new(10.0, 5.0),
        });
        tick(&mut state, 33);
        assert_eq!(state.shovels.active_len(), 0);
        assert_eq!(state.shovels.idle_len(), MAX_SHOVELS);
    }

    #[test]
    fn test_idle_session_does_not_tick() {
        let mut state = GameState::new(1, Playfield::default());
        tick(&mut state, 5_000);
        assert_eq!(state.time_ms, 0);
    }

    #[test]
    fn test_tutorial_walkthrough() {
        let mut state = GameState::new(99, Playfield::default());
        start_level(&mut state, &LevelSetup::resolve(TUTORIAL_LEVEL, Upgrades::default()), 0);
        assert_eq!(state.plots.len(), 2);
        assert!(state.aliens.is_empty());
        assert!(!state.player.visible);

        // Hidden controls ignore input
        assert!(!set_direction(&mut state, Direction::Up, true));
        assert!(!throw_shovel(&mut state));

        assert!(tutorial::advance(&mut state));
        assert!(tutorial::advance(&mut state));
        assert_eq!(state.phase.tutorial().unwrap().step, TutorialStep::Movement);
        assert!(state.player.visible);

        // Must move before continuing
        assert!(!tutorial::advance(&mut state));
        assert!(set_direction(&mut state, Direction::Left, true));
        assert!(move_step(&mut state, 50));
        set_direction(&mut state, Direction::Left, false);
        assert!(tutorial::advance(&mut state));
        assert_eq!(state.phase.tutorial().unwrap().step, TutorialStep::Planting);
        assert!(!tutorial::advance(&mut state));

        // Fill the field by hand; the tutorial never wins outright
        for plot in state.plots.iter_mut() {
            plot.state = PlotState::Planted;
        }
        outcome::check_plot_quota(&mut state);
        assert!(state.phase.tutorial().is_some());
        assert!(state.events.contains(&GameEvent::PlotsFilled));

        for _ in 0..4 {
            assert!(tutorial::advance(&mut state));
        }
        assert_eq!(state.phase.tutorial().unwrap().step, TutorialStep::Combat);
        assert_eq!(state.aliens.len(), 1);
        assert!(!tutorial::advance(&mut state));

        // Defeat the scripted alien
        let alien = &mut state.aliens[0];
        alien.next_move_ms = u64::MAX;
        alien.next_shoot_ms = u64::MAX;
        let below = alien.pos + Vec2::new(20.0, ALIEN_SIZE - 20.0);
        state.shovels.acquire(Shovel { pos: below });
        tick(&mut state, 1_000);
        assert!(state.aliens.is_empty());
        assert_eq!(state.phase.tutorial().unwrap().step, TutorialStep::Victory);
        assert!(state.events.contains(&GameEvent::TutorialVictory));

        // Halted: nothing respawns, time stands still
        tick(&mut state, 20_000);
        assert_eq!(state.time_ms, 1_000);
        assert!(state.aliens.is_empty());

        assert!(tutorial::advance(&mut state));
        assert_eq!(state.phase, SessionPhase::Idle);
        assert!(state.events.contains(&GameEvent::TutorialFinished));
    }

    #[test]
    fn test_tutorial_combat_retries_missing_alien() {
        let mut state = GameState::new(99, Playfield::default());
        start_level(&mut state, &LevelSetup::resolve(TUTORIAL_LEVEL, Upgrades::default()), 0);

        // Earlier steps never spawn anything
        tick(&mut state, 100);
        assert!(state.aliens.is_empty());

        state.phase = SessionPhase::Tutorial(TutorialCursor::at(TutorialStep::PowerUps));
        assert!(tutorial::advance(&mut state));
        assert_eq!(state.phase.tutorial().unwrap().step, TutorialStep::Combat);

        // As if entering the step found no room
        state.aliens.clear();
        tick(&mut state, 200);
        assert_eq!(state.aliens.len(), 1);
        assert_eq!(state.phase.tutorial().unwrap().step, TutorialStep::Combat);

        // Only ever the one
        tick(&mut state, 300);
        assert_eq!(state.aliens.len(), 1);
    }

    #[test]
    fn test_determinism() {
        let setup = LevelSetup::resolve(9, Upgrades::default());
        let mut state1 = GameState::new(424242, Playfield::default());
        let mut state2 = GameState::new(424242, Playfield::default());
        start_level(&mut state1, &setup, 0);
        start_level(&mut state2, &setup, 0);

        for step in 1..300u64 {
            tick(&mut state1, step * TICK_MS);
            tick(&mut state2, step * TICK_MS);
        }

        assert_eq!(state1.time_ms, state2.time_ms);
        assert_eq!(state1.aliens.len(), state2.aliens.len());
        assert_eq!(state1.bullets.active_len(), state2.bullets.active_len());
        assert_eq!(state1.player.health, state2.player.health);
        for (a, b) in state1.aliens.iter().zip(&state2.aliens) {
            assert_eq!(a.pos, b.pos);
        }
    }
}
