//! Alien and boss behaviour
//!
//! Aliens glide between random waypoints and fire aimed shots on their own
//! timers. The boss tracks the player horizontally and gets faster and more
//! aggressive as its health drops.

use glam::Vec2;

use super::spawn::alien_band;
use super::state::{Bullet, GameEvent, GameState, Tween};
use crate::consts::*;
use crate::jitter_ms;

/// Spawn a bullet at `origin` (top-left) heading toward `target`
///
/// The step is fixed here and never re-aimed. Returns false when the bullet
/// pool is exhausted and the shot was dropped.
pub fn fire_bullet(state: &mut GameState, origin: Vec2, target: Vec2) -> bool {
    let center = origin + Vec2::splat(BULLET_SIZE / 2.0);
    let direction = (target - center).normalize_or_zero();
    let direction = if direction == Vec2::ZERO { Vec2::Y } else { direction };
    let bullet = Bullet {
        pos: origin,
        step: direction * BULLET_SPEED,
    };
    if state.bullets.acquire(bullet).is_none() {
        log::debug!("Bullet pool exhausted, shot dropped");
        return false;
    }
    state.emit(GameEvent::BulletFired);
    true
}

/// Where a bullet leaves a shooter: centred under its bottom edge
fn muzzle(pos: Vec2, size: f32) -> Vec2 {
    Vec2::new(pos.x + size / 2.0 - BULLET_SIZE / 2.0, pos.y + size)
}

/// Advance alien interpolation and run their move/shoot timers
pub fn update_aliens(state: &mut GameState, now_ms: u64) {
    let band = alien_band(state);
    let move_interval = state.config.alien_move_interval_ms();
    let aim_y = state.player.center().y;
    let aim_x = state.player.center().x;

    let mut shots = Vec::new();
    {
        let GameState { aliens, rng, .. } = state;
        for alien in aliens.iter_mut() {
            if let Some(tween) = alien.tween {
                alien.pos = tween.sample(now_ms);
                if tween.is_finished(now_ms) {
                    alien.tween = None;
                }
            }

            if now_ms >= alien.next_move_ms {
                alien.tween = Some(Tween {
                    from: alien.pos,
                    to: band.sample(rng),
                    start_ms: now_ms,
                    duration_ms: ALIEN_MOVE_DURATION_MS,
                });
                alien.next_move_ms = now_ms + move_interval;
            }

            if now_ms >= alien.next_shoot_ms {
                shots.push(muzzle(alien.pos, ALIEN_SIZE));
                alien.next_shoot_ms =
                    now_ms + ALIEN_SHOOT_BASE_MS + jitter_ms(rng, ALIEN_SHOOT_JITTER_MS);
            }
        }
    }

    for origin in shots {
        fire_bullet(state, origin, Vec2::new(aim_x, aim_y));
    }
}

/// Ease the boss toward the player and fire its spread on schedule
pub fn update_boss(state: &mut GameState, now_ms: u64) {
    let player_center = state.player.center();
    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    if !boss.is_alive() {
        return;
    }

    let fraction = boss.health_fraction();
    let target_x = player_center.x - BOSS_SIZE / 2.0;
    let rate = BOSS_TRACKING_RATE * (1.0 + (1.0 - fraction) * BOSS_ENRAGE_FACTOR);
    boss.pos.x += (target_x - boss.pos.x) * rate;

    if now_ms < boss.next_shoot_ms {
        return;
    }

    let origin = muzzle(boss.pos, BOSS_SIZE);
    let base = (BOSS_SHOOT_BASE_MS + jitter_ms(&mut state.rng, BOSS_SHOOT_JITTER_MS)) as f32;
    let delay = ((base * fraction) as u64).max(BOSS_MIN_SHOOT_MS);
    if let Some(boss) = state.boss.as_mut() {
        boss.next_shoot_ms = now_ms + delay;
    }

    for offset in [0.0, -BOSS_SPREAD, BOSS_SPREAD] {
        fire_bullet(state, origin, Vec2::new(player_center.x + offset, player_center.y));
    }
}
