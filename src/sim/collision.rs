//! Axis-aligned collision detection
//!
//! Everything in the playfield is an upright rectangle in screen space
//! (origin top-left, y grows downward). The player gets a tighter hitbox so
//! near misses feel fair.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::PLAYER_HITBOX_INSET;

/// An axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    /// Square rectangle of side `side`
    pub fn square(pos: Vec2, side: f32) -> Self {
        Self::new(pos, Vec2::splat(side))
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Grow the rectangle by `pad` on every side
    pub fn expanded(&self, pad: f32) -> Self {
        Self::new(self.pos - Vec2::splat(pad), self.size + Vec2::splat(pad * 2.0))
    }

    /// Shrink the rectangle by `inset` on each side of each axis
    pub fn shrunk(&self, inset: Vec2) -> Self {
        Self::new(self.pos + inset, self.size - inset * 2.0)
    }

    /// Strict overlap (touching edges do not count)
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

/// A rectangle tagged with the flags collision cares about
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub aabb: Aabb,
    pub visible: bool,
    pub is_player: bool,
}

impl Hitbox {
    /// Visible, non-player hitbox
    pub fn of(aabb: Aabb) -> Self {
        Self {
            aabb,
            visible: true,
            is_player: false,
        }
    }

    /// Player hitbox (inset applied during overlap tests)
    pub fn player(aabb: Aabb, visible: bool) -> Self {
        Self {
            aabb,
            visible,
            is_player: true,
        }
    }

    /// The rectangle actually used for overlap tests
    fn effective(&self) -> Aabb {
        if self.is_player {
            self.aabb.shrunk(self.aabb.size * PLAYER_HITBOX_INSET)
        } else {
            self.aabb
        }
    }
}

/// Check whether two hitboxes overlap
///
/// Hidden hitboxes never collide. When either side is the player the test is
/// shrunk by 20% of the player's own width/height on each axis.
pub fn overlaps(a: &Hitbox, b: &Hitbox) -> bool {
    if !a.visible || !b.visible {
        return false;
    }

    a.effective().intersects(&b.effective())
}
