//! Fixed-capacity entity pools
//!
//! Every slot is either idle or active. Activating a slot attaches a fresh
//! payload; releasing it drops the payload, so nothing stale survives into the
//! next activation. Pools never grow.

use serde::{Deserialize, Serialize};

/// Stable reference to a pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle(usize);

impl Handle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A fixed-size pool partitioned into idle and active slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool<T> {
    /// Payload per slot (`None` while idle)
    slots: Vec<Option<T>>,
    /// Idle slot indices (stack)
    idle: Vec<usize>,
    /// Active slot indices, in activation order
    active: Vec<usize>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T> Pool<T> {
    /// Pre-allocate a pool with `capacity` idle slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            // Reversed so slot 0 is handed out first
            idle: (0..capacity).rev().collect(),
            active: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn idle_len(&self) -> usize {
        self.idle.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.idle.is_empty()
    }

    /// Activate an idle slot with `value`
    ///
    /// Returns `None` when every slot is already active; the value is dropped.
    pub fn acquire(&mut self, value: T) -> Option<Handle> {
        let index = self.idle.pop()?;
        self.slots[index] = Some(value);
        self.active.push(index);
        Some(Handle(index))
    }

    /// Return an active slot to idle, handing back its payload
    ///
    /// Releasing an idle or unknown handle is a no-op.
    pub fn release(&mut self, handle: Handle) -> Option<T> {
        let position = self.active.iter().position(|&i| i == handle.0)?;
        self.active.remove(position);
        self.idle.push(handle.0);
        self.slots[handle.0].take()
    }

    /// Release every active slot
    pub fn release_all(&mut self) {
        for index in self.active.drain(..) {
            self.slots[index] = None;
            self.idle.push(index);
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots.get_mut(handle.0).and_then(Option::as_mut)
    }

    /// Iterate active payloads in activation order
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.active
            .iter()
            .filter_map(|&i| self.slots[i].as_ref().map(|v| (Handle(i), v)))
    }

    /// Visit every active payload once; those for which `keep` returns false
    /// are released in place.
    ///
    /// Safe against removal during iteration: each active slot is visited
    /// exactly once regardless of how many are released.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(Handle, &mut T) -> bool,
    {
        let mut i = 0;
        while i < self.active.len() {
            let index = self.active[i];
            let kept = match self.slots[index].as_mut() {
                Some(value) => keep(Handle(index), value),
                None => false,
            };
            if kept {
                i += 1;
            } else {
                self.active.remove(i);
                self.slots[index] = None;
                self.idle.push(index);
            }
        }
    }
}
