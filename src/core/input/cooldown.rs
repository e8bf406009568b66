//=========================================================================
// Input Cooldown
//=========================================================================
//
// Per-key debounce counters owned by each scene.
//
// Firing an action locks its key for a few frames; the lock counts down
// once per frame and the key may fire again only at zero. This keeps a
// double click from skipping two screens at once.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

//=== Internal Dependencies ===============================================

use super::InputKey;

//=== InputCooldown =======================================================

/// Per-key cooldown counters, capped at `limit` frames.
#[derive(Debug, Clone)]
pub struct InputCooldown {
    limit: u8,
    counters: HashMap<InputKey, u8>,
}

impl InputCooldown {
    /// Creates counters that lock a key for `limit` frames after it fires.
    pub fn new(limit: u8) -> Self {
        Self { limit, counters: HashMap::new() }
    }

    /// Returns true when `key` may fire this frame.
    pub fn is_ready(&self, key: InputKey) -> bool {
        self.remaining(key) == 0
    }

    /// Frames left before `key` may fire again.
    pub fn remaining(&self, key: InputKey) -> u8 {
        self.counters.get(&key).copied().unwrap_or(0)
    }

    /// Fires `key` if it is not cooling down. Returns whether it fired.
    pub fn try_trigger(&mut self, key: InputKey) -> bool {
        if !self.is_ready(key) {
            return false;
        }
        if self.limit > 0 {
            self.counters.insert(key, self.limit);
        }
        true
    }

    /// Advances every counter by one frame.
    pub fn tick(&mut self) {
        self.counters.retain(|_, frames| {
            *frames = frames.saturating_sub(1);
            *frames > 0
        });
    }

    /// Unlocks every key.
    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_locks_for_limit_frames() {
        let mut cooldown = InputCooldown::new(3);

        assert!(cooldown.try_trigger(InputKey::Ok));
        assert!(!cooldown.try_trigger(InputKey::Ok));
        assert_eq!(cooldown.remaining(InputKey::Ok), 3);

        cooldown.tick();
        cooldown.tick();
        assert!(!cooldown.is_ready(InputKey::Ok));

        cooldown.tick();
        assert!(cooldown.is_ready(InputKey::Ok));
        assert!(cooldown.try_trigger(InputKey::Ok));
    }

    #[test]
    fn keys_cool_down_independently() {
        let mut cooldown = InputCooldown::new(2);

        assert!(cooldown.try_trigger(InputKey::Ok));
        assert!(cooldown.try_trigger(InputKey::Cancel));
        assert!(!cooldown.try_trigger(InputKey::Ok));
        assert!(cooldown.is_ready(InputKey::Skip));
    }

    #[test]
    fn zero_limit_never_locks() {
        let mut cooldown = InputCooldown::new(0);
        assert!(cooldown.try_trigger(InputKey::Ok));
        assert!(cooldown.try_trigger(InputKey::Ok));
    }

    #[test]
    fn reset_unlocks_everything() {
        let mut cooldown = InputCooldown::new(5);
        cooldown.try_trigger(InputKey::Menu);
        cooldown.reset();
        assert!(cooldown.is_ready(InputKey::Menu));
    }
}
