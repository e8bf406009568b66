//=========================================================================
// Input Buffer
//
// Per-frame aggregator between the Winit callbacks and the core channel.
//
// Responsibilities:
// - Keep discrete events (keys, buttons) in arrival order
// - Drop immediate duplicates of a discrete event
// - Coalesce pointer movement into the latest position
//
// Notes:
// The buffer is drained once per redraw and its storage is reused.
//=========================================================================

//=== Internal Modules ====================================================

use crate::core::input::event::InputEvent;

//=== InputBuffer =========================================================

pub(crate) struct InputBuffer {
    discrete: Vec<InputEvent>,
    pointer: Option<(f32, f32)>,
}

impl InputBuffer {
    pub(crate) fn new() -> Self {
        const DISCRETE_BASE: usize = 64;

        Self {
            discrete: Vec::with_capacity(DISCRETE_BASE),
            pointer: None,
        }
    }

    /// Records a pointer move; only the latest position is kept.
    pub(crate) fn push_continuous(&mut self, event: InputEvent) {
        if let InputEvent::MouseMoved { x, y } = event {
            self.pointer = Some((x, y));
        }
    }

    /// Appends a key/button event unless it repeats the previous one.
    pub(crate) fn push_discrete(&mut self, event: InputEvent) {
        if self.discrete.last() != Some(&event) {
            self.discrete.push(event);
        }
    }

    /// Takes `(discrete, continuous)` events, or `None` when nothing was
    /// buffered.
    pub(crate) fn drain(&mut self) -> Option<(Vec<InputEvent>, Vec<InputEvent>)> {
        if self.is_empty() {
            return None;
        }
        let discrete = self.discrete.drain(..).collect();
        let continuous = self
            .pointer
            .take()
            .map(|(x, y)| InputEvent::MouseMoved { x, y })
            .into_iter()
            .collect();
        Some((discrete, continuous))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.discrete.is_empty() && self.pointer.is_none()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::event::{KeyCode, Modifiers};

    fn key_down(key: KeyCode) -> InputEvent {
        InputEvent::KeyDown { key, modifiers: Modifiers::NONE }
    }

    #[test]
    fn repeated_discrete_events_collapse() {
        let mut buffer = InputBuffer::new();
        buffer.push_discrete(key_down(KeyCode::KeyZ));
        buffer.push_discrete(key_down(KeyCode::KeyZ));
        buffer.push_discrete(key_down(KeyCode::KeyX));

        let (discrete, _) = buffer.drain().unwrap();
        assert_eq!(discrete, vec![key_down(KeyCode::KeyZ), key_down(KeyCode::KeyX)]);
    }

    #[test]
    fn pointer_moves_coalesce() {
        let mut buffer = InputBuffer::new();
        buffer.push_continuous(InputEvent::MouseMoved { x: 10.0, y: 10.0 });
        buffer.push_continuous(InputEvent::MouseMoved { x: 20.0, y: 30.0 });

        let (discrete, continuous) = buffer.drain().unwrap();
        assert!(discrete.is_empty());
        assert_eq!(continuous, vec![InputEvent::MouseMoved { x: 20.0, y: 30.0 }]);
    }

    #[test]
    fn drain_empties_and_keeps_capacity() {
        let mut buffer = InputBuffer::new();
        for _ in 0..100 {
            buffer.push_discrete(key_down(KeyCode::Enter));
            buffer.push_discrete(key_down(KeyCode::Escape));
        }
        let capacity = buffer.discrete.capacity();

        assert!(buffer.drain().is_some());
        assert!(buffer.is_empty());
        assert!(buffer.drain().is_none());
        assert_eq!(buffer.discrete.capacity(), capacity);
    }
}
