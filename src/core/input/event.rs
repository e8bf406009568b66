//=========================================================================
// Input Event Types
//
// Platform-independent representation of low-level input.
//
// The platform layer converts winit events into these types; the input
// system folds them into logical key state each frame.
//
// Event Flow:
// ```text
// Platform Layer (winit)
//         ↓
//    InputEvent (this module)
//         ↓
//    InputSystem (bindings)
//         ↓
//    InputState (logical keys: Ok, Cancel, Left ...)
// ```
//
//=========================================================================

//=== MouseButton =========================================================

/// Physical mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Side, thumb and macro buttons.
    Other,
}

//=== KeyCode =============================================================

/// Physical keyboard key identifier.
///
/// Only keys a card table can use are listed; everything else arrives as
/// `Unidentified` and is dropped by the platform layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    //--- Arrows -----------------------------------------------------------
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    ArrowUp,

    //--- Confirm / Cancel -------------------------------------------------
    Enter,
    Space,
    KeyZ,
    KeyX,
    Escape,
    Backspace,

    //--- Misc -------------------------------------------------------------
    Tab,
    KeyS,

    Unidentified,
}

//=== Modifiers ===========================================================

/// Modifier key state attached to discrete events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// No modifiers held.
    pub const NONE: Self = Self { shift: false, ctrl: false, alt: false };

    /// Returns true if no modifier is held.
    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }
}

//=== InputEvent ==========================================================

/// Low-level input event from the platform layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown { key: KeyCode, modifiers: Modifiers },
    KeyUp { key: KeyCode, modifiers: Modifiers },
    MouseButtonDown { button: MouseButton, modifiers: Modifiers },
    MouseButtonUp { button: MouseButton, modifiers: Modifiers },

    /// Cursor position in screen space (pixels, top-left origin).
    MouseMoved { x: f32, y: f32 },
}

impl InputEvent {
    /// Returns true for events whose order matters (keys and buttons).
    pub fn is_discrete(&self) -> bool {
        !matches!(self, Self::MouseMoved { .. })
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modifiers_none_is_empty() {
        assert!(Modifiers::NONE.is_empty());
        assert!(Modifiers::default().is_empty());
        assert!(!Modifiers { shift: true, ..Modifiers::NONE }.is_empty());
    }

    #[test]
    fn mouse_moves_are_continuous() {
        assert!(!InputEvent::MouseMoved { x: 1.0, y: 2.0 }.is_discrete());
        assert!(InputEvent::KeyDown { key: KeyCode::Enter, modifiers: Modifiers::NONE }
            .is_discrete());
    }
}
