//=========================================================================
// Input System
//
// Folds platform input events into logical key state once per frame.
//
// Responsibilities:
// - Map physical keys / mouse buttons onto logical `InputKey`s
// - Track held keys and per-frame triggers / releases
// - Track the pointer position
//
// Notes:
// The system is owned by `GlobalSystems`; scenes read the resulting
// `InputState` from the shared context and never see physical keys.
//
//=========================================================================

//=== Submodules ==========================================================

pub mod event;
mod cooldown;

//=== Standard Library Imports ============================================

use std::collections::{HashMap, HashSet};

//=== External Crates =====================================================

use log::trace;

//=== Internal Imports ====================================================

pub use cooldown::InputCooldown;
pub use event::{InputEvent, KeyCode, Modifiers, MouseButton};

//=== InputKey ============================================================

/// Logical input keys understood by scenes and widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKey {
    Ok,
    Cancel,
    Menu,
    Skip,
    Left,
    Right,
    Up,
    Down,
}

//=== Binding =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Source {
    Key(KeyCode),
    Button(MouseButton),
}

//=== InputState ==========================================================

/// Logical input snapshot for the current frame.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    held: HashSet<InputKey>,
    triggered: HashSet<InputKey>,
    released: HashSet<InputKey>,
    pointer: (f32, f32),
}

impl InputState {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while any source bound to `key` is held.
    pub fn is_pressed(&self, key: InputKey) -> bool {
        self.held.contains(&key)
    }

    /// True only on the frame `key` went down.
    pub fn is_triggered(&self, key: InputKey) -> bool {
        self.triggered.contains(&key)
    }

    /// True only on the frame `key` went up.
    pub fn is_released(&self, key: InputKey) -> bool {
        self.released.contains(&key)
    }

    /// Pointer position in screen space.
    pub fn pointer(&self) -> (f32, f32) {
        self.pointer
    }

    /// Marks `key` as pressed this frame. Used by headless drivers and tests.
    pub fn press(&mut self, key: InputKey) {
        if self.held.insert(key) {
            self.triggered.insert(key);
        }
    }

    /// Marks `key` as released this frame.
    pub fn release(&mut self, key: InputKey) {
        if self.held.remove(&key) {
            self.released.insert(key);
        }
    }

    /// Clears per-frame deltas, keeping held keys.
    pub fn begin_frame(&mut self) {
        self.triggered.clear();
        self.released.clear();
    }
}

//=== InputSystem =========================================================

/// Binds physical inputs to logical keys and maintains [`InputState`].
pub struct InputSystem {
    bindings: HashMap<Source, InputKey>,
    sources_down: HashSet<Source>,
}

impl InputSystem {
    //--- Construction -----------------------------------------------------

    /// Creates a system without bindings.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            sources_down: HashSet::new(),
        }
    }

    /// Creates a system with the default keyboard/mouse layout.
    pub fn with_default_bindings() -> Self {
        let mut system = Self::new();

        system.bind_key(KeyCode::Enter, InputKey::Ok);
        system.bind_key(KeyCode::Space, InputKey::Ok);
        system.bind_key(KeyCode::KeyZ, InputKey::Ok);
        system.bind_key(KeyCode::Escape, InputKey::Cancel);
        system.bind_key(KeyCode::KeyX, InputKey::Cancel);
        system.bind_key(KeyCode::Backspace, InputKey::Cancel);
        system.bind_key(KeyCode::Tab, InputKey::Menu);
        system.bind_key(KeyCode::KeyS, InputKey::Skip);
        system.bind_key(KeyCode::ArrowLeft, InputKey::Left);
        system.bind_key(KeyCode::ArrowRight, InputKey::Right);
        system.bind_key(KeyCode::ArrowUp, InputKey::Up);
        system.bind_key(KeyCode::ArrowDown, InputKey::Down);

        system.bind_mouse(MouseButton::Left, InputKey::Ok);
        system.bind_mouse(MouseButton::Right, InputKey::Cancel);
        system
    }

    //--- Binding API ------------------------------------------------------

    /// Binds a keyboard key to a logical key (replaces any previous binding).
    pub fn bind_key(&mut self, key: KeyCode, target: InputKey) {
        self.bindings.insert(Source::Key(key), target);
    }

    /// Binds a mouse button to a logical key.
    pub fn bind_mouse(&mut self, button: MouseButton, target: InputKey) {
        self.bindings.insert(Source::Button(button), target);
    }

    /// Removes the binding of a keyboard key.
    pub fn unbind_key(&mut self, key: KeyCode) {
        self.bindings.remove(&Source::Key(key));
    }

    /// Returns the logical key bound to `key`.
    pub fn binding_for(&self, key: KeyCode) -> Option<InputKey> {
        self.bindings.get(&Source::Key(key)).copied()
    }

    //--- Frame Processing -------------------------------------------------

    /// Folds this frame's event batches into `state`.
    pub fn process_frame(&mut self, state: &mut InputState, batches: &[Vec<InputEvent>]) {
        state.begin_frame();

        for event in batches.iter().flatten() {
            match *event {
                InputEvent::KeyDown { key, .. } => self.source_down(state, Source::Key(key)),
                InputEvent::KeyUp { key, .. } => self.source_up(state, Source::Key(key)),
                InputEvent::MouseButtonDown { button, .. } => {
                    self.source_down(state, Source::Button(button))
                }
                InputEvent::MouseButtonUp { button, .. } => {
                    self.source_up(state, Source::Button(button))
                }
                InputEvent::MouseMoved { x, y } => state.pointer = (x, y),
            }
        }
    }

    //--- Internal Helpers -------------------------------------------------

    fn source_down(&mut self, state: &mut InputState, source: Source) {
        if !self.sources_down.insert(source) {
            return; // key repeat
        }
        if let Some(&key) = self.bindings.get(&source) {
            trace!("{:?} -> {:?} down", source, key);
            state.press(key);
        }
    }

    fn source_up(&mut self, state: &mut InputState, source: Source) {
        if !self.sources_down.remove(&source) {
            return;
        }
        let Some(&key) = self.bindings.get(&source) else {
            return;
        };

        // Another source bound to the same key keeps it held.
        let still_held = self
            .sources_down
            .iter()
            .any(|s| self.bindings.get(s) == Some(&key));
        if !still_held {
            state.release(key);
        }
    }
}

impl Default for InputSystem {
    fn default() -> Self {
        Self::with_default_bindings()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
