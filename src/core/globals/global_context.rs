//=========================================================================
// Global Context
//=========================================================================
//
// Shared data container for scenes.
//
// Replaces process-wide registries with one explicit object owned by the
// orchestrator and lent to every scene hook:
// - input: logical key state for the current frame
// - bus: typed event queues (scene requests, widget commands)
// - renderer / audio: external collaborators
// - persistent: widgets that survive scene changes
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;

//=== Internal Dependencies ===============================================

use crate::core::audio::{AudioSink, SilentAudio};
use crate::core::config::StageConfig;
use crate::core::event_bus::EventBus;
use crate::core::input::{InputEvent, InputState};
use crate::core::render::{HeadlessRenderer, Renderer};
use crate::core::scene::PersistentWidgets;

//=== GlobalContext =======================================================

/// Shared context data accessible to scenes during updates.
///
/// Scenes receive `&mut GlobalContext` in every lifecycle hook. This
/// separates scene-accessible data from internal engine systems.
pub struct GlobalContext {
    /// Logical input state, refreshed by the input system each tick.
    pub input: InputState,

    /// Typed event queues. Scene requests posted here are applied by the
    /// scene manager at the start of the next tick.
    pub bus: EventBus,

    pub renderer: Box<dyn Renderer>,
    pub audio: Box<dyn AudioSink>,

    /// Widgets shared by every scene.
    pub persistent: PersistentWidgets,

    pub config: StageConfig,

    /// Ticks processed so far.
    pub frame: u64,

    /// Set once the player has left the title screen for the first time.
    pub game_started: bool,

    /// Input events for the current frame.
    ///
    /// Populated from the platform channel and consumed by the input
    /// system during the update phase.
    pub(crate) frame_events: Vec<Vec<InputEvent>>,
}

impl GlobalContext {
    pub fn new(config: StageConfig, renderer: Box<dyn Renderer>, audio: Box<dyn AudioSink>) -> Self {
        Self {
            input: InputState::new(),
            bus: EventBus::new(),
            renderer,
            audio,
            persistent: PersistentWidgets::new(),
            config,
            frame: 0,
            game_started: false,
            frame_events: Vec::new(),
        }
    }

    /// Context backed by the in-memory renderer and a silent mixer.
    pub fn headless(config: StageConfig) -> Self {
        Self::new(config, Box::new(HeadlessRenderer::new()), Box::new(SilentAudio::new()))
    }

    /// The renderer as its concrete type.
    pub fn renderer<T: Renderer + Any>(&self) -> Option<&T> {
        self.renderer.as_any().downcast_ref()
    }

    /// The audio sink as its concrete type.
    pub fn audio<T: AudioSink + Any>(&self) -> Option<&T> {
        self.audio.as_any().downcast_ref()
    }
}
