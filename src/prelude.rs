//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use card_stage::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Engine core
pub use crate::engine::{Engine, EngineBuilder};

// Configuration and errors
pub use crate::core::config::StageConfig;
pub use crate::core::error::{StageError, StageResult};

// Global systems and context
pub use crate::core::globals::{GlobalContext, GlobalSystems};

// Input system
pub use crate::core::input::{InputKey, InputState, KeyCode, Modifiers, MouseButton};

// Scene system
pub use crate::core::scene::{
    Scene, SceneBase, SceneKey, SceneManager, SceneRequest, Widget, WidgetContext, WidgetCore,
    WidgetId,
};

// Collaborators
pub use crate::core::audio::AudioSink;
pub use crate::core::event_bus::EventBus;
pub use crate::core::render::{Layer, Pose, Renderer};
