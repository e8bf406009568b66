//=========================================================================
// Global Systems
//=========================================================================
//
// Container for engine-level systems with logic.
//
// Contains systems that process input and manage scenes. Systems operate
// on GlobalContext data.
//
//=========================================================================

//=== Internal Dependencies ===============================================

use super::GlobalContext;
use crate::core::error::StageResult;
use crate::core::input::InputSystem;
use crate::core::scene::{SceneKey, SceneManager};

//=== GlobalSystems =======================================================

/// Container for engine-level logic systems.
///
/// # Available Systems
///
/// - `input`: maps physical keys onto logical input keys
/// - `scene_manager`: scene lifecycle and change protocol
pub struct GlobalSystems<S: SceneKey> {
    /// Processes raw platform events into `GlobalContext::input`.
    pub input: InputSystem,

    /// Owns the current scene and applies scene requests.
    pub scene_manager: SceneManager<S>,
}

impl<S: SceneKey> GlobalSystems<S> {
    /// Creates the systems with the default key bindings.
    ///
    /// Users reach them through [`crate::Engine::init`].
    pub(crate) fn new() -> Self {
        Self {
            input: InputSystem::with_default_bindings(),
            scene_manager: SceneManager::new(),
        }
    }

    //--- Update Loop ------------------------------------------------------

    /// Runs one tick.
    ///
    /// # Processing Pipeline
    ///
    /// 1. **Input Processing**: folds platform events into logical key state
    /// 2. **Scene Update**: applies scene requests, then updates the scene
    ///
    /// Returns only fatal errors.
    pub(crate) fn update(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        // 1. Process input events into state
        self.input.process_frame(&mut context.input, &context.frame_events);
        context.frame_events.clear();
        context.frame += 1;

        // 2. Update the scene stack
        self.scene_manager.update(context)
    }

    /// True once the scene manager has processed an exit request.
    pub(crate) fn is_finished(&self) -> bool {
        self.scene_manager.is_exited()
    }
}
