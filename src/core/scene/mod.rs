//=========================================================================
// Scene System
//=========================================================================
//
// Scene lifecycle, shared scene state and the scene manager.
//
// Architecture:
//   SceneManager<S>
//     ├─ factories: HashMap<S, SceneFactory>   (fresh scene per visit)
//     ├─ current:   Box<dyn Scene>
//     └─ return stack: Vec<S>                  (Push / Pop)
//
//   Scene (trait) ──base()──► SceneBase
//                               ├─ FadeTransition
//                               ├─ widgets + z-order + overlay
//                               └─ InputCooldown
//
// Lifecycle:
//   Created ─create()─► Starting ─start()─► Active ─stop()─► Stopping
//           ─pre_terminate()─► Terminating ─terminate()─► Disposed
//
//=========================================================================

//=== Module Declarations =================================================

mod fade;
mod scene_manager;
mod stage;
pub mod widget;

//=== Public API ==========================================================

pub use fade::{FadeDirection, FadeTransition};
pub use scene_manager::{SceneFactory, SceneKey, SceneManager, SceneRequest};
pub use stage::SceneBase;
pub use widget::{PersistentWidgets, Widget, WidgetContext, WidgetCore, WidgetId};

//=== Internal Dependencies ===============================================

use crate::core::error::StageResult;
use crate::core::globals::GlobalContext;

//=== ScenePhase ==========================================================

/// Lifecycle phase of a scene instance. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScenePhase {
    /// Constructed, visuals not built yet.
    Created,
    /// Visuals built, waiting for `is_ready()` and `start()`.
    Starting,
    /// Started and receiving input.
    Active,
    /// Stopped; still ticking so exit effects can finish.
    Stopping,
    /// Fading out; waiting for `is_busy()` to clear.
    Terminating,
    /// Widgets released. The instance is dead.
    Disposed,
}

//=== Scene Trait =========================================================

/// A top-level screen with its own lifecycle.
///
/// Every hook defaults to the shared behaviour in [`SceneBase`]; concrete
/// scenes override the hooks they need and call the base version.
///
/// ```rust
/// # use card_stage::prelude::*;
/// struct Blank {
///     base: SceneBase,
/// }
///
/// impl Scene for Blank {
///     fn base(&self) -> &SceneBase { &self.base }
///     fn base_mut(&mut self) -> &mut SceneBase { &mut self.base }
/// }
/// ```
pub trait Scene: Send {
    fn base(&self) -> &SceneBase;
    fn base_mut(&mut self) -> &mut SceneBase;

    /// Builds static visuals. Called exactly once per instance.
    fn create(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base_mut().create(context)
    }

    /// Polled by the manager before `start()`; false while assets load.
    fn is_ready(&mut self, _context: &mut GlobalContext) -> bool {
        true
    }

    /// Activates the scene and attaches persistent widgets.
    fn start(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base_mut().start(context)
    }

    /// Called once per tick after `start()`.
    fn update(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base_mut().update(context);
        Ok(())
    }

    fn stop(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base_mut().stop(context)
    }

    /// True while the scene must not be torn down or advanced.
    fn is_busy(&self) -> bool {
        self.base().is_busy()
    }

    /// Starts the exit fade and deactivates every widget.
    fn pre_terminate(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base_mut().pre_terminate(context)
    }

    /// Disposes every owned widget.
    fn terminate(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base_mut().terminate(context)
    }
}
