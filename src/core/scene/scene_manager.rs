//=========================================================================
// Scene Manager
//=========================================================================
//
// Owns the current scene and runs the scene change protocol.
//
// Scenes are registered as factories keyed by a `SceneKey`, so every
// visit builds a fresh instance. Requests arrive on the event bus and
// are applied at the start of the next tick:
//
//   request ─► stop() ─► pre_terminate() ─► update() while is_busy()
//           ─► terminate() ─► next.create() ─► (poll is_ready()) ─► start()
//
// The outgoing scene is always fully terminated before the incoming
// scene's `create()` runs.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use log::{debug, error, info, warn};

//=== Internal Dependencies ===============================================

use super::Scene;
use crate::core::config::StageConfig;
use crate::core::error::StageResult;
use crate::core::globals::GlobalContext;

//=== Scene Key Trait =====================================================

/// Marker trait for scene identifiers.
///
/// Typically implemented by game-specific enums.
pub trait SceneKey: Clone + Copy + Eq + Hash + Debug + Send + 'static {}

//=== Scene Request =======================================================

/// Scene change requested by a scene through the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneRequest<K: SceneKey> {
    /// Replaces the current scene.
    Goto(K),

    /// Replaces the current scene, remembering it for a later `Pop`.
    Push(K),

    /// Returns to the most recently pushed-from scene. Ignored when the
    /// return stack is empty.
    Pop,

    /// Tears the current scene down and stops the stage.
    Exit,
}

/// Builds a fresh scene instance for one visit.
pub type SceneFactory = Box<dyn Fn(&StageConfig) -> Box<dyn Scene> + Send>;

//=== Scene Manager =======================================================

/// The scene currently owned by the manager.
struct Running<S> {
    key: S,
    scene: Box<dyn Scene>,
    started: bool,
    leaving: bool,
}

/// Runs one scene at a time and switches between them.
pub struct SceneManager<S: SceneKey> {
    factories: HashMap<S, SceneFactory>,
    initial: Option<S>,
    current: Option<Running<S>>,
    /// Destination once the current scene has torn down; `Some(None)` exits.
    next: Option<Option<S>>,
    return_stack: Vec<S>,
    exited: bool,
}

impl<S: SceneKey> SceneManager<S> {
    //--- Construction -----------------------------------------------------

    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            initial: None,
            current: None,
            next: None,
            return_stack: Vec::new(),
            exited: false,
        }
    }

    //--- Registration -----------------------------------------------------

    /// Registers the factory used to build `key`'s scene.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use card_stage::prelude::*;
    /// # #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// # enum Screen { Main }
    /// # impl SceneKey for Screen {}
    /// # struct MainScene { base: SceneBase }
    /// # impl Scene for MainScene {
    /// #     fn base(&self) -> &SceneBase { &self.base }
    /// #     fn base_mut(&mut self) -> &mut SceneBase { &mut self.base }
    /// # }
    /// let mut manager = SceneManager::new();
    /// manager.register_scene(Screen::Main, |config: &StageConfig| {
    ///     Box::new(MainScene { base: SceneBase::new("main", config.input_cooldown_frames) })
    ///         as Box<dyn Scene>
    /// });
    /// ```
    pub fn register_scene<F>(&mut self, key: S, factory: F)
    where
        F: Fn(&StageConfig) -> Box<dyn Scene> + Send + 'static,
    {
        if self.factories.insert(key, Box::new(factory)).is_some() {
            warn!(target: "stage", "Scene {:?} was already registered and has been replaced", key);
        }
    }

    /// Registers a scene and makes it the first one entered by `start()`.
    pub fn register_default<F>(&mut self, key: S, factory: F)
    where
        F: Fn(&StageConfig) -> Box<dyn Scene> + Send + 'static,
    {
        self.register_scene(key, factory);
        self.initial = Some(key);
        debug!(target: "stage", "Registered scene {:?} as default", key);
    }

    /// Makes an already registered scene the first one entered.
    pub fn set_initial(&mut self, key: S) {
        if self.is_registered(key) {
            self.initial = Some(key);
        } else {
            warn!(target: "stage", "Cannot start with unregistered scene {:?}", key);
        }
    }

    pub fn is_registered(&self, key: S) -> bool {
        self.factories.contains_key(&key)
    }

    //--- Queries ----------------------------------------------------------

    /// Key of the scene currently owned, including one that is leaving.
    pub fn current_key(&self) -> Option<S> {
        self.current.as_ref().map(|r| r.key)
    }

    /// The scene currently owned.
    pub fn current(&self) -> Option<&dyn Scene> {
        self.current.as_ref().map(|r| r.scene.as_ref())
    }

    /// True while a scene change has been requested but not completed.
    pub fn is_changing(&self) -> bool {
        self.next.is_some()
    }

    /// True once an `Exit` has been fully processed.
    pub fn is_exited(&self) -> bool {
        self.exited
    }

    //--- Lifecycle --------------------------------------------------------

    /// Enters the default scene.
    pub fn start(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        match self.initial {
            Some(initial) => {
                info!(target: "stage", "Starting scene manager with initial scene: {:?}", initial);
                self.enter(initial, context)
            }
            None => {
                warn!(target: "stage", "No default scene registered");
                Ok(())
            }
        }
    }

    //--- Update Loop ------------------------------------------------------

    /// Runs one tick: applies requests, starts a ready scene, updates the
    /// started one and finishes a pending change once it is idle.
    ///
    /// Only fatal errors are returned; contract violations are logged.
    pub fn update(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        if self.exited {
            return Ok(());
        }

        for request in context.bus.drain::<SceneRequest<S>>() {
            self.request(request, context)?;
        }

        let Some(running) = self.current.as_mut() else {
            return Ok(());
        };

        if !running.started && !running.leaving && running.scene.is_ready(context) {
            contain(running.scene.start(context))?;
            running.started = true;
        }
        // A scene torn down before it started still has to run its exit fade.
        if running.started || running.leaving {
            contain(running.scene.update(context))?;
        }

        if running.leaving && !running.scene.is_busy() {
            self.finish_change(context)?;
        }
        Ok(())
    }

    //--- Transition Processing --------------------------------------------

    /// Applies one scene request.
    pub fn request(&mut self, request: SceneRequest<S>, context: &mut GlobalContext) -> StageResult<()> {
        debug!(target: "stage", "Scene request {:?}", request);
        let target = match request {
            SceneRequest::Goto(key) | SceneRequest::Push(key) => Some(key),
            SceneRequest::Pop => match self.return_stack.pop() {
                Some(key) => Some(key),
                None => {
                    warn!(target: "stage", "Pop requested with an empty return stack");
                    return Ok(());
                }
            },
            SceneRequest::Exit => None,
        };

        if let Some(key) = target {
            if !self.is_registered(key) {
                warn!(target: "stage", "Requested unregistered scene {:?}", key);
                return Ok(());
            }
        }
        if let SceneRequest::Push(_) = request {
            if let Some(current) = self.current_key() {
                self.return_stack.push(current);
            }
        }

        if self.next.is_some() {
            debug!(target: "stage", "Scene change already pending, retargeting to {:?}", target);
        }
        self.next = Some(target);

        let Some(running) = self.current.as_mut() else {
            return self.finish_change(context);
        };
        if !running.leaving {
            if running.started {
                contain(running.scene.stop(context))?;
            }
            contain(running.scene.pre_terminate(context))?;
            running.leaving = true;
        }
        Ok(())
    }

    //--- Internal Helpers -------------------------------------------------

    fn finish_change(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        if let Some(mut running) = self.current.take() {
            contain(running.scene.terminate(context))?;
            debug!(target: "stage", "Scene {:?} terminated", running.key);
        }
        context.bus.clear_all();

        match self.next.take().flatten() {
            Some(key) => self.enter(key, context),
            None => {
                info!(target: "stage", "Scene manager exited");
                self.exited = true;
                Ok(())
            }
        }
    }

    fn enter(&mut self, key: S, context: &mut GlobalContext) -> StageResult<()> {
        let Some(factory) = self.factories.get(&key) else {
            warn!(target: "stage", "Attempted to enter unregistered scene {:?}", key);
            return Ok(());
        };

        let mut scene = factory(&context.config);
        debug!(target: "stage", "Creating scene {:?}", key);
        contain(scene.create(context))?;
        self.current = Some(Running { key, scene, started: false, leaving: false });
        Ok(())
    }
}

impl<S: SceneKey> Default for SceneManager<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs contract violations and lets fatal errors through.
fn contain(result: StageResult<()>) -> StageResult<()> {
    match result {
        Err(err) if err.is_fatal() => {
            error!(target: "stage", "Fatal scene error: {}", err);
            Err(err)
        }
        Err(err) => {
            warn!(target: "stage", "Scene contract violation ignored: {}", err);
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
