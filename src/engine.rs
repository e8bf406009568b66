//=========================================================================
// Card Stage Engine
//
// Main entry point and coordinator.
//
// Architecture:
// ```text
//     EngineBuilder  ──build()──>  Engine  ──run()──>  [Runtime]
//         │                          │
//         ├─ with_config()           ├─ init(): scenes, bindings
//         ├─ with_tps()              ├─ run(): core thread + window
//         ├─ with_channel_capacity() └─ run_headless(): no window
//         ├─ with_renderer()
//         └─ with_audio()
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{error, info, warn};

//=== Internal Dependencies ===============================================

use crate::core::audio::{AudioSink, SilentAudio};
use crate::core::config::StageConfig;
use crate::core::globals::{GlobalContext, GlobalSystems};
use crate::core::platform_bridge::{PlatformEvent, TickControl};
use crate::core::render::{HeadlessRenderer, Renderer};
use crate::core::scene::SceneKey;
use crate::core::CoreSystemsOrchestrator;
use crate::platform::{Platform, WindowSettings};

//=== EngineBuilder =======================================================

/// Builder for configuring and constructing an [`Engine`].
///
/// # Default Values
///
/// - **Config**: [`StageConfig::default`] (60 TPS, channel of 128 events)
/// - **Renderer**: [`HeadlessRenderer`]
/// - **Audio**: [`SilentAudio`]
///
/// # Examples
///
/// ```no_run
/// use card_stage::EngineBuilder;
/// use card_stage::core::config::StageConfig;
/// use card_stage::game::{self, RuleEngine, ScriptedRules, StageKey};
///
/// EngineBuilder::<StageKey>::new()
///     .with_tps(120.0)
///     .build()
///     .init(|systems, _context| {
///         game::register_scenes(&mut systems.scene_manager, |config: &StageConfig| {
///             Box::new(ScriptedRules::seeded(config.seats, config.rules_seed)) as Box<dyn RuleEngine>
///         });
///     })
///     .run();
/// ```
pub struct EngineBuilder<S: SceneKey> {
    config: StageConfig,
    renderer: Option<Box<dyn Renderer>>,
    audio: Option<Box<dyn AudioSink>>,
    title: String,
    _phantom: std::marker::PhantomData<S>,
}

impl<S: SceneKey> EngineBuilder<S> {
    pub fn new() -> Self {
        Self {
            config: StageConfig::default(),
            renderer: None,
            audio: None,
            title: "Card Stage".to_owned(),
            _phantom: std::marker::PhantomData,
        }
    }

    /// Replaces every tunable at once. Later `with_tps` /
    /// `with_channel_capacity` calls override the matching fields.
    pub fn with_config(mut self, config: StageConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the target ticks per second for the logic thread.
    ///
    /// # Panics
    ///
    /// Panics if `tps <= 0.0`.
    pub fn with_tps(mut self, tps: f64) -> Self {
        assert!(tps > 0.0, "TPS must be positive, got {}", tps);
        self.config.tps = tps;
        self
    }

    /// Sets the channel capacity for platform → core communication.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.config.channel_capacity = capacity;
        self
    }

    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_audio(mut self, audio: Box<dyn AudioSink>) -> Self {
        self.audio = Some(audio);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builds the engine instance.
    pub fn build(self) -> Engine<S> {
        info!(
            "Building engine (TPS: {}, channel: {})",
            self.config.tps, self.config.channel_capacity
        );

        let settings = WindowSettings {
            title: self.title,
            width: self.config.screen_width,
            height: self.config.screen_height,
        };
        let tps = self.config.tps;
        let channel_capacity = self.config.channel_capacity;
        let renderer = self.renderer.unwrap_or_else(|| Box::new(HeadlessRenderer::new()));
        let audio = self.audio.unwrap_or_else(|| Box::new(SilentAudio::new()));

        Engine {
            orchestrator: CoreSystemsOrchestrator::new(GlobalContext::new(self.config, renderer, audio)),
            settings,
            tps,
            channel_capacity,
        }
    }
}

impl<S: SceneKey> Default for EngineBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

//=== Engine ==============================================================

/// Card stage runtime.
///
/// ```text
/// Engine (Main Thread)
///   ├─► CoreSystemsOrchestrator (Logic Thread @ TPS)
///   │     └─► InputSystem, SceneManager
///   │
///   └─► Platform (Event Loop)
///         └─► Window, Input Polling
///
/// Communication: bounded crossbeam channel (PlatformEvent)
/// ```
pub struct Engine<S: SceneKey> {
    orchestrator: CoreSystemsOrchestrator<S>,
    settings: WindowSettings,
    tps: f64,
    channel_capacity: usize,
}

impl<S: SceneKey> Engine<S> {
    //--- Initialization ---------------------------------------------------

    /// Configures systems and context before execution (scene factories,
    /// key bindings, persistent widgets).
    pub fn init<F>(mut self, init_fn: F) -> Self
    where
        F: FnOnce(&mut GlobalSystems<S>, &mut GlobalContext),
    {
        info!("Initializing engine systems");
        self.orchestrator.init_systems(init_fn);
        info!("Engine initialization complete");
        self
    }

    //--- Execution --------------------------------------------------------

    /// Opens the window and blocks until the application exits.
    ///
    /// # Lifecycle
    ///
    /// 1. Creates the bounded channel for platform → core communication
    /// 2. Spawns the logic thread at the configured TPS
    /// 3. Runs the platform event loop (blocks here)
    /// 4. Joins the logic thread
    pub fn run(self) {
        info!("Starting engine runtime (TPS: {})", self.tps);

        //--- 1. Create communication channel -----------------------------
        let (tx, rx): (Sender<PlatformEvent>, Receiver<PlatformEvent>) =
            bounded(self.channel_capacity);
        let core_finished = Arc::new(AtomicBool::new(false));

        //--- 2. Spawn the core logic thread -------------------------------
        let core_handle = self.orchestrator.spawn_core_thread(rx, self.tps, core_finished.clone());
        info!("Core logic thread spawned");

        //--- 3. Launch the platform subsystem -----------------------------
        let platform = Platform::new(tx, self.settings, core_finished);
        if let Err(e) = platform.run() {
            error!("Platform error: {}", e);
        }
        info!("Platform event loop exited");

        //--- 4. Cleanup: Wait for logic thread to terminate --------------
        match core_handle.join() {
            Ok(()) => info!("Core thread terminated cleanly"),
            Err(e) => error!("Core thread panicked: {:?}", e),
        }

        info!("Engine shutdown complete");
    }

    /// Runs the stage without a window for at most `max_frames` ticks,
    /// as fast as possible. Returns the number of ticks run.
    pub fn run_headless(mut self, max_frames: u64) -> u64 {
        info!("Starting headless run (max {} frames)", max_frames);
        let mut frames = 0;
        while frames < max_frames {
            frames += 1;
            if self.orchestrator.step(Vec::new()) == TickControl::Exit {
                info!("Stage finished after {} frames", frames);
                return frames;
            }
        }
        warn!("Headless run stopped at the frame limit");
        frames
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
