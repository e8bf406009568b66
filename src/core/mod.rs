//=========================================================================
// Core Systems Orchestrator
//
// Central coordinator for everything running on the logic (non-platform)
// thread.
//
// Responsibilities:
// - Own the global systems (input, scene manager) and the shared context
// - Receive platform events over the bounded crossbeam channel
// - Tick at a fixed rate (TPS)
// - Stop on window close, scene exit or a fatal scene error
//
// Notes:
// The orchestrator never touches the window. Communication with the
// platform happens only through the channel and the shared
// `core_finished` flag raised when this thread ends on its own.
//
//=========================================================================

//=== Module Declarations =================================================

pub mod audio;
pub mod config;
pub mod error;
pub mod event_bus;
pub mod globals;
pub mod input;
pub(crate) mod platform_bridge;
pub mod render;
pub mod scene;

//=== Standard Library Imports ============================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

//=== External Crates =====================================================

use crossbeam_channel::Receiver;
use log::{error, info, trace};

//=== Internal Modules ====================================================

use globals::{GlobalContext, GlobalSystems};
use input::InputEvent;
use platform_bridge::{EventCollector, PlatformEvent, TickControl};
use scene::SceneKey;

//=== CoreSystemsOrchestrator =============================================

/// Owns the logic-thread state and drives it one tick at a time.
pub(crate) struct CoreSystemsOrchestrator<S: SceneKey> {
    systems: GlobalSystems<S>,
    context: GlobalContext,
    started: bool,
}

impl<S: SceneKey> CoreSystemsOrchestrator<S> {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new(context: GlobalContext) -> Self {
        Self {
            systems: GlobalSystems::new(),
            context,
            started: false,
        }
    }

    /// Gives the caller mutable access to systems and context before the
    /// first tick (scene registration, key bindings, persistent widgets).
    pub(crate) fn init_systems<F>(&mut self, init_fn: F)
    where
        F: FnOnce(&mut GlobalSystems<S>, &mut GlobalContext),
    {
        init_fn(&mut self.systems, &mut self.context);
    }

    #[cfg(test)]
    pub(crate) fn context(&self) -> &GlobalContext {
        &self.context
    }

    //--- Ticking ----------------------------------------------------------

    /// Runs one tick with the given input batches.
    ///
    /// The first call enters the default scene. Returns `Exit` once the
    /// scene manager has exited or a fatal error stopped the stage.
    pub(crate) fn step(&mut self, batches: Vec<Vec<InputEvent>>) -> TickControl {
        if !self.started {
            self.started = true;
            if let Err(err) = self.systems.scene_manager.start(&mut self.context) {
                error!("Fatal error entering the first scene: {}", err);
                return TickControl::Exit;
            }
        }

        self.context.frame_events = batches;
        if let Err(err) = self.systems.update(&mut self.context) {
            error!("Fatal error at frame {}: {}", self.context.frame, err);
            return TickControl::Exit;
        }
        trace!("Frame {} done", self.context.frame);

        if self.systems.is_finished() {
            TickControl::Exit
        } else {
            TickControl::Continue
        }
    }

    //--- spawn_core_thread() ---------------------------------------------
    //
    // Each tick:
    //  1. Collects platform events (bounded drain)
    //  2. Runs input + scene update
    //  3. Sleeps to maintain fixed pacing
    //  4. Exits on window close, disconnect, scene exit or fatal error
    //
    pub(crate) fn spawn_core_thread(
        mut self,
        receiver: Receiver<PlatformEvent>,
        tps: f64,
        core_finished: Arc<AtomicBool>,
    ) -> thread::JoinHandle<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / tps);
        let max_per_frame = self.context.config.channel_capacity;

        thread::spawn(move || {
            let mut collector = EventCollector::new(receiver, max_per_frame);

            loop {
                let frame_start = Instant::now();

                //--- Step 1: Gather platform events ------------------------
                if collector.collect_frame() == TickControl::Exit {
                    info!("Core thread exiting (platform closed)");
                    break;
                }

                //--- Step 2: Update systems --------------------------------
                if self.step(collector.take_batches()) == TickControl::Exit {
                    info!("Core thread exiting (stage finished)");
                    break;
                }

                //--- Step 3: Maintain deterministic pacing ----------------
                let elapsed = frame_start.elapsed();
                if elapsed < frame_duration {
                    thread::sleep(frame_duration - elapsed);
                }
            }

            core_finished.store(true, Ordering::Release);
        })
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
