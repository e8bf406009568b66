//=========================================================================
// Platform Subsystem
//
// Bridges Winit (OS-level events) with the core thread via a bounded
// crossbeam channel.
//
// Architecture:
// ```text
//  Main Thread:                     Logic Thread:
//  ┌──────────────────────────┐    ┌──────────────────┐
//  │  Winit Event Loop        │    │  Orchestrator    │
//  │   ↓                      │    │   ↓              │
//  │  InputProcessor          │    │  InputSystem     │
//  │   ↓                      │    │   ↓              │
//  │  InputBuffer             │    │  SceneManager    │
//  │   ↓                      │    │                  │
//  │  RedrawRequested (flush) │    └──────────────────┘
//  │   ↓                      │             ↑
//  │  Channel ────────────────┼─────────────┘
//  └──────────────────────────┘    PlatformEvent
// ```
//
// RedrawRequested is the frame boundary: buffered input is sent as one
// message. When the core thread finishes on its own (scene exit, fatal
// error) it raises the shared shutdown flag and the event loop closes.
//
//=========================================================================

//=== Submodules ==========================================================

mod input_buffer;
mod input_processor;

//=== External Crates =====================================================

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};
use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

//=== Internal Imports ====================================================

use crate::core::platform_bridge::{PlatformError, PlatformEvent};
use input_buffer::InputBuffer;
use input_processor::InputProcessor;

//=== WindowSettings ======================================================

/// Window parameters handed over by the engine.
#[derive(Debug, Clone)]
pub(crate) struct WindowSettings {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

//=== Platform ============================================================

/// Window owner and input aggregator. Lives on the main thread.
pub(crate) struct Platform {
    window: Option<Window>,
    settings: WindowSettings,
    buffer: InputBuffer,
    event_sender: Sender<PlatformEvent>,
    input_processor: InputProcessor,
    core_finished: Arc<AtomicBool>,
}

impl Platform {
    //--- Construction -----------------------------------------------------

    /// Creates the platform. The window is created lazily in `resumed()`.
    pub fn new(
        event_sender: Sender<PlatformEvent>,
        settings: WindowSettings,
        core_finished: Arc<AtomicBool>,
    ) -> Self {
        info!(target: "platform", "Platform subsystem initialized");
        Self {
            window: None,
            settings,
            buffer: InputBuffer::new(),
            event_sender,
            input_processor: InputProcessor::new(),
            core_finished,
        }
    }

    //--- Execution --------------------------------------------------------

    /// Runs the Winit event loop until the window closes.
    ///
    /// # Panics
    ///
    /// Panics if called off the main thread (macOS/iOS Winit requirement).
    pub fn run(mut self) -> Result<(), PlatformError> {
        debug!(target: "platform", "Starting Winit event loop");

        let event_loop = EventLoop::new()
            .map_err(|e| PlatformError::EventLoopCreation(e.to_string()))?;

        event_loop
            .run_app(&mut self)
            .map_err(|e| PlatformError::EventLoopExecution(e.to_string()))
    }

    //--- Internal Helpers -------------------------------------------------

    /// Sends buffered input to the core thread.
    ///
    /// A full channel drops the frame's input with a warning; a
    /// disconnected one means the core thread is gone.
    fn flush_input_buffer(&mut self) {
        let Some((discrete, continuous)) = self.buffer.drain() else {
            return;
        };
        let total = discrete.len() + continuous.len();
        trace!(target: "platform::input", "Flushing {} events", total);

        match self.event_sender.try_send(PlatformEvent::Inputs { discrete, continuous }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!(target: "platform::input", "Core channel full, dropping {} events", total);
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!(target: "platform::input", "Channel disconnected, dropping {} events", total);
            }
        }
    }

    fn close(&mut self, event_loop: &ActiveEventLoop) {
        let _ = self.event_sender.send(PlatformEvent::WindowClosed);
        event_loop.exit();
    }
}

//=== Winit Integration ===================================================

impl ApplicationHandler for Platform {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(self.settings.title.clone())
            .with_inner_size(LogicalSize::new(self.settings.width, self.settings.height))
            .with_resizable(false);

        match event_loop.create_window(attrs) {
            Ok(window) => {
                info!(
                    target: "platform",
                    "Window created: {}x{} @ {}x DPI",
                    window.inner_size().width,
                    window.inner_size().height,
                    window.scale_factor()
                );
                window.request_redraw();
                self.window = Some(window);
            }
            Err(e) => {
                error!(target: "platform", "Window creation failed: {}", e);
                self.close(event_loop);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match &event {
            WindowEvent::CloseRequested => {
                info!(target: "platform", "Window close requested");
                self.close(event_loop);
            }

            WindowEvent::ModifiersChanged(state) => {
                self.input_processor.update_modifiers(state.state());
            }

            WindowEvent::CursorMoved { position, .. } => {
                let event = self
                    .input_processor
                    .process_mouse_move(position.x as f32, position.y as f32);
                self.buffer.push_continuous(event);
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                if let Some(event) = self.input_processor.process_key_event(key_event) {
                    self.buffer.push_discrete(event);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let event = self.input_processor.process_mouse_button(*button, *state);
                self.buffer.push_discrete(event);
            }

            WindowEvent::RedrawRequested => {
                if self.core_finished.load(Ordering::Acquire) {
                    info!(target: "platform", "Core finished, closing window");
                    event_loop.exit();
                    return;
                }

                self.flush_input_buffer();

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::event::{InputEvent, KeyCode, Modifiers};
    use crossbeam_channel::bounded;

    fn platform(capacity: usize) -> (Platform, crossbeam_channel::Receiver<PlatformEvent>) {
        let (tx, rx) = bounded(capacity);
        let settings = WindowSettings { title: "test".into(), width: 816.0, height: 624.0 };
        (Platform::new(tx, settings, Arc::new(AtomicBool::new(false))), rx)
    }

    fn space() -> InputEvent {
        InputEvent::KeyDown { key: KeyCode::Space, modifiers: Modifiers::NONE }
    }

    #[test]
    fn window_is_created_lazily() {
        let (platform, _rx) = platform(4);
        assert!(platform.window.is_none());
    }

    #[test]
    fn flush_empty_buffer_is_noop() {
        let (mut platform, rx) = platform(4);
        platform.flush_input_buffer();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn flush_sends_buffered_events_once() {
        let (mut platform, rx) = platform(4);
        platform.buffer.push_discrete(space());

        platform.flush_input_buffer();
        platform.flush_input_buffer();

        assert_eq!(
            rx.try_recv().unwrap(),
            PlatformEvent::Inputs { discrete: vec![space()], continuous: vec![] }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn flush_survives_full_or_closed_channel() {
        let (mut platform, rx) = platform(1);
        platform.buffer.push_discrete(space());
        platform.flush_input_buffer();
        platform.buffer.push_discrete(space());
        platform.flush_input_buffer();
        assert!(platform.buffer.is_empty());

        drop(rx);
        platform.buffer.push_discrete(space());
        platform.flush_input_buffer();
    }

    #[test]
    fn platform_error_displays_cause() {
        let err = PlatformError::EventLoopCreation("no display".into());
        assert_eq!(err.to_string(), "event loop creation failed: no display");
    }
}
