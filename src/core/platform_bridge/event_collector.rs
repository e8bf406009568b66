//=========================================================================
// Event Collector
//=========================================================================
//
// Core-side reader of the platform channel.
//
// Architecture:
//   Receiver<PlatformEvent> → collect_frame() → input batches → TickControl
//
// At most `max_per_frame` messages are taken per tick so a flood of input
// cannot starve the update loop; the rest waits for the next tick.
//
//=========================================================================

//=== External Dependencies ===============================================

use crossbeam_channel::{Receiver, TryRecvError};
use log::{info, warn};

//=== Internal Dependencies ===============================================

use super::PlatformEvent;
use crate::core::input::event::InputEvent;

//=== TickControl =========================================================

/// Update loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickControl {
    Continue,
    Exit,
}

//=== EventCollector ======================================================

pub(crate) struct EventCollector {
    receiver: Receiver<PlatformEvent>,
    input_batches: Vec<Vec<InputEvent>>,
    max_per_frame: usize,
}

impl EventCollector {
    pub(crate) fn new(receiver: Receiver<PlatformEvent>, max_per_frame: usize) -> Self {
        Self {
            receiver,
            input_batches: Vec::with_capacity(4),
            max_per_frame: max_per_frame.max(1),
        }
    }

    /// Drains pending platform messages for this tick.
    pub(crate) fn collect_frame(&mut self) -> TickControl {
        self.input_batches.clear();

        for _ in 0..self.max_per_frame {
            match self.receiver.try_recv() {
                Ok(PlatformEvent::Inputs { discrete, continuous }) => {
                    if !discrete.is_empty() {
                        self.input_batches.push(discrete);
                    }
                    if !continuous.is_empty() {
                        self.input_batches.push(continuous);
                    }
                }
                Ok(PlatformEvent::WindowClosed) => {
                    info!("Window closed, stopping core loop");
                    return TickControl::Exit;
                }
                Err(TryRecvError::Disconnected) => return TickControl::Exit,
                Err(TryRecvError::Empty) => return TickControl::Continue,
            }
        }

        if !self.receiver.is_empty() {
            warn!("Event queue backlog: {} messages deferred", self.receiver.len());
        }
        TickControl::Continue
    }

    /// Takes this tick's input batches.
    pub(crate) fn take_batches(&mut self) -> Vec<Vec<InputEvent>> {
        std::mem::take(&mut self.input_batches)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{KeyCode, Modifiers};
    use crossbeam_channel::{bounded, unbounded};

    fn enter() -> InputEvent {
        InputEvent::KeyDown { key: KeyCode::Enter, modifiers: Modifiers::NONE }
    }

    #[test]
    fn empty_queue_continues() {
        let (_tx, rx) = unbounded::<PlatformEvent>();
        let mut collector = EventCollector::new(rx, 16);

        assert_eq!(collector.collect_frame(), TickControl::Continue);
        assert!(collector.take_batches().is_empty());
    }

    #[test]
    fn batches_keep_discrete_and_continuous_apart() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx, 16);

        tx.send(PlatformEvent::Inputs { discrete: vec![enter()], continuous: vec![] }).unwrap();
        tx.send(PlatformEvent::Inputs {
            discrete: vec![],
            continuous: vec![InputEvent::MouseMoved { x: 10.0, y: 20.0 }],
        })
        .unwrap();

        assert_eq!(collector.collect_frame(), TickControl::Continue);
        assert_eq!(collector.take_batches().len(), 2);
    }

    #[test]
    fn drain_is_bounded_per_frame() {
        let (tx, rx) = bounded(8);
        let mut collector = EventCollector::new(rx, 2);
        for _ in 0..5 {
            tx.send(PlatformEvent::Inputs { discrete: vec![enter()], continuous: vec![] }).unwrap();
        }

        collector.collect_frame();
        assert_eq!(collector.take_batches().len(), 2);
        collector.collect_frame();
        collector.collect_frame();
        assert_eq!(collector.take_batches().len(), 1);
    }

    #[test]
    fn window_closed_and_disconnect_exit() {
        let (tx, rx) = unbounded();
        let mut collector = EventCollector::new(rx, 16);
        tx.send(PlatformEvent::WindowClosed).unwrap();
        assert_eq!(collector.collect_frame(), TickControl::Exit);

        drop(tx);
        assert_eq!(collector.collect_frame(), TickControl::Exit);
    }
}
