//=========================================================================
// Event Bus
//=========================================================================
//
// Typed queues for requests that cross system boundaries within a tick.
//
// Architecture:
//   widgets / scenes → post<E>() → HashMap<TypeId, Vec<E>>
//                                        ↓
//   owner of E ───────────────→ drain<E>() (single consumer)
//
// Scene requests and menu commands travel through here. Queues keep
// their allocation between frames.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::{Any, TypeId};
use std::collections::HashMap;

//=== Event Trait =========================================================

/// Marker for types that can be posted on the [`EventBus`].
pub trait Event: Send + 'static {}

impl<T: Send + 'static> Event for T {}

//=== Type-Erased Queue ===================================================

trait Queue: Send {
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<E: Event> Queue for Vec<E> {
    fn clear(&mut self) {
        Vec::clear(self);
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=== EventBus ============================================================

/// Per-type FIFO queues with single-consumer draining.
#[derive(Default)]
pub struct EventBus {
    queues: HashMap<TypeId, Box<dyn Queue>>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    //--- Posting ----------------------------------------------------------

    /// Appends an event to the queue for its type.
    pub fn post<E: Event>(&mut self, event: E) {
        self.queue_mut::<E>().push(event);
    }

    //--- Consuming --------------------------------------------------------

    /// Removes and returns all queued events of type `E`, oldest first.
    pub fn drain<E: Event>(&mut self) -> Vec<E> {
        match self.queues.get_mut(&TypeId::of::<E>()) {
            Some(queue) => queue
                .as_any_mut()
                .downcast_mut::<Vec<E>>()
                .map(|v| v.drain(..).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Returns the queued events of type `E` without consuming them.
    pub fn peek<E: Event>(&self) -> &[E] {
        self.queues
            .get(&TypeId::of::<E>())
            .and_then(|q| q.as_any().downcast_ref::<Vec<E>>())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of queued events of type `E`.
    pub fn len<E: Event>(&self) -> usize {
        self.queues.get(&TypeId::of::<E>()).map_or(0, |q| q.len())
    }

    /// Drops every queued event of every type, keeping capacity.
    pub fn clear_all(&mut self) {
        for queue in self.queues.values_mut() {
            queue.clear();
        }
    }

    //--- Internal Helpers -------------------------------------------------

    fn queue_mut<E: Event>(&mut self) -> &mut Vec<E> {
        self.queues
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::new(Vec::<E>::new()))
            .as_any_mut()
            .downcast_mut::<Vec<E>>()
            .expect("queue stored under a foreign TypeId")
    }
}

//=========================================================================
// Tests
//=========================================================================
