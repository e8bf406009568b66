//=========================================================================
// Platform Bridge
//=========================================================================
//
// Contract between the windowing backend and the core thread.
//
// Components:
// - `interface`: event and error types crossing the thread boundary
// - `event_collector`: core-side bounded draining of the channel
//
//=========================================================================

//=== Module Declarations =================================================

pub(crate) mod event_collector;
pub(crate) mod interface;

//=== Internal API ========================================================

pub(crate) use event_collector::{EventCollector, TickControl};
pub(crate) use interface::PlatformEvent;
pub use interface::PlatformError;
