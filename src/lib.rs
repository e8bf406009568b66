//=========================================================================
// Card Stage — Library Root
//
// Presentation layer of a card game: scene lifecycle, fade transitions,
// widgets, and the card sprite pool / animation scheduler / hand layout
// used during play.
//
// Responsibilities:
// - Expose the engine facade (`Engine`, `EngineBuilder`)
// - Expose `core` (scene stack, input, collaborator traits) for
//   extension and `game` (the card table scenes) for the demo binary
// - Keep the windowing backend (`platform`) private
//
// Typical usage:
// ```no_run
// use card_stage::EngineBuilder;
// use card_stage::game::{self, ScriptedRules, StageKey};
//
// EngineBuilder::<StageKey>::new()
//     .build()
//     .init(|systems, _context| {
//         game::register_scenes(&mut systems.scene_manager, |_config| {
//             Box::new(ScriptedRules::demo(4))
//         });
//     })
//     .run();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds the engine-level systems: scene lifecycle, input, the
// event bus and the renderer/audio seams.
//
// `game` holds the card table built on top of `core`.
//
pub mod core;
pub mod game;
pub mod prelude;

//--- Internal Modules ----------------------------------------------------
//
// `platform` wraps Winit (window, event loop) and stays private.
// `engine` wires platform and core threads together.
//
mod engine;
mod platform;

//--- Public Exports ------------------------------------------------------

pub use engine::{Engine, EngineBuilder};
