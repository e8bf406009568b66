//=========================================================================
// Stage Errors
//=========================================================================
//
// Error taxonomy shared by the scene stack and the card layer.
//
// Contract violations (bad widget handles, inactive scenes, sprites that
// are still animating) are logged where they happen and returned as
// `Err` without touching state. Data errors raised by the card layer
// (see `game::cards::SymbolError`) are fatal and travel up through
// `Scene::update` to the orchestrator.
//
//=========================================================================

//=== External Dependencies ===============================================

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::scene::ScenePhase;
use crate::game::cards::SymbolError;

//=== StageError ==========================================================

/// Errors reported by scenes, widgets and the card sprite pool.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StageError {
    /// A widget handle does not belong to the scene (or was already removed).
    #[error("widget {0} is not registered with this scene")]
    WidgetNotRegistered(String),

    /// A disposed widget was handed to `add_widget`.
    #[error("widget '{0}' has already been disposed")]
    WidgetDisposed(&'static str),

    /// `add_widget` without `forced` on a scene that is not active.
    #[error("scene is not active; widget '{0}' rejected")]
    SceneInactive(&'static str),

    /// A lifecycle hook was called out of order.
    #[error("cannot {action} a scene in phase {phase:?}")]
    InvalidPhase {
        action: &'static str,
        phase: ScenePhase,
    },

    /// A sprite was released while an animation still references it.
    #[error("sprite #{0} still has an animation in flight")]
    SpriteAnimating(usize),

    /// A sprite index that is not currently acquired.
    #[error("sprite #{0} is not acquired")]
    SpriteNotAcquired(usize),

    /// A seat index outside the table.
    #[error("seat {seat} is out of range (table has {seats} seats)")]
    SeatOutOfRange { seat: usize, seats: usize },

    /// Card data that cannot be mapped to an image symbol. Fatal.
    #[error(transparent)]
    Symbol(#[from] SymbolError),
}

impl StageError {
    /// Returns true for errors that must stop the frame loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Symbol(_))
    }
}

/// Result alias used across the stage.
pub type StageResult<T> = Result<T, StageError>;

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_symbol_errors_are_fatal() {
        assert!(!StageError::SpriteAnimating(3).is_fatal());
        assert!(!StageError::SceneInactive("menu").is_fatal());

        let symbol = StageError::from(SymbolError::UnknownColor("purple".into()));
        assert!(symbol.is_fatal());
    }

    #[test]
    fn messages_name_the_offender() {
        let err = StageError::SeatOutOfRange { seat: 5, seats: 4 };
        assert_eq!(err.to_string(), "seat 5 is out of range (table has 4 seats)");

        let err = StageError::InvalidPhase { action: "start", phase: ScenePhase::Disposed };
        assert!(err.to_string().contains("Disposed"));
    }
}
