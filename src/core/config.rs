//=========================================================================
// Stage Configuration
//=========================================================================
//
// Tunables for the frame loop, transitions and card animation.
//
// Loaded from TOML; every field has a default so partial files work:
//
// ```toml
// tps = 60.0
// fade_frames = 24
//
// draw_stagger_ms = 250
// ```
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

//=== ConfigError =========================================================

/// Errors raised while loading or validating a [`StageConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization back to TOML failed.
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// A value is outside its accepted range.
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

//=== StageConfig =========================================================

/// All tunables of the stage.
///
/// Frame-based values count logic ticks; `*_ms` values are converted to
/// ticks by the scheduler using [`StageConfig::frame_ms`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Logic ticks per second.
    pub tps: f64,
    /// Platform → core channel capacity.
    pub channel_capacity: usize,

    /// Base fade length in frames (`fade_out_all` uses twice this).
    pub fade_frames: u32,
    /// Frames an input key stays locked after it fires.
    pub input_cooldown_frames: u8,

    /// Number of seats at the table.
    pub seats: usize,
    /// Card sprites created up front.
    pub initial_pool_size: usize,
    /// Sprites kept in the discard container before older ones are recycled.
    pub discard_keep: usize,

    /// Delay between consecutive cards of one draw batch.
    pub draw_stagger_ms: u64,
    /// How long a revealed draw stays face up before returning to the deck.
    pub reveal_hold_ms: u64,
    pub draw_move_ms: u64,
    pub play_move_ms: u64,
    pub layout_move_ms: u64,
    pub return_move_ms: u64,

    pub card_width: f32,
    pub card_height: f32,
    pub screen_width: f32,
    pub screen_height: f32,
    /// Extent of a hand canvas along its stacking axis.
    pub hand_span: f32,
    /// Extent of a hand canvas across its stacking axis.
    pub hand_depth: f32,

    /// Seed of the scripted demo opponent.
    pub rules_seed: u64,

    /// Frames the splash screen holds before moving on.
    pub splash_frames: u32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            tps: 60.0,
            channel_capacity: 128,
            fade_frames: 30,
            input_cooldown_frames: 6,
            seats: 4,
            initial_pool_size: 116,
            discard_keep: 6,
            draw_stagger_ms: 300,
            reveal_hold_ms: 2000,
            draw_move_ms: 400,
            play_move_ms: 300,
            layout_move_ms: 200,
            return_move_ms: 300,
            card_width: 50.0,
            card_height: 70.0,
            screen_width: 816.0,
            screen_height: 624.0,
            hand_span: 350.0,
            hand_depth: 90.0,
            rules_seed: 7,
            splash_frames: 90,
        }
    }
}

impl StageConfig {
    //--- Loading ----------------------------------------------------------

    /// Reads and validates a TOML config file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Renders the config as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    //--- Validation -------------------------------------------------------

    /// Rejects values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tps > 0.0) {
            return Err(invalid("tps", format!("must be positive, got {}", self.tps)));
        }
        if self.channel_capacity == 0 {
            return Err(invalid("channel_capacity", "must be positive".into()));
        }
        if self.fade_frames == 0 {
            return Err(invalid("fade_frames", "must be at least one frame".into()));
        }
        if !(1..=8).contains(&self.seats) {
            return Err(invalid("seats", format!("must be within 1..=8, got {}", self.seats)));
        }
        if self.card_width <= 0.0 || self.card_height <= 0.0 {
            return Err(invalid("card_width", "card footprint must be positive".into()));
        }
        if self.hand_span < self.card_width {
            return Err(invalid("hand_span", "must fit at least one card".into()));
        }
        Ok(())
    }

    //--- Derived Values ---------------------------------------------------

    /// Length of one logic tick in milliseconds.
    pub fn frame_ms(&self) -> f64 {
        1000.0 / self.tps
    }

    /// Fade length used by `fade_out_all`.
    pub fn slow_fade_frames(&self) -> u32 {
        self.fade_frames * 2
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_are_valid() {
        let config = StageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.initial_pool_size, 116);
        assert_eq!(config.slow_fade_frames(), 60);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = StageConfig::from_toml_str("fade_frames = 24\nseats = 2\n").unwrap();
        assert_eq!(config.fade_frames, 24);
        assert_eq!(config.seats, 2);
        assert_eq!(config.draw_stagger_ms, 300);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = StageConfig::from_toml_str("seats = 12").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "seats", .. }));

        let err = StageConfig::from_toml_str("tps = 0.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "tps", .. }));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = StageConfig::from_toml_str("fade_frames = \"slow\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn round_trips_through_toml() {
        let config = StageConfig { discard_keep: 3, ..StageConfig::default() };
        let text = config.to_toml_string().unwrap();
        assert_eq!(StageConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn frame_ms_follows_tps() {
        let config = StageConfig { tps: 50.0, ..StageConfig::default() };
        assert_relative_eq!(config.frame_ms(), 20.0);
    }
}
