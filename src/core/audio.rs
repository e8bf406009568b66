//=========================================================================
// Audio Seam
//=========================================================================
//
// The mixer is an external collaborator; the stage only asks it to play
// sound effects and to fade everything out ahead of a screen change.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;

use log::debug;

//=== AudioSink ===========================================================

/// Audio requests issued by scenes.
pub trait AudioSink: Send {
    /// Fades out all playing music and ambience over `seconds`.
    fn fade_out_all(&mut self, seconds: f32);

    /// Plays a one-shot sound effect.
    fn play_se(&mut self, name: &str);

    /// Downcast access for inspection by tools and tests.
    fn as_any(&self) -> &dyn Any;
}

//=== SilentAudio =========================================================

/// Audio sink that only logs, remembering what it was asked to do.
#[derive(Debug, Default)]
pub struct SilentAudio {
    last_fade: Option<f32>,
    played: Vec<String>,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Length of the most recent `fade_out_all` request.
    pub fn last_fade(&self) -> Option<f32> {
        self.last_fade
    }

    /// Sound effects played so far.
    pub fn played(&self) -> &[String] {
        &self.played
    }
}

impl AudioSink for SilentAudio {
    fn fade_out_all(&mut self, seconds: f32) {
        debug!(target: "audio", "fade_out_all over {:.2}s", seconds);
        self.last_fade = Some(seconds);
    }

    fn play_se(&mut self, name: &str) {
        debug!(target: "audio", "se {}", name);
        self.played.push(name.to_owned());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
