//=========================================================================
// Fade Transition
//=========================================================================
//
// Full-screen fade curtain driven one step per frame.
//
// The curtain opacity approaches its target geometrically:
//
//   opacity += (target - opacity) / remaining_frames
//
// so each frame consumes the same fraction of the remaining distance
// (ease-out). On the frame the timer reaches zero the opacity lands
// exactly on the target.
//
//   fade-in : curtain 1.0 → 0.0 (scene appears)
//   fade-out: curtain 0.0 → 1.0 (scene disappears)
//
//=========================================================================

//=== FadeDirection =======================================================

/// Direction of a running fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

impl FadeDirection {
    /// `+1` for fade-in, `-1` for fade-out.
    pub fn sign(self) -> i8 {
        match self {
            Self::In => 1,
            Self::Out => -1,
        }
    }

    /// Curtain opacity this direction converges to.
    pub fn target(self) -> f32 {
        match self {
            Self::In => 0.0,
            Self::Out => 1.0,
        }
    }
}

//=== FadeTransition ======================================================

/// Fade timer and curtain opacity of one scene.
#[derive(Debug, Clone, PartialEq)]
pub struct FadeTransition {
    direction: Option<FadeDirection>,
    timer: u32,
    duration: u32,
    opacity: f32,
}

impl FadeTransition {
    /// Frames used when no duration is given.
    pub const DEFAULT_FRAMES: u32 = 30;

    /// Idle transition with a transparent curtain.
    pub fn new() -> Self {
        Self {
            direction: None,
            timer: 0,
            duration: 0,
            opacity: 0.0,
        }
    }

    //--- Control ----------------------------------------------------------

    /// Starts revealing the scene from a black curtain.
    pub fn start_in(&mut self, duration: u32) {
        self.begin(FadeDirection::In, duration, 1.0);
    }

    /// Starts covering the scene from a clear curtain.
    pub fn start_out(&mut self, duration: u32) {
        self.begin(FadeDirection::Out, duration, 0.0);
    }

    /// Advances one frame. Returns the direction that finished on this
    /// frame, if any.
    pub fn update(&mut self) -> Option<FadeDirection> {
        let direction = self.direction?;
        if self.timer == 0 {
            return None;
        }

        let target = direction.target();
        self.opacity += (target - self.opacity) / self.timer as f32;
        self.timer -= 1;

        if self.timer == 0 {
            self.finish(direction);
            return Some(direction);
        }
        None
    }

    //--- Queries ----------------------------------------------------------

    /// True while the timer is running.
    pub fn is_active(&self) -> bool {
        self.timer > 0
    }

    /// Direction of the running fade.
    pub fn direction(&self) -> Option<FadeDirection> {
        self.direction
    }

    /// Frames left.
    pub fn remaining(&self) -> u32 {
        self.timer
    }

    /// Length the current (or last) fade was started with.
    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Current curtain opacity.
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    //--- Internal Helpers -------------------------------------------------

    fn begin(&mut self, direction: FadeDirection, duration: u32, from: f32) {
        self.direction = Some(direction);
        self.duration = duration;
        self.timer = duration;
        self.opacity = from;
        if duration == 0 {
            self.finish(direction);
        }
    }

    fn finish(&mut self, direction: FadeDirection) {
        self.opacity = direction.target();
        self.direction = None;
        self.timer = 0;
    }
}

impl Default for FadeTransition {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
