//=========================================================================
// Splash Scene
//=========================================================================

use log::debug;

use crate::core::error::StageResult;
use crate::core::globals::GlobalContext;
use crate::core::input::InputKey;
use crate::core::render::{Layer, Pose, VisualId};
use crate::core::scene::{Scene, SceneBase, SceneRequest};
use crate::game::StageKey;

/// Logo card: fades in, holds for `splash_frames` (Ok skips), moves on to
/// loading.
pub struct SplashScene {
    base: SceneBase,
    logo: Option<VisualId>,
    held: u32,
    hold_frames: u32,
    leaving: bool,
}

impl SplashScene {
    pub fn new(config: &crate::core::config::StageConfig) -> Self {
        Self {
            base: SceneBase::new("splash", config.input_cooldown_frames),
            logo: None,
            held: 0,
            hold_frames: config.splash_frames,
            leaving: false,
        }
    }

    pub fn held_frames(&self) -> u32 {
        self.held
    }
}

impl Scene for SplashScene {
    fn base(&self) -> &SceneBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut SceneBase {
        &mut self.base
    }

    fn create(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.create(context)?;
        let renderer = context.renderer.as_mut();
        let logo = renderer.add_sprite("splash_logo");
        renderer.set_layer(logo, Layer::Ui);
        renderer.set_pose(logo, Pose::at(context.config.screen_width / 2.0, context.config.screen_height / 2.0));
        renderer.set_visible(logo, true);
        self.logo = Some(logo);
        Ok(())
    }

    fn start(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.start(context)?;
        self.base.start_fade_in(context.config.fade_frames, context);
        Ok(())
    }

    fn update(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        // The frame that finishes the fade-in is not part of the hold.
        let fading = self.base.is_busy();
        self.base.update(context);
        if fading || !self.base.is_active() || self.leaving || self.base.is_busy() {
            return Ok(());
        }

        self.held += 1;
        let skipped =
            context.input.is_triggered(InputKey::Ok) && self.base.cooldown_mut().try_trigger(InputKey::Ok);
        if skipped || self.held >= self.hold_frames {
            debug!(target: "stage", "splash: done after {} frames (skipped: {})", self.held, skipped);
            self.leaving = true;
            context.bus.post(SceneRequest::Goto(StageKey::Loading));
        }
        Ok(())
    }

    fn terminate(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.terminate(context)?;
        if let Some(logo) = self.logo.take() {
            context.renderer.remove_sprite(logo);
        }
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
