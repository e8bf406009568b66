//=========================================================================
// Loading Scene
//=========================================================================
//
// Requests every texture the table needs, shows a gauge while the
// renderer works through them and moves on to the title once all of them
// are in.
//
//=========================================================================

use log::{debug, info};

use crate::core::config::StageConfig;
use crate::core::error::StageResult;
use crate::core::globals::GlobalContext;
use crate::core::scene::{Scene, SceneBase, SceneRequest, WidgetId};
use crate::game::cards::{CardColor, CARD_BACK};
use crate::game::widgets::ProgressGauge;
use crate::game::StageKey;

/// Textures used by the title and gameplay scenes.
pub fn stage_assets() -> Vec<String> {
    let mut assets = Vec::with_capacity(64);
    for color in CardColor::PLAYABLE {
        let symbol = color.symbol();
        for value in 0..=9 {
            assets.push(format!("card_{}_{}", symbol, value));
        }
        for value in ["skip", "reverse", "draw2"] {
            assets.push(format!("card_{}_{}", symbol, value));
        }
    }
    assets.extend(["card_wild_wild", "card_wild_wild4", CARD_BACK, "table", "deck_pile", "discard_pile"].map(String::from));
    assets
}

pub struct LoadingScene {
    base: SceneBase,
    gauge: Option<WidgetId>,
    leaving: bool,
}

impl LoadingScene {
    pub fn new(config: &StageConfig) -> Self {
        Self {
            base: SceneBase::new("loading", config.input_cooldown_frames),
            gauge: None,
            leaving: false,
        }
    }

    /// Progress last shown on the gauge.
    pub fn ratio(&self) -> f32 {
        self.gauge
            .and_then(|id| self.base.widget::<ProgressGauge>(id))
            .map_or(0.0, |gauge| gauge.ratio())
    }
}

impl Scene for LoadingScene {
    fn base(&self) -> &SceneBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut SceneBase {
        &mut self.base
    }

    fn create(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.create(context)?;
        let assets = stage_assets();
        let names: Vec<&str> = assets.iter().map(String::as_str).collect();
        context.renderer.request_preload(&names);
        info!(target: "stage", "loading: {} assets requested", names.len());
        Ok(())
    }

    fn start(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.start(context)?;
        self.gauge = Some(self.base.add_widget(Box::new(ProgressGauge::new()), false, context)?);
        self.base.start_fade_in(context.config.fade_frames, context);
        Ok(())
    }

    fn update(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.base.update(context);
        if !self.base.is_active() || self.leaving {
            return Ok(());
        }

        let progress = context.renderer.poll_preload();
        if let Some(gauge) = self.gauge.and_then(|id| self.base.widget_mut::<ProgressGauge>(id)) {
            gauge.set_progress(progress, context.renderer.as_mut());
        }

        if progress.is_complete() && !self.base.is_busy() {
            debug!(target: "stage", "loading: {}/{} done", progress.loaded, progress.total);
            self.leaving = true;
            context.bus.post(SceneRequest::Goto(StageKey::Title));
        }
        Ok(())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
