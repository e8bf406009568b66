//=========================================================================
// Scene Base
//=========================================================================
//
// State and behaviour shared by every scene: lifecycle phase, fade
// curtain, owned widgets with their z-order, the modal overlay and the
// per-key input cooldown.
//
// Update order per tick:
//   1. input cooldown ticks down
//   2. fade advances, curtain opacity pushed to the renderer
//   3. persistent widgets (when this scene hosts them; only always-active
//      ones while an overlay is up)
//   4. owned widgets, back to front
//      (only the overlay and always-active widgets while an overlay is up)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::mem;

use log::{debug, error, trace, warn};
use slotmap::SlotMap;

//=== Internal Dependencies ===============================================

use super::fade::{FadeDirection, FadeTransition};
use super::widget::{Widget, WidgetContext, WidgetId};
use super::ScenePhase;
use crate::core::error::{StageError, StageResult};
use crate::core::globals::GlobalContext;
use crate::core::input::InputCooldown;

//=== Overlay =============================================================

/// Bookkeeping of a raised overlay, restored on close.
struct Overlay {
    widget: WidgetId,
    snapshot: Vec<(WidgetId, bool)>,
    order: Vec<WidgetId>,
}

//=== SceneBase ===========================================================

/// Shared scene state. Concrete scenes embed one and hand it out through
/// [`Scene::base`](super::Scene::base).
pub struct SceneBase {
    name: &'static str,
    phase: ScenePhase,
    fade: FadeTransition,
    widgets: SlotMap<WidgetId, Box<dyn Widget>>,
    order: Vec<WidgetId>,
    overlay: Option<Overlay>,
    cooldown: InputCooldown,
}

impl SceneBase {
    pub fn new(name: &'static str, cooldown_frames: u8) -> Self {
        Self {
            name,
            phase: ScenePhase::Created,
            fade: FadeTransition::new(),
            widgets: SlotMap::with_key(),
            order: Vec::new(),
            overlay: None,
            cooldown: InputCooldown::new(cooldown_frames),
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn phase(&self) -> ScenePhase {
        self.phase
    }

    /// True between `start()` and `stop()`.
    pub fn is_active(&self) -> bool {
        self.phase == ScenePhase::Active
    }

    /// True while a fade is running.
    pub fn is_busy(&self) -> bool {
        self.fade.is_active()
    }

    pub fn fade(&self) -> &FadeTransition {
        &self.fade
    }

    pub fn cooldown(&self) -> &InputCooldown {
        &self.cooldown
    }

    pub fn cooldown_mut(&mut self) -> &mut InputCooldown {
        &mut self.cooldown
    }

    /// Owned widgets, back to front.
    pub fn z_order(&self) -> &[WidgetId] {
        &self.order
    }

    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    pub fn overlay(&self) -> Option<WidgetId> {
        self.overlay.as_ref().map(|o| o.widget)
    }

    pub fn widget<T: Widget>(&self, id: WidgetId) -> Option<&T> {
        self.widgets.get(id).and_then(|w| w.as_any().downcast_ref())
    }

    pub fn widget_mut<T: Widget>(&mut self, id: WidgetId) -> Option<&mut T> {
        self.widgets.get_mut(id).and_then(|w| w.as_any_mut().downcast_mut())
    }

    /// Whether an owned widget is currently active.
    pub fn is_widget_active(&self, id: WidgetId) -> Option<bool> {
        self.widgets.get(id).map(|w| w.is_active())
    }

    //--- Lifecycle --------------------------------------------------------

    pub fn create(&mut self, _context: &mut GlobalContext) -> StageResult<()> {
        self.advance("create", &[ScenePhase::Created], ScenePhase::Starting)
    }

    pub fn start(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.advance("start", &[ScenePhase::Starting], ScenePhase::Active)?;
        context.persistent.attach(self.name, context.renderer.as_mut());
        Ok(())
    }

    /// Advances the fade and updates widgets.
    pub fn update(&mut self, context: &mut GlobalContext) {
        if self.phase == ScenePhase::Disposed {
            warn!(target: "stage", "{}: update after terminate ignored", self.name);
            return;
        }

        self.cooldown.tick();

        let fading = self.fade.is_active();
        if let Some(finished) = self.fade.update() {
            debug!(target: "stage", "{}: fade {:?} finished", self.name, finished);
        }
        if fading {
            context.renderer.set_curtain(self.fade.opacity());
        }

        let overlay = self.overlay.as_ref().map(|o| o.widget);
        let mut ctx = WidgetContext {
            input: &context.input,
            bus: &mut context.bus,
            renderer: context.renderer.as_mut(),
            cooldown: &mut self.cooldown,
        };

        if context.persistent.host() == Some(self.name) {
            context.persistent.update(&mut ctx, overlay.is_some());
        }

        for &id in &self.order {
            let Some(widget) = self.widgets.get_mut(id) else { continue };
            let eligible = match overlay {
                Some(top) => id == top || widget.always_active(),
                None => true,
            };
            if eligible {
                widget.update(&mut ctx);
            }
        }
    }

    pub fn stop(&mut self, _context: &mut GlobalContext) -> StageResult<()> {
        self.advance("stop", &[ScenePhase::Active], ScenePhase::Stopping)
    }

    /// Deactivates every widget and starts the exit fade, unless the
    /// curtain is already on its way down.
    pub fn pre_terminate(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.advance(
            "pre_terminate",
            &[ScenePhase::Starting, ScenePhase::Active, ScenePhase::Stopping],
            ScenePhase::Terminating,
        )?;

        for widget in self.widgets.values_mut() {
            widget.set_active(false);
        }

        let covering = self.fade.direction() == Some(FadeDirection::Out)
            || (!self.fade.is_active() && self.fade.opacity() >= 1.0);
        if !covering {
            self.start_fade_out(context.config.fade_frames, context);
        }
        Ok(())
    }

    /// Disposes every owned widget and releases the persistent widgets.
    pub fn terminate(&mut self, context: &mut GlobalContext) -> StageResult<()> {
        self.advance("terminate", &[ScenePhase::Terminating], ScenePhase::Disposed)?;

        if self.overlay.take().is_some() {
            context.renderer.set_dim(false);
        }
        for id in mem::take(&mut self.order) {
            if let Some(mut widget) = self.widgets.remove(id) {
                if !widget.is_disposed() {
                    widget.dispose(context.renderer.as_mut());
                }
            }
        }
        self.widgets.clear();
        context.persistent.detach(self.name, context.renderer.as_mut());

        debug!(target: "stage", "{}: terminated", self.name);
        Ok(())
    }

    //--- Fades ------------------------------------------------------------

    pub fn start_fade_in(&mut self, duration: u32, context: &mut GlobalContext) {
        self.fade.start_in(duration);
        context.renderer.set_curtain(self.fade.opacity());
    }

    pub fn start_fade_out(&mut self, duration: u32, context: &mut GlobalContext) {
        self.fade.start_out(duration);
        context.renderer.set_curtain(self.fade.opacity());
    }

    /// Fades out audio and screen together ahead of a scene change.
    ///
    /// Audio runs over `2 × fade_frames / tps` seconds and the curtain over
    /// `2 × fade_frames` frames, so the sound never stops before the
    /// picture does.
    pub fn fade_out_all(&mut self, context: &mut GlobalContext) {
        let frames = context.config.slow_fade_frames();
        let seconds = frames as f32 / context.config.tps as f32;
        context.audio.fade_out_all(seconds);
        self.start_fade_out(frames, context);
    }

    //--- Widgets ----------------------------------------------------------

    /// Takes ownership of a widget and builds its visuals.
    ///
    /// Fails when the scene is not active (unless `forced`) or when the
    /// widget has already been disposed. The widget is dropped on failure.
    pub fn add_widget(
        &mut self,
        mut widget: Box<dyn Widget>,
        forced: bool,
        context: &mut GlobalContext,
    ) -> StageResult<WidgetId> {
        if self.phase == ScenePhase::Disposed {
            return Err(self.report(StageError::InvalidPhase {
                action: "add_widget",
                phase: self.phase,
            }));
        }
        if !forced && !self.is_active() {
            return Err(self.report(StageError::SceneInactive(widget.name())));
        }
        if widget.is_disposed() {
            return Err(self.report(StageError::WidgetDisposed(widget.name())));
        }

        widget.create(context.renderer.as_mut());
        let id = self.widgets.insert(widget);
        self.order.push(id);
        trace!(target: "stage", "{}: widget {:?} added", self.name, id);
        Ok(id)
    }

    /// Disposes one owned widget.
    pub fn remove_widget(&mut self, id: WidgetId, context: &mut GlobalContext) -> StageResult<()> {
        let Some(mut widget) = self.widgets.remove(id) else {
            return Err(self.report(StageError::WidgetNotRegistered(format!("{:?}", id))));
        };
        self.order.retain(|&w| w != id);
        if self.overlay.as_ref().map(|o| o.widget) == Some(id) {
            self.close_overlay(context);
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.snapshot.retain(|&(w, _)| w != id);
            overlay.order.retain(|&w| w != id);
        }

        if widget.is_disposed() {
            return Err(self.report(StageError::WidgetDisposed(widget.name())));
        }
        widget.dispose(context.renderer.as_mut());
        Ok(())
    }

    //--- Overlay ----------------------------------------------------------

    /// Makes `id` the modal overlay.
    ///
    /// Siblings are deactivated (always-active ones excepted) and their
    /// previous state is remembered; `id` moves to the top of the z-order
    /// and the background is dimmed.
    pub fn raise_overlay(&mut self, id: WidgetId, context: &mut GlobalContext) -> StageResult<()> {
        if !self.widgets.contains_key(id) {
            return Err(self.report(StageError::WidgetNotRegistered(format!("{:?}", id))));
        }
        match self.overlay.as_ref().map(|o| o.widget) {
            Some(current) if current == id => return Ok(()),
            Some(_) => self.close_overlay(context),
            None => {}
        }

        let snapshot: Vec<(WidgetId, bool)> =
            self.order.iter().map(|&w| (w, self.widgets[w].is_active())).collect();
        let order = self.order.clone();

        for (w, widget) in self.widgets.iter_mut() {
            if w == id {
                widget.set_active(true);
            } else if !widget.always_active() {
                widget.set_active(false);
            }
        }
        self.order.retain(|&w| w != id);
        self.order.push(id);
        context.renderer.set_dim(true);

        debug!(target: "stage", "{}: overlay {:?} raised", self.name, id);
        self.overlay = Some(Overlay { widget: id, snapshot, order });
        Ok(())
    }

    /// Restores the state captured by [`raise_overlay`](Self::raise_overlay).
    /// No-op without an overlay.
    pub fn close_overlay(&mut self, context: &mut GlobalContext) {
        let Some(overlay) = self.overlay.take() else { return };

        for (id, active) in overlay.snapshot {
            if let Some(widget) = self.widgets.get_mut(id) {
                widget.set_active(active);
            }
        }
        self.order = overlay
            .order
            .into_iter()
            .filter(|&w| self.widgets.contains_key(w))
            .collect();
        context.renderer.set_dim(false);

        debug!(target: "stage", "{}: overlay {:?} closed", self.name, overlay.widget);
    }

    //--- Internal Helpers -------------------------------------------------

    fn advance(&mut self, action: &'static str, from: &[ScenePhase], to: ScenePhase) -> StageResult<()> {
        if !from.contains(&self.phase) {
            return Err(self.report(StageError::InvalidPhase { action, phase: self.phase }));
        }
        debug!(target: "stage", "{}: {:?} -> {:?}", self.name, self.phase, to);
        self.phase = to;
        Ok(())
    }

    fn report(&self, err: StageError) -> StageError {
        error!(target: "stage", "{}: {}", self.name, err);
        err
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StageConfig;
    use crate::core::render::HeadlessRenderer;
    use crate::core::scene::widget::tests::Tally;
    use approx::assert_relative_eq;

    fn context() -> GlobalContext {
        GlobalContext::headless(StageConfig::default())
    }

    fn started(context: &mut GlobalContext) -> SceneBase {
        let mut base = SceneBase::new("test", 6);
        base.create(context).unwrap();
        base.start(context).unwrap();
        base
    }

    fn headless(context: &GlobalContext) -> &HeadlessRenderer {
        context.renderer::<HeadlessRenderer>().unwrap()
    }

    //--- Lifecycle --------------------------------------------------------

    #[test]
    fn lifecycle_runs_forward_only() {
        let mut context = context();
        let mut base = SceneBase::new("test", 6);

        assert!(matches!(base.start(&mut context), Err(StageError::InvalidPhase { .. })));
        base.create(&mut context).unwrap();
        assert!(base.create(&mut context).is_err());
        base.start(&mut context).unwrap();
        assert!(base.is_active());

        base.stop(&mut context).unwrap();
        assert!(!base.is_active());
        assert!(base.terminate(&mut context).is_err());
        base.pre_terminate(&mut context).unwrap();
        assert!(base.is_busy());

        while base.is_busy() {
            base.update(&mut context);
        }
        base.terminate(&mut context).unwrap();
        assert_eq!(base.phase(), ScenePhase::Disposed);
    }

    #[test]
    fn pre_terminate_deactivates_and_fades_out() {
        let mut context = context();
        let mut base = started(&mut context);
        let id = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();

        base.pre_terminate(&mut context).unwrap();
        assert_eq!(base.is_widget_active(id), Some(false));
        assert_eq!(base.fade().direction(), Some(FadeDirection::Out));

        while base.is_busy() {
            base.update(&mut context);
        }
        assert_eq!(headless(&context).curtain(), 1.0);
    }

    #[test]
    fn pre_terminate_keeps_a_running_fade_out() {
        let mut context = context();
        let mut base = started(&mut context);

        base.fade_out_all(&mut context);
        let frames = base.fade().remaining();
        assert_eq!(frames, context.config.slow_fade_frames());

        base.pre_terminate(&mut context).unwrap();
        assert_eq!(base.fade().remaining(), frames);
    }

    #[test]
    fn fade_out_all_outlasts_the_curtain_with_audio() {
        let mut context = context();
        let mut base = started(&mut context);
        base.fade_out_all(&mut context);

        let audio = context.audio::<crate::core::audio::SilentAudio>().unwrap();
        let seconds = audio.last_fade().unwrap();
        assert_relative_eq!(seconds, 1.0);
        let visual = base.fade().remaining() as f32 / context.config.tps as f32;
        assert!(seconds >= visual);
    }

    #[test]
    fn terminate_disposes_every_widget() {
        let mut context = context();
        let mut base = started(&mut context);
        base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();
        base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();
        assert_eq!(headless(&context).visual_count(), 2);

        base.stop(&mut context).unwrap();
        base.pre_terminate(&mut context).unwrap();
        base.terminate(&mut context).unwrap();
        assert_eq!(base.widget_count(), 0);
        assert_eq!(headless(&context).visual_count(), 0);
    }

    //--- Widgets ----------------------------------------------------------

    #[test]
    fn add_widget_requires_active_scene_unless_forced() {
        let mut context = context();
        let mut base = SceneBase::new("test", 6);
        base.create(&mut context).unwrap();

        let err = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap_err();
        assert_eq!(err, StageError::SceneInactive("tally"));
        assert_eq!(base.widget_count(), 0);

        assert!(base.add_widget(Box::new(Tally::new()), true, &mut context).is_ok());
    }

    #[test]
    fn add_widget_rejects_disposed_widgets() {
        let mut context = context();
        let mut base = started(&mut context);

        let mut tally = Tally::new();
        tally.dispose(context.renderer.as_mut());
        let err = base.add_widget(Box::new(tally), false, &mut context).unwrap_err();
        assert_eq!(err, StageError::WidgetDisposed("tally"));
    }

    #[test]
    fn removing_twice_is_reported() {
        let mut context = context();
        let mut base = started(&mut context);
        let id = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();

        base.remove_widget(id, &mut context).unwrap();
        assert!(matches!(
            base.remove_widget(id, &mut context),
            Err(StageError::WidgetNotRegistered(_))
        ));
    }

    #[test]
    fn update_reaches_widgets_in_order() {
        let mut context = context();
        let mut base = started(&mut context);
        let a = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();
        let b = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();

        base.update(&mut context);
        base.update(&mut context);
        assert_eq!(base.z_order(), &[a, b]);
        assert_eq!(base.widget::<Tally>(a).unwrap().updates, 2);
        assert_eq!(base.widget::<Tally>(b).unwrap().updates, 2);
    }

    //--- Overlay ----------------------------------------------------------

    #[test]
    fn overlay_round_trip_restores_state_and_order() {
        let mut context = context();
        let mut base = started(&mut context);
        let a = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();
        let b = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();
        let pinned = base.add_widget(Box::new(Tally::pinned()), false, &mut context).unwrap();
        let menu = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();
        base.widget_mut::<Tally>(b).unwrap().set_active(false);
        base.widget_mut::<Tally>(menu).unwrap().set_active(false);

        let order_before = base.z_order().to_vec();
        let states_before: Vec<_> =
            order_before.iter().map(|&w| base.is_widget_active(w)).collect();

        base.raise_overlay(a, &mut context).unwrap();
        assert_eq!(base.overlay(), Some(a));
        assert_eq!(base.z_order().last(), Some(&a));
        assert_eq!(base.is_widget_active(a), Some(true));
        assert_eq!(base.is_widget_active(pinned), Some(true));
        assert_eq!(base.is_widget_active(b), Some(false));
        assert!(headless(&context).is_dimmed());

        base.close_overlay(&mut context);
        let states_after: Vec<_> =
            order_before.iter().map(|&w| base.is_widget_active(w)).collect();
        assert_eq!(base.z_order(), order_before.as_slice());
        assert_eq!(states_after, states_before);
        assert!(!headless(&context).is_dimmed());
        assert_eq!(base.overlay(), None);
    }

    #[test]
    fn overlay_isolates_updates() {
        let mut context = context();
        let mut base = started(&mut context);
        let a = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();
        let pinned = base.add_widget(Box::new(Tally::pinned()), false, &mut context).unwrap();
        let menu = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();

        base.raise_overlay(menu, &mut context).unwrap();
        base.update(&mut context);

        assert_eq!(base.widget::<Tally>(a).unwrap().updates, 0);
        assert_eq!(base.widget::<Tally>(pinned).unwrap().updates, 1);
        assert_eq!(base.widget::<Tally>(menu).unwrap().updates, 1);
    }

    #[test]
    fn overlay_holds_back_persistent_widgets() {
        let mut context = context();
        let ticker = context.persistent.register(Box::new(Tally::new()), context.renderer.as_mut());
        let clock = context.persistent.register(Box::new(Tally::pinned()), context.renderer.as_mut());
        let mut base = started(&mut context);
        let menu = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();

        base.update(&mut context);
        base.raise_overlay(menu, &mut context).unwrap();
        base.update(&mut context);
        base.update(&mut context);

        assert_eq!(context.persistent.get::<Tally>(ticker).unwrap().updates, 1);
        assert_eq!(context.persistent.get::<Tally>(clock).unwrap().updates, 3);

        base.close_overlay(&mut context);
        base.update(&mut context);
        assert_eq!(context.persistent.get::<Tally>(ticker).unwrap().updates, 2);
    }

    #[test]
    fn overlay_calls_without_state_change_are_noops() {
        let mut context = context();
        let mut base = started(&mut context);
        let a = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();
        let menu = base.add_widget(Box::new(Tally::new()), false, &mut context).unwrap();

        base.close_overlay(&mut context);
        assert_eq!(base.z_order(), &[a, menu]);

        base.raise_overlay(menu, &mut context).unwrap();
        base.raise_overlay(menu, &mut context).unwrap();
        base.close_overlay(&mut context);
        base.close_overlay(&mut context);
        assert_eq!(base.is_widget_active(a), Some(true));
        assert_eq!(base.z_order(), &[a, menu]);
    }

    //--- Cooldown ---------------------------------------------------------

    #[test]
    fn cooldown_ticks_with_update() {
        use crate::core::input::InputKey;

        let mut context = context();
        let mut base = started(&mut context);
        assert!(base.cooldown_mut().try_trigger(InputKey::Ok));
        assert!(!base.cooldown_mut().try_trigger(InputKey::Ok));

        for _ in 0..6 {
            base.update(&mut context);
        }
        assert!(base.cooldown_mut().try_trigger(InputKey::Ok));
    }
}
