//=========================================================================
// Widgets
//=========================================================================
//
// UI elements owned by a scene (windows, menus, gauges) and the registry
// of persistent widgets that outlive scene changes.
//
// Architecture:
//   SceneBase
//     ├─ widgets: SlotMap<WidgetId, Box<dyn Widget>>   (owned, disposed on terminate)
//     └─ order:   Vec<WidgetId>                        (z-order, back to front)
//   GlobalContext
//     └─ persistent: PersistentWidgets                 (attached by the active scene)
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;

use log::{debug, warn};
use slotmap::{new_key_type, SlotMap};

//=== Internal Dependencies ===============================================

use crate::core::event_bus::EventBus;
use crate::core::input::{InputCooldown, InputKey, InputState};
use crate::core::render::{Renderer, VisualId};

new_key_type! {
    /// Handle to a widget owned by a scene or the persistent registry.
    pub struct WidgetId;
}

//=== WidgetContext =======================================================

/// What a widget may touch during its update.
pub struct WidgetContext<'a> {
    pub input: &'a InputState,
    pub bus: &'a mut EventBus,
    pub renderer: &'a mut dyn Renderer,
    pub cooldown: &'a mut InputCooldown,
}

impl WidgetContext<'_> {
    /// True when `key` was triggered this frame and is not cooling down.
    /// Arms the cooldown when it returns true.
    pub fn triggered(&mut self, key: InputKey) -> bool {
        self.input.is_triggered(key) && self.cooldown.try_trigger(key)
    }
}

//=== WidgetCore ==========================================================

/// State every widget carries.
#[derive(Debug, Clone, Default)]
pub struct WidgetCore {
    pub active: bool,
    pub disposed: bool,
    pub visual: Option<VisualId>,
}

impl WidgetCore {
    /// Core for a widget that starts active.
    pub fn active() -> Self {
        Self { active: true, ..Self::default() }
    }
}

//=== Widget Trait ========================================================

/// A UI element updated by its owner every frame.
///
/// Only `core`, `core_mut`, `name`, `as_any` and `as_any_mut` are
/// required; the rest defaults to working off [`WidgetCore`].
pub trait Widget: Send + 'static {
    fn core(&self) -> &WidgetCore;
    fn core_mut(&mut self) -> &mut WidgetCore;

    /// Name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Builds renderer visuals. Called once, when the widget is registered.
    fn create(&mut self, renderer: &mut dyn Renderer) {
        if self.core().visual.is_none() {
            let visual = renderer.add_sprite(self.name());
            renderer.set_visible(visual, true);
            self.core_mut().visual = Some(visual);
        }
    }

    /// Per-frame logic. Only called on widgets the owner chose to update.
    fn update(&mut self, _ctx: &mut WidgetContext<'_>) {}

    fn is_active(&self) -> bool {
        self.core().active
    }

    fn set_active(&mut self, active: bool) {
        self.core_mut().active = active;
    }

    /// Widgets that keep running underneath a modal overlay.
    fn always_active(&self) -> bool {
        false
    }

    fn is_disposed(&self) -> bool {
        self.core().disposed
    }

    fn set_shown(&mut self, renderer: &mut dyn Renderer, shown: bool) {
        if let Some(visual) = self.core().visual {
            renderer.set_visible(visual, shown);
        }
    }

    /// Releases renderer resources. The widget is unusable afterwards.
    fn dispose(&mut self, renderer: &mut dyn Renderer) {
        let core = self.core_mut();
        if let Some(visual) = core.visual.take() {
            renderer.remove_sprite(visual);
        }
        core.active = false;
        core.disposed = true;
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

//=== PersistentWidgets ===================================================

/// Widgets shared by every scene (notices, debug readouts).
///
/// Owned by the global context. The active scene attaches them in
/// `start()` and detaches them during teardown; they are never disposed
/// by a scene.
#[derive(Default)]
pub struct PersistentWidgets {
    widgets: SlotMap<WidgetId, Box<dyn Widget>>,
    host: Option<&'static str>,
}

impl PersistentWidgets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a persistent widget, building its visuals immediately.
    pub fn register(&mut self, mut widget: Box<dyn Widget>, renderer: &mut dyn Renderer) -> WidgetId {
        widget.create(renderer);
        widget.set_shown(renderer, false);
        widget.set_active(false);
        self.widgets.insert(widget)
    }

    /// Makes the widgets visible and live under `host`.
    pub fn attach(&mut self, host: &'static str, renderer: &mut dyn Renderer) {
        if let Some(previous) = self.host {
            warn!(target: "stage", "Persistent widgets still attached to {}, moving to {}", previous, host);
        }
        debug!(target: "stage", "Persistent widgets attached to {}", host);
        self.host = Some(host);
        for widget in self.widgets.values_mut() {
            widget.set_active(true);
            widget.set_shown(renderer, true);
        }
    }

    /// Hides the widgets if `host` currently owns them.
    pub fn detach(&mut self, host: &'static str, renderer: &mut dyn Renderer) {
        if self.host != Some(host) {
            return;
        }
        self.host = None;
        for widget in self.widgets.values_mut() {
            widget.set_active(false);
            widget.set_shown(renderer, false);
        }
    }

    /// Name of the scene the widgets are attached to.
    pub fn host(&self) -> Option<&'static str> {
        self.host
    }

    /// Updates every attached widget. While the host has an overlay up only
    /// `always_active` widgets are reached.
    pub fn update(&mut self, ctx: &mut WidgetContext<'_>, overlay_up: bool) {
        if self.host.is_none() {
            return;
        }
        for widget in self.widgets.values_mut() {
            if widget.is_active() && (!overlay_up || widget.always_active()) {
                widget.update(ctx);
            }
        }
    }

    pub fn get<T: Widget>(&self, id: WidgetId) -> Option<&T> {
        self.widgets.get(id).and_then(|w| w.as_any().downcast_ref())
    }

    pub fn get_mut<T: Widget>(&mut self, id: WidgetId) -> Option<&mut T> {
        self.widgets.get_mut(id).and_then(|w| w.as_any_mut().downcast_mut())
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
