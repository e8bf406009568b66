//=========================================================================
// Game Widgets
//=========================================================================
//
// Menus, gauges and indicators used by the card game scenes.
//
// Widgets never reach into scenes. Anything they want to report goes on
// the bus:
//
//   CommandMenu ──post──► MenuCommand ──drain──► owning scene
//   scene       ──post──► Notice      ──drain──► NoticeTicker
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;

use log::{debug, trace};

//=== Internal Dependencies ===============================================

use crate::core::input::InputKey;
use crate::core::render::{Layer, LoadProgress, Renderer, Tint};
use crate::core::scene::{Widget, WidgetContext, WidgetCore};
use crate::game::cards::CardColor;

//=== Bus Messages ========================================================

/// A command chosen in a [`CommandMenu`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuCommand {
    pub menu: &'static str,
    pub symbol: &'static str,
}

/// Text for the [`NoticeTicker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice(pub String);

//=== CommandMenu =========================================================

/// Vertical list of commands; Up/Down move, Ok chooses, Cancel backs out.
pub struct CommandMenu {
    core: WidgetCore,
    name: &'static str,
    items: Vec<(&'static str, &'static str)>,
    index: usize,
    cancel: Option<&'static str>,
}

impl CommandMenu {
    /// `items` are `(label, symbol)` pairs; the symbol is what gets posted.
    pub fn new(name: &'static str, items: &[(&'static str, &'static str)]) -> Self {
        Self {
            core: WidgetCore::active(),
            name,
            items: items.to_vec(),
            index: 0,
            cancel: None,
        }
    }

    /// Symbol posted when Cancel is pressed.
    pub fn with_cancel(mut self, symbol: &'static str) -> Self {
        self.cancel = Some(symbol);
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn selected(&self) -> Option<&'static str> {
        self.items.get(self.index).map(|(_, symbol)| *symbol)
    }

    pub fn select(&mut self, index: usize) {
        if index < self.items.len() {
            self.index = index;
        }
    }

    fn cursor_texture(&self) -> String {
        format!("{}_cursor_{}", self.name, self.index)
    }

    fn post(&self, ctx: &mut WidgetContext<'_>, symbol: &'static str) {
        debug!(target: "stage", "{}: '{}' chosen", self.name, symbol);
        ctx.bus.post(MenuCommand { menu: self.name, symbol });
    }
}

impl Widget for CommandMenu {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }
    fn name(&self) -> &'static str {
        self.name
    }

    fn create(&mut self, renderer: &mut dyn Renderer) {
        let visual = renderer.add_sprite(self.name);
        renderer.set_layer(visual, Layer::Ui);
        renderer.set_texture(visual, &self.cursor_texture());
        renderer.set_visible(visual, true);
        self.core.visual = Some(visual);
    }

    fn update(&mut self, ctx: &mut WidgetContext<'_>) {
        if !self.core.active || self.items.is_empty() {
            return;
        }

        let count = self.items.len();
        let previous = self.index;
        if ctx.triggered(InputKey::Down) {
            self.index = (self.index + 1) % count;
        } else if ctx.triggered(InputKey::Up) {
            self.index = (self.index + count - 1) % count;
        }
        if self.index != previous {
            trace!(target: "stage", "{}: cursor {} -> {}", self.name, previous, self.index);
            if let Some(visual) = self.core.visual {
                ctx.renderer.set_texture(visual, &self.cursor_texture());
            }
        }

        if ctx.triggered(InputKey::Ok) {
            let symbol = self.items[self.index].1;
            self.post(ctx, symbol);
        } else if let Some(symbol) = self.cancel {
            if ctx.triggered(InputKey::Cancel) {
                self.post(ctx, symbol);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=== ColorIndicator ======================================================

/// Shows the colour currently in force on the discard pile.
pub struct ColorIndicator {
    core: WidgetCore,
    color: Option<CardColor>,
}

impl ColorIndicator {
    pub fn new() -> Self {
        Self { core: WidgetCore::active(), color: None }
    }

    pub fn color(&self) -> Option<CardColor> {
        self.color
    }

    pub fn set_color(&mut self, color: CardColor, renderer: &mut dyn Renderer) {
        self.color = Some(color);
        if let Some(visual) = self.core.visual {
            renderer.set_texture(visual, &format!("color_{}", color.symbol()));
            renderer.set_tint(visual, color.tint());
        }
    }
}

impl Default for ColorIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for ColorIndicator {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }
    fn name(&self) -> &'static str {
        "color_indicator"
    }

    fn create(&mut self, renderer: &mut dyn Renderer) {
        let visual = renderer.add_sprite(self.name());
        renderer.set_layer(visual, Layer::Ui);
        renderer.set_tint(visual, Tint::NONE);
        renderer.set_visible(visual, true);
        self.core.visual = Some(visual);
    }

    /// Stays lit under the pause overlay.
    fn always_active(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=== ProgressGauge =======================================================

/// Loading bar, drawn in ten steps.
pub struct ProgressGauge {
    core: WidgetCore,
    progress: LoadProgress,
    step: Option<u32>,
}

impl ProgressGauge {
    pub fn new() -> Self {
        Self { core: WidgetCore::active(), progress: LoadProgress::default(), step: None }
    }

    pub fn progress(&self) -> LoadProgress {
        self.progress
    }

    pub fn ratio(&self) -> f32 {
        self.progress.ratio()
    }

    pub fn set_progress(&mut self, progress: LoadProgress, renderer: &mut dyn Renderer) {
        self.progress = progress;
        let step = (progress.ratio() * 10.0).floor() as u32;
        if self.step == Some(step) {
            return;
        }
        self.step = Some(step);
        if let Some(visual) = self.core.visual {
            renderer.set_texture(visual, &format!("gauge_{}", step));
        }
    }
}

impl Default for ProgressGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for ProgressGauge {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }
    fn name(&self) -> &'static str {
        "progress_gauge"
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=== NoticeTicker ========================================================

/// Short-lived banner fed by [`Notice`] messages. Meant to be registered
/// as a persistent widget.
pub struct NoticeTicker {
    core: WidgetCore,
    frames: u32,
    remaining: u32,
    text: Option<String>,
}

impl NoticeTicker {
    /// Each notice stays up for `frames` frames.
    pub fn new(frames: u32) -> Self {
        Self { core: WidgetCore::default(), frames, remaining: 0, text: None }
    }

    /// Text currently shown.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl Widget for NoticeTicker {
    fn core(&self) -> &WidgetCore {
        &self.core
    }
    fn core_mut(&mut self) -> &mut WidgetCore {
        &mut self.core
    }
    fn name(&self) -> &'static str {
        "notice_ticker"
    }

    fn update(&mut self, ctx: &mut WidgetContext<'_>) {
        if let Some(Notice(text)) = ctx.bus.drain::<Notice>().pop() {
            if let Some(visual) = self.core.visual {
                ctx.renderer.set_texture(visual, &text);
                ctx.renderer.set_layer(visual, Layer::Ui);
                ctx.renderer.set_visible(visual, true);
            }
            self.text = Some(text);
            self.remaining = self.frames;
            return;
        }

        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining == 0 {
                self.text = None;
                if let Some(visual) = self.core.visual {
                    ctx.renderer.set_visible(visual, false);
                }
            }
        }
    }

    fn always_active(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::EventBus;
    use crate::core::input::{InputCooldown, InputState};
    use crate::core::render::HeadlessRenderer;

    struct Harness {
        input: InputState,
        bus: EventBus,
        renderer: HeadlessRenderer,
        cooldown: InputCooldown,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                input: InputState::new(),
                bus: EventBus::new(),
                renderer: HeadlessRenderer::new(),
                cooldown: InputCooldown::new(0),
            }
        }

        /// One frame with `key` tapped.
        fn tap(&mut self, widget: &mut dyn Widget, key: Option<InputKey>) {
            self.input.begin_frame();
            if let Some(key) = key {
                self.input.press(key);
            }
            let mut ctx = WidgetContext {
                input: &self.input,
                bus: &mut self.bus,
                renderer: &mut self.renderer,
                cooldown: &mut self.cooldown,
            };
            widget.update(&mut ctx);
            if let Some(key) = key {
                self.input.release(key);
            }
        }
    }

    #[test]
    fn menu_wraps_and_posts_the_selected_symbol() {
        let mut harness = Harness::new();
        let mut menu = CommandMenu::new("title", &[("New Game", "new_game"), ("Exit", "exit")]);
        menu.create(&mut harness.renderer);

        harness.tap(&mut menu, Some(InputKey::Up));
        assert_eq!(menu.selected(), Some("exit"));
        harness.tap(&mut menu, Some(InputKey::Down));
        assert_eq!(menu.index(), 0);

        harness.tap(&mut menu, Some(InputKey::Ok));
        assert_eq!(
            harness.bus.drain::<MenuCommand>(),
            vec![MenuCommand { menu: "title", symbol: "new_game" }]
        );
    }

    #[test]
    fn inactive_menu_ignores_input() {
        let mut harness = Harness::new();
        let mut menu = CommandMenu::new("pause", &[("Resume", "resume")]).with_cancel("resume");
        menu.set_active(false);

        harness.tap(&mut menu, Some(InputKey::Ok));
        assert!(harness.bus.drain::<MenuCommand>().is_empty());

        menu.set_active(true);
        harness.tap(&mut menu, Some(InputKey::Cancel));
        assert_eq!(harness.bus.drain::<MenuCommand>().len(), 1);
    }

    #[test]
    fn gauge_redraws_only_on_new_steps() {
        let mut renderer = HeadlessRenderer::new();
        let mut gauge = ProgressGauge::new();
        gauge.create(&mut renderer);
        let visual = gauge.core().visual.unwrap();

        gauge.set_progress(LoadProgress { loaded: 1, total: 4 }, &mut renderer);
        assert_eq!(renderer.visual(visual).unwrap().texture.as_deref(), Some("gauge_2"));
        gauge.set_progress(LoadProgress { loaded: 4, total: 4 }, &mut renderer);
        assert_eq!(renderer.visual(visual).unwrap().texture.as_deref(), Some("gauge_10"));
    }

    #[test]
    fn color_indicator_tints_its_visual() {
        let mut renderer = HeadlessRenderer::new();
        let mut indicator = ColorIndicator::new();
        indicator.create(&mut renderer);
        indicator.set_color(CardColor::Blue, &mut renderer);

        let visual = renderer.visual(indicator.core().visual.unwrap()).unwrap();
        assert_eq!(visual.tint, CardColor::Blue.tint());
        assert_eq!(indicator.color(), Some(CardColor::Blue));
    }

    #[test]
    fn notices_expire() {
        let mut harness = Harness::new();
        let mut ticker = NoticeTicker::new(2);
        ticker.create(&mut harness.renderer);

        harness.bus.post(Notice("Your turn".into()));
        harness.tap(&mut ticker, None);
        assert_eq!(ticker.text(), Some("Your turn"));

        harness.tap(&mut ticker, None);
        assert_eq!(ticker.text(), Some("Your turn"));
        harness.tap(&mut ticker, None);
        assert_eq!(ticker.text(), None);
    }
}
