//=========================================================================
// Renderer Seam
//=========================================================================
//
// The compositor is an external collaborator. Scenes, widgets and the
// card layer talk to it only through the `Renderer` trait:
//
//   scene / widget / card layer ──► Renderer (trait object in context)
//                                       ├─ HeadlessRenderer (in-memory)
//                                       └─ real backends (out of tree)
//
// Everything is addressed by opaque `VisualId`s. Poses are global
// screen coordinates.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::collections::{HashMap, VecDeque};

use log::{debug, trace, warn};

//=== Pose ================================================================

/// Screen-space placement of a visual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    /// Rotation in degrees, clockwise.
    pub rotation: f32,
    /// 0.0 (transparent) ..= 1.0 (opaque).
    pub opacity: f32,
}

impl Pose {
    /// Opaque, unrotated pose at `(x, y)`.
    pub const fn at(x: f32, y: f32) -> Self {
        Self { x, y, rotation: 0.0, opacity: 1.0 }
    }

    /// Same pose with a different rotation.
    pub const fn rotated(self, rotation: f32) -> Self {
        Self { rotation, ..self }
    }

    /// Same pose with a different opacity.
    pub const fn with_opacity(self, opacity: f32) -> Self {
        Self { opacity, ..self }
    }

    /// Interpolates every component; `t` is clamped to `0..=1`.
    pub fn lerp(&self, to: &Pose, t: f32) -> Pose {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Pose {
            x: mix(self.x, to.x),
            y: mix(self.y, to.y),
            rotation: mix(self.rotation, to.rotation),
            opacity: mix(self.opacity, to.opacity),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::at(0.0, 0.0)
    }
}

//=== Layer ===============================================================

/// Z bands, back to front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    Background,
    /// Deck and discard containers.
    Table,
    /// Cards resting in a hand canvas.
    Hands,
    /// Cards in flight; drawn above every hand.
    Front,
    /// Windows and menus.
    Ui,
}

//=== Tint ================================================================

/// Colour multiplier used by visual effect hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tint {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Tint {
    pub const NONE: Tint = Tint { r: 255, g: 255, b: 255 };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

//=== Handles & Progress ==================================================

/// Opaque handle to a renderer-side visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualId(pub u32);

/// Asset preload progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadProgress {
    pub loaded: usize,
    pub total: usize,
}

impl LoadProgress {
    /// True when every requested asset is available.
    pub fn is_complete(&self) -> bool {
        self.loaded >= self.total
    }

    /// Fraction loaded, `1.0` when nothing was requested.
    pub fn ratio(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.loaded as f32 / self.total as f32
        }
    }
}

//=== Renderer Trait ======================================================

/// Drawing and asset services consumed by the stage.
pub trait Renderer: Send {
    /// Creates a hidden visual for `asset`.
    fn add_sprite(&mut self, asset: &str) -> VisualId;

    /// Destroys a visual and its resources.
    fn remove_sprite(&mut self, id: VisualId);

    /// Swaps the texture shown by a visual.
    fn set_texture(&mut self, id: VisualId, texture: &str);

    fn set_pose(&mut self, id: VisualId, pose: Pose);

    fn set_visible(&mut self, id: VisualId, visible: bool);

    fn set_layer(&mut self, id: VisualId, layer: Layer);

    /// Colour effect hook.
    fn set_tint(&mut self, id: VisualId, tint: Tint);

    /// Opacity of the full-screen fade curtain (always topmost).
    fn set_curtain(&mut self, opacity: f32);

    /// Shows or hides the dim layer behind a modal overlay.
    fn set_dim(&mut self, dimmed: bool);

    /// Queues assets for background loading.
    fn request_preload(&mut self, assets: &[&str]);

    /// Advances background loading and reports progress.
    fn poll_preload(&mut self) -> LoadProgress;

    /// Downcast access for inspection by tools and tests.
    fn as_any(&self) -> &dyn Any;
}

//=== HeadlessRenderer ====================================================

/// State of one visual in the [`HeadlessRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct VisualState {
    pub asset: String,
    pub texture: Option<String>,
    pub pose: Pose,
    pub visible: bool,
    pub layer: Layer,
    pub tint: Tint,
}

/// In-memory renderer used by the demo binary and tests.
///
/// Preloads complete `assets_per_poll` assets per `poll_preload` call.
#[derive(Debug)]
pub struct HeadlessRenderer {
    visuals: HashMap<VisualId, VisualState>,
    next_id: u32,
    curtain: f32,
    dimmed: bool,
    pending: VecDeque<String>,
    loaded: Vec<String>,
    requested: usize,
    assets_per_poll: usize,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::with_load_rate(usize::MAX)
    }

    /// Renderer whose preloads take `ceil(n / assets_per_poll)` polls.
    pub fn with_load_rate(assets_per_poll: usize) -> Self {
        Self {
            visuals: HashMap::new(),
            next_id: 1,
            curtain: 0.0,
            dimmed: false,
            pending: VecDeque::new(),
            loaded: Vec::new(),
            requested: 0,
            assets_per_poll: assets_per_poll.max(1),
        }
    }

    //--- Inspection -------------------------------------------------------

    pub fn visual(&self, id: VisualId) -> Option<&VisualState> {
        self.visuals.get(&id)
    }

    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    pub fn curtain(&self) -> f32 {
        self.curtain
    }

    pub fn is_dimmed(&self) -> bool {
        self.dimmed
    }

    pub fn is_loaded(&self, asset: &str) -> bool {
        self.loaded.iter().any(|a| a == asset)
    }

    //--- Internal Helpers -------------------------------------------------

    fn with_visual(&mut self, id: VisualId, op: &str, f: impl FnOnce(&mut VisualState)) {
        match self.visuals.get_mut(&id) {
            Some(visual) => f(visual),
            None => warn!(target: "render", "{} on unknown visual {:?}", op, id),
        }
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HeadlessRenderer {
    fn add_sprite(&mut self, asset: &str) -> VisualId {
        let id = VisualId(self.next_id);
        self.next_id += 1;
        self.visuals.insert(
            id,
            VisualState {
                asset: asset.to_owned(),
                texture: None,
                pose: Pose::default(),
                visible: false,
                layer: Layer::Table,
                tint: Tint::NONE,
            },
        );
        trace!(target: "render", "add_sprite {:?} ({})", id, asset);
        id
    }

    fn remove_sprite(&mut self, id: VisualId) {
        if self.visuals.remove(&id).is_none() {
            warn!(target: "render", "remove_sprite on unknown visual {:?}", id);
        }
    }

    fn set_texture(&mut self, id: VisualId, texture: &str) {
        self.with_visual(id, "set_texture", |v| v.texture = Some(texture.to_owned()));
    }

    fn set_pose(&mut self, id: VisualId, pose: Pose) {
        self.with_visual(id, "set_pose", |v| v.pose = pose);
    }

    fn set_visible(&mut self, id: VisualId, visible: bool) {
        self.with_visual(id, "set_visible", |v| v.visible = visible);
    }

    fn set_layer(&mut self, id: VisualId, layer: Layer) {
        self.with_visual(id, "set_layer", |v| v.layer = layer);
    }

    fn set_tint(&mut self, id: VisualId, tint: Tint) {
        self.with_visual(id, "set_tint", |v| v.tint = tint);
    }

    fn set_curtain(&mut self, opacity: f32) {
        self.curtain = opacity;
    }

    fn set_dim(&mut self, dimmed: bool) {
        self.dimmed = dimmed;
    }

    fn request_preload(&mut self, assets: &[&str]) {
        for asset in assets {
            if !self.is_loaded(asset) && !self.pending.iter().any(|a| a == asset) {
                self.pending.push_back((*asset).to_owned());
                self.requested += 1;
            }
        }
        debug!(target: "render", "Preload requested: {} pending", self.pending.len());
    }

    fn poll_preload(&mut self) -> LoadProgress {
        for _ in 0..self.assets_per_poll {
            match self.pending.pop_front() {
                Some(asset) => self.loaded.push(asset),
                None => break,
            }
        }
        LoadProgress {
            loaded: self.requested - self.pending.len(),
            total: self.requested,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn pose_lerp_clamps_and_mixes() {
        let from = Pose::at(0.0, 0.0).with_opacity(0.0);
        let to = Pose::at(100.0, 50.0).rotated(90.0);

        let mid = from.lerp(&to, 0.5);
        assert_relative_eq!(mid.x, 50.0);
        assert_relative_eq!(mid.y, 25.0);
        assert_relative_eq!(mid.rotation, 45.0);
        assert_relative_eq!(mid.opacity, 0.5);

        assert_eq!(from.lerp(&to, 2.0), to);
    }

    #[test]
    fn headless_tracks_visual_state() {
        let mut renderer = HeadlessRenderer::new();
        let id = renderer.add_sprite("card_back");

        renderer.set_pose(id, Pose::at(10.0, 20.0));
        renderer.set_visible(id, true);
        renderer.set_layer(id, Layer::Front);
        renderer.set_texture(id, "card_red_5");

        let visual = renderer.visual(id).unwrap();
        assert_eq!(visual.pose, Pose::at(10.0, 20.0));
        assert!(visual.visible);
        assert_eq!(visual.layer, Layer::Front);
        assert_eq!(visual.texture.as_deref(), Some("card_red_5"));

        renderer.remove_sprite(id);
        assert_eq!(renderer.visual_count(), 0);
    }

    #[test]
    fn preload_progresses_at_load_rate() {
        let mut renderer = HeadlessRenderer::with_load_rate(2);
        renderer.request_preload(&["a", "b", "c", "a"]);

        assert_eq!(renderer.poll_preload(), LoadProgress { loaded: 2, total: 3 });
        let done = renderer.poll_preload();
        assert!(done.is_complete());
        assert_relative_eq!(done.ratio(), 1.0);
        assert!(renderer.is_loaded("c"));
    }

    #[test]
    fn empty_progress_counts_as_complete() {
        let progress = LoadProgress::default();
        assert!(progress.is_complete());
        assert_relative_eq!(progress.ratio(), 1.0);
    }
}
