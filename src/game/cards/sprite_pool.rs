//=========================================================================
// Sprite Pool
//=========================================================================
//
// Reusable card visuals.
//
// Architecture:
//   sprites: Vec<CardSprite>        arena, indices never change
//   free:    Vec<usize>             LIFO stack of unassigned indices
//   bound:   HashMap<CardId, usize> logical card → sprite
//
// Free-list predicate: a sprite is `Unassigned` exactly when it has no
// animation in flight and sits hidden at the deck anchor. The pool grows
// by one sprite whenever the free stack is empty and never shrinks.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::HashMap;

use log::{debug, error, trace};

//=== Internal Dependencies ===============================================

use super::card::{CardId, CARD_BACK};
use super::tween::AnimationId;
use crate::core::error::{StageError, StageResult};
use crate::core::render::{Layer, Pose, Renderer, Tint, VisualId};

//=== Owner ===============================================================

/// Who currently holds a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Unassigned,
    /// On its way to, or resting on, the discard pile.
    InPlay,
    Player(usize),
}

impl Owner {
    /// Numeric owner tag: `-2` unassigned, `-1` in play, seat otherwise.
    pub fn tag(self) -> i64 {
        match self {
            Self::Unassigned => -2,
            Self::InPlay => -1,
            Self::Player(seat) => seat as i64,
        }
    }
}

//=== CardSprite ==========================================================

/// One pooled card visual.
#[derive(Debug, Clone)]
pub struct CardSprite {
    index: usize,
    visual: VisualId,
    owner: Owner,
    card: Option<CardId>,
    hand_index: Option<usize>,
    visible: bool,
    pose: Pose,
    layer: Layer,
    animation: Option<AnimationId>,
}

impl CardSprite {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn visual(&self) -> VisualId {
        self.visual
    }

    pub fn owner(&self) -> Owner {
        self.owner
    }

    pub fn card(&self) -> Option<CardId> {
        self.card
    }

    /// Position within its hand, `None` when not in a hand.
    pub fn hand_index(&self) -> Option<usize> {
        self.hand_index
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current global pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn layer(&self) -> Layer {
        self.layer
    }

    pub fn animation(&self) -> Option<AnimationId> {
        self.animation
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }
}

//=== SpritePool ==========================================================

pub struct SpritePool {
    sprites: Vec<CardSprite>,
    free: Vec<usize>,
    bound: HashMap<CardId, usize>,
    anchor: Pose,
}

impl SpritePool {
    /// Creates `initial` hidden sprites parked at `anchor` (the deck).
    pub fn new(initial: usize, anchor: Pose, renderer: &mut dyn Renderer) -> Self {
        let mut pool = Self {
            sprites: Vec::with_capacity(initial),
            free: Vec::with_capacity(initial),
            bound: HashMap::new(),
            anchor,
        };
        for _ in 0..initial {
            let index = pool.spawn(renderer);
            pool.free.push(index);
        }
        // Lowest index on top of the stack.
        pool.free.reverse();
        debug!(target: "stage::cards", "Sprite pool created with {} sprites", initial);
        pool
    }

    //--- Allocation -------------------------------------------------------

    /// Binds `card` to a sprite and hands it to `owner`.
    ///
    /// A card that already has a sprite keeps it (ownership moves). The
    /// sprite is left hidden at the anchor; callers place and show it.
    pub fn acquire(&mut self, card: CardId, owner: Owner, renderer: &mut dyn Renderer) -> usize {
        if let Some(&index) = self.bound.get(&card) {
            trace!(target: "stage::cards", "Card {} already bound to sprite #{}", card, index);
            self.sprites[index].owner = owner;
            return index;
        }

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = self.spawn(renderer);
                debug!(target: "stage::cards", "Sprite pool grew to {}", self.sprites.len());
                index
            }
        };
        debug_assert!(self.is_parked(index), "free sprite #{} was not parked", index);

        let sprite = &mut self.sprites[index];
        sprite.owner = owner;
        sprite.card = Some(card);
        self.bound.insert(card, index);
        trace!(target: "stage::cards", "Sprite #{} acquired for {} by {:?}", index, card, owner);
        index
    }

    /// Returns a sprite to the pool: hidden, back at the anchor, unbound.
    pub fn release(&mut self, index: usize, renderer: &mut dyn Renderer) -> StageResult<()> {
        let Some(sprite) = self.sprites.get_mut(index) else {
            return Err(report(StageError::SpriteNotAcquired(index)));
        };
        if sprite.owner == Owner::Unassigned {
            return Err(report(StageError::SpriteNotAcquired(index)));
        }
        if sprite.animation.is_some() {
            return Err(report(StageError::SpriteAnimating(index)));
        }

        if let Some(card) = sprite.card.take() {
            self.bound.remove(&card);
        }
        sprite.owner = Owner::Unassigned;
        sprite.hand_index = None;
        sprite.visible = false;
        sprite.pose = self.anchor;
        sprite.layer = Layer::Table;

        let visual = sprite.visual;
        renderer.set_visible(visual, false);
        renderer.set_pose(visual, self.anchor);
        renderer.set_layer(visual, Layer::Table);
        renderer.set_texture(visual, CARD_BACK);
        renderer.set_tint(visual, Tint::NONE);

        self.free.push(index);
        trace!(target: "stage::cards", "Sprite #{} released", index);
        Ok(())
    }

    /// Removes every visual from the renderer and empties the pool.
    pub fn dispose(&mut self, renderer: &mut dyn Renderer) {
        for sprite in self.sprites.drain(..) {
            renderer.remove_sprite(sprite.visual);
        }
        self.free.clear();
        self.bound.clear();
        debug!(target: "stage::cards", "Sprite pool disposed");
    }

    //--- Sprite State -----------------------------------------------------

    pub fn sprite(&self, index: usize) -> Option<&CardSprite> {
        self.sprites.get(index)
    }

    pub fn index_of(&self, card: CardId) -> Option<usize> {
        self.bound.get(&card).copied()
    }

    pub fn set_owner(&mut self, index: usize, owner: Owner) {
        if let Some(sprite) = self.sprites.get_mut(index) {
            sprite.owner = owner;
        }
    }

    pub fn place(&mut self, index: usize, pose: Pose, renderer: &mut dyn Renderer) {
        if let Some(sprite) = self.sprites.get_mut(index) {
            sprite.pose = pose;
            renderer.set_pose(sprite.visual, pose);
        }
    }

    pub fn show(&mut self, index: usize, texture: &str, renderer: &mut dyn Renderer) {
        if let Some(sprite) = self.sprites.get_mut(index) {
            sprite.visible = true;
            renderer.set_texture(sprite.visual, texture);
            renderer.set_visible(sprite.visual, true);
        }
    }

    pub fn raise(&mut self, index: usize, layer: Layer, renderer: &mut dyn Renderer) {
        if let Some(sprite) = self.sprites.get_mut(index) {
            sprite.layer = layer;
            renderer.set_layer(sprite.visual, layer);
        }
    }

    pub(crate) fn set_hand_index(&mut self, index: usize, hand_index: Option<usize>) {
        if let Some(sprite) = self.sprites.get_mut(index) {
            sprite.hand_index = hand_index;
        }
    }

    pub(crate) fn set_animation(&mut self, index: usize, animation: Option<AnimationId>) {
        if let Some(sprite) = self.sprites.get_mut(index) {
            sprite.animation = animation;
        }
    }

    //--- Queries ----------------------------------------------------------

    pub fn anchor(&self) -> Pose {
        self.anchor
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn in_use(&self) -> usize {
        self.sprites.len() - self.free.len()
    }

    /// Sprites held by `owner`, in hand order when they have one.
    pub fn owned_by(&self, owner: Owner) -> Vec<usize> {
        let mut held: Vec<&CardSprite> = self.sprites.iter().filter(|s| s.owner == owner).collect();
        held.sort_by_key(|s| (s.hand_index.unwrap_or(usize::MAX), s.index));
        held.into_iter().map(|s| s.index).collect()
    }

    /// Checks the free-list predicate on every sprite.
    pub fn is_consistent(&self) -> bool {
        self.sprites.iter().all(|s| (s.owner == Owner::Unassigned) == self.is_parked(s.index))
            && self.free.iter().all(|&i| self.sprites[i].owner == Owner::Unassigned)
            && self.free.len() == self.sprites.iter().filter(|s| s.owner == Owner::Unassigned).count()
    }

    //--- Internal Helpers -------------------------------------------------

    fn spawn(&mut self, renderer: &mut dyn Renderer) -> usize {
        let index = self.sprites.len();
        let visual = renderer.add_sprite(CARD_BACK);
        renderer.set_pose(visual, self.anchor);
        renderer.set_layer(visual, Layer::Table);
        renderer.set_visible(visual, false);
        self.sprites.push(CardSprite {
            index,
            visual,
            owner: Owner::Unassigned,
            card: None,
            hand_index: None,
            visible: false,
            pose: self.anchor,
            layer: Layer::Table,
            animation: None,
        });
        index
    }

    fn is_parked(&self, index: usize) -> bool {
        let sprite = &self.sprites[index];
        sprite.animation.is_none() && !sprite.visible && sprite.pose == self.anchor
    }
}

fn report(err: StageError) -> StageError {
    error!(target: "stage::cards", "{}", err);
    err
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::HeadlessRenderer;
    use slotmap::KeyData;

    fn pool(initial: usize) -> (SpritePool, HeadlessRenderer) {
        let mut renderer = HeadlessRenderer::new();
        let pool = SpritePool::new(initial, Pose::at(100.0, 300.0), &mut renderer);
        (pool, renderer)
    }

    #[test]
    fn acquires_lowest_index_first_and_reuses_released() {
        let (mut pool, mut renderer) = pool(3);
        assert_eq!(pool.acquire(CardId(10), Owner::Player(0), &mut renderer), 0);
        assert_eq!(pool.acquire(CardId(11), Owner::Player(0), &mut renderer), 1);

        pool.release(0, &mut renderer).unwrap();
        assert_eq!(pool.acquire(CardId(12), Owner::Player(1), &mut renderer), 0);
        assert_eq!(pool.index_of(CardId(10)), None);
        assert_eq!(pool.index_of(CardId(12)), Some(0));
    }

    #[test]
    fn grows_on_exhaustion_and_never_shrinks() {
        let (mut pool, mut renderer) = pool(2);
        for id in 0..5 {
            pool.acquire(CardId(id), Owner::InPlay, &mut renderer);
        }
        assert_eq!(pool.len(), 5);
        assert_eq!(renderer.visual_count(), 5);

        for index in 0..5 {
            pool.release(index, &mut renderer).unwrap();
        }
        assert_eq!(pool.len(), 5);
        assert_eq!(pool.free_count(), 5);
    }

    #[test]
    fn rebinding_a_card_moves_ownership() {
        let (mut pool, mut renderer) = pool(4);
        let first = pool.acquire(CardId(7), Owner::Player(2), &mut renderer);
        let again = pool.acquire(CardId(7), Owner::InPlay, &mut renderer);
        assert_eq!(first, again);
        assert_eq!(pool.sprite(first).unwrap().owner(), Owner::InPlay);
        assert_eq!(pool.in_use(), 1);
    }

    #[test]
    fn release_refuses_animating_or_free_sprites() {
        let (mut pool, mut renderer) = pool(2);
        let index = pool.acquire(CardId(1), Owner::Player(0), &mut renderer);
        pool.set_animation(index, Some(AnimationId::from(KeyData::from_ffi(1))));

        assert_eq!(pool.release(index, &mut renderer), Err(StageError::SpriteAnimating(index)));
        assert_eq!(pool.sprite(index).unwrap().owner(), Owner::Player(0));

        pool.set_animation(index, None);
        pool.release(index, &mut renderer).unwrap();
        assert_eq!(pool.release(index, &mut renderer), Err(StageError::SpriteNotAcquired(index)));
        assert_eq!(pool.release(99, &mut renderer), Err(StageError::SpriteNotAcquired(99)));
    }

    #[test]
    fn release_parks_the_sprite() {
        let (mut pool, mut renderer) = pool(1);
        let index = pool.acquire(CardId(3), Owner::Player(1), &mut renderer);
        pool.show(index, "card_red_3", &mut renderer);
        pool.place(index, Pose::at(400.0, 500.0).rotated(90.0), &mut renderer);
        pool.raise(index, Layer::Front, &mut renderer);
        assert!(pool.is_consistent());

        pool.release(index, &mut renderer).unwrap();
        let sprite = pool.sprite(index).unwrap();
        assert_eq!(sprite.pose(), pool.anchor());
        assert!(!sprite.is_visible());
        assert_eq!(sprite.hand_index(), None);

        let visual = renderer.visual(sprite.visual()).unwrap();
        assert!(!visual.visible);
        assert_eq!(visual.texture.as_deref(), Some(CARD_BACK));
        assert!(pool.is_consistent());
    }

    #[test]
    fn owner_tags_match_legacy_numbers() {
        assert_eq!(Owner::Unassigned.tag(), -2);
        assert_eq!(Owner::InPlay.tag(), -1);
        assert_eq!(Owner::Player(3).tag(), 3);
    }
}
