//=========================================================================
// Animation Scheduler
//=========================================================================
//
// Turns rule-engine card events into sprite motion.
//
// Architecture:
// ```text
//   play_draw / play_card
//        │
//        ├─► SpritePool   (acquire / release)
//        ├─► TweenTable   (in-flight moves, typed completions)
//        └─► deferred     (staggered draws, reveal holds; epoch-stamped)
//
//   update():
//     1. advance tweens, act on their completions
//     2. advance the clock
//     3. fire deferred work that is due and still belongs to this epoch
// ```
//
// A draw batch relayouts its seat exactly once, when the last of its
// cards has arrived (or been cancelled). Layout moves are tweens too;
// the last one to finish records the seat's hand as `last_known`.
//
// `shutdown` cancels everything. Deferred work queued before it never
// fires.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::{HashMap, VecDeque};

use log::{debug, error, trace, warn};

//=== Internal Dependencies ===============================================

use super::card::{CardDescriptor, CardEffect, CardFace, CardId, CARD_BACK};
use super::hand_layout::{HandCanvas, Orientation};
use super::sprite_pool::{Owner, SpritePool};
use super::tween::{Completion, Finished, TweenTable};
use crate::core::config::StageConfig;
use crate::core::error::{StageError, StageResult};
use crate::core::render::{Layer, Pose, Renderer};

/// Distance a selected card rises out of its hand.
pub const LIFT_PX: f32 = 20.0;

/// Identifier of one `play_draw` call.
pub type BatchId = u64;

//=== Origin ==============================================================

/// Where a played card comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Straight off the deck (e.g. the opening discard).
    System,
    Seat(usize),
}

//=== Hand ================================================================

/// One seat's hand as seen by the scheduler.
#[derive(Debug, Clone, Default)]
pub struct Hand {
    sprites: Vec<usize>,
    last_known: Vec<CardId>,
    layout_passes: u32,
    settling: usize,
}

impl Hand {
    /// Sprite indices in hand order.
    pub fn sprites(&self) -> &[usize] {
        &self.sprites
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Hand order recorded when the last layout pass settled.
    pub fn last_known(&self) -> &[CardId] {
        &self.last_known
    }

    /// Number of layout passes run for this seat.
    pub fn layout_passes(&self) -> u32 {
        self.layout_passes
    }

    /// True while layout moves are still running.
    pub fn is_settling(&self) -> bool {
        self.settling > 0
    }
}

//=== Deferred Work =======================================================

#[derive(Debug, Clone)]
enum DeferredAction {
    Draw {
        seat: usize,
        batch: BatchId,
        card: CardId,
        texture: String,
        reveal: bool,
    },
    ReturnToDeck {
        sprite: usize,
        card: CardId,
        seat: usize,
    },
}

#[derive(Debug, Clone)]
struct Deferred {
    due_ms: f64,
    epoch: u64,
    action: DeferredAction,
}

#[derive(Debug, Clone, Copy)]
struct Batch {
    seat: usize,
    remaining: usize,
    reveal: bool,
}

#[derive(Debug, Clone, Copy)]
struct Timing {
    stagger_ms: u64,
    hold_ms: u64,
    draw_ms: u64,
    play_ms: u64,
    layout_ms: u64,
    return_ms: u64,
    discard_keep: usize,
}

impl Timing {
    fn from_config(config: &StageConfig) -> Self {
        Self {
            stagger_ms: config.draw_stagger_ms,
            hold_ms: config.reveal_hold_ms,
            draw_ms: config.draw_move_ms,
            play_ms: config.play_move_ms,
            layout_ms: config.layout_move_ms,
            return_ms: config.return_move_ms,
            discard_keep: config.discard_keep,
        }
    }
}

//=== AnimationScheduler ==================================================

pub struct AnimationScheduler {
    pool: SpritePool,
    tweens: TweenTable,
    deferred: Vec<Deferred>,
    epoch: u64,
    clock_ms: f64,
    frame_ms: f64,
    batches: HashMap<BatchId, Batch>,
    next_batch: BatchId,
    hands: Vec<Hand>,
    canvases: Vec<HandCanvas>,
    discard: VecDeque<usize>,
    timing: Timing,
    deck: Pose,
    discard_pose: Pose,
    lifted: Option<usize>,
    live: bool,
}

impl AnimationScheduler {
    //--- Construction -----------------------------------------------------

    /// Creates the sprite pool and one hand canvas per seat.
    pub fn new(config: &StageConfig, renderer: &mut dyn Renderer) -> Self {
        let center_x = config.screen_width / 2.0;
        let center_y = config.screen_height / 2.0;
        let deck = Pose::at(center_x - config.card_width, center_y);
        let discard_pose = Pose::at(center_x + config.card_width, center_y);

        let canvases: Vec<HandCanvas> = (0..config.seats).map(|seat| HandCanvas::for_seat(seat, config)).collect();
        debug!(target: "stage::cards", "Animation scheduler ready for {} seats", config.seats);

        Self {
            pool: SpritePool::new(config.initial_pool_size, deck, renderer),
            tweens: TweenTable::new(),
            deferred: Vec::new(),
            epoch: 0,
            clock_ms: 0.0,
            frame_ms: config.frame_ms(),
            batches: HashMap::new(),
            next_batch: 1,
            hands: vec![Hand::default(); config.seats],
            canvases,
            discard: VecDeque::new(),
            timing: Timing::from_config(config),
            deck,
            discard_pose,
            lifted: None,
            live: true,
        }
    }

    //--- Card Events ------------------------------------------------------

    /// Deals `cards` from the deck to `seat`, one every `draw_stagger_ms`.
    ///
    /// Every card is resolved before anything moves, so a bad symbol
    /// leaves the table untouched. Seat 0 and revealed draws travel face
    /// up. Revealed cards go back to the deck after `reveal_hold_ms`
    /// instead of joining the hand.
    pub fn play_draw(
        &mut self,
        seat: usize,
        cards: &[CardDescriptor],
        reveal: bool,
        renderer: &mut dyn Renderer,
    ) -> StageResult<Option<BatchId>> {
        if !self.live {
            warn!(target: "stage::cards", "Draw for seat {} ignored after shutdown", seat);
            return Ok(None);
        }
        self.check_seat(seat)?;

        let mut items = Vec::with_capacity(cards.len());
        for card in cards {
            let face = CardFace::resolve(card)?;
            let texture = if seat == 0 || reveal { face.texture() } else { CARD_BACK.to_owned() };
            items.push((card.id, texture));
        }
        if items.is_empty() {
            return Ok(None);
        }

        let batch = self.next_batch;
        self.next_batch += 1;
        self.batches.insert(batch, Batch { seat, remaining: items.len(), reveal });
        debug!(target: "stage::cards", "Batch {}: {} card(s) to seat {}", batch, items.len(), seat);

        for (i, (card, texture)) in items.into_iter().enumerate() {
            let action = DeferredAction::Draw { seat, batch, card, texture, reveal };
            if i == 0 {
                self.fire(action, renderer);
            } else {
                self.deferred.push(Deferred {
                    due_ms: self.clock_ms + (i as u64 * self.timing.stagger_ms) as f64,
                    epoch: self.epoch,
                    action,
                });
            }
        }
        Ok(Some(batch))
    }

    /// Moves `card` onto the discard pile.
    ///
    /// A card already on screen starts from where it is; anything else
    /// appears at the deck (`System`) or at the seat's canvas. The card
    /// lands face up with the colour effect of `effects`.
    pub fn play_card(
        &mut self,
        origin: Origin,
        card: &CardDescriptor,
        effects: &[CardEffect],
        renderer: &mut dyn Renderer,
    ) -> StageResult<()> {
        if !self.live {
            warn!(target: "stage::cards", "Play of {} ignored after shutdown", card.id);
            return Ok(());
        }
        let spawn_at = match origin {
            Origin::System => Some(self.deck),
            Origin::Seat(seat) => {
                self.check_seat(seat)?;
                self.pool.index_of(card.id).is_none().then(|| self.canvases[seat].center())
            }
        };
        let texture = CardFace::resolve(card)?.texture();
        let landing = CardEffect::landing_color(card, effects)?;

        let sprite = self.pool.acquire(card.id, Owner::InPlay, renderer);
        if let Some(pose) = spawn_at {
            self.pool.place(sprite, pose, renderer);
        }
        let from_seat = self.detach(sprite);

        self.pool.show(sprite, &texture, renderer);
        self.pool.raise(sprite, Layer::Front, renderer);
        self.tweens.start(
            sprite,
            self.discard_pose,
            self.timing.play_ms,
            Completion::Discard { tint: landing.tint() },
            &mut self.pool,
        );
        debug!(target: "stage::cards", "{} played from {:?}", card.id, origin);

        if let Some(seat) = from_seat {
            self.relayout(seat, renderer);
        }
        Ok(())
    }

    /// Raises the card at `selected` in `seat`'s hand, lowering any other.
    pub fn lift(&mut self, seat: usize, selected: Option<usize>, renderer: &mut dyn Renderer) -> StageResult<()> {
        self.check_seat(seat)?;
        let lifted = selected.and_then(|i| self.hands[seat].sprites.get(i).copied());
        if lifted == self.lifted {
            return Ok(());
        }
        self.lifted = lifted;
        self.relayout(seat, renderer);
        Ok(())
    }

    //--- Frame Update -----------------------------------------------------

    /// Advances one frame.
    pub fn update(&mut self, renderer: &mut dyn Renderer) {
        // Completions stamp deferred work against this frame's time.
        self.clock_ms += self.frame_ms;
        let finished = self.tweens.advance(self.frame_ms, &mut self.pool, renderer);
        for done in finished {
            self.complete(done, renderer);
        }

        let now = self.clock_ms + 1e-6;
        let (mut due, pending): (Vec<Deferred>, Vec<Deferred>) =
            std::mem::take(&mut self.deferred).into_iter().partition(|d| d.due_ms <= now);
        self.deferred = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));

        for item in due {
            if item.epoch != self.epoch {
                trace!(target: "stage::cards", "Dropping stale deferred work");
                continue;
            }
            self.fire(item.action, renderer);
        }
    }

    /// Cancels every tween and all deferred work. Later events are ignored.
    pub fn shutdown(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        self.epoch += 1;
        let dropped = self.deferred.len();
        self.deferred.clear();
        let cancelled = self.tweens.cancel_all(&mut self.pool);
        self.batches.clear();
        debug!(
            target: "stage::cards",
            "Scheduler shut down ({} tweens cancelled, {} deferred dropped)",
            cancelled.len(),
            dropped
        );
    }

    /// Shuts down and removes every card visual.
    pub fn dispose(&mut self, renderer: &mut dyn Renderer) {
        self.shutdown();
        self.hands.iter_mut().for_each(|hand| *hand = Hand::default());
        self.discard.clear();
        self.lifted = None;
        self.pool.dispose(renderer);
    }

    //--- Queries ----------------------------------------------------------

    /// Outstanding animation handles.
    pub fn in_flight(&self) -> usize {
        self.tweens.in_flight()
    }

    /// True while staggered draws or reveal holds are waiting to fire.
    pub fn has_pending(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// True while anything on the table still has to move.
    pub fn is_busy(&self) -> bool {
        self.in_flight() != 0 || self.has_pending() || !self.batches.is_empty()
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn seats(&self) -> usize {
        self.hands.len()
    }

    pub fn hand(&self, seat: usize) -> Option<&Hand> {
        self.hands.get(seat)
    }

    /// Cards of `seat` in hand order.
    pub fn hand_cards(&self, seat: usize) -> Vec<CardId> {
        self.hands
            .get(seat)
            .map(|hand| hand.sprites.iter().filter_map(|&i| self.pool.sprite(i)?.card()).collect())
            .unwrap_or_default()
    }

    pub fn pool(&self) -> &SpritePool {
        &self.pool
    }

    /// Sprites currently resting on (or flying to) the discard pile.
    pub fn discard_len(&self) -> usize {
        self.discard.len()
    }

    pub fn deck_pose(&self) -> Pose {
        self.deck
    }

    pub fn discard_pose(&self) -> Pose {
        self.discard_pose
    }

    //--- Internal Helpers -------------------------------------------------

    fn check_seat(&self, seat: usize) -> StageResult<()> {
        if seat < self.hands.len() {
            Ok(())
        } else {
            let err = StageError::SeatOutOfRange { seat, seats: self.hands.len() };
            error!(target: "stage::cards", "{}", err);
            Err(err)
        }
    }

    fn fire(&mut self, action: DeferredAction, renderer: &mut dyn Renderer) {
        match action {
            DeferredAction::Draw { seat, batch, card, texture, reveal } => {
                let sprite = self.pool.acquire(card, Owner::Player(seat), renderer);
                if let Some(from) = self.detach(sprite) {
                    self.relayout(from, renderer);
                }
                self.pool.place(sprite, self.deck, renderer);
                self.pool.show(sprite, &texture, renderer);
                self.pool.raise(sprite, Layer::Front, renderer);

                let completion = if reveal {
                    Completion::Revealed { seat, batch }
                } else {
                    Completion::JoinHand { seat, batch }
                };
                let target = self.canvases[seat].center();
                self.tweens.start(sprite, target, self.timing.draw_ms, completion, &mut self.pool);
            }

            DeferredAction::ReturnToDeck { sprite, card, seat } => {
                let still_ours = self
                    .pool
                    .sprite(sprite)
                    .is_some_and(|s| s.card() == Some(card) && s.owner() == Owner::Player(seat));
                if !still_ours {
                    trace!(target: "stage::cards", "{} moved on before returning to the deck", card);
                    return;
                }
                self.pool.show(sprite, CARD_BACK, renderer);
                self.tweens.start(sprite, self.deck, self.timing.return_ms, Completion::Release, &mut self.pool);
            }
        }
    }

    fn complete(&mut self, done: Finished, renderer: &mut dyn Renderer) {
        let Finished { sprite, completion, cancelled } = done;
        match completion {
            Completion::JoinHand { seat, batch } => {
                if !cancelled {
                    let hand = &mut self.hands[seat];
                    self.pool.set_hand_index(sprite, Some(hand.sprites.len()));
                    hand.sprites.push(sprite);
                    self.pool.raise(sprite, Layer::Hands, renderer);
                }
                self.settle_batch(batch, renderer);
            }

            Completion::Revealed { seat, batch } => {
                if !cancelled {
                    if let Some(card) = self.pool.sprite(sprite).and_then(|s| s.card()) {
                        self.deferred.push(Deferred {
                            due_ms: self.clock_ms + self.timing.hold_ms as f64,
                            epoch: self.epoch,
                            action: DeferredAction::ReturnToDeck { sprite, card, seat },
                        });
                    }
                }
                self.settle_batch(batch, renderer);
            }

            Completion::Release if !cancelled => {
                if let Err(err) = self.pool.release(sprite, renderer) {
                    debug!(target: "stage::cards", "Release skipped: {}", err);
                }
            }

            Completion::Discard { tint } if !cancelled => {
                if let Some(visual) = self.pool.sprite(sprite).map(|s| s.visual()) {
                    renderer.set_tint(visual, tint);
                }
                self.pool.raise(sprite, Layer::Table, renderer);
                self.discard.push_back(sprite);
                self.trim_discard(renderer);
            }

            Completion::Settle { seat } => {
                let hand = &mut self.hands[seat];
                hand.settling = hand.settling.saturating_sub(1);
                if hand.settling == 0 {
                    self.snapshot(seat);
                }
            }

            Completion::Release | Completion::Discard { .. } | Completion::Idle => {}
        }
    }

    fn settle_batch(&mut self, batch: BatchId, renderer: &mut dyn Renderer) {
        let Some(entry) = self.batches.get_mut(&batch) else {
            return;
        };
        entry.remaining -= 1;
        if entry.remaining > 0 {
            return;
        }
        let Batch { seat, reveal, .. } = *entry;
        self.batches.remove(&batch);
        trace!(target: "stage::cards", "Batch {} settled", batch);
        if !reveal {
            self.relayout(seat, renderer);
        }
    }

    /// Takes a sprite out of whichever hand or pile holds it.
    fn detach(&mut self, sprite: usize) -> Option<usize> {
        self.discard.retain(|&s| s != sprite);
        if self.lifted == Some(sprite) {
            self.lifted = None;
        }
        let seat = self.hands.iter().position(|hand| hand.sprites.contains(&sprite))?;
        self.hands[seat].sprites.retain(|&s| s != sprite);
        self.pool.set_hand_index(sprite, None);
        Some(seat)
    }

    fn relayout(&mut self, seat: usize, renderer: &mut dyn Renderer) {
        let canvas = &self.canvases[seat];
        let lift = lift_offset(canvas.orientation());
        let poses = canvas.layout(self.hands[seat].sprites.len());
        let sprites = self.hands[seat].sprites.clone();

        let mut started = 0;
        for (i, (sprite, mut target)) in sprites.into_iter().zip(poses).enumerate() {
            self.pool.set_hand_index(sprite, Some(i));
            self.pool.raise(sprite, Layer::Hands, renderer);
            if self.lifted == Some(sprite) {
                target.x += lift.0;
                target.y += lift.1;
            }
            let Some(current) = self.pool.sprite(sprite) else {
                continue;
            };
            if current.pose() == target && !current.is_animating() {
                continue;
            }
            self.tweens.start(sprite, target, self.timing.layout_ms, Completion::Settle { seat }, &mut self.pool);
            started += 1;
        }

        let hand = &mut self.hands[seat];
        hand.layout_passes += 1;
        hand.settling += started;
        trace!(target: "stage::cards", "Seat {} layout pass {} ({} moves)", seat, hand.layout_passes, started);
        if hand.settling == 0 {
            self.snapshot(seat);
        }
    }

    fn snapshot(&mut self, seat: usize) {
        let cards = self.hand_cards(seat);
        self.hands[seat].last_known = cards;
    }

    /// Releases the oldest idle discards beyond `discard_keep`.
    fn trim_discard(&mut self, renderer: &mut dyn Renderer) {
        while self.discard.len() > self.timing.discard_keep {
            let Some(&oldest) = self.discard.front() else {
                break;
            };
            if self.pool.sprite(oldest).is_some_and(|s| s.is_animating()) {
                break;
            }
            self.discard.pop_front();
            if let Err(err) = self.pool.release(oldest, renderer) {
                debug!(target: "stage::cards", "Discard trim skipped: {}", err);
            }
        }
    }
}

/// Screen offset that moves a card toward the table centre.
fn lift_offset(orientation: Orientation) -> (f32, f32) {
    match orientation {
        Orientation::Down => (0.0, -LIFT_PX),
        Orientation::Up => (0.0, LIFT_PX),
        Orientation::Right => (-LIFT_PX, 0.0),
        Orientation::Left => (LIFT_PX, 0.0),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::{HeadlessRenderer, Tint};
    use crate::game::cards::card::{CardColor, SymbolError};
    use approx::assert_relative_eq;

    fn scheduler(config: &StageConfig) -> (AnimationScheduler, HeadlessRenderer) {
        let mut renderer = HeadlessRenderer::new();
        let scheduler = AnimationScheduler::new(config, &mut renderer);
        (scheduler, renderer)
    }

    fn cards(ids: &[u32]) -> Vec<CardDescriptor> {
        ids.iter().map(|&id| CardDescriptor::new(id, "green", (id % 10).to_string())).collect()
    }

    /// Updates until idle; returns the number of frames run.
    fn run_idle(scheduler: &mut AnimationScheduler, renderer: &mut HeadlessRenderer) -> u32 {
        let mut frames = 0;
        while scheduler.is_busy() {
            scheduler.update(renderer);
            frames += 1;
            assert!(frames < 10_000, "scheduler never went idle");
        }
        frames
    }

    //=====================================================================
    // Play Card
    //=====================================================================

    #[test]
    fn play_card_counter_rises_and_returns_to_zero() {
        let config = StageConfig::default();
        let (mut scheduler, mut renderer) = scheduler(&config);
        assert_eq!(scheduler.in_flight(), 0);
        assert!(!scheduler.is_busy());

        let card = CardDescriptor::new(40, "red", "skip");
        scheduler.play_card(Origin::System, &card, &[], &mut renderer).unwrap();
        assert_eq!(scheduler.in_flight(), 1);
        assert!(scheduler.is_busy());

        run_idle(&mut scheduler, &mut renderer);
        assert_eq!(scheduler.in_flight(), 0);
        assert!(!scheduler.is_busy());

        let sprite = scheduler.pool().sprite(scheduler.pool().index_of(CardId(40)).unwrap()).unwrap();
        assert_eq!(sprite.owner(), Owner::InPlay);
        assert_eq!(sprite.layer(), Layer::Table);
        assert_relative_eq!(sprite.pose().x, scheduler.discard_pose().x);

        let visual = renderer.visual(sprite.visual()).unwrap();
        assert_eq!(visual.tint, CardColor::Red.tint());
        assert_eq!(visual.texture.as_deref(), Some("card_red_skip"));
        assert_eq!(scheduler.discard_len(), 1);
    }

    #[test]
    fn wild_lands_with_the_chosen_colour() {
        let (mut scheduler, mut renderer) = scheduler(&StageConfig::default());
        let card = CardDescriptor::new(1, "wild", "wild4");
        let effects = [CardEffect::Draw(4), CardEffect::ChooseColor("yellow".into())];
        scheduler.play_card(Origin::System, &card, &effects, &mut renderer).unwrap();
        run_idle(&mut scheduler, &mut renderer);

        let visual = scheduler.pool().sprite(0).unwrap().visual();
        assert_eq!(renderer.visual(visual).unwrap().tint, CardColor::Yellow.tint());
        assert_ne!(renderer.visual(visual).unwrap().tint, Tint::NONE);
    }

    #[test]
    fn playing_from_a_hand_relayouts_the_rest() {
        let (mut scheduler, mut renderer) = scheduler(&StageConfig::default());
        scheduler.play_draw(0, &cards(&[1, 2, 3]), false, &mut renderer).unwrap();
        run_idle(&mut scheduler, &mut renderer);
        assert_eq!(scheduler.hand(0).unwrap().last_known(), &[CardId(1), CardId(2), CardId(3)]);

        scheduler.play_card(Origin::Seat(0), &cards(&[2])[0], &[], &mut renderer).unwrap();
        assert_eq!(scheduler.hand_cards(0), vec![CardId(1), CardId(3)]);
        run_idle(&mut scheduler, &mut renderer);

        let hand = scheduler.hand(0).unwrap();
        assert_eq!(hand.layout_passes(), 2);
        assert_eq!(hand.last_known(), &[CardId(1), CardId(3)]);
        assert!(scheduler.pool().is_consistent());
    }

    //=====================================================================
    // Draw Batches
    //=====================================================================

    #[test]
    fn draw_batch_relayouts_once_after_the_last_arrival() {
        let config = StageConfig::default();
        let (mut scheduler, mut renderer) = scheduler(&config);

        scheduler.play_draw(1, &cards(&[1, 2, 3, 4]), false, &mut renderer).unwrap();
        assert_eq!(scheduler.in_flight(), 1);
        assert!(scheduler.has_pending());

        let mut frames = 0u32;
        while scheduler.hand(1).unwrap().len() < 4 {
            scheduler.update(&mut renderer);
            frames += 1;
            if scheduler.hand(1).unwrap().len() < 4 {
                assert_eq!(scheduler.hand(1).unwrap().layout_passes(), 0);
            }
            assert!(frames < 1000);
        }
        assert_eq!(scheduler.hand(1).unwrap().layout_passes(), 1);

        let elapsed_ms = frames as f64 * config.frame_ms();
        assert!(elapsed_ms >= (3 * config.draw_stagger_ms) as f64);

        run_idle(&mut scheduler, &mut renderer);
        let hand = scheduler.hand(1).unwrap();
        assert_eq!(hand.layout_passes(), 1);
        assert_eq!(hand.last_known(), &[CardId(1), CardId(2), CardId(3), CardId(4)]);
    }

    #[test]
    fn opponents_draw_face_down_and_seat_zero_face_up() {
        let (mut scheduler, mut renderer) = scheduler(&StageConfig::default());
        scheduler.play_draw(2, &cards(&[5]), false, &mut renderer).unwrap();
        scheduler.play_draw(0, &cards(&[6]), false, &mut renderer).unwrap();
        run_idle(&mut scheduler, &mut renderer);

        let texture = |card: u32| {
            let index = scheduler.pool().index_of(CardId(card)).unwrap();
            let visual = scheduler.pool().sprite(index).unwrap().visual();
            renderer.visual(visual).unwrap().texture.clone()
        };
        assert_eq!(texture(5).as_deref(), Some(CARD_BACK));
        assert_eq!(texture(6).as_deref(), Some("card_green_6"));
    }

    #[test]
    fn revealed_draw_returns_to_the_deck() {
        let config = StageConfig::default();
        let (mut scheduler, mut renderer) = scheduler(&config);

        scheduler.play_draw(3, &cards(&[7]), true, &mut renderer).unwrap();
        let frames = run_idle(&mut scheduler, &mut renderer);
        let minimum = (config.draw_move_ms + config.reveal_hold_ms + config.return_move_ms) as f64;
        assert!(frames as f64 * config.frame_ms() + 1e-6 >= minimum);

        let hand = scheduler.hand(3).unwrap();
        assert!(hand.is_empty());
        assert_eq!(hand.layout_passes(), 0);
        assert_eq!(scheduler.pool().index_of(CardId(7)), None);
        assert_eq!(scheduler.pool().free_count(), config.initial_pool_size);
        assert!(scheduler.pool().is_consistent());
    }

    #[test]
    fn revealed_card_holds_for_the_full_reveal_time() {
        let config = StageConfig::default();
        let (mut scheduler, mut renderer) = scheduler(&config);
        scheduler.play_draw(3, &cards(&[7]), true, &mut renderer).unwrap();
        let sprite = scheduler.pool().index_of(CardId(7)).unwrap();

        let mut guard = 0;
        while scheduler.pool().sprite(sprite).unwrap().is_animating() {
            scheduler.update(&mut renderer);
            guard += 1;
            assert!(guard < 1_000);
        }
        assert!(scheduler.has_pending());

        let mut held = 0;
        while !scheduler.pool().sprite(sprite).unwrap().is_animating() {
            scheduler.update(&mut renderer);
            held += 1;
            assert!(held < 1_000);
        }
        assert!(held as f64 * config.frame_ms() + 1e-6 >= config.reveal_hold_ms as f64);
        assert_eq!(held, 120);
    }

    #[test]
    fn bad_symbols_are_fatal_and_move_nothing() {
        let (mut scheduler, mut renderer) = scheduler(&StageConfig::default());
        let batch = vec![CardDescriptor::new(1, "red", "1"), CardDescriptor::new(2, "purple", "2")];

        let err = scheduler.play_draw(1, &batch, false, &mut renderer).unwrap_err();
        assert_eq!(err, StageError::Symbol(SymbolError::UnknownColor("purple".into())));
        assert!(err.is_fatal());
        assert!(!scheduler.is_busy());
        assert_eq!(scheduler.pool().in_use(), 0);
    }

    #[test]
    fn unknown_seat_is_rejected() {
        let (mut scheduler, mut renderer) = scheduler(&StageConfig::default());
        let err = scheduler.play_draw(9, &cards(&[1]), false, &mut renderer).unwrap_err();
        assert_eq!(err, StageError::SeatOutOfRange { seat: 9, seats: 4 });
        assert!(!err.is_fatal());
    }

    //=====================================================================
    // Retargeting & Teardown
    //=====================================================================

    #[test]
    fn playing_a_card_mid_draw_cancels_its_flight() {
        let (mut scheduler, mut renderer) = scheduler(&StageConfig::default());
        scheduler.play_draw(1, &cards(&[8]), false, &mut renderer).unwrap();
        scheduler.update(&mut renderer);
        scheduler.update(&mut renderer);

        scheduler.play_card(Origin::Seat(1), &cards(&[8])[0], &[], &mut renderer).unwrap();
        assert_eq!(scheduler.in_flight(), 1);

        run_idle(&mut scheduler, &mut renderer);
        assert_eq!(scheduler.in_flight(), 0);
        assert!(scheduler.hand(1).unwrap().is_empty());
        assert_eq!(scheduler.discard_len(), 1);
        assert!(scheduler.pool().is_consistent());
    }

    #[test]
    fn shutdown_drops_everything_in_flight() {
        let (mut scheduler, mut renderer) = scheduler(&StageConfig::default());
        scheduler.play_draw(1, &cards(&[1, 2, 3]), false, &mut renderer).unwrap();
        scheduler.update(&mut renderer);

        scheduler.shutdown();
        assert_eq!(scheduler.in_flight(), 0);
        assert!(!scheduler.has_pending());
        assert!(!scheduler.is_busy());

        for _ in 0..200 {
            scheduler.update(&mut renderer);
        }
        assert_eq!(scheduler.pool().in_use(), 1);
        assert_eq!(scheduler.play_draw(1, &cards(&[4]), false, &mut renderer), Ok(None));
        assert!(!scheduler.is_busy());
    }

    #[test]
    fn discard_pile_keeps_only_the_newest() {
        let config = StageConfig { discard_keep: 2, ..StageConfig::default() };
        let (mut scheduler, mut renderer) = scheduler(&config);

        for id in 0..4 {
            scheduler.play_card(Origin::System, &cards(&[id])[0], &[], &mut renderer).unwrap();
            run_idle(&mut scheduler, &mut renderer);
        }
        assert_eq!(scheduler.discard_len(), 2);
        assert_eq!(scheduler.pool().in_use(), 2);
        assert_eq!(scheduler.pool().index_of(CardId(0)), None);
        assert!(scheduler.pool().index_of(CardId(3)).is_some());
    }

    #[test]
    fn lifted_card_rises_toward_the_table() {
        let (mut scheduler, mut renderer) = scheduler(&StageConfig::default());
        scheduler.play_draw(0, &cards(&[1, 2]), false, &mut renderer).unwrap();
        run_idle(&mut scheduler, &mut renderer);
        let resting = scheduler.pool().sprite(scheduler.hand(0).unwrap().sprites()[1]).unwrap().pose();

        scheduler.lift(0, Some(1), &mut renderer).unwrap();
        run_idle(&mut scheduler, &mut renderer);
        let raised = scheduler.pool().sprite(scheduler.hand(0).unwrap().sprites()[1]).unwrap().pose();
        assert_relative_eq!(raised.y, resting.y - LIFT_PX, epsilon = 1e-3);
        assert_relative_eq!(raised.x, resting.x, epsilon = 1e-3);
    }

    #[test]
    fn dispose_removes_every_card_visual() {
        let config = StageConfig { initial_pool_size: 8, ..StageConfig::default() };
        let (mut scheduler, mut renderer) = scheduler(&config);
        assert_eq!(renderer.visual_count(), 8);

        scheduler.play_draw(2, &cards(&[1, 2]), false, &mut renderer).unwrap();
        scheduler.dispose(&mut renderer);

        assert_eq!(renderer.visual_count(), 0);
        assert!(scheduler.pool().is_empty());
        assert!(scheduler.hand(2).unwrap().is_empty());
        assert!(!scheduler.is_busy());
    }
}
