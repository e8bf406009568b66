//=========================================================================
// Tween Table
//=========================================================================
//
// In-flight pose interpolations, one per animating sprite.
//
// Each tween carries a typed `Completion` that the scheduler acts on when
// the tween finishes (or is cancelled). The table keeps its own
// outstanding counter: incremented once in `start`, decremented once when
// the handle leaves the table, whichever way it leaves.
//
//   start(sprite) ──► [sprite had a tween?] ──yes──► cancel old ──► settled
//        │
//        └──► SlotMap<AnimationId, Tween>
//                  │ advance(dt)
//                  ▼
//             Finished { completion, cancelled: false }
//
//=========================================================================

//=== External Dependencies ===============================================

use log::trace;
use slotmap::{new_key_type, SlotMap};

//=== Internal Dependencies ===============================================

use super::sprite_pool::SpritePool;
use crate::core::render::{Pose, Renderer, Tint};

new_key_type! {
    /// Handle of one in-flight tween.
    pub struct AnimationId;
}

//=== Completion ==========================================================

/// What happens when a tween ends.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Drawn card arrives at a seat and joins the hand.
    JoinHand { seat: usize, batch: u64 },
    /// Revealed draw arrives; it goes back to the deck after a hold.
    Revealed { seat: usize, batch: u64 },
    /// Sprite returns to the pool.
    Release,
    /// Played card lands on the discard pile.
    Discard { tint: Tint },
    /// Hand relayout move; the last one snapshots the seat's order.
    Settle { seat: usize },
    Idle,
}

/// A tween that left the table.
#[derive(Debug, Clone, PartialEq)]
pub struct Finished {
    pub sprite: usize,
    pub completion: Completion,
    /// True when the tween was replaced or shut down before arriving.
    pub cancelled: bool,
}

//=== Tween ===============================================================

#[derive(Debug, Clone)]
struct Tween {
    sprite: usize,
    from: Pose,
    to: Pose,
    elapsed_ms: f64,
    duration_ms: f64,
    completion: Completion,
    seq: u64,
}

impl Tween {
    /// Ease-out quad.
    fn pose(&self) -> Pose {
        let t = if self.duration_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms / self.duration_ms).min(1.0) as f32
        };
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        self.from.lerp(&self.to, eased)
    }

    fn is_done(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }
}

//=== TweenTable ==========================================================

#[derive(Default)]
pub struct TweenTable {
    tweens: SlotMap<AnimationId, Tween>,
    in_flight: usize,
    seq: u64,
    settled: Vec<Finished>,
}

impl TweenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts moving `sprite` from its current pose to `to`.
    ///
    /// An existing tween on the sprite is cancelled first; its completion
    /// is handed back by the next `advance`.
    pub fn start(
        &mut self,
        sprite: usize,
        to: Pose,
        duration_ms: u64,
        completion: Completion,
        pool: &mut SpritePool,
    ) -> AnimationId {
        let (from, previous) = match pool.sprite(sprite) {
            Some(s) => (s.pose(), s.animation()),
            None => (to, None),
        };
        if let Some(old) = previous {
            self.cancel(old, pool);
        }

        self.seq += 1;
        let id = self.tweens.insert(Tween {
            sprite,
            from,
            to,
            elapsed_ms: 0.0,
            duration_ms: duration_ms as f64,
            completion,
            seq: self.seq,
        });
        pool.set_animation(sprite, Some(id));
        self.in_flight += 1;
        debug_assert_eq!(self.in_flight, self.tweens.len());
        trace!(target: "stage::cards", "Tween {:?} started on sprite #{}", id, sprite);
        id
    }

    /// Advances every tween by `dt_ms` and returns the ones that ended
    /// (cancellations first, then arrivals in start order).
    pub fn advance(&mut self, dt_ms: f64, pool: &mut SpritePool, renderer: &mut dyn Renderer) -> Vec<Finished> {
        let mut done: Vec<(u64, AnimationId)> = Vec::new();
        for (id, tween) in self.tweens.iter_mut() {
            tween.elapsed_ms += dt_ms;
            pool.place(tween.sprite, tween.pose(), renderer);
            if tween.is_done() {
                done.push((tween.seq, id));
            }
        }
        done.sort_unstable_by_key(|(seq, _)| *seq);

        let mut finished = std::mem::take(&mut self.settled);
        for (_, id) in done {
            if let Some(tween) = self.remove(id, pool) {
                finished.push(Finished { sprite: tween.sprite, completion: tween.completion, cancelled: false });
            }
        }
        finished
    }

    /// Cancels every tween; the sprites stay where they are.
    pub fn cancel_all(&mut self, pool: &mut SpritePool) -> Vec<Finished> {
        let ids: Vec<AnimationId> = self.tweens.keys().collect();
        for id in ids {
            self.cancel(id, pool);
        }
        std::mem::take(&mut self.settled)
    }

    /// Outstanding handles. Zero means nothing is moving.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn contains(&self, id: AnimationId) -> bool {
        self.tweens.contains_key(id)
    }

    //--- Internal Helpers -------------------------------------------------

    fn cancel(&mut self, id: AnimationId, pool: &mut SpritePool) {
        if let Some(tween) = self.remove(id, pool) {
            trace!(target: "stage::cards", "Tween {:?} cancelled on sprite #{}", id, tween.sprite);
            self.settled.push(Finished { sprite: tween.sprite, completion: tween.completion, cancelled: true });
        }
    }

    fn remove(&mut self, id: AnimationId, pool: &mut SpritePool) -> Option<Tween> {
        let tween = self.tweens.remove(id)?;
        pool.set_animation(tween.sprite, None);
        self.in_flight -= 1;
        debug_assert_eq!(self.in_flight, self.tweens.len());
        Some(tween)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::HeadlessRenderer;
    use crate::game::cards::card::CardId;
    use crate::game::cards::sprite_pool::Owner;
    use approx::assert_relative_eq;

    fn setup() -> (TweenTable, SpritePool, HeadlessRenderer) {
        let mut renderer = HeadlessRenderer::new();
        let pool = SpritePool::new(4, Pose::at(0.0, 0.0), &mut renderer);
        (TweenTable::new(), pool, renderer)
    }

    #[test]
    fn counter_follows_handle_lifetime() {
        let (mut table, mut pool, mut renderer) = setup();
        let sprite = pool.acquire(CardId(1), Owner::InPlay, &mut renderer);

        table.start(sprite, Pose::at(100.0, 0.0), 100, Completion::Idle, &mut pool);
        assert_eq!(table.in_flight(), 1);
        assert!(pool.sprite(sprite).unwrap().is_animating());

        assert!(table.advance(50.0, &mut pool, &mut renderer).is_empty());
        assert_eq!(table.in_flight(), 1);

        let finished = table.advance(50.0, &mut pool, &mut renderer);
        assert_eq!(finished, vec![Finished { sprite, completion: Completion::Idle, cancelled: false }]);
        assert_eq!(table.in_flight(), 0);
        assert!(!pool.sprite(sprite).unwrap().is_animating());
        assert_eq!(pool.sprite(sprite).unwrap().pose(), Pose::at(100.0, 0.0));
    }

    #[test]
    fn eases_out() {
        let (mut table, mut pool, mut renderer) = setup();
        let sprite = pool.acquire(CardId(1), Owner::InPlay, &mut renderer);
        table.start(sprite, Pose::at(100.0, 0.0), 100, Completion::Idle, &mut pool);

        table.advance(50.0, &mut pool, &mut renderer);
        // 1 - (1 - 0.5)^2
        assert_relative_eq!(pool.sprite(sprite).unwrap().pose().x, 75.0);
    }

    #[test]
    fn retargeting_cancels_the_previous_handle_once() {
        let (mut table, mut pool, mut renderer) = setup();
        let sprite = pool.acquire(CardId(1), Owner::Player(0), &mut renderer);

        let first = table.start(sprite, Pose::at(100.0, 0.0), 100, Completion::Settle { seat: 0 }, &mut pool);
        table.advance(50.0, &mut pool, &mut renderer);
        let second = table.start(sprite, Pose::at(0.0, 200.0), 100, Completion::Idle, &mut pool);

        assert_eq!(table.in_flight(), 1);
        assert!(!table.contains(first));
        assert_eq!(pool.sprite(sprite).unwrap().animation(), Some(second));

        let finished = table.advance(10.0, &mut pool, &mut renderer);
        assert_eq!(
            finished,
            vec![Finished { sprite, completion: Completion::Settle { seat: 0 }, cancelled: true }]
        );

        let finished = table.advance(90.0, &mut pool, &mut renderer);
        assert_eq!(finished.len(), 1);
        assert!(!finished[0].cancelled);
        assert_eq!(table.in_flight(), 0);
    }

    #[test]
    fn arrivals_come_back_in_start_order() {
        let (mut table, mut pool, mut renderer) = setup();
        let a = pool.acquire(CardId(1), Owner::InPlay, &mut renderer);
        let b = pool.acquire(CardId(2), Owner::InPlay, &mut renderer);
        table.start(b, Pose::at(1.0, 0.0), 0, Completion::Idle, &mut pool);
        table.start(a, Pose::at(2.0, 0.0), 0, Completion::Release, &mut pool);

        let finished = table.advance(16.0, &mut pool, &mut renderer);
        let order: Vec<usize> = finished.iter().map(|f| f.sprite).collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn cancel_all_clears_the_table() {
        let (mut table, mut pool, mut renderer) = setup();
        for id in 0..3 {
            let sprite = pool.acquire(CardId(id), Owner::InPlay, &mut renderer);
            table.start(sprite, Pose::at(50.0, 50.0), 500, Completion::Idle, &mut pool);
        }
        let cancelled = table.cancel_all(&mut pool);
        assert_eq!(cancelled.len(), 3);
        assert!(cancelled.iter().all(|f| f.cancelled));
        assert_eq!(table.in_flight(), 0);
        assert!(table.advance(16.0, &mut pool, &mut renderer).is_empty());
    }
}
