//=========================================================================
// Cards
//=========================================================================
//
// Card model, sprite pooling, tweening and hand layout.
//
//   card ──► sprite_pool ◄── tween
//                 ▲            ▲
//                 └─ animation ┘──► hand_layout
//
//=========================================================================

mod animation;
mod card;
mod hand_layout;
mod sprite_pool;
mod tween;

pub use animation::{AnimationScheduler, BatchId, Hand, Origin, LIFT_PX};
pub use card::{CardColor, CardDescriptor, CardEffect, CardFace, CardId, CardValue, SymbolError, CARD_BACK};
pub use hand_layout::{overlap_fraction, stack_positions, HandCanvas, Orientation};
pub use sprite_pool::{CardSprite, Owner, SpritePool};
pub use tween::{AnimationId, Completion, Finished, TweenTable};
