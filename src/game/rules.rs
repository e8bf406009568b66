//=========================================================================
// Rule Engine Seam
//=========================================================================
//
// The gameplay scene does not know the rules of the game. It polls a
// `RuleEngine` for `GameEvent`s (only while nothing is animating) and
// answers `UserTurn` events with a `PlayerDecision`.
//
//   GameplayScene ──next_event()──► RuleEngine
//        │        ◄── GameEvent ───────┘
//        └──────────submit(decision)──►
//
// `ScriptedRules` is a seeded, self-contained shedding game with
// computer opponents, used by the demo binary and tests.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::collections::VecDeque;

use log::{debug, info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

//=== Internal Dependencies ===============================================

use crate::game::cards::{CardColor, CardDescriptor, CardEffect, CardId, CardValue, Origin};

/// Cards dealt to each seat at the start.
pub const HAND_SIZE: usize = 7;

//=== Events & Decisions ==================================================

/// Something the table has to show.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// `player` takes `cards` from the deck. Revealed cards are shown
    /// face up and go back to the deck afterwards.
    Draw {
        player: usize,
        cards: Vec<CardDescriptor>,
        reveal: bool,
    },
    /// A card goes onto the discard pile.
    Play {
        origin: Origin,
        card: CardDescriptor,
        effects: Vec<CardEffect>,
    },
    ColorChanged { color: String },
    /// Seat 0 has to decide; `playable` lists the legal plays.
    UserTurn { playable: Vec<CardId> },
    GameOver { winner: usize },
}

/// The local player's answer to [`GameEvent::UserTurn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerDecision {
    Play(CardId),
    Draw,
}

//=== RuleEngine Trait ====================================================

pub trait RuleEngine: Send {
    /// Next event to present, `None` while waiting for a decision or
    /// after the game ended.
    fn next_event(&mut self) -> Option<GameEvent>;

    /// Hands the local player's decision to the rules.
    fn submit(&mut self, decision: PlayerDecision);
}

//=== ScriptedRules =======================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Card {
    id: CardId,
    color: CardColor,
    value: CardValue,
}

impl Card {
    fn descriptor(&self) -> CardDescriptor {
        CardDescriptor {
            id: self.id,
            color: self.color.symbol().to_owned(),
            value: self.value.symbol(),
        }
    }

    fn playable_on(&self, top: &Card, color: CardColor) -> bool {
        self.color == CardColor::Wild || self.color == color || self.value == top.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Setup,
    Running,
    AwaitingUser,
    Over,
}

/// Seeded demo rules: one human at seat 0, computer players elsewhere.
pub struct ScriptedRules {
    rng: StdRng,
    deck: Vec<Card>,
    discard: Vec<Card>,
    hands: Vec<Vec<Card>>,
    color: CardColor,
    turn: usize,
    reversed: bool,
    passes: usize,
    queue: VecDeque<GameEvent>,
    phase: Phase,
    autoplay: bool,
}

impl ScriptedRules {
    /// Standard 108-card game for `seats` players, shuffled with a fixed seed.
    pub fn demo(seats: usize) -> Self {
        Self::seeded(seats, 7)
    }

    pub fn seeded(seats: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut deck = full_deck();
        deck.shuffle(&mut rng);
        Self {
            rng,
            deck,
            discard: Vec::new(),
            hands: vec![Vec::new(); seats.max(1)],
            color: CardColor::Red,
            turn: 0,
            reversed: false,
            passes: 0,
            queue: VecDeque::new(),
            phase: Phase::Setup,
            autoplay: false,
        }
    }

    /// Lets the computer play seat 0 as well; no `UserTurn` is emitted.
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Over
    }

    pub fn hand_len(&self, seat: usize) -> usize {
        self.hands.get(seat).map_or(0, Vec::len)
    }

    //--- Setup ------------------------------------------------------------

    fn setup(&mut self) {
        let seats = self.hands.len();

        // Everyone reveals one card; the highest number deals.
        let mut reveals = Vec::with_capacity(seats);
        for seat in 0..seats {
            if let Some(card) = self.take_from_deck() {
                self.queue.push_back(GameEvent::Draw { player: seat, cards: vec![card.descriptor()], reveal: true });
                reveals.push((seat, card));
            }
        }
        let dealer = reveals
            .iter()
            .max_by_key(|(seat, card)| (rank(card), std::cmp::Reverse(*seat)))
            .map_or(0, |(seat, _)| *seat);
        self.deck.extend(reveals.into_iter().map(|(_, card)| card));
        self.deck.shuffle(&mut self.rng);

        for seat in 0..seats {
            let dealt: Vec<Card> = (0..HAND_SIZE).filter_map(|_| self.take_from_deck()).collect();
            let cards = dealt.iter().map(Card::descriptor).collect();
            self.hands[seat].extend(dealt);
            self.queue.push_back(GameEvent::Draw { player: seat, cards, reveal: false });
        }

        // A wild draw four cannot open the pile.
        let mut returned = Vec::new();
        let opening = loop {
            match self.take_from_deck() {
                Some(card) if card.value == CardValue::WildDrawFour => returned.push(card),
                other => break other,
            }
        };
        self.deck.extend(returned);
        self.deck.shuffle(&mut self.rng);

        if let Some(card) = opening {
            let mut effects = Vec::new();
            self.color = if card.color == CardColor::Wild {
                let chosen = *CardColor::PLAYABLE.choose(&mut self.rng).unwrap_or(&CardColor::Red);
                effects.push(CardEffect::ChooseColor(chosen.symbol().to_owned()));
                chosen
            } else {
                card.color
            };
            self.discard.push(card);
            self.queue.push_back(GameEvent::Play { origin: Origin::System, card: card.descriptor(), effects });
            self.queue.push_back(GameEvent::ColorChanged { color: self.color.symbol().to_owned() });
        }

        self.turn = (dealer + 1) % seats;
        self.phase = Phase::Running;
        info!(target: "stage::rules", "Dealt {} seats, seat {} deals", seats, dealer);
    }

    //--- Turns ------------------------------------------------------------

    fn step(&mut self) {
        let seat = self.turn;
        if seat == 0 && !self.autoplay {
            let playable = self.playable(0).into_iter().map(|i| self.hands[0][i].id).collect();
            self.phase = Phase::AwaitingUser;
            self.queue.push_back(GameEvent::UserTurn { playable });
            return;
        }

        if let Some(index) = self.choose_play(seat) {
            self.play(seat, index);
            return;
        }

        match self.take_from_deck() {
            Some(card) => {
                self.queue.push_back(GameEvent::Draw { player: seat, cards: vec![card.descriptor()], reveal: false });
                self.hands[seat].push(card);
                let drawn = self.hands[seat].len() - 1;
                if self.is_playable(&card) {
                    self.play(seat, drawn);
                    return;
                }
                self.passes = 0;
            }
            None => self.passes += 1,
        }

        if self.passes >= self.hands.len() {
            self.finish_stalled();
        } else {
            self.advance(1);
        }
    }

    /// Computer choice: a matching coloured card first, then anything legal.
    fn choose_play(&self, seat: usize) -> Option<usize> {
        let playable = self.playable(seat);
        playable
            .iter()
            .copied()
            .find(|&i| self.hands[seat][i].color != CardColor::Wild)
            .or_else(|| playable.first().copied())
    }

    fn play(&mut self, seat: usize, index: usize) {
        let card = self.hands[seat].remove(index);
        self.passes = 0;

        let mut effects = Vec::new();
        let mut draw_penalty = 0;
        let mut skip = false;
        match card.value {
            CardValue::Skip => {
                effects.push(CardEffect::Skip);
                skip = true;
            }
            CardValue::Reverse => {
                effects.push(CardEffect::Reverse);
                self.reversed = !self.reversed;
                // With two players a reverse acts as a skip.
                skip = self.hands.len() == 2;
            }
            CardValue::DrawTwo => {
                effects.push(CardEffect::Draw(2));
                draw_penalty = 2;
            }
            CardValue::WildDrawFour => {
                effects.push(CardEffect::Draw(4));
                draw_penalty = 4;
            }
            CardValue::Wild | CardValue::Number(_) => {}
        }

        let previous = self.color;
        self.color = if card.color == CardColor::Wild {
            let chosen = favourite_color(&self.hands[seat]);
            effects.push(CardEffect::ChooseColor(chosen.symbol().to_owned()));
            chosen
        } else {
            card.color
        };

        debug!(target: "stage::rules", "Seat {} plays {:?} {:?}", seat, card.color, card.value);
        self.discard.push(card);
        self.queue.push_back(GameEvent::Play { origin: Origin::Seat(seat), card: card.descriptor(), effects });
        if self.color != previous {
            self.queue.push_back(GameEvent::ColorChanged { color: self.color.symbol().to_owned() });
        }

        if self.hands[seat].is_empty() {
            self.game_over(seat);
            return;
        }

        if draw_penalty > 0 {
            let victim = self.seat_after(seat, 1);
            let drawn: Vec<Card> = (0..draw_penalty).filter_map(|_| self.take_from_deck()).collect();
            if !drawn.is_empty() {
                let cards = drawn.iter().map(Card::descriptor).collect();
                self.hands[victim].extend(drawn);
                self.queue.push_back(GameEvent::Draw { player: victim, cards, reveal: false });
            }
            skip = true;
        }

        self.turn = seat;
        self.advance(if skip { 2 } else { 1 });
    }

    fn user_draw(&mut self) {
        match self.take_from_deck() {
            Some(card) => {
                self.hands[0].push(card);
                self.queue.push_back(GameEvent::Draw { player: 0, cards: vec![card.descriptor()], reveal: false });
                self.passes = 0;
            }
            None => self.passes += 1,
        }
        self.phase = Phase::Running;
        if self.passes >= self.hands.len() {
            self.finish_stalled();
        } else {
            self.advance(1);
        }
    }

    //--- Internal Helpers -------------------------------------------------

    fn playable(&self, seat: usize) -> Vec<usize> {
        self.hands[seat]
            .iter()
            .enumerate()
            .filter(|(_, card)| self.is_playable(card))
            .map(|(i, _)| i)
            .collect()
    }

    fn is_playable(&self, card: &Card) -> bool {
        match self.discard.last() {
            Some(top) => card.playable_on(top, self.color),
            None => true,
        }
    }

    /// Draws from the deck, reshuffling the discard pile under the top
    /// card when the deck runs out.
    fn take_from_deck(&mut self) -> Option<Card> {
        if self.deck.is_empty() && self.discard.len() > 1 {
            let top = self.discard.pop();
            self.deck.append(&mut self.discard);
            self.deck.shuffle(&mut self.rng);
            self.discard.extend(top);
            debug!(target: "stage::rules", "Reshuffled {} cards into the deck", self.deck.len());
        }
        self.deck.pop()
    }

    fn seat_after(&self, seat: usize, steps: usize) -> usize {
        let seats = self.hands.len();
        let steps = steps % seats;
        if self.reversed {
            (seat + seats - steps) % seats
        } else {
            (seat + steps) % seats
        }
    }

    fn advance(&mut self, steps: usize) {
        self.turn = self.seat_after(self.turn, steps);
    }

    /// Nobody can play or draw: the smallest hand wins.
    fn finish_stalled(&mut self) {
        let winner = (0..self.hands.len()).min_by_key(|&seat| self.hands[seat].len()).unwrap_or(0);
        warn!(target: "stage::rules", "Game stalled with an empty deck");
        self.game_over(winner);
    }

    fn game_over(&mut self, winner: usize) {
        info!(target: "stage::rules", "Seat {} wins", winner);
        self.phase = Phase::Over;
        self.queue.push_back(GameEvent::GameOver { winner });
    }
}

impl RuleEngine for ScriptedRules {
    fn next_event(&mut self) -> Option<GameEvent> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Some(event);
            }
            match self.phase {
                Phase::Setup => self.setup(),
                Phase::Running => self.step(),
                Phase::AwaitingUser | Phase::Over => return None,
            }
        }
    }

    fn submit(&mut self, decision: PlayerDecision) {
        if self.phase != Phase::AwaitingUser {
            warn!(target: "stage::rules", "Decision {:?} outside the user's turn", decision);
            return;
        }
        match decision {
            PlayerDecision::Draw => self.user_draw(),
            PlayerDecision::Play(id) => {
                let index = self.hands[0].iter().position(|c| c.id == id);
                match index {
                    Some(i) if self.is_playable(&self.hands[0][i]) => {
                        self.phase = Phase::Running;
                        self.play(0, i);
                    }
                    _ => {
                        warn!(target: "stage::rules", "Card {} cannot be played now", id);
                        let playable = self.playable(0).into_iter().map(|i| self.hands[0][i].id).collect();
                        self.queue.push_back(GameEvent::UserTurn { playable });
                    }
                }
            }
        }
    }
}

//=== Deck ================================================================

/// 108 cards: per colour one 0, two of 1-9, skip, reverse and draw two;
/// four wilds and four wild draw fours.
fn full_deck() -> Vec<Card> {
    let mut values = Vec::new();
    for color in CardColor::PLAYABLE {
        values.push((color, CardValue::Number(0)));
        for _ in 0..2 {
            for n in 1..=9 {
                values.push((color, CardValue::Number(n)));
            }
            values.push((color, CardValue::Skip));
            values.push((color, CardValue::Reverse));
            values.push((color, CardValue::DrawTwo));
        }
    }
    for _ in 0..4 {
        values.push((CardColor::Wild, CardValue::Wild));
        values.push((CardColor::Wild, CardValue::WildDrawFour));
    }
    values
        .into_iter()
        .enumerate()
        .map(|(i, (color, value))| Card { id: CardId(i as u32), color, value })
        .collect()
}

fn rank(card: &Card) -> u8 {
    match card.value {
        CardValue::Number(n) => n,
        _ => 0,
    }
}

fn favourite_color(hand: &[Card]) -> CardColor {
    CardColor::PLAYABLE
        .into_iter()
        .max_by_key(|color| hand.iter().filter(|c| c.color == *color).count())
        .unwrap_or(CardColor::Red)
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::CardFace;
    use std::collections::HashSet;

    fn total_cards(rules: &ScriptedRules) -> usize {
        rules.deck.len() + rules.discard.len() + rules.hands.iter().map(Vec::len).sum::<usize>()
    }

    #[test]
    fn deck_has_108_resolvable_cards() {
        let deck = full_deck();
        assert_eq!(deck.len(), 108);
        let ids: HashSet<CardId> = deck.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 108);
        assert!(deck.iter().all(|c| CardFace::resolve(&c.descriptor()).is_ok()));
    }

    #[test]
    fn setup_reveals_deals_then_opens_the_pile() {
        let mut rules = ScriptedRules::seeded(4, 11);

        for seat in 0..4 {
            match rules.next_event() {
                Some(GameEvent::Draw { player, cards, reveal: true }) => {
                    assert_eq!(player, seat);
                    assert_eq!(cards.len(), 1);
                }
                other => panic!("expected a reveal, got {:?}", other),
            }
        }
        for seat in 0..4 {
            match rules.next_event() {
                Some(GameEvent::Draw { player, cards, reveal: false }) => {
                    assert_eq!(player, seat);
                    assert_eq!(cards.len(), HAND_SIZE);
                }
                other => panic!("expected a deal, got {:?}", other),
            }
        }
        match rules.next_event() {
            Some(GameEvent::Play { origin: Origin::System, card, .. }) => {
                assert_ne!(card.value, "wild4");
            }
            other => panic!("expected the opening card, got {:?}", other),
        }
        assert!(matches!(rules.next_event(), Some(GameEvent::ColorChanged { .. })));
        assert_eq!(total_cards(&rules), 108);
    }

    #[test]
    fn same_seed_same_game() {
        let mut a = ScriptedRules::seeded(3, 99).with_autoplay(true);
        let mut b = ScriptedRules::seeded(3, 99).with_autoplay(true);
        for _ in 0..60 {
            assert_eq!(a.next_event(), b.next_event());
        }
    }

    #[test]
    fn autoplay_game_runs_to_a_winner() {
        let mut rules = ScriptedRules::seeded(4, 3).with_autoplay(true);
        let mut winner = None;
        for _ in 0..20_000 {
            match rules.next_event() {
                Some(GameEvent::GameOver { winner: seat }) => {
                    winner = Some(seat);
                    break;
                }
                Some(GameEvent::UserTurn { .. }) => panic!("autoplay never asks the user"),
                Some(_) => assert_eq!(total_cards(&rules), 108),
                None => break,
            }
        }
        assert!(winner.is_some());
        assert!(rules.is_over());
        assert_eq!(rules.next_event(), None);
    }

    #[test]
    fn user_turn_waits_for_a_decision() {
        let mut rules = ScriptedRules::seeded(2, 5);
        let playable = loop {
            match rules.next_event() {
                Some(GameEvent::UserTurn { playable }) => break playable,
                Some(GameEvent::GameOver { .. }) | None => panic!("game ended before the user's turn"),
                Some(_) => {}
            }
        };
        assert_eq!(rules.next_event(), None);

        // a card the user does not hold is refused and the turn re-offered
        rules.submit(PlayerDecision::Play(CardId(10_000)));
        assert_eq!(rules.next_event(), Some(GameEvent::UserTurn { playable: playable.clone() }));

        let before = rules.hand_len(0);
        rules.submit(PlayerDecision::Draw);
        match rules.next_event() {
            Some(GameEvent::Draw { player: 0, cards, reveal: false }) => assert_eq!(cards.len(), 1),
            other => panic!("expected the user's draw, got {:?}", other),
        }
        assert_eq!(rules.hand_len(0), before + 1);
    }

    #[test]
    fn decisions_outside_the_turn_are_ignored() {
        let mut rules = ScriptedRules::seeded(2, 5);
        rules.submit(PlayerDecision::Draw);
        assert_eq!(rules.hand_len(0), 0);
        assert!(matches!(rules.next_event(), Some(GameEvent::Draw { reveal: true, .. })));
    }
}
