//=========================================================================
// Card Model
//=========================================================================
//
// Cards arrive from the rule engine as raw strings. They are resolved to
// typed faces (and from there to texture names) only when a sprite needs
// an image; an unknown colour or value at that point is a data/asset
// mismatch and is fatal.
//
//   CardDescriptor { id, "red", "7" } ──resolve──► CardFace ──► "card_red_7"
//
//=========================================================================

//=== External Dependencies ===============================================

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

//=== Internal Dependencies ===============================================

use crate::core::render::Tint;

/// Texture shown on face-down cards.
pub const CARD_BACK: &str = "card_back";

//=== SymbolError =========================================================

/// Card data with no matching image symbol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("unknown card color '{0}'")]
    UnknownColor(String),

    #[error("unknown card value '{0}'")]
    UnknownValue(String),
}

//=== Identity ============================================================

/// Logical card identity assigned by the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A card as reported by the rule engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardDescriptor {
    pub id: CardId,
    pub color: String,
    pub value: String,
}

impl CardDescriptor {
    pub fn new(id: u32, color: impl Into<String>, value: impl Into<String>) -> Self {
        Self { id: CardId(id), color: color.into(), value: value.into() }
    }
}

/// Rule effects reported alongside a played card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardEffect {
    Skip,
    Reverse,
    /// Next player draws this many.
    Draw(usize),
    /// Colour chosen for a wild card, as a raw symbol.
    ChooseColor(String),
}

impl CardEffect {
    /// Colour the discard pile takes on after `card` is played with
    /// `effects`: the chosen colour when there is one, the card's own
    /// otherwise.
    pub fn landing_color(card: &CardDescriptor, effects: &[CardEffect]) -> Result<CardColor, SymbolError> {
        let chosen = effects.iter().find_map(|e| match e {
            Self::ChooseColor(color) => Some(color.as_str()),
            _ => None,
        });
        match chosen {
            Some(color) => color.parse(),
            None => card.color.parse(),
        }
    }
}

//=== CardColor ===========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardColor {
    Red,
    Yellow,
    Green,
    Blue,
    Wild,
}

impl CardColor {
    pub const PLAYABLE: [CardColor; 4] = [Self::Red, Self::Yellow, Self::Green, Self::Blue];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Wild => "wild",
        }
    }

    /// Colour effect applied to a card when it lands on the discard pile.
    pub fn tint(self) -> Tint {
        match self {
            Self::Red => Tint::rgb(255, 200, 200),
            Self::Yellow => Tint::rgb(255, 250, 200),
            Self::Green => Tint::rgb(200, 255, 200),
            Self::Blue => Tint::rgb(200, 220, 255),
            Self::Wild => Tint::NONE,
        }
    }
}

impl FromStr for CardColor {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "yellow" => Ok(Self::Yellow),
            "green" => Ok(Self::Green),
            "blue" => Ok(Self::Blue),
            "wild" | "black" => Ok(Self::Wild),
            _ => Err(SymbolError::UnknownColor(s.to_owned())),
        }
    }
}

//=== CardValue ===========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardValue {
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl CardValue {
    pub fn symbol(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Skip => "skip".into(),
            Self::Reverse => "reverse".into(),
            Self::DrawTwo => "draw2".into(),
            Self::Wild => "wild".into(),
            Self::WildDrawFour => "wild4".into(),
        }
    }
}

impl FromStr for CardValue {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "skip" => Ok(Self::Skip),
            "reverse" => Ok(Self::Reverse),
            "draw2" | "draw_two" | "+2" => Ok(Self::DrawTwo),
            "wild" => Ok(Self::Wild),
            "wild4" | "wild_draw_four" | "+4" => Ok(Self::WildDrawFour),
            digit => match digit.parse::<u8>() {
                Ok(n) if n <= 9 => Ok(Self::Number(n)),
                _ => Err(SymbolError::UnknownValue(s.to_owned())),
            },
        }
    }
}

//=== CardFace ============================================================

/// Typed, image-resolvable card face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CardFace {
    pub color: CardColor,
    pub value: CardValue,
}

impl CardFace {
    pub fn resolve(card: &CardDescriptor) -> Result<Self, SymbolError> {
        Ok(Self {
            color: card.color.parse()?,
            value: card.value.parse()?,
        })
    }

    /// Texture name, `card_<color>_<value>`.
    pub fn texture(&self) -> String {
        format!("card_{}_{}", self.color.symbol(), self.value.symbol())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_texture_names() {
        let face = CardFace::resolve(&CardDescriptor::new(1, "Red", "7")).unwrap();
        assert_eq!(face.texture(), "card_red_7");

        let face = CardFace::resolve(&CardDescriptor::new(2, "wild", "wild_draw_four")).unwrap();
        assert_eq!(face.value, CardValue::WildDrawFour);
        assert_eq!(face.texture(), "card_wild_wild4");
    }

    #[test]
    fn unknown_symbols_are_distinct_errors() {
        assert_eq!(
            CardFace::resolve(&CardDescriptor::new(1, "purple", "7")),
            Err(SymbolError::UnknownColor("purple".into()))
        );
        assert_eq!(
            CardFace::resolve(&CardDescriptor::new(1, "red", "10")),
            Err(SymbolError::UnknownValue("10".into()))
        );
    }

    #[test]
    fn chosen_colour_wins_over_card_colour() {
        let wild = CardDescriptor::new(9, "wild", "wild");
        assert_eq!(CardEffect::landing_color(&wild, &[]), Ok(CardColor::Wild));

        let effects = [CardEffect::Draw(4), CardEffect::ChooseColor("blue".into())];
        assert_eq!(CardEffect::landing_color(&wild, &effects), Ok(CardColor::Blue));

        let effects = [CardEffect::ChooseColor("mauve".into())];
        assert!(CardEffect::landing_color(&wild, &effects).is_err());
    }
}
