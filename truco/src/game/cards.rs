use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use std::fmt;

use super::errors::{GameError, Result};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Face value with ace low and court cards as 11/12/13.
    #[must_use]
    pub const fn pip(self) -> u8 {
        match self {
            Self::Ace => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
            Self::Nine => 9,
            Self::Ten => 10,
            Self::Jack => 11,
            Self::Queen => 12,
            Self::King => 13,
        }
    }

    #[must_use]
    pub const fn is_face(self) -> bool {
        matches!(self, Self::Jack | Self::Queen | Self::King)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Ace => "A",
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            other => return write!(f, "{}", other.pip()),
        };
        write!(f, "{repr}")
    }
}

/// Comparison strength of a card. Higher is stronger; the meaning is
/// entirely defined by the [`ValueTable`] the deck was built from.
pub type Value = u8;

/// An immutable playing card.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
    pub value: Value,
}

impl Card {
    #[must_use]
    pub const fn new(rank: Rank, suit: Suit, value: Value) -> Self {
        Self { rank, suit, value }
    }

    /// Display name, e.g. `4♣`.
    #[must_use]
    pub fn name(&self) -> String {
        format!("{}{}", self.rank, self.suit)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:>3}", self.name())
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Card", 4)?;
        state.serialize_field("name", &self.name())?;
        state.serialize_field("suit", &self.suit)?;
        state.serialize_field("rank", &self.rank)?;
        state.serialize_field("value", &self.value)?;
        state.end()
    }
}

/// Mapping from (rank, suit) to comparison value. A deck built from a
/// table holds exactly one card per entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueTable(Vec<(Rank, Suit, Value)>);

impl ValueTable {
    #[must_use]
    pub fn new(entries: Vec<(Rank, Suit, Value)>) -> Self {
        Self(entries)
    }

    /// 40-card Truco deck with fixed manilhas. Every card has a distinct
    /// value so no two cards ever compare equal.
    #[must_use]
    pub fn truco() -> Self {
        const MANILHAS: [(Rank, Suit); 4] = [
            (Rank::Seven, Suit::Diamond),
            (Rank::Ace, Suit::Spade),
            (Rank::Seven, Suit::Heart),
            (Rank::Four, Suit::Club),
        ];
        const STRENGTH: [Rank; 10] = [
            Rank::Four,
            Rank::Five,
            Rank::Six,
            Rank::Seven,
            Rank::Queen,
            Rank::Jack,
            Rank::King,
            Rank::Ace,
            Rank::Two,
            Rank::Three,
        ];
        const SUIT_ORDER: [Suit; 4] = [Suit::Diamond, Suit::Spade, Suit::Heart, Suit::Club];

        let mut entries = Vec::with_capacity(40);
        let mut value: Value = 0;
        for rank in STRENGTH {
            for suit in SUIT_ORDER {
                if MANILHAS.contains(&(rank, suit)) {
                    continue;
                }
                value += 1;
                entries.push((rank, suit, value));
            }
        }
        for (rank, suit) in MANILHAS {
            value += 1;
            entries.push((rank, suit, value));
        }
        Self(entries)
    }

    /// Standard 52-card deck, ace high. Suits tie.
    #[must_use]
    pub fn standard() -> Self {
        let mut entries = Vec::with_capacity(52);
        for rank in Rank::ALL {
            let value = match rank {
                Rank::Ace => 14,
                other => other.pip(),
            };
            for suit in Suit::ALL {
                entries.push((rank, suit, value));
            }
        }
        Self(entries)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of a card in this table, if the table holds it.
    #[must_use]
    pub fn value_of(&self, rank: Rank, suit: Suit) -> Option<Value> {
        self.0
            .iter()
            .find(|(r, s, _)| *r == rank && *s == suit)
            .map(|(_, _, v)| *v)
    }
}

/// Ordered pile of cards owned by a single game.
#[derive(Clone, Debug, Default)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Build one card per table entry, in table order.
    #[must_use]
    pub fn from_table(table: &ValueTable) -> Self {
        let cards = table
            .0
            .iter()
            .map(|&(rank, suit, value)| Card::new(rank, suit, value))
            .collect();
        Self { cards }
    }

    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Uniform in-place permutation (Fisher-Yates).
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Deal `per_hand` cards to each of `hands` hands, one card at a time
    /// round-robin from the front of the deck.
    pub fn deal(&mut self, hands: usize, per_hand: usize) -> Result<Vec<Vec<Card>>> {
        let needed = hands * per_hand;
        if needed > self.cards.len() {
            return Err(GameError::InsufficientCards {
                needed,
                available: self.cards.len(),
            });
        }

        let mut dealt = vec![Vec::with_capacity(per_hand); hands];
        for (i, card) in self.cards.drain(..needed).enumerate() {
            dealt[i % hands].push(card);
        }
        Ok(dealt)
    }

    /// Pop a single card from the end of the deck.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Tuck a card under the deck, where it is drawn last.
    pub fn insert_bottom(&mut self, card: Card) {
        self.cards.insert(0, card);
    }

    /// Pop a single card, failing if the deck is exhausted.
    pub fn draw_or_err(&mut self) -> Result<Card> {
        self.draw().ok_or(GameError::InsufficientCards {
            needed: 1,
            available: 0,
        })
    }

    /// Shuffle recycled cards back into the deck.
    pub fn refill_from<R, I>(&mut self, cards: I, rng: &mut R)
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = Card>,
    {
        self.cards.extend(cards);
        self.shuffle(rng);
    }
}
