use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use super::cards::Card;
use super::constants;
use super::errors::{GameError, Result};

/// Stable identity of a participant (human or bot) for a room's lifetime.
pub type PlayerId = Uuid;

/// Type alias for seat positions during the game.
pub type SeatIndex = usize;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let mut username: String = s
            .trim()
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        if let Some((idx, _)) = username.char_indices().nth(constants::MAX_USER_INPUT_LENGTH / 2) {
            username.truncate(idx);
        }
        if username.is_empty() {
            username.push_str("player");
        }
        Self(username)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One of the two sides in a team game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Index into per-team tallies.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    /// Alternating assignment: even seats play for A, odd seats for B.
    #[must_use]
    pub const fn for_seat(seat: SeatIndex) -> Self {
        if seat % 2 == 0 { Self::A } else { Self::B }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::A => "team A",
            Self::B => "team B",
        };
        write!(f, "{repr}")
    }
}

/// A seated participant. The hand is only mutated by the owning game
/// after it has validated the action.
#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: Username,
    pub seat: SeatIndex,
    pub team: Option<Team>,
    pub is_bot: bool,
    pub hand: Vec<Card>,
    /// Whether this seat currently holds the turn.
    pub is_active: bool,
    /// Variant-specific running score (penalty points, chips won, ...).
    pub score: i32,
}

impl Player {
    #[must_use]
    pub fn new(id: PlayerId, name: Username, seat: SeatIndex, is_bot: bool) -> Self {
        Self {
            id,
            name,
            seat,
            team: None,
            is_bot,
            hand: Vec::new(),
            is_active: false,
            score: 0,
        }
    }

    #[must_use]
    pub fn with_team(mut self, team: Team) -> Self {
        self.team = Some(team);
        self
    }

    /// Remove and return the card at `index`.
    pub fn take_card(&mut self, index: usize) -> Result<Card> {
        if index >= self.hand.len() {
            return Err(GameError::InvalidCardIndex {
                index,
                hand_size: self.hand.len(),
            });
        }
        Ok(self.hand.remove(index))
    }

    /// Check a card index without removing anything.
    pub fn card_at(&self, index: usize) -> Result<Card> {
        self.hand
            .get(index)
            .copied()
            .ok_or(GameError::InvalidCardIndex {
                index,
                hand_size: self.hand.len(),
            })
    }

    pub fn reset(&mut self) {
        self.hand.clear();
        self.is_active = false;
    }
}

/// A card on the table with its attribution, used for round resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayedCard {
    pub card: Card,
    pub player: PlayerId,
    pub seat: SeatIndex,
    pub team: Option<Team>,
}

impl PlayedCard {
    #[must_use]
    pub fn new(card: Card, player: &Player) -> Self {
        Self {
            card,
            player: player.id,
            seat: player.seat,
            team: player.team,
        }
    }
}

/// Build the seat list for a game from (id, name, is_bot) triples, seating
/// them in the given order.
#[must_use]
pub fn seat_players<I>(participants: I) -> Vec<Player>
where
    I: IntoIterator<Item = (PlayerId, Username, bool)>,
{
    participants
        .into_iter()
        .enumerate()
        .map(|(seat, (id, name, is_bot))| Player::new(id, name, seat, is_bot))
        .collect()
}
