use serde::Serialize;
use std::fmt;

use super::cards::{Card, Suit};
use super::entities::{PlayerId, SeatIndex, Team};
use super::round::RoundWinner;
use super::truco_call::{TrucoResponse, TrucoState};

/// Things that happened inside a game, in the order they happened.
///
/// Games push these while applying actions and continuations; the room
/// drains them after every mutation and relays them to members.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GameEvent {
    HandDealt {
        hand_number: u32,
        lead: SeatIndex,
    },
    ActivePlayerChanged {
        seat: SeatIndex,
        player: PlayerId,
    },
    CardPlayed {
        seat: SeatIndex,
        player: PlayerId,
        card: Card,
        /// `None` when the play completed a round or ended the hand.
        next_player: Option<SeatIndex>,
    },
    /// `card` is only public in variants where draws are face up.
    CardDrawn {
        seat: SeatIndex,
        player: PlayerId,
        card: Option<Card>,
    },
    SuitDeclared {
        seat: SeatIndex,
        suit: Suit,
    },
    TrucoRequested {
        seat: SeatIndex,
        player: PlayerId,
        state: TrucoState,
        responder: SeatIndex,
    },
    TrucoAnswered {
        seat: SeatIndex,
        player: PlayerId,
        response: TrucoResponse,
        /// Value of the hand after the response.
        value: u8,
        /// Still-pending call after a raise.
        state: Option<TrucoState>,
    },
    RoundEnded {
        winner: Option<RoundWinner>,
        scores: [u8; 2],
        games: [u32; 2],
        sets: [u32; 2],
    },
    GameEnded {
        winner: Option<Team>,
        value: u8,
        games: [u32; 2],
        sets: [u32; 2],
    },
    SetWon {
        team: Team,
        sets: [u32; 2],
    },
    TrickTaken {
        seat: Option<SeatIndex>,
        cards: usize,
        points: i32,
    },
    SeatStood {
        seat: SeatIndex,
        total: u8,
    },
    SeatBusted {
        seat: SeatIndex,
        total: u8,
    },
    DealerPlayed {
        cards: Vec<Card>,
        total: u8,
    },
    HandScored {
        deltas: Vec<i32>,
        totals: Vec<i32>,
    },
    MatchOver {
        winners: Vec<SeatIndex>,
    },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HandDealt { hand_number, lead } => {
                format!("hand {hand_number} dealt, seat {lead} leads")
            }
            Self::ActivePlayerChanged { seat, .. } => format!("seat {seat} to act"),
            Self::CardPlayed { seat, card, .. } => format!("seat {seat} played {}", card.name()),
            Self::CardDrawn { seat, card, .. } => match card {
                Some(card) => format!("seat {seat} drew {}", card.name()),
                None => format!("seat {seat} drew a card"),
            },
            Self::SuitDeclared { seat, suit } => format!("seat {seat} declared {suit}"),
            Self::TrucoRequested { seat, state, .. } => {
                format!("seat {seat} calls truco for {}", state.potential_value)
            }
            Self::TrucoAnswered {
                seat,
                response,
                value,
                ..
            } => format!("seat {seat} {response} (hand worth {value})"),
            Self::RoundEnded { winner, .. } => match winner {
                Some(winner) => format!("{} took the round", winner.team),
                None => "round drawn".to_string(),
            },
            Self::GameEnded { winner, value, .. } => match winner {
                Some(team) => format!("{team} won the game for {value}"),
                None => "game drawn".to_string(),
            },
            Self::SetWon { team, .. } => format!("{team} won the set"),
            Self::TrickTaken {
                seat,
                cards,
                points,
            } => match seat {
                Some(seat) => format!("seat {seat} took {cards} cards ({points} points)"),
                None => format!("{cards} cards left on the table"),
            },
            Self::SeatStood { seat, total } => format!("seat {seat} stands on {total}"),
            Self::SeatBusted { seat, total } => format!("seat {seat} busts with {total}"),
            Self::DealerPlayed { total, .. } => format!("dealer finishes on {total}"),
            Self::HandScored { totals, .. } => format!("scores now {totals:?}"),
            Self::MatchOver { winners } => format!("match over, winners {winners:?}"),
        };
        write!(f, "{repr}")
    }
}
