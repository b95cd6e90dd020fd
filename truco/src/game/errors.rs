//! Errors raised by the game engines.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::GameKind;

/// Errors that can occur while applying an action to a game.
///
/// Every variant is recoverable at the action boundary: the offending
/// action is rejected and the game state is left untouched.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("it's not your turn")]
    NotYourTurn,
    #[error("a truco call is pending")]
    TrucoPending,
    #[error("invalid card index {index} (hand has {hand_size} cards)")]
    InvalidCardIndex { index: usize, hand_size: usize },
    #[error("not enough cards: needed {needed}, {available} available")]
    InsufficientCards { needed: usize, available: usize },
    #[error("illegal truco response: {0}")]
    IllegalTrucoResponse(String),
    #[error("illegal truco call: {0}")]
    IllegalTrucoCall(String),
    #[error("no game in progress")]
    GameNotInProgress,
    #[error("game already in progress")]
    GameAlreadyInProgress,
    #[error("{kind} needs {expected} players, {actual} seated")]
    InvalidPlayerCount {
        kind: GameKind,
        expected: String,
        actual: usize,
    },
    #[error("no player at seat {0}")]
    InvalidSeat(usize),
    #[error("round is missing plays from one of the teams")]
    IncompleteRound,
    #[error("{action} is not allowed in {kind}")]
    UnsupportedAction { kind: GameKind, action: String },
    #[error("illegal play: {0}")]
    IllegalPlay(String),
    #[error("nothing scheduled to resume")]
    NothingToResume,
}

/// Result type for game operations
pub type Result<T> = std::result::Result<T, GameError>;
