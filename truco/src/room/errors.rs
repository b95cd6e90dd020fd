//! Errors raised by the room layer.

use thiserror::Error;

use crate::game::{GameError, SeatIndex};

/// Errors a room operation can return to the member that asked for it.
///
/// None of them change room state or reach other members.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RoomError {
    #[error("room {0} not found")]
    RoomNotFound(String),
    #[error("room is full ({capacity} players)")]
    RoomFull { capacity: usize },
    #[error("room is closed")]
    RoomClosed,
    #[error("you are already in this room")]
    AlreadyJoined,
    #[error("you are not in this room")]
    NotInRoom,
    #[error("only the host can do that")]
    NotHost,
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("game has not started")]
    GameNotStarted,
    #[error("there is no bot to remove")]
    NoBotToRemove,
    #[error("seat {0} is not a bot on your team")]
    NotYourBot(SeatIndex),
    #[error("room code {0} is already in use")]
    CodeTaken(String),
    #[error("invalid room code {0:?}")]
    InvalidCode(String),
    #[error("too many rooms (limit {0})")]
    TooManyRooms(usize),
    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomError {
    /// Whether the error came from the game rules rather than the room.
    #[must_use]
    pub fn is_game_error(&self) -> bool {
        matches!(self, Self::Game(_))
    }
}

/// Result type for room operations
pub type RoomResult<T> = Result<T, RoomError>;
