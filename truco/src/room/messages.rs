//! Room actor message types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

use super::errors::RoomResult;
use crate::game::{GameKind, GameView, Phase, PlayerAction, PlayerId, SeatIndex, Username};
use crate::net::messages::{MemberView, ServerMessage};

/// Messages that can be sent to a RoomActor
#[derive(Debug)]
pub enum RoomMessage {
    /// Take a seat. `outbox` receives everything the room tells this member.
    Join {
        player_id: PlayerId,
        name: Username,
        outbox: mpsc::Sender<ServerMessage>,
        response: oneshot::Sender<RoomResult<Joined>>,
    },

    /// Leave voluntarily or by disconnecting
    Leave {
        player_id: PlayerId,
        response: oneshot::Sender<RoomResult<()>>,
    },

    AddBot {
        player_id: PlayerId,
        response: oneshot::Sender<RoomResult<MemberView>>,
    },

    RemoveBot {
        player_id: PlayerId,
        response: oneshot::Sender<RoomResult<()>>,
    },

    /// Host only
    StartGame {
        player_id: PlayerId,
        response: oneshot::Sender<RoomResult<()>>,
    },

    /// In-game action from a member's own seat, or from a bot partner's
    /// seat when `on_behalf_of` is set
    Action {
        player_id: PlayerId,
        action: PlayerAction,
        on_behalf_of: Option<SeatIndex>,
        response: oneshot::Sender<RoomResult<()>>,
    },

    /// The member's private view, if a game exists
    GetView {
        player_id: PlayerId,
        response: oneshot::Sender<RoomResult<Option<GameView>>>,
    },

    GetSummary {
        response: oneshot::Sender<RoomSummary>,
    },

    /// Tear the room down
    Close {
        response: oneshot::Sender<()>,
    },
}

/// Reply to a successful join.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Joined {
    pub room_id: String,
    pub player_index: SeatIndex,
    pub is_host: bool,
}

/// Lobby listing entry for a room.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub code: String,
    pub game: GameKind,
    pub humans: usize,
    pub bots: usize,
    pub capacity: usize,
    pub started: bool,
    pub phase: Option<Phase>,
    pub created_at: DateTime<Utc>,
}

impl RoomSummary {
    #[must_use]
    pub fn players(&self) -> usize {
        self.humans + self.bots
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.players() >= self.capacity
    }
}
