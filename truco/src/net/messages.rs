use serde::{Deserialize, Serialize};
use std::fmt;

use crate::game::{
    Card, GameEvent, GameKind, GameView, PlayerAction, PlayerId, PlayerView, RoundWinner,
    SeatIndex, Suit, Team, TrucoResponse, TrucoState, Username,
};

/// A message from a client to the server.
///
/// Room-scoped messages may name the room they target; a connection only
/// ever belongs to one room, so a mismatching id is rejected rather than
/// routed elsewhere.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        #[serde(default = "default_game_type")]
        game_type: GameKind,
        /// Requested room code; generated when absent.
        #[serde(default)]
        room_code: Option<String>,
        #[serde(default)]
        name: Option<Username>,
    },
    JoinRoom {
        room_code: String,
        #[serde(default)]
        name: Option<Username>,
    },
    LeaveRoom,
    AddBot {
        #[serde(default)]
        room_id: Option<String>,
    },
    RemoveBot {
        #[serde(default)]
        room_id: Option<String>,
    },
    StartGame {
        #[serde(default)]
        room_id: Option<String>,
    },
    PlayCard {
        #[serde(default)]
        room_id: Option<String>,
        card_index: usize,
        #[serde(default)]
        declared_suit: Option<Suit>,
    },
    RequestTruco {
        #[serde(default)]
        room_code: Option<String>,
    },
    RespondTruco {
        response: TrucoResponse,
        /// Answer on behalf of a bot partner instead of the sender's seat.
        #[serde(default)]
        bot_player_index: Option<SeatIndex>,
    },
    Draw,
    Hit,
    Stand,
    /// Ask for a fresh private `state` message.
    GetState,
}

fn default_game_type() -> GameKind {
    GameKind::Truco
}

impl ClientMessage {
    /// Room the message says it targets, if it names one.
    #[must_use]
    pub fn target_room(&self) -> Option<&str> {
        match self {
            Self::AddBot { room_id }
            | Self::RemoveBot { room_id }
            | Self::StartGame { room_id }
            | Self::PlayCard { room_id, .. } => room_id.as_deref(),
            Self::RequestTruco { room_code } => room_code.as_deref(),
            _ => None,
        }
    }

    /// The in-game action this message carries, if any.
    #[must_use]
    pub fn as_action(&self) -> Option<PlayerAction> {
        let action = match self {
            Self::PlayCard {
                card_index,
                declared_suit,
                ..
            } => PlayerAction::PlayCard {
                index: *card_index,
                declared_suit: *declared_suit,
            },
            Self::RequestTruco { .. } => PlayerAction::CallTruco,
            Self::RespondTruco { response, .. } => PlayerAction::RespondTruco {
                response: *response,
            },
            Self::Draw => PlayerAction::Draw,
            Self::Hit => PlayerAction::Hit,
            Self::Stand => PlayerAction::Stand,
            _ => return None,
        };
        Some(action)
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::CreateRoom { game_type, .. } => format!("create a {game_type} room"),
            Self::JoinRoom { room_code, .. } => format!("join room {room_code}"),
            Self::LeaveRoom => "leave the room".to_string(),
            Self::AddBot { .. } => "add a bot".to_string(),
            Self::RemoveBot { .. } => "remove a bot".to_string(),
            Self::StartGame { .. } => "start the game".to_string(),
            Self::GetState => "request state".to_string(),
            other => match other.as_action() {
                Some(action) => action.to_string(),
                None => "unknown".to_string(),
            },
        };
        write!(f, "{repr}")
    }
}

/// Lobby entry for one room member.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub player_id: PlayerId,
    pub name: Username,
    pub player_index: SeatIndex,
    pub is_bot: bool,
    pub is_host: bool,
}

/// A message from the server to one client.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomCreated {
        room_id: String,
        player_id: PlayerId,
        is_host: bool,
        game_type: GameKind,
    },
    RoomJoined {
        room_id: String,
        player_id: PlayerId,
        player_index: SeatIndex,
    },
    PlayerJoined {
        player: MemberView,
        player_count: usize,
    },
    PlayerLeft {
        player_id: PlayerId,
        player_count: usize,
    },
    PlayersUpdated {
        players: Vec<MemberView>,
    },
    HostChanged {
        player_id: PlayerId,
    },
    /// Sent per member, so `local_player_index` is the recipient's seat.
    GameStarted {
        players: Vec<PlayerView>,
        local_player_index: Option<SeatIndex>,
        current_player: Option<SeatIndex>,
    },
    HandDealt {
        hand_number: u32,
        lead: SeatIndex,
    },
    ActivePlayerChanged {
        player_index: SeatIndex,
        player_id: PlayerId,
    },
    CardPlayed {
        player_id: PlayerId,
        player_index: SeatIndex,
        card: Card,
        next_player: Option<SeatIndex>,
    },
    TrucoRequested {
        player_id: PlayerId,
        player_index: SeatIndex,
        truco_state: TrucoState,
        responder: SeatIndex,
    },
    TrucoResponseReceived {
        player_id: PlayerId,
        player_index: SeatIndex,
        response: TrucoResponse,
        game_value: u8,
        truco_state: Option<TrucoState>,
    },
    RoundEnd {
        scores: [u8; 2],
        games: [u32; 2],
        sets: [u32; 2],
        winner: Option<RoundWinner>,
    },
    GameEnd {
        winner: Option<Team>,
        game_value: u8,
        games: [u32; 2],
        sets: [u32; 2],
    },
    /// Variant events without a dedicated message.
    GameEvent {
        detail: GameEvent,
    },
    /// The recipient's private view of the game.
    State {
        view: GameView,
    },
    Error {
        message: String,
    },
    RoomError {
        message: String,
    },
}

impl ServerMessage {
    pub fn error(message: impl ToString) -> Self {
        Self::Error {
            message: message.to_string(),
        }
    }

    pub fn room_error(message: impl ToString) -> Self {
        Self::RoomError {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::RoomError { .. })
    }
}

impl From<GameEvent> for ServerMessage {
    fn from(event: GameEvent) -> Self {
        match event {
            GameEvent::HandDealt { hand_number, lead } => Self::HandDealt { hand_number, lead },
            GameEvent::ActivePlayerChanged { seat, player } => Self::ActivePlayerChanged {
                player_index: seat,
                player_id: player,
            },
            GameEvent::CardPlayed {
                seat,
                player,
                card,
                next_player,
            } => Self::CardPlayed {
                player_id: player,
                player_index: seat,
                card,
                next_player,
            },
            GameEvent::TrucoRequested {
                seat,
                player,
                state,
                responder,
            } => Self::TrucoRequested {
                player_id: player,
                player_index: seat,
                truco_state: state,
                responder,
            },
            GameEvent::TrucoAnswered {
                seat,
                player,
                response,
                value,
                state,
            } => Self::TrucoResponseReceived {
                player_id: player,
                player_index: seat,
                response,
                game_value: value,
                truco_state: state,
            },
            GameEvent::RoundEnded {
                winner,
                scores,
                games,
                sets,
            } => Self::RoundEnd {
                scores,
                games,
                sets,
                winner,
            },
            GameEvent::GameEnded {
                winner,
                value,
                games,
                sets,
            } => Self::GameEnd {
                winner,
                game_value: value,
                games,
                sets,
            },
            detail => Self::GameEvent { detail },
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::RoomCreated { room_id, .. } => format!("room {room_id} created"),
            Self::RoomJoined {
                room_id,
                player_index,
                ..
            } => format!("joined room {room_id} at seat {player_index}"),
            Self::PlayerJoined { player, .. } => format!("{} joined", player.name),
            Self::PlayerLeft { player_count, .. } => {
                format!("a player left ({player_count} remaining)")
            }
            Self::PlayersUpdated { players } => format!("{} players seated", players.len()),
            Self::HostChanged { player_id } => format!("{player_id} is now host"),
            Self::GameStarted { .. } => "game started".to_string(),
            Self::HandDealt { hand_number, .. } => format!("hand {hand_number} dealt"),
            Self::ActivePlayerChanged { player_index, .. } => {
                format!("seat {player_index} to act")
            }
            Self::CardPlayed {
                player_index, card, ..
            } => format!("seat {player_index} played {}", card.name()),
            Self::TrucoRequested {
                player_index,
                truco_state,
                ..
            } => format!(
                "seat {player_index} calls truco for {}",
                truco_state.potential_value
            ),
            Self::TrucoResponseReceived {
                player_index,
                response,
                ..
            } => format!("seat {player_index} {response}"),
            Self::RoundEnd { winner, .. } => match winner {
                Some(winner) => format!("{} took the round", winner.team),
                None => "round drawn".to_string(),
            },
            Self::GameEnd { winner, .. } => match winner {
                Some(team) => format!("{team} won the game"),
                None => "game drawn".to_string(),
            },
            Self::GameEvent { detail } => detail.to_string(),
            Self::State { .. } => "game view".to_string(),
            Self::Error { message } | Self::RoomError { message } => message.clone(),
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Rank, Suit};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_create_room_defaults_to_truco() {
        let msg: ClientMessage = serde_json::from_value(json!({"type": "createRoom"})).unwrap();
        assert_eq!(
            msg,
            ClientMessage::CreateRoom {
                game_type: GameKind::Truco,
                room_code: None,
                name: None,
            }
        );
    }

    #[test]
    fn test_client_payloads_match_wire_names() {
        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "joinRoom", "roomCode": "ABC123"})).unwrap();
        assert_eq!(
            msg,
            ClientMessage::JoinRoom {
                room_code: "ABC123".to_string(),
                name: None,
            }
        );

        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "playCard", "roomId": "ABC123", "cardIndex": 2}))
                .unwrap();
        assert_eq!(msg.target_room(), Some("ABC123"));
        assert_eq!(msg.as_action(), Some(PlayerAction::play(2)));

        let msg: ClientMessage =
            serde_json::from_value(json!({"type": "respondTruco", "response": 3})).unwrap();
        assert_eq!(
            msg.as_action(),
            Some(PlayerAction::RespondTruco {
                response: TrucoResponse::Raise
            })
        );
    }

    #[test]
    fn test_bad_truco_response_is_rejected() {
        let result: Result<ClientMessage, _> =
            serde_json::from_value(json!({"type": "respondTruco", "response": 4}));
        assert!(result.is_err());
    }

    #[test]
    fn test_lobby_messages_carry_no_action() {
        assert_eq!(ClientMessage::LeaveRoom.as_action(), None);
        assert_eq!(ClientMessage::GetState.as_action(), None);
        assert_eq!(ClientMessage::StartGame { room_id: None }.as_action(), None);
    }

    #[test]
    fn test_card_played_event_maps_to_wire_message() {
        let player = Uuid::new_v4();
        let card = Card::new(Rank::Four, Suit::Club, 40);
        let msg = ServerMessage::from(GameEvent::CardPlayed {
            seat: 1,
            player,
            card,
            next_player: Some(2),
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "cardPlayed");
        assert_eq!(value["playerIndex"], 1);
        assert_eq!(value["nextPlayer"], 2);
        assert_eq!(value["playerId"], player.to_string());
    }

    #[test]
    fn test_other_events_are_wrapped() {
        let msg = ServerMessage::from(GameEvent::SuitDeclared {
            seat: 0,
            suit: Suit::Heart,
        });
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "gameEvent");
        assert_eq!(value["detail"]["event"], "suitDeclared");
    }

    #[test]
    fn test_errors_are_tagged() {
        let value = serde_json::to_value(ServerMessage::error("it's not your turn")).unwrap();
        assert_eq!(value, json!({"type": "error", "message": "it's not your turn"}));
        let value = serde_json::to_value(ServerMessage::room_error("room is full")).unwrap();
        assert_eq!(value["type"], "roomError");
        assert!(ServerMessage::room_error("x").is_error());
    }
}
