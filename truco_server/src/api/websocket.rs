//! WebSocket handler for live games.
//!
//! A connection is one player. It may create or join a single room at a
//! time; everything the room broadcasts arrives on the connection's outbox
//! and is forwarded to the socket by a dedicated send task.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws` and is assigned a player id
//! 2. Server spawns a send task draining the outbox into the socket
//! 3. Incoming frames are rate limited, decoded and dispatched to the room
//! 4. Failures are answered to the sender only, never broadcast
//! 5. On disconnect the player leaves its room; a bot takes over the seat
//!    if a game is running
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws');
//! ws.send(JSON.stringify({ type: "createRoom", gameType: "truco", name: "ana" }));
//! ws.send(JSON.stringify({ type: "addBot" }));
//! ws.send(JSON.stringify({ type: "startGame" }));
//! ws.send(JSON.stringify({ type: "playCard", cardIndex: 0 }));
//! ws.send(JSON.stringify({ type: "requestTruco" }));
//! ```

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use truco::{
    game::{PlayerId, Username},
    net::{ClientMessage, ProtocolError, ServerMessage, codec},
    room::{RoomError, RoomHandle, RoomManager},
};
use uuid::Uuid;

use super::{AppState, rate_limiter::MessageLimits};
use crate::{logging, metrics};

/// Messages buffered for a slow socket before the room starts dropping them.
const OUTBOX_CAPACITY: usize = 256;

/// Upgrade HTTP connection to WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(codec::MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Why a client request was refused.
#[derive(Debug, thiserror::Error)]
enum RequestError {
    #[error(transparent)]
    Room(#[from] RoomError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl RequestError {
    fn label(&self) -> &'static str {
        match self {
            Self::Room(RoomError::Game(_)) => "game",
            Self::Room(_) => "room",
            Self::Protocol(_) => "protocol",
        }
    }

    /// Rule violations come back as `error`, membership problems as
    /// `roomError`.
    fn into_message(self) -> ServerMessage {
        match self {
            Self::Room(e) if !e.is_game_error() => ServerMessage::room_error(e),
            other => ServerMessage::error(other),
        }
    }
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let player_id = Uuid::new_v4();

    metrics::websocket_connections_total();
    metrics::websocket_connections_active(state.connection_opened());
    info!("WebSocket connected: player={player_id}");

    let (outbox, mut outbox_rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);

    let mut send_task = tokio::spawn(async move {
        // Only the host's connection counts finished games, once per room.
        let mut is_host = false;
        while let Some(message) = outbox_rx.recv().await {
            match &message {
                ServerMessage::RoomCreated { is_host: host, .. } => is_host = *host,
                ServerMessage::RoomJoined { .. } => is_host = false,
                ServerMessage::HostChanged { player_id: host } => is_host = *host == player_id,
                ServerMessage::GameEnd { .. } if is_host => metrics::games_completed_total(),
                _ => {}
            }

            let frame = match codec::encode(&message) {
                Ok(frame) => frame,
                Err(e) => {
                    error!("Failed to encode {message}: {e}");
                    continue;
                }
            };
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
            metrics::websocket_messages_sent();
        }
        let _ = sink.close().await;
    });

    let mut session = Session {
        player_id,
        outbox,
        manager: state.room_manager.clone(),
        room: None,
    };
    let mut limits = MessageLimits::default();

    loop {
        tokio::select! {
            frame = stream.next() => {
                let frame = match frame {
                    Some(Ok(frame)) => frame,
                    Some(Err(e)) => {
                        debug!("WebSocket error for player {player_id}: {e}");
                        break;
                    }
                    None => break,
                };
                match frame {
                    Message::Text(text) => {
                        metrics::websocket_messages_received();
                        if let Err(limited) = limits.admit() {
                            metrics::rate_limit_hits_total(limited.window);
                            warn!("Rate limit ({}) exceeded for player {player_id}", limited.window);
                            session
                                .reply(ServerMessage::error(format!(
                                    "rate limit exceeded, retry in {} ms",
                                    limited.retry_in.as_millis()
                                )))
                                .await;
                            continue;
                        }
                        session.handle_frame(text.as_str()).await;
                    }
                    Message::Binary(_) => {
                        session.reply(ServerMessage::error("binary frames are not supported")).await;
                    }
                    Message::Close(_) => break,
                    // Pings are answered by axum.
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }
            _ = &mut send_task => {
                debug!("Send task for player {player_id} ended");
                break;
            }
        }
    }

    session.disconnect().await;
    send_task.abort();

    metrics::websocket_connections_active(state.connection_closed());
    info!("WebSocket disconnected: player={player_id}");
}

/// One connection's membership state.
struct Session {
    player_id: PlayerId,
    outbox: mpsc::Sender<ServerMessage>,
    manager: RoomManager,
    room: Option<RoomHandle>,
}

impl Session {
    async fn reply(&self, message: ServerMessage) {
        if self.outbox.send(message).await.is_err() {
            debug!("Outbox for player {} is closed", self.player_id);
        }
    }

    fn room(&self) -> Result<&RoomHandle, RoomError> {
        self.room.as_ref().ok_or(RoomError::NotInRoom)
    }

    fn ensure_roomless(&self) -> Result<(), RoomError> {
        match self.room {
            Some(_) => Err(RoomError::AlreadyJoined),
            None => Ok(()),
        }
    }

    fn name_or_default(&self, name: &Option<Username>) -> Username {
        name.clone().unwrap_or_else(|| {
            let id = self.player_id.simple().to_string();
            Username::new(&format!("player-{}", &id[..6]))
        })
    }

    async fn handle_frame(&mut self, frame: &str) {
        let message = match codec::decode::<ClientMessage>(frame) {
            Ok(message) => message,
            Err(e) => {
                metrics::actions_rejected_total("protocol");
                self.reply(ServerMessage::error(e)).await;
                return;
            }
        };
        debug!("Player {} asks to {message}", self.player_id);

        if let Err(e) = self.dispatch(&message).await {
            if matches!(e, RequestError::Room(RoomError::RoomClosed)) {
                self.room = None;
            }
            logging::log_rejected(
                self.player_id,
                self.room.as_ref().map(RoomHandle::code),
                &message.to_string(),
                &e.to_string(),
            );
            metrics::actions_rejected_total(e.label());
            self.reply(e.into_message()).await;
        }
    }

    async fn dispatch(&mut self, message: &ClientMessage) -> Result<(), RequestError> {
        if let Some(requested) = message.target_room() {
            let room = self.room()?;
            if !requested.trim().eq_ignore_ascii_case(room.code()) {
                return Err(ProtocolError::RoomMismatch {
                    requested: requested.to_string(),
                    actual: room.code().to_string(),
                }
                .into());
            }
        }

        match message {
            ClientMessage::CreateRoom {
                game_type,
                room_code,
                name,
            } => {
                self.ensure_roomless()?;
                let (room, _) = self
                    .manager
                    .create_and_join(
                        *game_type,
                        room_code.as_deref(),
                        self.player_id,
                        self.name_or_default(name),
                        self.outbox.clone(),
                    )
                    .await?;
                info!("Player {} created room {}", self.player_id, room.code());
                self.room = Some(room);
                metrics::active_rooms(self.manager.active_room_count().await);
            }
            ClientMessage::JoinRoom { room_code, name } => {
                self.ensure_roomless()?;
                let (room, joined) = self
                    .manager
                    .join_room(
                        room_code,
                        self.player_id,
                        self.name_or_default(name),
                        self.outbox.clone(),
                    )
                    .await?;
                info!(
                    "Player {} joined room {} at seat {}",
                    self.player_id, joined.room_id, joined.player_index
                );
                self.room = Some(room);
            }
            ClientMessage::LeaveRoom => {
                let room = self.room.take().ok_or(RoomError::NotInRoom)?;
                match room.leave(self.player_id).await {
                    Ok(()) | Err(RoomError::RoomClosed) => {}
                    Err(e) => return Err(e.into()),
                }
                metrics::active_rooms(self.manager.active_room_count().await);
            }
            ClientMessage::AddBot { .. } => {
                self.room()?.add_bot(self.player_id).await?;
            }
            ClientMessage::RemoveBot { .. } => {
                self.room()?.remove_bot(self.player_id).await?;
            }
            ClientMessage::StartGame { .. } => {
                self.room()?.start_game(self.player_id).await?;
            }
            ClientMessage::GetState => {
                let view = self
                    .room()?
                    .view(self.player_id)
                    .await?
                    .ok_or(RoomError::GameNotStarted)?;
                self.reply(ServerMessage::State { view }).await;
            }
            ClientMessage::PlayCard { .. }
            | ClientMessage::RequestTruco { .. }
            | ClientMessage::RespondTruco { .. }
            | ClientMessage::Draw
            | ClientMessage::Hit
            | ClientMessage::Stand => {
                let on_behalf_of = match message {
                    ClientMessage::RespondTruco {
                        bot_player_index, ..
                    } => *bot_player_index,
                    _ => None,
                };
                if let Some(action) = message.as_action() {
                    self.room()?
                        .act(self.player_id, action, on_behalf_of)
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// Leave the current room, if any, when the socket goes away.
    async fn disconnect(&mut self) {
        let Some(room) = self.room.take() else {
            return;
        };
        if let Err(e) = room.leave(self.player_id).await {
            debug!(
                "Player {} could not leave room {}: {e}",
                self.player_id,
                room.code()
            );
        }
        metrics::active_rooms(self.manager.active_room_count().await);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use truco::game::GameError;

    #[test]
    fn test_rule_violations_are_plain_errors() {
        let e = RequestError::from(RoomError::Game(GameError::NotYourTurn));
        assert_eq!(e.label(), "game");
        assert!(matches!(e.into_message(), ServerMessage::Error { .. }));
    }

    #[test]
    fn test_membership_problems_are_room_errors() {
        let e = RequestError::from(RoomError::RoomFull { capacity: 4 });
        assert_eq!(e.label(), "room");
        match e.into_message() {
            ServerMessage::RoomError { message } => assert!(message.contains("full")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_mismatched_room_is_a_protocol_error() {
        let e = RequestError::from(ProtocolError::RoomMismatch {
            requested: "AAAAAA".to_string(),
            actual: "BBBBBB".to_string(),
        });
        assert_eq!(e.label(), "protocol");
        assert!(matches!(e.into_message(), ServerMessage::Error { .. }));
    }
}
