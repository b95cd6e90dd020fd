//! Room manager for spawning and looking up room actors.

use rand::Rng;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc};

use super::{
    actor::{RoomActor, RoomHandle, RoomRegistry},
    config::RoomConfig,
    errors::{RoomError, RoomResult},
    messages::{Joined, RoomSummary},
};
use crate::{
    game::{GameKind, PlayerId, Username},
    net::messages::ServerMessage,
};

/// Length of generated room codes.
pub const ROOM_CODE_LENGTH: usize = 6;

/// Longest code a caller may pick.
const MAX_ROOM_CODE_LENGTH: usize = 12;

const ROOM_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Registry of live rooms.
///
/// Rooms remove themselves from the registry when their last human leaves,
/// so lookups after that point report [`RoomError::RoomNotFound`].
#[derive(Clone)]
pub struct RoomManager {
    /// Active room handles
    rooms: RoomRegistry,

    /// Timings and bot tuning copied into every new room
    template: RoomConfig,

    max_rooms: usize,
}

impl RoomManager {
    pub fn new(template: RoomConfig, max_rooms: usize) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            template,
            max_rooms,
        }
    }

    /// Spawn a room for `game`, under `code` when given.
    ///
    /// # Errors
    ///
    /// [`RoomError::InvalidCode`] for a code that is empty, too long or not
    /// alphanumeric, [`RoomError::CodeTaken`] when it is in use and
    /// [`RoomError::TooManyRooms`] at the room limit.
    pub async fn create_room(&self, game: GameKind, code: Option<&str>) -> RoomResult<RoomHandle> {
        let requested = code.map(normalize_code).transpose()?;

        let mut rooms = self.rooms.write().await;
        if rooms.len() >= self.max_rooms {
            return Err(RoomError::TooManyRooms(self.max_rooms));
        }
        let code = match requested {
            Some(code) if rooms.contains_key(&code) => return Err(RoomError::CodeTaken(code)),
            Some(code) => code,
            None => loop {
                let code = generate_code();
                if !rooms.contains_key(&code) {
                    break code;
                }
            },
        };

        let config = self.template.with_game(game);
        let (actor, handle) = RoomActor::new(code.clone(), config, Some(self.rooms.clone()));
        rooms.insert(code.clone(), handle.clone());
        drop(rooms);

        tokio::spawn(actor.run());
        log::info!("created {game} room {code}");
        Ok(handle)
    }

    /// Create a room and seat its creator, who becomes host.
    pub async fn create_and_join(
        &self,
        game: GameKind,
        code: Option<&str>,
        player_id: PlayerId,
        name: Username,
        outbox: mpsc::Sender<ServerMessage>,
    ) -> RoomResult<(RoomHandle, Joined)> {
        let handle = self.create_room(game, code).await?;
        match handle.join(player_id, name, outbox).await {
            Ok(joined) => Ok((handle, joined)),
            Err(e) => {
                let _ = handle.close().await;
                Err(e)
            }
        }
    }

    pub async fn get_room(&self, code: &str) -> Option<RoomHandle> {
        let code = code.trim().to_ascii_uppercase();
        let rooms = self.rooms.read().await;
        rooms.get(&code).cloned()
    }

    pub async fn find_room(&self, code: &str) -> RoomResult<RoomHandle> {
        self.get_room(code)
            .await
            .ok_or_else(|| RoomError::RoomNotFound(code.to_string()))
    }

    pub async fn join_room(
        &self,
        code: &str,
        player_id: PlayerId,
        name: Username,
        outbox: mpsc::Sender<ServerMessage>,
    ) -> RoomResult<(RoomHandle, Joined)> {
        let handle = self.find_room(code).await?;
        let joined = handle.join(player_id, name, outbox).await.map_err(|e| match e {
            // Closed between lookup and join.
            RoomError::RoomClosed => RoomError::RoomNotFound(code.to_string()),
            other => other,
        })?;
        Ok((handle, joined))
    }

    pub async fn room_summary(&self, code: &str) -> RoomResult<RoomSummary> {
        self.find_room(code)
            .await?
            .summary()
            .await
            .map_err(|_| RoomError::RoomNotFound(code.to_string()))
    }

    /// Summaries of every live room, newest first.
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(summary) = handle.summary().await {
                summaries.push(summary);
            }
        }
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.code.cmp(&b.code)));
        summaries
    }

    /// Close a room and forget it.
    pub async fn close_room(&self, code: &str) -> RoomResult<()> {
        let handle = self.find_room(code).await?;
        // The room may already be gone; either way it is closed.
        let _ = handle.close().await;
        let mut rooms = self.rooms.write().await;
        if rooms.get(handle.code()).is_some_and(|h| h.same_room(&handle)) {
            rooms.remove(handle.code());
        }
        drop(rooms);
        log::info!("closed room {}", handle.code());
        Ok(())
    }

    pub async fn active_room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    #[must_use]
    pub fn max_rooms(&self) -> usize {
        self.max_rooms
    }
}

fn normalize_code(code: &str) -> RoomResult<String> {
    let code = code.trim();
    if code.is_empty()
        || code.len() > MAX_ROOM_CODE_LENGTH
        || !code.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(RoomError::InvalidCode(code.to_string()));
    }
    Ok(code.to_ascii_uppercase())
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| char::from(ROOM_CODE_CHARSET[rng.random_range(0..ROOM_CODE_CHARSET.len())]))
        .collect()
}
