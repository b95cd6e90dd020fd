//! Rooms: one actor per room owning its roster and game.
//!
//! - [`RoomActor`]: async task serializing every action against one game
//! - [`RoomManager`]: registry for creating, finding and listing rooms
//!
//! ## Architecture
//!
//! Each room runs in its own Tokio task with an mpsc inbox. Requests carry a
//! oneshot sender for the reply; everything else a member should see goes to
//! that member's outbox as [`ServerMessage`](crate::net::ServerMessage)s.
//! Bot moves and the pauses between rounds and hands are a single deadline
//! inside the actor loop, so they die with the room.
//!
//! ## Example
//!
//! ```no_run
//! use truco::game::{GameKind, Username};
//! use truco::room::{RoomConfig, RoomManager};
//! use uuid::Uuid;
//!
//! # async fn demo() -> Result<(), truco::room::RoomError> {
//! let manager = RoomManager::new(RoomConfig::default(), 100);
//! let (outbox, _inbox) = tokio::sync::mpsc::channel(64);
//! let host = Uuid::new_v4();
//! let (room, _) = manager
//!     .create_and_join(GameKind::Truco, None, host, Username::new("host"), outbox)
//!     .await?;
//! room.add_bot(host).await?;
//! room.start_game(host).await?;
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod errors;
pub mod manager;
pub mod messages;

pub use actor::{RoomActor, RoomHandle, RoomRegistry};
pub use config::RoomConfig;
pub use errors::{RoomError, RoomResult};
pub use manager::RoomManager;
pub use messages::{Joined, RoomMessage, RoomSummary};
