//! # Truco
//!
//! An authoritative engine for real-time multiplayer Truco, plus a handful
//! of other card games that share its rooms and bots.
//!
//! ## Architecture
//!
//! - [`game`]: cards, seats, the round and truco-call rules and the
//!   [`CardGame`] variants (Truco, War, Crazy Eights, Hearts, Blackjack)
//! - [`bot`]: the policy bots use to pick a legal action
//! - [`room`]: one actor per room serializing every action against its game
//! - [`net`]: the JSON messages exchanged with clients
//!
//! Rules are enforced in one place. Humans and bots submit actions through
//! the same [`CardGame::apply`]; an illegal action returns an error and
//! leaves the game untouched.
//!
//! ## Example
//!
//! ```
//! use truco::{CardGame, GameInstance, GameKind, PlayerAction, Username};
//! use uuid::Uuid;
//!
//! let seats = (0..4).map(|i| (Uuid::new_v4(), Username::new(&format!("p{i}")), false));
//! let mut game = GameInstance::with_seed(GameKind::Truco, seats, 42).unwrap();
//! game.start().unwrap();
//!
//! let lead = game.awaiting_seat().unwrap();
//! game.apply(lead, PlayerAction::play(0)).unwrap();
//! assert_ne!(game.awaiting_seat(), Some(lead));
//! ```

/// Bot decision policy and identities.
pub mod bot;

/// Card games, rules and state machines.
pub mod game;
pub use game::{
    CardGame, Continuation, GameError, GameInstance, GameKind, GameView, Phase, PlayerAction,
    TrucoResponse, Username,
    constants::{self, TRUCO_MAX_PLAYERS, TRUCO_MAX_VALUE},
};

/// Client/server wire protocol.
pub mod net;
pub use net::{ClientMessage, ServerMessage};

/// Room actors and the room registry.
pub mod room;
pub use room::{RoomConfig, RoomError, RoomHandle, RoomManager};
