//! The playable games.

mod blackjack;
mod crazy_eights;
mod hearts;
mod truco;
mod war;

pub use blackjack::{BlackjackGame, hand_total};
pub use crazy_eights::{CrazyEightsGame, card_points};
pub use hearts::HeartsGame;
pub use truco::TrucoGame;
pub use war::WarGame;
