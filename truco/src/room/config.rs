//! Room configuration.

use std::time::Duration;

use crate::bot::BotDecisionConfig;
use crate::game::{Continuation, GameKind};

pub const DEFAULT_BOT_DELAY: Duration = Duration::from_millis(2000);
pub const DEFAULT_ROUND_END_DELAY: Duration = Duration::from_millis(1500);
pub const DEFAULT_GAME_END_DELAY: Duration = Duration::from_millis(3000);
pub const DEFAULT_DEALER_DELAY: Duration = Duration::from_millis(1000);

/// Settings for one room.
#[derive(Clone, Debug, PartialEq)]
pub struct RoomConfig {
    /// Game the room plays
    pub game: GameKind,

    /// Seats available, humans and bots together
    pub max_players: usize,

    /// Pause before a bot acts
    pub bot_delay: Duration,

    /// Pause between a finished round and the next one
    pub round_end_delay: Duration,

    /// Pause between a finished hand and the next deal
    pub game_end_delay: Duration,

    /// Pause before the blackjack dealer plays
    pub dealer_delay: Duration,

    /// Bot policy tuning
    pub bot: BotDecisionConfig,

    /// Fixed seed for shuffles and bot choices; random when `None`
    pub seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self::for_game(GameKind::Truco)
    }
}

impl RoomConfig {
    #[must_use]
    pub fn for_game(game: GameKind) -> Self {
        Self {
            game,
            max_players: game.max_players(),
            bot_delay: DEFAULT_BOT_DELAY,
            round_end_delay: DEFAULT_ROUND_END_DELAY,
            game_end_delay: DEFAULT_GAME_END_DELAY,
            dealer_delay: DEFAULT_DEALER_DELAY,
            bot: BotDecisionConfig::default(),
            seed: None,
        }
    }

    /// Same timings, different game. Capacity follows the new game.
    #[must_use]
    pub fn with_game(&self, game: GameKind) -> Self {
        Self {
            game,
            max_players: game.max_players(),
            ..self.clone()
        }
    }

    /// Delay before running `step`.
    #[must_use]
    pub fn delay_for(&self, step: Continuation) -> Duration {
        match step {
            Continuation::NextRound => self.round_end_delay,
            Continuation::NextHand => self.game_end_delay,
            Continuation::DealerTurn => self.dealer_delay,
        }
    }
}
