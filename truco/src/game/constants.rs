//! Fixed game constants shared by the engine and the room layer.

/// Longest accepted display name or room code input.
pub const MAX_USER_INPUT_LENGTH: usize = 32;

/// Cards dealt to each seat in a Truco hand.
pub const TRUCO_HAND_SIZE: usize = 3;

/// Rounds in a Truco hand (best of three).
pub const TRUCO_ROUNDS_PER_GAME: u8 = 3;

/// Round wins that take a Truco hand.
pub const TRUCO_ROUNDS_TO_WIN: u8 = 2;

/// Base value of a hand before any Truco call.
pub const TRUCO_BASE_VALUE: u8 = 1;

/// Value a hand jumps to on the first call.
pub const TRUCO_FIRST_CALL_VALUE: u8 = 3;

/// Step between rungs of the stakes ladder after the first call.
pub const TRUCO_RAISE_STEP: u8 = 3;

/// Top rung of the stakes ladder. Raising stops here.
pub const TRUCO_MAX_VALUE: u8 = 12;

/// Games a team must accumulate to take a set.
pub const GAMES_PER_SET: u32 = 12;

/// Maximum seats at a Truco table.
pub const TRUCO_MAX_PLAYERS: usize = 4;

/// War rounds before the larger pile is declared the winner.
pub const WAR_MAX_ROUNDS: u32 = 500;

/// Score that ends a Hearts game.
pub const HEARTS_GAME_OVER_SCORE: i32 = 100;

/// Hearts points available in a single hand.
pub const HEARTS_POINTS_PER_HAND: i32 = 26;

/// Dealer stands on this total or higher.
pub const BLACKJACK_DEALER_STANDS_ON: u8 = 17;

/// Best Blackjack hand total.
pub const BLACKJACK_TARGET: u8 = 21;

/// A fresh shoe is opened when fewer cards than this remain before a deal.
pub const BLACKJACK_RESHUFFLE_THRESHOLD: usize = 15;
