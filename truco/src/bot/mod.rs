//! Bot players.
//!
//! A bot is an ordinary seat with `is_bot` set. When the game waits on such
//! a seat, the room schedules a decision after its bot delay and submits the
//! chosen action like any other.
//!
//! ## Truco policy
//!
//! - No call pending: call truco ~10% of the time (when legal), otherwise
//!   play a random card.
//! - Answering a call: accept 50%, reject 20%, raise 30%; at 12, where
//!   raising is illegal, accept 70% and reject 30%.
//!
//! ## Other games
//!
//! Random legal action, except Blackjack bots hit below 17 and Crazy Eights
//! bots only draw when they cannot play.

pub mod decision;
pub mod models;

pub use decision::{BotDecisionConfig, BotDecisionContext, BotDecisionMaker};
pub use models::bot_name;
