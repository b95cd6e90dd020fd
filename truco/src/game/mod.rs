//! Card game engines.
//!
//! Every variant implements [`CardGame`] and is wrapped in [`GameInstance`],
//! which is what a room holds. Games are plain synchronous state machines:
//! they validate an action, mutate themselves and queue [`GameEvent`]s.
//! Anything that should happen "a bit later" (next round, next hand, the
//! dealer's turn) is exposed as a [`Continuation`] for the owner to schedule.

pub mod cards;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod events;
pub mod round;
pub mod seats;
pub mod truco_call;
pub mod variants;
pub mod views;

use enum_dispatch::enum_dispatch;
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};

pub use cards::{Card, Deck, Rank, Suit, Value, ValueTable};
pub use entities::{PlayedCard, Player, PlayerId, SeatIndex, Team, Username, seat_players};
pub use errors::{GameError, Result};
pub use events::GameEvent;
pub use round::{GameResult, RoundResolver, RoundTally, RoundWinner};
pub use seats::Seats;
pub use truco_call::{CallOutcome, TrucoResponse, TrucoStakes, TrucoState};
pub use variants::{BlackjackGame, CrazyEightsGame, HeartsGame, TrucoGame, WarGame};
pub use views::{GameView, PlayerView, VariantView};

/// Which game a room plays.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GameKind {
    Truco,
    War,
    CrazyEights,
    Hearts,
    Blackjack,
}

impl GameKind {
    pub const ALL: [GameKind; 5] = [
        Self::Truco,
        Self::War,
        Self::CrazyEights,
        Self::Hearts,
        Self::Blackjack,
    ];

    /// Seats available in a room of this kind.
    #[must_use]
    pub const fn max_players(self) -> usize {
        match self {
            Self::Truco | Self::CrazyEights | Self::Hearts => 4,
            Self::War => 2,
            Self::Blackjack => 5,
        }
    }

    #[must_use]
    pub const fn min_players(self) -> usize {
        match self {
            Self::Truco | Self::War | Self::CrazyEights => 2,
            Self::Hearts => 4,
            Self::Blackjack => 1,
        }
    }

    /// Truco only works with even teams.
    #[must_use]
    pub const fn accepts_player_count(self, n: usize) -> bool {
        match self {
            Self::Truco => n == 2 || n == 4,
            other => n >= other.min_players() && n <= other.max_players(),
        }
    }

    #[must_use]
    pub const fn is_team_game(self) -> bool {
        matches!(self, Self::Truco)
    }

    fn expected_players(self) -> String {
        match self {
            Self::Truco => "2 or 4".to_string(),
            other if other.min_players() == other.max_players() => other.min_players().to_string(),
            other => format!("{}-{}", other.min_players(), other.max_players()),
        }
    }

    /// Fail with [`GameError::InvalidPlayerCount`] for an unplayable table.
    pub fn check_player_count(self, n: usize) -> Result<()> {
        if self.accepts_player_count(n) {
            Ok(())
        } else {
            Err(GameError::InvalidPlayerCount {
                kind: self,
                expected: self.expected_players(),
                actual: n,
            })
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Truco => "truco",
            Self::War => "war",
            Self::CrazyEights => "crazy eights",
            Self::Hearts => "hearts",
            Self::Blackjack => "blackjack",
        };
        write!(f, "{repr}")
    }
}

/// Coarse lifecycle of a game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Seated but not dealt yet.
    Dealing,
    Playing,
    /// A round or trick is complete and still on the table.
    RoundEnd,
    /// A hand is over; the next one is dealt after a delay.
    GameEnd,
    /// Blackjack seats are done; the dealer plays after a delay.
    DealerTurn,
    /// Nothing left to play.
    Finished,
}

/// Something a seat can do.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlayerAction {
    PlayCard {
        index: usize,
        /// Required when playing an eight in Crazy Eights.
        #[serde(default)]
        declared_suit: Option<Suit>,
    },
    CallTruco,
    RespondTruco {
        response: TrucoResponse,
    },
    Draw,
    Hit,
    Stand,
}

impl PlayerAction {
    #[must_use]
    pub const fn play(index: usize) -> Self {
        Self::PlayCard {
            index,
            declared_suit: None,
        }
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayCard {
                index,
                declared_suit: Some(suit),
            } => write!(f, "play card {index} as {suit}"),
            Self::PlayCard { index, .. } => write!(f, "play card {index}"),
            Self::CallTruco => write!(f, "truco"),
            Self::RespondTruco { response } => write!(f, "{response} truco"),
            Self::Draw => write!(f, "draw"),
            Self::Hit => write!(f, "hit"),
            Self::Stand => write!(f, "stand"),
        }
    }
}

/// Deferred step the owner of a game schedules after a pause.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Continuation {
    NextRound,
    NextHand,
    DealerTurn,
}

/// The capability every variant provides to a room.
#[enum_dispatch]
pub trait CardGame {
    fn kind(&self) -> GameKind;

    fn phase(&self) -> Phase;

    fn seats(&self) -> &Seats;

    fn seats_mut(&mut self) -> &mut Seats;

    /// Deal the first hand.
    fn start(&mut self) -> Result<()>;

    /// Validate and apply one action for `seat`. On error nothing changed.
    fn apply(&mut self, seat: SeatIndex, action: PlayerAction) -> Result<()>;

    /// Every action `seat` could legally take right now.
    #[must_use]
    fn legal_actions(&self, seat: SeatIndex) -> Vec<PlayerAction>;

    /// Seat the game is waiting on, if any.
    fn awaiting_seat(&self) -> Option<SeatIndex>;

    /// Step waiting to be scheduled, if any.
    fn continuation(&self) -> Option<Continuation>;

    /// Run the scheduled continuation.
    fn resume(&mut self) -> Result<()>;

    #[must_use]
    fn view_for(&self, viewer: Option<SeatIndex>) -> GameView;

    fn drain_events(&mut self) -> VecDeque<GameEvent>;

    fn players(&self) -> &[Player] {
        self.seats().players()
    }

    /// Let a bot take over `seat` for the rest of the game.
    fn hand_to_bot(&mut self, seat: SeatIndex) -> Result<()> {
        self.seats_mut().hand_to_bot(seat)
    }
}

#[enum_dispatch(CardGame)]
#[derive(Debug)]
pub enum GameInstance {
    Truco(TrucoGame),
    War(WarGame),
    CrazyEights(CrazyEightsGame),
    Hearts(HeartsGame),
    Blackjack(BlackjackGame),
}

impl GameInstance {
    /// Seat participants in order and build a game of `kind`.
    pub fn new<I>(kind: GameKind, participants: I) -> Result<Self>
    where
        I: IntoIterator<Item = (PlayerId, Username, bool)>,
    {
        Self::with_rng(kind, participants, StdRng::from_os_rng())
    }

    /// Deterministic shuffles for tests and replays.
    pub fn with_seed<I>(kind: GameKind, participants: I, seed: u64) -> Result<Self>
    where
        I: IntoIterator<Item = (PlayerId, Username, bool)>,
    {
        Self::with_rng(kind, participants, StdRng::seed_from_u64(seed))
    }

    fn with_rng<I>(kind: GameKind, participants: I, rng: StdRng) -> Result<Self>
    where
        I: IntoIterator<Item = (PlayerId, Username, bool)>,
    {
        let players = seat_players(participants);
        kind.check_player_count(players.len())?;
        let game = match kind {
            GameKind::Truco => TrucoGame::new(players, rng)?.into(),
            GameKind::War => WarGame::new(players, rng)?.into(),
            GameKind::CrazyEights => CrazyEightsGame::new(players, rng)?.into(),
            GameKind::Hearts => HeartsGame::new(players, rng)?.into(),
            GameKind::Blackjack => BlackjackGame::new(players, rng)?.into(),
        };
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn participants(n: usize) -> Vec<(PlayerId, Username, bool)> {
        (0..n)
            .map(|i| (Uuid::new_v4(), Username::new(&format!("p{i}")), false))
            .collect()
    }

    #[test]
    fn test_capacities() {
        assert_eq!(GameKind::Truco.max_players(), 4);
        assert_eq!(GameKind::War.max_players(), 2);
        assert_eq!(GameKind::CrazyEights.max_players(), 4);
        assert_eq!(GameKind::Hearts.max_players(), 4);
        assert_eq!(GameKind::Blackjack.max_players(), 5);
    }

    #[test]
    fn test_truco_needs_even_teams() {
        assert!(GameKind::Truco.accepts_player_count(2));
        assert!(!GameKind::Truco.accepts_player_count(3));
        assert!(GameKind::Truco.accepts_player_count(4));
        let err = GameInstance::new(GameKind::Truco, participants(3)).unwrap_err();
        assert!(matches!(err, GameError::InvalidPlayerCount { actual: 3, .. }));
        assert_eq!(err.to_string(), "truco needs 2 or 4 players, 3 seated");
    }

    #[test]
    fn test_every_kind_builds_and_starts() {
        for kind in GameKind::ALL {
            let mut game = GameInstance::with_seed(kind, participants(kind.max_players()), 11).unwrap();
            assert_eq!(game.kind(), kind);
            assert_eq!(game.phase(), Phase::Dealing);
            game.start().unwrap();
            assert_eq!(game.phase(), Phase::Playing, "{kind}");
            assert!(game.awaiting_seat().is_some());
            assert!(!game.drain_events().is_empty());
            assert_eq!(game.start(), Err(GameError::GameAlreadyInProgress));
        }
    }

    #[test]
    fn test_action_wire_format() {
        let action: PlayerAction =
            serde_json::from_str(r#"{"action":"playCard","index":2}"#).unwrap();
        assert_eq!(action, PlayerAction::play(2));

        let action: PlayerAction =
            serde_json::from_str(r#"{"action":"respondTruco","response":3}"#).unwrap();
        assert_eq!(
            action,
            PlayerAction::RespondTruco {
                response: TrucoResponse::Raise
            }
        );

        let json = serde_json::to_value(PlayerAction::PlayCard {
            index: 0,
            declared_suit: Some(Suit::Heart),
        })
        .unwrap();
        assert_eq!(json["declaredSuit"], "Heart");
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(serde_json::to_string(&GameKind::CrazyEights).unwrap(), "\"crazyEights\"");
        let kind: GameKind = serde_json::from_str("\"blackjack\"").unwrap();
        assert_eq!(kind, GameKind::Blackjack);
    }
}
