//! Round (trick) resolution and best-of-three bookkeeping for team games.
//!
//! Each team is represented by its *weakest* card on the table and the
//! team whose weakest card has the lower value takes the round. Ties go
//! to whichever team won the most recent decided round of the current
//! game; with no decided round yet, a tie is a draw.

use serde::Serialize;
use std::cmp::Ordering;

use super::constants::{TRUCO_ROUNDS_PER_GAME, TRUCO_ROUNDS_TO_WIN};
use super::entities::{PlayedCard, PlayerId, SeatIndex, Team};
use super::errors::{GameError, Result};

/// Winner of a single round, with the seat that contributed the deciding card.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundWinner {
    pub team: Team,
    pub seat: SeatIndex,
    pub player: PlayerId,
}

/// Remembers the last decided round of the current game for tie-breaks.
#[derive(Clone, Debug, Default)]
pub struct RoundResolver {
    last_decided: Option<Team>,
}

impl RoundResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last_decided(&self) -> Option<Team> {
        self.last_decided
    }

    /// Forget tie-break history. Called at the start of every game.
    pub fn reset(&mut self) {
        self.last_decided = None;
    }

    /// Decide a round. `Ok(None)` means the round is a draw.
    ///
    /// Both teams must have at least one card on the table; anything else
    /// is reported as [`GameError::IncompleteRound`].
    pub fn decide(&mut self, played: &[PlayedCard]) -> Result<Option<RoundWinner>> {
        let (Some(a), Some(b)) = (team_minimum(played, Team::A), team_minimum(played, Team::B))
        else {
            return Err(GameError::IncompleteRound);
        };

        let deciding = match a.card.value.cmp(&b.card.value) {
            Ordering::Less => Some(a),
            Ordering::Greater => Some(b),
            Ordering::Equal => match self.last_decided {
                Some(Team::A) => Some(a),
                Some(Team::B) => Some(b),
                None => None,
            },
        };

        let winner = deciding.and_then(|played| {
            played.team.map(|team| RoundWinner {
                team,
                seat: played.seat,
                player: played.player,
            })
        });

        if let Some(winner) = winner {
            self.last_decided = Some(winner.team);
        }
        Ok(winner)
    }
}

/// The first-played card with the lowest value among a team's plays.
fn team_minimum(played: &[PlayedCard], team: Team) -> Option<&PlayedCard> {
    played
        .iter()
        .filter(|p| p.team == Some(team))
        .min_by_key(|p| p.card.value)
}

/// Final result of a game (best of three rounds).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "result", content = "team", rename_all = "camelCase")]
pub enum GameResult {
    Won(Team),
    Draw,
}

impl GameResult {
    #[must_use]
    pub fn winner(self) -> Option<Team> {
        match self {
            Self::Won(team) => Some(team),
            Self::Draw => None,
        }
    }
}

/// Round wins inside the current game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundTally {
    pub scores: [u8; 2],
    pub is_draw: bool,
    pub rounds_played: u8,
}

impl RoundTally {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn score(&self, team: Team) -> u8 {
        self.scores[team.index()]
    }

    /// Record a round and report whether the game is over.
    ///
    /// Two round wins take the game. A win after an earlier drawn round
    /// also takes the game. Three rounds without either ends in a draw.
    pub fn record(&mut self, winner: Option<Team>) -> Option<GameResult> {
        self.rounds_played += 1;

        match winner {
            Some(team) => {
                let score = &mut self.scores[team.index()];
                *score += 1;
                if *score >= TRUCO_ROUNDS_TO_WIN || (self.is_draw && *score == 1) {
                    return Some(GameResult::Won(team));
                }
            }
            None => self.is_draw = true,
        }

        if self.rounds_played >= TRUCO_ROUNDS_PER_GAME {
            Some(GameResult::Draw)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::{Card, Rank, Suit};
    use uuid::Uuid;

    fn play(value: u8, seat: SeatIndex) -> PlayedCard {
        PlayedCard {
            card: Card::new(Rank::Four, Suit::Club, value),
            player: Uuid::new_v4(),
            seat,
            team: Some(Team::for_seat(seat)),
        }
    }

    #[test]
    fn test_lowest_team_minimum_wins() {
        let mut resolver = RoundResolver::new();
        // Team A plays 10 and 30, team B plays 12 and 2.
        let played = [play(10, 0), play(12, 1), play(30, 2), play(2, 3)];
        let winner = resolver.decide(&played).unwrap().unwrap();
        assert_eq!(winner.team, Team::B);
        assert_eq!(winner.seat, 3);
        assert_eq!(resolver.last_decided(), Some(Team::B));
    }

    #[test]
    fn test_highest_card_does_not_decide() {
        let mut resolver = RoundResolver::new();
        // A holds the strongest card (40) but also the weakest (1).
        let played = [play(40, 0), play(20, 1), play(1, 2), play(21, 3)];
        let winner = resolver.decide(&played).unwrap().unwrap();
        assert_eq!(winner.team, Team::A);
        assert_eq!(winner.seat, 2);
    }

    #[test]
    fn test_first_tie_is_draw() {
        let mut resolver = RoundResolver::new();
        let played = [play(5, 0), play(5, 1)];
        assert_eq!(resolver.decide(&played).unwrap(), None);
        assert_eq!(resolver.last_decided(), None);
    }

    #[test]
    fn test_tie_goes_to_last_decided_winner() {
        let mut resolver = RoundResolver::new();
        let first = resolver.decide(&[play(9, 0), play(3, 1)]).unwrap().unwrap();
        assert_eq!(first.team, Team::B);

        let tie = resolver.decide(&[play(7, 0), play(7, 1)]).unwrap().unwrap();
        assert_eq!(tie.team, Team::B);
        assert_eq!(tie.seat, 1);
    }

    #[test]
    fn test_reset_clears_tiebreak() {
        let mut resolver = RoundResolver::new();
        resolver.decide(&[play(1, 0), play(3, 1)]).unwrap();
        resolver.reset();
        assert_eq!(resolver.decide(&[play(7, 0), play(7, 1)]).unwrap(), None);
    }

    #[test]
    fn test_missing_team_is_incomplete() {
        let mut resolver = RoundResolver::new();
        let played = [play(1, 0), play(3, 2)];
        assert_eq!(resolver.decide(&played), Err(GameError::IncompleteRound));
    }

    #[test]
    fn test_two_round_wins_take_game() {
        let mut tally = RoundTally::default();
        assert_eq!(tally.record(Some(Team::A)), None);
        assert_eq!(tally.record(Some(Team::B)), None);
        assert_eq!(tally.record(Some(Team::A)), Some(GameResult::Won(Team::A)));
    }

    #[test]
    fn test_draw_then_win_takes_game() {
        let mut tally = RoundTally::default();
        assert_eq!(tally.record(None), None);
        assert!(tally.is_draw);
        assert_eq!(tally.record(Some(Team::A)), Some(GameResult::Won(Team::A)));
        assert_eq!(tally.score(Team::A), 1);
    }

    #[test]
    fn test_three_draws_is_draw() {
        let mut tally = RoundTally::default();
        assert_eq!(tally.record(None), None);
        assert_eq!(tally.record(None), None);
        assert_eq!(tally.record(None), Some(GameResult::Draw));
    }

    #[test]
    fn test_straight_win() {
        let mut tally = RoundTally::default();
        tally.record(Some(Team::B));
        assert_eq!(tally.record(Some(Team::B)), Some(GameResult::Won(Team::B)));
        assert_eq!(tally.rounds_played, 2);
    }
}
