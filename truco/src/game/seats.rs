//! Circular turn order shared by every variant.

use super::entities::{Player, SeatIndex};
use super::errors::{GameError, Result};
use super::events::GameEvent;

/// Seated players plus the seat currently holding the turn.
///
/// Exactly one player is marked active at a time; moving the turn always
/// goes through [`Seats::set_current`] so the flag and the index never
/// disagree.
#[derive(Clone, Debug)]
pub struct Seats {
    players: Vec<Player>,
    current: SeatIndex,
}

impl Seats {
    /// Players must already be seated `0..n` in order.
    #[must_use]
    pub fn new(players: Vec<Player>) -> Self {
        Self {
            players,
            current: 0,
        }
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    #[must_use]
    pub fn current(&self) -> SeatIndex {
        self.current
    }

    pub fn get(&self, seat: SeatIndex) -> Result<&Player> {
        self.players.get(seat).ok_or(GameError::InvalidSeat(seat))
    }

    pub fn get_mut(&mut self, seat: SeatIndex) -> Result<&mut Player> {
        self.players.get_mut(seat).ok_or(GameError::InvalidSeat(seat))
    }

    /// Seat after `seat` in circular order.
    #[must_use]
    pub fn next_seat(&self, seat: SeatIndex) -> SeatIndex {
        (seat + 1) % self.players.len().max(1)
    }

    /// Fail unless `seat` exists and holds the turn.
    pub fn ensure_turn(&self, seat: SeatIndex) -> Result<()> {
        self.get(seat)?;
        if seat != self.current {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    /// Hand the turn to `seat`.
    pub fn set_current(&mut self, seat: SeatIndex) -> Result<GameEvent> {
        let player = self.get(seat)?.id;
        for p in &mut self.players {
            p.is_active = p.seat == seat;
        }
        self.current = seat;
        Ok(GameEvent::ActivePlayerChanged { seat, player })
    }

    /// Move the turn one seat along.
    pub fn advance(&mut self) -> Result<GameEvent> {
        self.set_current(self.next_seat(self.current))
    }

    /// Nobody holds the turn (between rounds, dealer's turn).
    pub fn clear_active(&mut self) {
        for p in &mut self.players {
            p.is_active = false;
        }
    }

    /// Hand a seat over to a bot, keeping its cards and score.
    pub fn hand_to_bot(&mut self, seat: SeatIndex) -> Result<()> {
        self.get_mut(seat)?.is_bot = true;
        Ok(())
    }
}
