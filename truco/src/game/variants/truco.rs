use log::debug;
use rand::rngs::StdRng;
use std::collections::VecDeque;

use crate::game::{
    CardGame, Continuation, GameKind, Phase, PlayerAction,
    cards::{Deck, ValueTable},
    constants::{GAMES_PER_SET, TRUCO_HAND_SIZE},
    entities::{PlayedCard, Player, SeatIndex, Team},
    errors::{GameError, Result},
    events::GameEvent,
    round::{RoundResolver, RoundTally},
    seats::Seats,
    truco_call::{CallOutcome, TrucoResponse, TrucoStakes, TrucoState},
    views::{GameView, VariantView, player_views},
};

/// Team Truco for two or four seats.
///
/// A hand is three cards each and is decided best of three rounds. The
/// hand's winner adds the hand value to its `games`; twelve games make a
/// set.
#[derive(Debug)]
pub struct TrucoGame {
    seats: Seats,
    values: ValueTable,
    deck: Deck,
    rng: StdRng,
    phase: Phase,
    /// Cards on the table for the current round.
    played: Vec<PlayedCard>,
    resolver: RoundResolver,
    tally: RoundTally,
    stakes: TrucoStakes,
    games: [u32; 2],
    sets: [u32; 2],
    hand_lead: SeatIndex,
    round_lead: SeatIndex,
    hand_number: u32,
    pending: Option<Continuation>,
    events: VecDeque<GameEvent>,
}

impl TrucoGame {
    /// Seats alternate teams: even seats are team A.
    pub fn new(players: Vec<Player>, rng: StdRng) -> Result<Self> {
        GameKind::Truco.check_player_count(players.len())?;
        let players = players
            .into_iter()
            .map(|p| {
                let team = Team::for_seat(p.seat);
                p.with_team(team)
            })
            .collect();
        Ok(Self {
            seats: Seats::new(players),
            values: ValueTable::truco(),
            deck: Deck::default(),
            rng,
            phase: Phase::Dealing,
            played: Vec::with_capacity(4),
            resolver: RoundResolver::new(),
            tally: RoundTally::default(),
            stakes: TrucoStakes::new(),
            games: [0; 2],
            sets: [0; 2],
            hand_lead: 0,
            round_lead: 0,
            hand_number: 0,
            pending: None,
            events: VecDeque::new(),
        })
    }

    /// Value the current hand is being played for.
    #[must_use]
    pub fn game_value(&self) -> u8 {
        self.stakes.value()
    }

    #[must_use]
    pub fn truco_state(&self) -> Option<TrucoState> {
        self.stakes.state()
    }

    #[must_use]
    pub fn tally(&self) -> &RoundTally {
        &self.tally
    }

    #[must_use]
    pub fn games(&self) -> [u32; 2] {
        self.games
    }

    #[must_use]
    pub fn sets(&self) -> [u32; 2] {
        self.sets
    }

    #[must_use]
    pub fn played(&self) -> &[PlayedCard] {
        &self.played
    }

    /// Cards left undealt this hand.
    #[must_use]
    pub fn stock(&self) -> usize {
        self.deck.len()
    }

    fn team_of(&self, seat: SeatIndex) -> Result<Team> {
        self.seats.get(seat)?.team.ok_or(GameError::InvalidSeat(seat))
    }

    fn deal_hand(&mut self) -> Result<()> {
        let mut deck = Deck::from_table(&self.values);
        deck.shuffle(&mut self.rng);
        let hands = deck.deal(self.seats.len(), TRUCO_HAND_SIZE)?;
        for (player, hand) in self.seats.players_mut().zip(hands) {
            player.hand = hand;
        }
        self.deck = deck;
        self.played.clear();
        self.resolver.reset();
        self.tally.reset();
        self.stakes.reset();
        self.round_lead = self.hand_lead;
        self.phase = Phase::Playing;
        self.events.push_back(GameEvent::HandDealt {
            hand_number: self.hand_number,
            lead: self.hand_lead,
        });
        let event = self.seats.set_current(self.hand_lead)?;
        self.events.push_back(event);
        Ok(())
    }

    fn play_card(&mut self, seat: SeatIndex, index: usize) -> Result<()> {
        if self.phase != Phase::Playing {
            return Err(GameError::GameNotInProgress);
        }
        // A pending call freezes play for every seat.
        if self.stakes.is_pending() {
            return Err(GameError::TrucoPending);
        }
        self.seats.ensure_turn(seat)?;

        let player = self.seats.get_mut(seat)?;
        let card = player.take_card(index)?;
        let played = PlayedCard::new(card, player);
        self.played.push(played);

        let round_complete = self.played.len() == self.seats.len();
        let next_player = (!round_complete).then(|| self.seats.next_seat(seat));
        self.events.push_back(GameEvent::CardPlayed {
            seat,
            player: played.player,
            card,
            next_player,
        });

        if round_complete {
            self.resolve_round()
        } else {
            let event = self.seats.advance()?;
            self.events.push_back(event);
            Ok(())
        }
    }

    fn resolve_round(&mut self) -> Result<()> {
        let winner = self.resolver.decide(&self.played)?;
        if let Some(winner) = winner {
            self.round_lead = winner.seat;
        }
        let result = self.tally.record(winner.map(|w| w.team));
        self.seats.clear_active();
        self.events.push_back(GameEvent::RoundEnded {
            winner,
            scores: self.tally.scores,
            games: self.games,
            sets: self.sets,
        });

        match result {
            Some(result) => self.end_game(result.winner()),
            None => {
                self.phase = Phase::RoundEnd;
                self.pending = Some(Continuation::NextRound);
            }
        }
        Ok(())
    }

    /// Credit the hand's value to `winner` and clear per-hand state.
    fn end_game(&mut self, winner: Option<Team>) {
        let value = self.stakes.value();
        let mut set_won = None;
        if let Some(team) = winner {
            let games = &mut self.games[team.index()];
            *games += u32::from(value);
            if *games >= GAMES_PER_SET {
                self.sets[team.index()] += 1;
                self.games = [0; 2];
                set_won = Some(team);
            }
        }
        debug!(
            "truco hand {} over: winner {winner:?} value {value} games {:?} sets {:?}",
            self.hand_number, self.games, self.sets
        );

        self.events.push_back(GameEvent::GameEnded {
            winner,
            value,
            games: self.games,
            sets: self.sets,
        });
        if let Some(team) = set_won {
            self.events.push_back(GameEvent::SetWon {
                team,
                sets: self.sets,
            });
        }

        self.tally.reset();
        self.resolver.reset();
        self.stakes.reset();
        self.seats.clear_active();
        self.phase = Phase::GameEnd;
        self.pending = Some(Continuation::NextHand);
    }

    fn call_truco(&mut self, seat: SeatIndex) -> Result<()> {
        if self.phase != Phase::Playing {
            return Err(GameError::GameNotInProgress);
        }
        self.seats.ensure_turn(seat)?;
        let team = self.team_of(seat)?;
        let responder = self.seats.next_seat(seat);
        let state = self.stakes.call(seat, team, responder)?;
        let player = self.seats.get(seat)?.id;
        self.events.push_back(GameEvent::TrucoRequested {
            seat,
            player,
            state,
            responder,
        });
        Ok(())
    }

    fn respond_truco(&mut self, seat: SeatIndex, response: TrucoResponse) -> Result<()> {
        if self.phase != Phase::Playing {
            return Err(GameError::GameNotInProgress);
        }
        let team = self.team_of(seat)?;
        let player = self.seats.get(seat)?.id;
        let outcome = self.stakes.respond(seat, team, response)?;
        self.events.push_back(GameEvent::TrucoAnswered {
            seat,
            player,
            response,
            value: self.stakes.value(),
            state: self.stakes.state(),
        });

        match outcome {
            CallOutcome::Accepted { resume_seat, .. } => {
                let event = self.seats.set_current(resume_seat)?;
                self.events.push_back(event);
            }
            CallOutcome::Rejected { winner, .. } => self.end_game(Some(winner)),
            CallOutcome::Raised { .. } => {}
        }
        Ok(())
    }
}

impl CardGame for TrucoGame {
    fn kind(&self) -> GameKind {
        GameKind::Truco
    }

    fn phase(&self) -> Phase {
        self.phase
    }

    fn seats(&self) -> &Seats {
        &self.seats
    }

    fn seats_mut(&mut self) -> &mut Seats {
        &mut self.seats
    }

    fn start(&mut self) -> Result<()> {
        if self.phase != Phase::Dealing {
            return Err(GameError::GameAlreadyInProgress);
        }
        self.hand_number = 1;
        self.deal_hand()
    }

    fn apply(&mut self, seat: SeatIndex, action: PlayerAction) -> Result<()> {
        match action {
            PlayerAction::PlayCard { index, .. } => self.play_card(seat, index),
            PlayerAction::CallTruco => self.call_truco(seat),
            PlayerAction::RespondTruco { response } => self.respond_truco(seat, response),
            other => Err(GameError::UnsupportedAction {
                kind: GameKind::Truco,
                action: other.to_string(),
            }),
        }
    }

    fn legal_actions(&self, seat: SeatIndex) -> Vec<PlayerAction> {
        if self.phase != Phase::Playing {
            return Vec::new();
        }
        let Ok(player) = self.seats.get(seat) else {
            return Vec::new();
        };

        if let Some(awaiting) = self.stakes.awaiting_team() {
            if player.team != Some(awaiting) {
                return Vec::new();
            }
            let mut actions = vec![
                PlayerAction::RespondTruco {
                    response: TrucoResponse::Accept,
                },
                PlayerAction::RespondTruco {
                    response: TrucoResponse::Reject,
                },
            ];
            if self.stakes.can_raise() {
                actions.push(PlayerAction::RespondTruco {
                    response: TrucoResponse::Raise,
                });
            }
            return actions;
        }

        if seat != self.seats.current() {
            return Vec::new();
        }
        let mut actions: Vec<_> = (0..player.hand.len()).map(PlayerAction::play).collect();
        if self.stakes.can_call() {
            actions.push(PlayerAction::CallTruco);
        }
        actions
    }

    fn awaiting_seat(&self) -> Option<SeatIndex> {
        if self.phase != Phase::Playing {
            return None;
        }
        self.stakes.responder_seat().or(Some(self.seats.current()))
    }

    fn continuation(&self) -> Option<Continuation> {
        self.pending
    }

    fn resume(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(Continuation::NextRound) => {
                self.played.clear();
                self.phase = Phase::Playing;
                let event = self.seats.set_current(self.round_lead)?;
                self.events.push_back(event);
                Ok(())
            }
            Some(Continuation::NextHand) => {
                self.hand_lead = self.seats.next_seat(self.hand_lead);
                self.hand_number += 1;
                self.deal_hand()
            }
            Some(Continuation::DealerTurn) | None => Err(GameError::NothingToResume),
        }
    }

    fn view_for(&self, viewer: Option<SeatIndex>) -> GameView {
        let playing = self.phase == Phase::Playing;
        GameView {
            kind: GameKind::Truco,
            phase: self.phase,
            current_player: playing.then(|| self.seats.current()),
            local_player_index: viewer,
            hand_number: self.hand_number,
            players: player_views(self.seats.players(), viewer, false),
            table: self.played.clone(),
            pending: self.pending,
            details: VariantView::Truco {
                game_value: self.stakes.value(),
                truco_state: self.stakes.state(),
                responder: self.stakes.responder_seat(),
                scores: self.tally.scores,
                games: self.games,
                sets: self.sets,
                is_draw: self.tally.is_draw,
                round_number: self.tally.rounds_played + 1,
            },
        }
    }

    fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
