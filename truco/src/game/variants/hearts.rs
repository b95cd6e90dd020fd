use rand::rngs::StdRng;
use std::collections::VecDeque;

use crate::game::{
    CardGame, Continuation, GameKind, Phase, PlayerAction,
    cards::{Card, Deck, Rank, Suit, ValueTable},
    constants::{HEARTS_GAME_OVER_SCORE, HEARTS_POINTS_PER_HAND},
    entities::{PlayedCard, Player, SeatIndex},
    errors::{GameError, Result},
    events::GameEvent,
    seats::Seats,
    views::{GameView, VariantView, player_views},
};

const TWO_OF_CLUBS: (Rank, Suit) = (Rank::Two, Suit::Club);

fn penalty(card: &Card) -> i32 {
    match (card.rank, card.suit) {
        (_, Suit::Heart) => 1,
        (Rank::Queen, Suit::Spade) => 13,
        _ => 0,
    }
}

/// Four-seat Hearts without passing. Lowest score when someone reaches
/// 100 wins.
#[derive(Debug)]
pub struct HeartsGame {
    seats: Seats,
    rng: StdRng,
    phase: Phase,
    played: Vec<PlayedCard>,
    /// Penalty points taken per seat this hand.
    trick_points: Vec<i32>,
    hearts_broken: bool,
    first_trick: bool,
    trick_lead: SeatIndex,
    hand_number: u32,
    pending: Option<Continuation>,
    events: VecDeque<GameEvent>,
}

impl HeartsGame {
    pub fn new(players: Vec<Player>, rng: StdRng) -> Result<Self> {
        GameKind::Hearts.check_player_count(players.len())?;
        let seats = players.len();
        Ok(Self {
            seats: Seats::new(players),
            rng,
            phase: Phase::Dealing,
            played: Vec::with_capacity(seats),
            trick_points: vec![0; seats],
            hearts_broken: false,
            first_trick: true,
            trick_lead: 0,
            hand_number: 0,
            pending: None,
            events: VecDeque::new(),
        })
    }

    #[must_use]
    pub fn hearts_broken(&self) -> bool {
        self.hearts_broken
    }

    #[must_use]
    pub fn trick_points(&self) -> &[i32] {
        &self.trick_points
    }

    #[must_use]
    pub fn led_suit(&self) -> Option<Suit> {
        self.played.first().map(|p| p.card.suit)
    }

    fn deal_hand(&mut self) -> Result<()> {
        let mut deck = Deck::from_table(&ValueTable::standard());
        deck.shuffle(&mut self.rng);
        let per_player = deck.len() / self.seats.len();
        let hands = deck.deal(self.seats.len(), per_player)?;
        for (player, mut hand) in self.seats.players_mut().zip(hands) {
            hand.sort_by_key(|c| (c.suit, c.value));
            player.hand = hand;
        }

        self.played.clear();
        self.trick_points = vec![0; self.seats.len()];
        self.hearts_broken = false;
        self.first_trick = true;
        self.trick_lead = self
            .seats
            .players()
            .iter()
            .find(|p| p.hand.iter().any(|c| (c.rank, c.suit) == TWO_OF_CLUBS))
            .map_or(0, |p| p.seat);
        self.phase = Phase::Playing;
        self.events.push_back(GameEvent::HandDealt {
            hand_number: self.hand_number,
            lead: self.trick_lead,
        });
        let event = self.seats.set_current(self.trick_lead)?;
        self.events.push_back(event);
        Ok(())
    }

    fn check_play(&self, player: &Player, card: &Card) -> Result<()> {
        let hand = &player.hand;
        match self.led_suit() {
            Some(led) => {
                if card.suit != led && hand.iter().any(|c| c.suit == led) {
                    return Err(GameError::IllegalPlay(format!("must follow {led}")));
                }
            }
            None => {
                if self.first_trick && (card.rank, card.suit) != TWO_OF_CLUBS {
                    return Err(GameError::IllegalPlay(
                        "the two of clubs leads the first trick".to_string(),
                    ));
                }
                if card.suit == Suit::Heart
                    && !self.hearts_broken
                    && hand.iter().any(|c| c.suit != Suit::Heart)
                {
                    return Err(GameError::IllegalPlay(
                        "hearts have not been broken".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    fn play_card(&mut self, seat: SeatIndex, index: usize) -> Result<()> {
        if self.phase != Phase::Playing {
            return Err(GameError::GameNotInProgress);
        }
        self.seats.ensure_turn(seat)?;
        let player = self.seats.get(seat)?;
        let card = player.card_at(index)?;
        self.check_play(player, &card)?;

        let player = self.seats.get_mut(seat)?;
        player.take_card(index)?;
        let played = PlayedCard::new(card, player);
        self.played.push(played);
        if card.suit == Suit::Heart {
            self.hearts_broken = true;
        }

        let trick_complete = self.played.len() == self.seats.len();
        self.events.push_back(GameEvent::CardPlayed {
            seat,
            player: played.player,
            card,
            next_player: (!trick_complete).then(|| self.seats.next_seat(seat)),
        });

        if trick_complete {
            self.resolve_trick();
        } else {
            let event = self.seats.advance()?;
            self.events.push_back(event);
        }
        Ok(())
    }

    fn resolve_trick(&mut self) {
        let led = self.played[0].card.suit;
        let winner = self
            .played
            .iter()
            .filter(|p| p.card.suit == led)
            .max_by_key(|p| p.card.value)
            .map_or(self.played[0].seat, |p| p.seat);
        let points: i32 = self.played.iter().map(|p| penalty(&p.card)).sum();
        self.trick_points[winner] += points;
        self.trick_lead = winner;
        self.first_trick = false;
        self.seats.clear_active();
        self.events.push_back(GameEvent::TrickTaken {
            seat: Some(winner),
            cards: self.played.len(),
            points,
        });

        if self.seats.players().iter().all(|p| p.hand.is_empty()) {
            self.score_hand();
        } else {
            self.phase = Phase::RoundEnd;
            self.pending = Some(Continuation::NextRound);
        }
    }

    fn score_hand(&mut self) {
        let moon = self
            .trick_points
            .iter()
            .position(|&p| p == HEARTS_POINTS_PER_HAND);
        let deltas: Vec<i32> = match moon {
            Some(shooter) => (0..self.seats.len())
                .map(|s| if s == shooter { 0 } else { HEARTS_POINTS_PER_HAND })
                .collect(),
            None => self.trick_points.clone(),
        };
        for player in self.seats.players_mut() {
            player.score += deltas[player.seat];
        }
        let totals: Vec<i32> = self.seats.players().iter().map(|p| p.score).collect();
        self.events.push_back(GameEvent::HandScored {
            deltas,
            totals: totals.clone(),
        });

        if totals.iter().any(|&t| t >= HEARTS_GAME_OVER_SCORE) {
            let low = totals.iter().copied().min().unwrap_or(0);
            let winners = (0..totals.len()).filter(|&s| totals[s] == low).collect();
            self.phase = Phase::Finished;
            self.events.push_back(GameEvent::MatchOver { winners });
        } else {
            self.phase = Phase::GameEnd;
            self.pending = Some(Continuation::NextHand);
        }
    }
}

impl CardGame for HeartsGame {
    fn kind(&self) -> GameKind {
        GameKind::Hearts
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
            other => Err(GameError::UnsupportedAction {
                kind: GameKind::Hearts,
                action: other.to_string(),
            }),
        }
    }

    fn legal_actions(&self, seat: SeatIndex) -> Vec<PlayerAction> {
        if self.phase != Phase::Playing || self.seats.ensure_turn(seat).is_err() {
            return Vec::new();
        }
        let Ok(player) = self.seats.get(seat) else {
            return Vec::new();
        };
        player
            .hand
            .iter()
            .enumerate()
            .filter(|(_, card)| self.check_play(player, card).is_ok())
            .map(|(index, _)| PlayerAction::play(index))
            .collect()
    }

    fn awaiting_seat(&self) -> Option<SeatIndex> {
        (self.phase == Phase::Playing).then(|| self.seats.current())
    }

    fn continuation(&self) -> Option<Continuation> {
        self.pending
    }

    fn resume(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(Continuation::NextRound) => {
                self.played.clear();
                self.phase = Phase::Playing;
                let event = self.seats.set_current(self.trick_lead)?;
                self.events.push_back(event);
                Ok(())
            }
            Some(Continuation::NextHand) => {
                self.hand_number += 1;
                self.deal_hand()
            }
            _ => Err(GameError::NothingToResume),
        }
    }

    fn view_for(&self, viewer: Option<SeatIndex>) -> GameView {
        let playing = self.phase == Phase::Playing;
        GameView {
            kind: GameKind::Hearts,
            phase: self.phase,
            current_player: playing.then(|| self.seats.current()),
            local_player_index: viewer,
            hand_number: self.hand_number,
            players: player_views(self.seats.players(), viewer, false),
            table: self.played.clone(),
            pending: self.pending,
            details: VariantView::Hearts {
                hearts_broken: self.hearts_broken,
                led_suit: self.led_suit(),
                trick_points: self.trick_points.clone(),
            },
        }
    }

    fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
