use log::debug;
use rand::rngs::StdRng;
use std::{cmp::Ordering, collections::VecDeque};

use crate::game::{
    CardGame, Continuation, GameKind, Phase, PlayerAction,
    cards::{Card, Deck, Rank, ValueTable},
    constants::{BLACKJACK_DEALER_STANDS_ON, BLACKJACK_RESHUFFLE_THRESHOLD, BLACKJACK_TARGET},
    entities::{Player, SeatIndex},
    errors::{GameError, Result},
    events::GameEvent,
    seats::Seats,
    views::{GameView, VariantView, player_views},
};

/// Best blackjack total for a hand, counting aces as 11 while that does
/// not bust.
#[must_use]
pub fn hand_total(cards: &[Card]) -> u8 {
    let mut total: u8 = 0;
    let mut soft_aces = 0;
    for card in cards {
        total += match card.rank {
            Rank::Ace => {
                soft_aces += 1;
                11
            }
            rank if rank.is_face() => 10,
            rank => rank.pip(),
        };
    }
    while total > BLACKJACK_TARGET && soft_aces > 0 {
        total -= 10;
        soft_aces -= 1;
    }
    total
}

/// A two-card 21.
#[must_use]
pub fn is_natural(cards: &[Card]) -> bool {
    cards.len() == 2 && hand_total(cards) == BLACKJACK_TARGET
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SeatStatus {
    Playing,
    Stood,
    Busted,
}

/// Blackjack for one to five seats against a house dealer.
#[derive(Debug)]
pub struct BlackjackGame {
    seats: Seats,
    rng: StdRng,
    phase: Phase,
    shoe: Deck,
    dealer: Vec<Card>,
    dealer_revealed: bool,
    status: Vec<SeatStatus>,
    /// Chips won or lost by each seat in the last settled hand.
    outcomes: Vec<Option<i32>>,
    hand_number: u32,
    pending: Option<Continuation>,
    events: VecDeque<GameEvent>,
}

impl BlackjackGame {
    pub fn new(players: Vec<Player>, rng: StdRng) -> Result<Self> {
        GameKind::Blackjack.check_player_count(players.len())?;
        let seats = players.len();
        Ok(Self {
            seats: Seats::new(players),
            rng,
            phase: Phase::Dealing,
            shoe: Deck::default(),
            dealer: Vec::new(),
            dealer_revealed: false,
            status: vec![SeatStatus::Playing; seats],
            outcomes: vec![None; seats],
            hand_number: 0,
            pending: None,
            events: VecDeque::new(),
        })
    }

    #[must_use]
    pub fn dealer_total(&self) -> u8 {
        hand_total(&self.dealer)
    }

    #[must_use]
    pub fn outcomes(&self) -> &[Option<i32>] {
        &self.outcomes
    }

    fn open_shoe(&mut self) {
        let mut shoe = Deck::from_table(&ValueTable::standard());
        shoe.shuffle(&mut self.rng);
        self.shoe = shoe;
    }

    fn draw_card(&mut self) -> Result<Card> {
        if self.shoe.is_empty() {
            self.open_shoe();
        }
        self.shoe.draw_or_err()
    }

    fn deal_hand(&mut self) -> Result<()> {
        if self.shoe.len() < BLACKJACK_RESHUFFLE_THRESHOLD {
            debug!("blackjack shoe down to {} cards, opening a new one", self.shoe.len());
            self.open_shoe();
        }
        for seat in 0..self.seats.len() {
            let cards = [self.draw_card()?, self.draw_card()?];
            self.seats.get_mut(seat)?.hand = cards.to_vec();
        }
        self.dealer = vec![self.draw_card()?, self.draw_card()?];
        self.dealer_revealed = false;
        self.status = vec![SeatStatus::Playing; self.seats.len()];
        self.outcomes = vec![None; self.seats.len()];
        self.phase = Phase::Playing;
        self.events.push_back(GameEvent::HandDealt {
            hand_number: self.hand_number,
            lead: 0,
        });
        self.open_play()
    }

    /// Stand every natural, then hand the turn to the first seat left to act.
    fn open_play(&mut self) -> Result<()> {
        for seat in 0..self.seats.len() {
            if is_natural(&self.seats.get(seat)?.hand) {
                self.status[seat] = SeatStatus::Stood;
                self.events.push_back(GameEvent::SeatStood {
                    seat,
                    total: BLACKJACK_TARGET,
                });
            }
        }
        self.advance_from(0)
    }

    fn check_turn(&self, seat: SeatIndex) -> Result<()> {
        if self.phase != Phase::Playing {
            return Err(GameError::GameNotInProgress);
        }
        self.seats.ensure_turn(seat)
    }

    fn hit(&mut self, seat: SeatIndex) -> Result<()> {
        self.check_turn(seat)?;
        let card = self.draw_card()?;
        let player = self.seats.get_mut(seat)?;
        player.hand.push(card);
        let total = hand_total(&player.hand);
        self.events.push_back(GameEvent::CardDrawn {
            seat,
            player: player.id,
            card: Some(card),
        });

        match total.cmp(&BLACKJACK_TARGET) {
            Ordering::Greater => {
                self.status[seat] = SeatStatus::Busted;
                self.events.push_back(GameEvent::SeatBusted { seat, total });
                self.finish_turn(seat)
            }
            Ordering::Equal => {
                self.status[seat] = SeatStatus::Stood;
                self.events.push_back(GameEvent::SeatStood { seat, total });
                self.finish_turn(seat)
            }
            Ordering::Less => Ok(()),
        }
    }

    fn stand(&mut self, seat: SeatIndex) -> Result<()> {
        self.check_turn(seat)?;
        let total = hand_total(&self.seats.get(seat)?.hand);
        self.status[seat] = SeatStatus::Stood;
        self.events.push_back(GameEvent::SeatStood { seat, total });
        self.finish_turn(seat)
    }

    fn finish_turn(&mut self, seat: SeatIndex) -> Result<()> {
        self.advance_from(seat + 1)
    }

    /// Pass to the first seat from `start` still playing, or to the dealer.
    fn advance_from(&mut self, start: SeatIndex) -> Result<()> {
        let next = (start..self.seats.len()).find(|&s| self.status[s] == SeatStatus::Playing);
        match next {
            Some(next) => {
                let event = self.seats.set_current(next)?;
                self.events.push_back(event);
            }
            None => {
                self.seats.clear_active();
                self.phase = Phase::DealerTurn;
                self.pending = Some(Continuation::DealerTurn);
            }
        }
        Ok(())
    }

    fn play_dealer(&mut self) -> Result<()> {
        self.dealer_revealed = true;
        // Naturals settle against the dealer's first two cards.
        let anyone_standing = self
            .seats
            .players()
            .iter()
            .zip(&self.status)
            .any(|(p, s)| *s == SeatStatus::Stood && !is_natural(&p.hand));
        while anyone_standing && self.dealer_total() < BLACKJACK_DEALER_STANDS_ON {
            let card = self.draw_card()?;
            self.dealer.push(card);
        }
        let dealer_total = self.dealer_total();
        let dealer_natural = is_natural(&self.dealer);
        self.events.push_back(GameEvent::DealerPlayed {
            cards: self.dealer.clone(),
            total: dealer_total,
        });

        let mut deltas = Vec::with_capacity(self.seats.len());
        for (player, status) in self.seats.players_mut().zip(&self.status) {
            let delta = match status {
                SeatStatus::Busted => -1,
                _ if is_natural(&player.hand) => i32::from(!dealer_natural),
                _ if dealer_natural => -1,
                _ if dealer_total > BLACKJACK_TARGET => 1,
                _ => match hand_total(&player.hand).cmp(&dealer_total) {
                    Ordering::Greater => 1,
                    Ordering::Less => -1,
                    Ordering::Equal => 0,
                },
            };
            player.score += delta;
            deltas.push(delta);
        }
        self.outcomes = deltas.iter().copied().map(Some).collect();
        let totals = self.seats.players().iter().map(|p| p.score).collect();
        self.events.push_back(GameEvent::HandScored { deltas, totals });

        self.phase = Phase::GameEnd;
        self.pending = Some(Continuation::NextHand);
        Ok(())
    }
}

impl CardGame for BlackjackGame {
    fn kind(&self) -> GameKind {
        GameKind::Blackjack
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
            PlayerAction::Hit => self.hit(seat),
            PlayerAction::Stand => self.stand(seat),
            other => Err(GameError::UnsupportedAction {
                kind: GameKind::Blackjack,
                action: other.to_string(),
            }),
        }
    }

    fn legal_actions(&self, seat: SeatIndex) -> Vec<PlayerAction> {
        if self.check_turn(seat).is_ok() {
            vec![PlayerAction::Hit, PlayerAction::Stand]
        } else {
            Vec::new()
        }
    }

    fn awaiting_seat(&self) -> Option<SeatIndex> {
        (self.phase == Phase::Playing).then(|| self.seats.current())
    }

    fn continuation(&self) -> Option<Continuation> {
        self.pending
    }

    fn resume(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(Continuation::DealerTurn) => self.play_dealer(),
            Some(Continuation::NextHand) => {
                self.hand_number += 1;
                self.deal_hand()
            }
            _ => Err(GameError::NothingToResume),
        }
    }

    fn view_for(&self, viewer: Option<SeatIndex>) -> GameView {
        let playing = self.phase == Phase::Playing;
        let (dealer, dealer_total, hidden_cards) = if self.dealer_revealed {
            (self.dealer.clone(), Some(self.dealer_total()), 0)
        } else {
            let shown: Vec<Card> = self.dealer.iter().take(1).copied().collect();
            let hidden = self.dealer.len() - shown.len();
            (shown, None, hidden)
        };
        GameView {
            kind: GameKind::Blackjack,
            phase: self.phase,
            current_player: playing.then(|| self.seats.current()),
            local_player_index: viewer,
            hand_number: self.hand_number,
            players: player_views(self.seats.players(), viewer, true),
            table: Vec::new(),
            pending: self.pending,
            details: VariantView::Blackjack {
                dealer,
                dealer_total,
                hidden_cards,
                outcomes: self.outcomes.clone(),
            },
        }
    }

    fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
