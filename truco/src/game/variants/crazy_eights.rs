use rand::rngs::StdRng;
use std::collections::VecDeque;

use crate::game::{
    CardGame, Continuation, GameKind, Phase, PlayerAction,
    cards::{Card, Deck, Rank, Suit, ValueTable},
    entities::{Player, SeatIndex},
    errors::{GameError, Result},
    events::GameEvent,
    seats::Seats,
    views::{GameView, VariantView, player_views},
};

/// Penalty value of a card left in hand when someone goes out.
#[must_use]
pub fn card_points(card: &Card) -> i32 {
    match card.rank {
        Rank::Eight => 50,
        rank if rank.is_face() => 10,
        rank => i32::from(rank.pip()),
    }
}

/// Crazy Eights for two to four seats. Hands are scored as they end and
/// scores accumulate across hands.
#[derive(Debug)]
pub struct CrazyEightsGame {
    seats: Seats,
    rng: StdRng,
    phase: Phase,
    stock: Deck,
    discard: Vec<Card>,
    active_suit: Option<Suit>,
    hand_lead: SeatIndex,
    hand_number: u32,
    pending: Option<Continuation>,
    events: VecDeque<GameEvent>,
}

impl CrazyEightsGame {
    pub fn new(players: Vec<Player>, rng: StdRng) -> Result<Self> {
        GameKind::CrazyEights.check_player_count(players.len())?;
        Ok(Self {
            seats: Seats::new(players),
            rng,
            phase: Phase::Dealing,
            stock: Deck::default(),
            discard: Vec::new(),
            active_suit: None,
            hand_lead: 0,
            hand_number: 0,
            pending: None,
            events: VecDeque::new(),
        })
    }

    #[must_use]
    pub fn top_card(&self) -> Option<Card> {
        self.discard.last().copied()
    }

    #[must_use]
    pub fn active_suit(&self) -> Option<Suit> {
        self.active_suit
    }

    #[must_use]
    pub fn stock_len(&self) -> usize {
        self.stock.len()
    }

    fn hand_size(&self) -> usize {
        if self.seats.len() == 2 { 7 } else { 5 }
    }

    fn deal_hand(&mut self) -> Result<()> {
        let mut deck = Deck::from_table(&ValueTable::standard());
        deck.shuffle(&mut self.rng);
        let hands = deck.deal(self.seats.len(), self.hand_size())?;
        for (player, hand) in self.seats.players_mut().zip(hands) {
            player.hand = hand;
        }

        let mut starter = deck.draw_or_err()?;
        while starter.rank == Rank::Eight {
            deck.insert_bottom(starter);
            starter = deck.draw_or_err()?;
        }
        self.stock = deck;
        self.discard = vec![starter];
        self.active_suit = Some(starter.suit);
        self.phase = Phase::Playing;
        self.events.push_back(GameEvent::HandDealt {
            hand_number: self.hand_number,
            lead: self.hand_lead,
        });
        let event = self.seats.set_current(self.hand_lead)?;
        self.events.push_back(event);
        Ok(())
    }

    fn playable(&self, card: &Card) -> bool {
        card.rank == Rank::Eight
            || Some(card.suit) == self.active_suit
            || self.top_card().is_some_and(|top| top.rank == card.rank)
    }

    fn play_card(&mut self, seat: SeatIndex, index: usize, declared: Option<Suit>) -> Result<()> {
        if self.phase != Phase::Playing {
            return Err(GameError::GameNotInProgress);
        }
        self.seats.ensure_turn(seat)?;
        let card = self.seats.get(seat)?.card_at(index)?;
        if !self.playable(&card) {
            return Err(GameError::IllegalPlay(format!(
                "{} does not match the active suit or rank",
                card.name()
            )));
        }
        let wild = card.rank == Rank::Eight;
        if wild && declared.is_none() {
            return Err(GameError::IllegalPlay(
                "declare a suit when playing an eight".to_string(),
            ));
        }

        let player = self.seats.get_mut(seat)?;
        player.take_card(index)?;
        let went_out = player.hand.is_empty();
        let player_id = player.id;
        self.discard.push(card);
        self.active_suit = if wild { declared } else { Some(card.suit) };

        self.events.push_back(GameEvent::CardPlayed {
            seat,
            player: player_id,
            card,
            next_player: (!went_out).then(|| self.seats.next_seat(seat)),
        });
        if let (true, Some(suit)) = (wild, declared) {
            self.events.push_back(GameEvent::SuitDeclared { seat, suit });
        }

        if went_out {
            self.score_hand(seat);
        } else {
            let event = self.seats.advance()?;
            self.events.push_back(event);
        }
        Ok(())
    }

    /// Take one card from the stock and pass the turn.
    fn draw(&mut self, seat: SeatIndex) -> Result<()> {
        if self.phase != Phase::Playing {
            return Err(GameError::GameNotInProgress);
        }
        self.seats.ensure_turn(seat)?;

        if self.stock.is_empty()
            && let Some(top) = self.discard.pop()
        {
            self.stock.refill_from(self.discard.drain(..), &mut self.rng);
            self.discard.push(top);
        }

        let player = self.seats.get_mut(seat)?;
        let player_id = player.id;
        if let Some(card) = self.stock.draw() {
            player.hand.push(card);
            self.events.push_back(GameEvent::CardDrawn {
                seat,
                player: player_id,
                card: None,
            });
        }
        let event = self.seats.advance()?;
        self.events.push_back(event);
        Ok(())
    }

    fn score_hand(&mut self, winner: SeatIndex) {
        let points: i32 = self
            .seats
            .players()
            .iter()
            .flat_map(|p| p.hand.iter())
            .map(card_points)
            .sum();
        let mut deltas = vec![0; self.seats.len()];
        deltas[winner] = points;
        for player in self.seats.players_mut() {
            player.score += deltas[player.seat];
        }
        let totals = self.seats.players().iter().map(|p| p.score).collect();
        self.events.push_back(GameEvent::HandScored { deltas, totals });

        self.seats.clear_active();
        self.phase = Phase::GameEnd;
        self.pending = Some(Continuation::NextHand);
    }
}

impl CardGame for CrazyEightsGame {
    fn kind(&self) -> GameKind {
        GameKind::CrazyEights
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
            PlayerAction::PlayCard {
                index,
                declared_suit,
            } => self.play_card(seat, index, declared_suit),
            PlayerAction::Draw => self.draw(seat),
            other => Err(GameError::UnsupportedAction {
                kind: GameKind::CrazyEights,
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

        let mut actions = Vec::new();
        for (index, card) in player.hand.iter().enumerate() {
            if card.rank == Rank::Eight {
                actions.extend(Suit::ALL.iter().map(|&suit| PlayerAction::PlayCard {
                    index,
                    declared_suit: Some(suit),
                }));
            } else if self.playable(card) {
                actions.push(PlayerAction::play(index));
            }
        }
        actions.push(PlayerAction::Draw);
        actions
    }

    fn awaiting_seat(&self) -> Option<SeatIndex> {
        (self.phase == Phase::Playing).then(|| self.seats.current())
    }

    fn continuation(&self) -> Option<Continuation> {
        self.pending
    }

    fn resume(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(Continuation::NextHand) => {
                self.hand_lead = self.seats.next_seat(self.hand_lead);
                self.hand_number += 1;
                self.deal_hand()
            }
            _ => Err(GameError::NothingToResume),
        }
    }

    fn view_for(&self, viewer: Option<SeatIndex>) -> GameView {
        let playing = self.phase == Phase::Playing;
        GameView {
            kind: GameKind::CrazyEights,
            phase: self.phase,
            current_player: playing.then(|| self.seats.current()),
            local_player_index: viewer,
            hand_number: self.hand_number,
            players: player_views(self.seats.players(), viewer, false),
            table: Vec::new(),
            pending: self.pending,
            details: VariantView::CrazyEights {
                top_card: self.top_card(),
                active_suit: self.active_suit,
                draw_pile: self.stock.len(),
            },
        }
    }

    fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
