use rand::rngs::StdRng;
use std::{cmp::Ordering, collections::VecDeque};

use crate::game::{
    CardGame, Continuation, GameKind, Phase, PlayerAction,
    cards::{Card, Deck, ValueTable},
    constants::WAR_MAX_ROUNDS,
    entities::{PlayedCard, Player, SeatIndex},
    errors::{GameError, Result},
    events::GameEvent,
    seats::Seats,
    views::{GameView, VariantView, player_views},
};

/// Two-player War. Each seat's hand is its face-down pile.
#[derive(Debug)]
pub struct WarGame {
    seats: Seats,
    rng: StdRng,
    phase: Phase,
    played: Vec<PlayedCard>,
    /// Cards from tied rounds, claimed by the next decided round.
    war_pot: Vec<Card>,
    rounds_played: u32,
    pending: Option<Continuation>,
    events: VecDeque<GameEvent>,
}

impl WarGame {
    pub fn new(players: Vec<Player>, rng: StdRng) -> Result<Self> {
        GameKind::War.check_player_count(players.len())?;
        Ok(Self {
            seats: Seats::new(players),
            rng,
            phase: Phase::Dealing,
            played: Vec::with_capacity(2),
            war_pot: Vec::new(),
            rounds_played: 0,
            pending: None,
            events: VecDeque::new(),
        })
    }

    #[must_use]
    pub fn rounds_played(&self) -> u32 {
        self.rounds_played
    }

    #[must_use]
    pub fn war_pot(&self) -> usize {
        self.war_pot.len()
    }

    fn play_top(&mut self, seat: SeatIndex, index: usize) -> Result<()> {
        if self.phase != Phase::Playing {
            return Err(GameError::GameNotInProgress);
        }
        self.seats.ensure_turn(seat)?;
        if index != 0 {
            return Err(GameError::IllegalPlay(
                "war always plays the top card".to_string(),
            ));
        }

        let player = self.seats.get_mut(seat)?;
        let card = player.take_card(0)?;
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
        self.rounds_played += 1;
        self.seats.clear_active();
        let (first, second) = (self.played[0], self.played[1]);
        let winner = match first.card.value.cmp(&second.card.value) {
            Ordering::Greater => Some(first.seat),
            Ordering::Less => Some(second.seat),
            Ordering::Equal => None,
        };

        self.war_pot.extend(self.played.iter().map(|p| p.card));
        match winner {
            Some(seat) => {
                let cards = self.war_pot.len();
                let pot = std::mem::take(&mut self.war_pot);
                self.seats.get_mut(seat)?.hand.extend(pot);
                self.events.push_back(GameEvent::TrickTaken {
                    seat: Some(seat),
                    cards,
                    points: 0,
                });
            }
            None => self.events.push_back(GameEvent::TrickTaken {
                seat: None,
                cards: self.war_pot.len(),
                points: 0,
            }),
        }
        for player in self.seats.players_mut() {
            player.score = player.hand.len() as i32;
        }

        if let Some(winners) = self.match_winners() {
            self.phase = Phase::Finished;
            self.events.push_back(GameEvent::MatchOver { winners });
        } else {
            self.phase = Phase::RoundEnd;
            self.pending = Some(Continuation::NextRound);
        }
        Ok(())
    }

    /// `Some` once the match is decided; an empty list is a draw.
    fn match_winners(&self) -> Option<Vec<SeatIndex>> {
        let piles: Vec<usize> = self.seats.players().iter().map(|p| p.hand.len()).collect();
        let out_of_cards = piles.iter().any(|&n| n == 0);
        if !out_of_cards && self.rounds_played < WAR_MAX_ROUNDS {
            return None;
        }
        let most = piles.iter().copied().max().unwrap_or(0);
        let leaders: Vec<SeatIndex> = (0..piles.len()).filter(|&s| piles[s] == most).collect();
        if most == 0 || leaders.len() > 1 {
            Some(Vec::new())
        } else {
            Some(leaders)
        }
    }
}

impl CardGame for WarGame {
    fn kind(&self) -> GameKind {
        GameKind::War
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
        let mut deck = Deck::from_table(&ValueTable::standard());
        deck.shuffle(&mut self.rng);
        let per_player = deck.len() / self.seats.len();
        let piles = deck.deal(self.seats.len(), per_player)?;
        for (player, pile) in self.seats.players_mut().zip(piles) {
            player.score = pile.len() as i32;
            player.hand = pile;
        }
        self.phase = Phase::Playing;
        self.events.push_back(GameEvent::HandDealt {
            hand_number: 1,
            lead: 0,
        });
        let event = self.seats.set_current(0)?;
        self.events.push_back(event);
        Ok(())
    }

    fn apply(&mut self, seat: SeatIndex, action: PlayerAction) -> Result<()> {
        match action {
            PlayerAction::PlayCard { index, .. } => self.play_top(seat, index),
            other => Err(GameError::UnsupportedAction {
                kind: GameKind::War,
                action: other.to_string(),
            }),
        }
    }

    fn legal_actions(&self, seat: SeatIndex) -> Vec<PlayerAction> {
        let can_play = self.phase == Phase::Playing
            && self.seats.ensure_turn(seat).is_ok()
            && self.seats.get(seat).is_ok_and(|p| !p.hand.is_empty());
        if can_play {
            vec![PlayerAction::play(0)]
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
            Some(Continuation::NextRound) => {
                self.played.clear();
                self.phase = Phase::Playing;
                let event = self.seats.set_current(0)?;
                self.events.push_back(event);
                Ok(())
            }
            _ => Err(GameError::NothingToResume),
        }
    }

    fn view_for(&self, viewer: Option<SeatIndex>) -> GameView {
        let playing = self.phase == Phase::Playing;
        GameView {
            kind: GameKind::War,
            phase: self.phase,
            current_player: playing.then(|| self.seats.current()),
            local_player_index: viewer,
            hand_number: 1,
            // Piles are face down, even to their owner.
            players: player_views(self.seats.players(), None, false),
            table: self.played.clone(),
            pending: self.pending,
            details: VariantView::War {
                pile_sizes: self.seats.players().iter().map(|p| p.hand.len()).collect(),
                war_pot: self.war_pot.len(),
                rounds_played: self.rounds_played,
            },
        }
    }

    fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
