//! Bot decision-making.
//!
//! Bots never touch game state directly. They look at the actions the game
//! says are legal for their seat and pick one, which the room then submits
//! through the same validated entry point a human's action goes through.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};

use crate::game::{
    Card, GameKind, PlayerAction, Rank, Suit, TrucoResponse,
    constants::BLACKJACK_DEALER_STANDS_ON, variants::hand_total,
};

/// Probabilities driving bot play.
///
/// Response weights are relative; they are normalized over the responses
/// that are actually legal, so at 12 (where raising is gone) only the
/// `*_at_max` pair is consulted.
///
/// # Examples
///
/// ```
/// use truco::bot::decision::BotDecisionConfig;
///
/// let config = BotDecisionConfig::default();
/// assert_eq!(config.truco_call_probability, 0.10);
/// assert_eq!(config.accept_weight, 0.50);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BotDecisionConfig {
    /// Chance of calling truco instead of playing a card when no call is
    /// pending and calling is legal.
    ///
    /// **Range**: 0.0-0.3 (typical: 0.10)
    /// **Higher** = more table talk, more volatile hands
    pub truco_call_probability: f64,

    /// Weight of accepting a call that can still be raised.
    ///
    /// **Typical**: 0.50
    pub accept_weight: f64,

    /// Weight of rejecting a call that can still be raised.
    ///
    /// **Typical**: 0.20
    /// **Higher** = concedes more hands cheaply
    pub reject_weight: f64,

    /// Weight of raising a call.
    ///
    /// **Typical**: 0.30
    pub raise_weight: f64,

    /// Weight of accepting once the stakes are at 12.
    ///
    /// **Typical**: 0.70
    pub accept_weight_at_max: f64,

    /// Weight of rejecting once the stakes are at 12.
    ///
    /// **Typical**: 0.30
    pub reject_weight_at_max: f64,

    /// Blackjack bots hit below this total.
    ///
    /// **Typical**: 17 (mirrors the dealer)
    pub blackjack_stand_on: u8,
}

impl Default for BotDecisionConfig {
    fn default() -> Self {
        Self {
            truco_call_probability: 0.10,
            accept_weight: 0.50,
            reject_weight: 0.20,
            raise_weight: 0.30,
            accept_weight_at_max: 0.70,
            reject_weight_at_max: 0.30,
            blackjack_stand_on: BLACKJACK_DEALER_STANDS_ON,
        }
    }
}

/// What a bot gets to see when it is asked for a move.
#[derive(Debug, Clone, Copy)]
pub struct BotDecisionContext<'a> {
    pub kind: GameKind,
    /// Actions the game currently accepts from the bot's seat.
    pub legal: &'a [PlayerAction],
    /// The bot's own cards.
    pub hand: &'a [Card],
}

/// Bot decision maker
#[derive(Debug)]
pub struct BotDecisionMaker {
    rng: StdRng,
    config: BotDecisionConfig,
}

impl BotDecisionMaker {
    /// Create a new decision maker with default config
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BotDecisionConfig::default())
    }

    /// Create a new decision maker with custom config
    #[must_use]
    pub fn with_config(config: BotDecisionConfig) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            config,
        }
    }

    /// Reproducible decisions for tests.
    #[must_use]
    pub fn with_seed(config: BotDecisionConfig, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BotDecisionConfig {
        &self.config
    }

    /// Pick one legal action, or `None` when the seat has nothing to do.
    pub fn decide_action(&mut self, ctx: &BotDecisionContext) -> Option<PlayerAction> {
        if ctx.legal.is_empty() {
            return None;
        }
        match ctx.kind {
            GameKind::Truco => self.decide_truco(ctx.legal),
            GameKind::Blackjack => self.decide_blackjack(ctx),
            GameKind::CrazyEights => self.decide_crazy_eights(ctx),
            GameKind::War | GameKind::Hearts => ctx.legal.choose(&mut self.rng).copied(),
        }
    }

    fn decide_truco(&mut self, legal: &[PlayerAction]) -> Option<PlayerAction> {
        let responses: Vec<TrucoResponse> = legal
            .iter()
            .filter_map(|action| match action {
                PlayerAction::RespondTruco { response } => Some(*response),
                _ => None,
            })
            .collect();
        if !responses.is_empty() {
            let response = self.choose_response(&responses);
            return Some(PlayerAction::RespondTruco { response });
        }

        if legal.contains(&PlayerAction::CallTruco)
            && self.rng.random_bool(self.config.truco_call_probability)
        {
            return Some(PlayerAction::CallTruco);
        }
        let plays: Vec<PlayerAction> = legal
            .iter()
            .copied()
            .filter(|action| matches!(action, PlayerAction::PlayCard { .. }))
            .collect();
        plays
            .choose(&mut self.rng)
            .or_else(|| legal.first())
            .copied()
    }

    /// Weighted pick among the legal responses.
    fn choose_response(&mut self, legal: &[TrucoResponse]) -> TrucoResponse {
        let can_raise = legal.contains(&TrucoResponse::Raise);
        let weighted: Vec<(TrucoResponse, f64)> = legal
            .iter()
            .map(|&response| {
                let weight = match (response, can_raise) {
                    (TrucoResponse::Accept, true) => self.config.accept_weight,
                    (TrucoResponse::Reject, true) => self.config.reject_weight,
                    (TrucoResponse::Accept, false) => self.config.accept_weight_at_max,
                    (TrucoResponse::Reject, false) => self.config.reject_weight_at_max,
                    (TrucoResponse::Raise, _) => self.config.raise_weight,
                };
                (response, weight.max(0.0))
            })
            .collect();

        // All-zero weights leave nothing to sample.
        weighted
            .choose_weighted(&mut self.rng, |(_, weight)| *weight)
            .map_or(TrucoResponse::Accept, |(response, _)| *response)
    }

    fn decide_blackjack(&mut self, ctx: &BotDecisionContext) -> Option<PlayerAction> {
        let wanted = if hand_total(ctx.hand) < self.config.blackjack_stand_on {
            PlayerAction::Hit
        } else {
            PlayerAction::Stand
        };
        if ctx.legal.contains(&wanted) {
            Some(wanted)
        } else {
            ctx.legal.first().copied()
        }
    }

    /// Play something if possible, declaring the suit the bot holds most of
    /// when the play is an eight. Draw only when stuck.
    fn decide_crazy_eights(&mut self, ctx: &BotDecisionContext) -> Option<PlayerAction> {
        let mut plays: Vec<usize> = ctx
            .legal
            .iter()
            .filter_map(|action| match action {
                PlayerAction::PlayCard { index, .. } => Some(*index),
                _ => None,
            })
            .collect();
        plays.dedup();

        let Some(&index) = plays.choose(&mut self.rng) else {
            return ctx.legal.first().copied();
        };
        let is_eight = ctx.hand.get(index).is_some_and(|c| c.rank == Rank::Eight);
        let declared_suit = is_eight.then(|| favourite_suit(ctx.hand, index));
        Some(PlayerAction::PlayCard {
            index,
            declared_suit,
        })
    }
}

impl Default for BotDecisionMaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Most common suit in `hand`, ignoring the card at `skip`.
fn favourite_suit(hand: &[Card], skip: usize) -> Suit {
    Suit::ALL
        .into_iter()
        .max_by_key(|&suit| {
            hand.iter()
                .enumerate()
                .filter(|&(i, c)| i != skip && c.suit == suit)
                .count()
        })
        .unwrap_or(Suit::Club)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maker(seed: u64) -> BotDecisionMaker {
        BotDecisionMaker::with_seed(BotDecisionConfig::default(), seed)
    }

    fn respond(response: TrucoResponse) -> PlayerAction {
        PlayerAction::RespondTruco { response }
    }

    fn c(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit, rank.pip())
    }

    #[test]
    fn test_no_legal_actions() {
        let mut bot = maker(1);
        let ctx = BotDecisionContext {
            kind: GameKind::Truco,
            legal: &[],
            hand: &[],
        };
        assert_eq!(bot.decide_action(&ctx), None);
    }

    #[test]
    fn test_truco_bot_mostly_plays_cards() {
        let mut bot = maker(7);
        let legal = [
            PlayerAction::play(0),
            PlayerAction::play(1),
            PlayerAction::play(2),
            PlayerAction::CallTruco,
        ];
        let ctx = BotDecisionContext {
            kind: GameKind::Truco,
            legal: &legal,
            hand: &[],
        };
        let calls = (0..1000)
            .filter(|_| bot.decide_action(&ctx) == Some(PlayerAction::CallTruco))
            .count();
        // ~10% with generous slack
        assert!(calls > 40 && calls < 180, "calls = {calls}");
    }

    #[test]
    fn test_truco_bot_never_calls_when_illegal() {
        let mut bot = BotDecisionMaker::with_seed(
            BotDecisionConfig {
                truco_call_probability: 1.0,
                ..BotDecisionConfig::default()
            },
            3,
        );
        let legal = [PlayerAction::play(0)];
        let ctx = BotDecisionContext {
            kind: GameKind::Truco,
            legal: &legal,
            hand: &[],
        };
        for _ in 0..50 {
            assert_eq!(bot.decide_action(&ctx), Some(PlayerAction::play(0)));
        }
    }

    #[test]
    fn test_response_weights_below_max() {
        let mut bot = maker(11);
        let legal = [
            respond(TrucoResponse::Accept),
            respond(TrucoResponse::Reject),
            respond(TrucoResponse::Raise),
        ];
        let ctx = BotDecisionContext {
            kind: GameKind::Truco,
            legal: &legal,
            hand: &[],
        };
        let mut counts = [0usize; 3];
        for _ in 0..3000 {
            match bot.decide_action(&ctx) {
                Some(PlayerAction::RespondTruco { response }) => {
                    counts[usize::from(u8::from(response)) - 1] += 1;
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        // accept 50%, reject 20%, raise 30%
        assert!(counts[0] > 1300 && counts[0] < 1700, "{counts:?}");
        assert!(counts[1] > 450 && counts[1] < 750, "{counts:?}");
        assert!(counts[2] > 750 && counts[2] < 1050, "{counts:?}");
    }

    #[test]
    fn test_response_at_max_never_raises() {
        let mut bot = maker(5);
        let legal = [respond(TrucoResponse::Accept), respond(TrucoResponse::Reject)];
        let ctx = BotDecisionContext {
            kind: GameKind::Truco,
            legal: &legal,
            hand: &[],
        };
        let mut accepts = 0;
        for _ in 0..1000 {
            let action = bot.decide_action(&ctx).unwrap();
            assert_ne!(action, respond(TrucoResponse::Raise));
            if action == respond(TrucoResponse::Accept) {
                accepts += 1;
            }
        }
        assert!(accepts > 600 && accepts < 800, "accepts = {accepts}");
    }

    #[test]
    fn test_response_without_weights_accepts() {
        let mut bot = BotDecisionMaker::with_seed(
            BotDecisionConfig {
                accept_weight: 0.0,
                reject_weight: -1.0,
                raise_weight: 0.0,
                ..BotDecisionConfig::default()
            },
            9,
        );
        let legal = [
            respond(TrucoResponse::Reject),
            respond(TrucoResponse::Raise),
            respond(TrucoResponse::Accept),
        ];
        let ctx = BotDecisionContext {
            kind: GameKind::Truco,
            legal: &legal,
            hand: &[],
        };
        for _ in 0..20 {
            assert_eq!(bot.decide_action(&ctx), Some(respond(TrucoResponse::Accept)));
        }
    }

    #[test]
    fn test_response_follows_the_only_weighted_option() {
        let mut bot = BotDecisionMaker::with_seed(
            BotDecisionConfig {
                accept_weight: 0.0,
                reject_weight: 1.0,
                raise_weight: 0.0,
                ..BotDecisionConfig::default()
            },
            4,
        );
        let legal = [
            respond(TrucoResponse::Accept),
            respond(TrucoResponse::Reject),
            respond(TrucoResponse::Raise),
        ];
        let ctx = BotDecisionContext {
            kind: GameKind::Truco,
            legal: &legal,
            hand: &[],
        };
        for _ in 0..50 {
            assert_eq!(bot.decide_action(&ctx), Some(respond(TrucoResponse::Reject)));
        }
    }

    #[test]
    fn test_blackjack_hits_below_seventeen() {
        let mut bot = maker(2);
        let legal = [PlayerAction::Hit, PlayerAction::Stand];
        let low = [c(Rank::Ten, Suit::Club), c(Rank::Six, Suit::Club)];
        let high = [c(Rank::Ten, Suit::Club), c(Rank::Seven, Suit::Club)];
        let ctx = BotDecisionContext {
            kind: GameKind::Blackjack,
            legal: &legal,
            hand: &low,
        };
        assert_eq!(bot.decide_action(&ctx), Some(PlayerAction::Hit));
        let ctx = BotDecisionContext { hand: &high, ..ctx };
        assert_eq!(bot.decide_action(&ctx), Some(PlayerAction::Stand));
    }

    #[test]
    fn test_crazy_eights_prefers_playing_and_declares() {
        let mut bot = maker(4);
        let hand = [
            c(Rank::Eight, Suit::Club),
            c(Rank::Two, Suit::Heart),
            c(Rank::Three, Suit::Heart),
        ];
        let mut legal: Vec<PlayerAction> = Suit::ALL
            .iter()
            .map(|&suit| PlayerAction::PlayCard {
                index: 0,
                declared_suit: Some(suit),
            })
            .collect();
        legal.push(PlayerAction::Draw);
        let ctx = BotDecisionContext {
            kind: GameKind::CrazyEights,
            legal: &legal,
            hand: &hand,
        };
        for _ in 0..20 {
            assert_eq!(
                bot.decide_action(&ctx),
                Some(PlayerAction::PlayCard {
                    index: 0,
                    declared_suit: Some(Suit::Heart)
                })
            );
        }

        let only_draw = [PlayerAction::Draw];
        let ctx = BotDecisionContext {
            legal: &only_draw,
            ..ctx
        };
        assert_eq!(bot.decide_action(&ctx), Some(PlayerAction::Draw));
    }
}
