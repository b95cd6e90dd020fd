use serde::Serialize;

use super::cards::{Card, Suit};
use super::entities::{PlayedCard, Player, PlayerId, SeatIndex, Team, Username};
use super::truco_call::TrucoState;
use super::{Continuation, GameKind, Phase};

/// What one member may see of a seated player.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: Username,
    pub seat: SeatIndex,
    pub team: Option<Team>,
    pub is_bot: bool,
    pub is_active: bool,
    pub hand_size: usize,
    pub score: i32,
    /// Only present for the viewer's own seat, or in face-up variants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand: Option<Vec<Card>>,
}

impl PlayerView {
    #[must_use]
    pub fn new(player: &Player, reveal_hand: bool) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            seat: player.seat,
            team: player.team,
            is_bot: player.is_bot,
            is_active: player.is_active,
            hand_size: player.hand.len(),
            score: player.score,
            hand: reveal_hand.then(|| player.hand.clone()),
        }
    }
}

/// Variant-specific part of a [`GameView`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum VariantView {
    Truco {
        game_value: u8,
        truco_state: Option<TrucoState>,
        /// Seat expected to answer a pending call.
        responder: Option<SeatIndex>,
        scores: [u8; 2],
        games: [u32; 2],
        sets: [u32; 2],
        is_draw: bool,
        round_number: u8,
    },
    War {
        pile_sizes: Vec<usize>,
        war_pot: usize,
        rounds_played: u32,
    },
    CrazyEights {
        top_card: Option<Card>,
        active_suit: Option<Suit>,
        draw_pile: usize,
    },
    Hearts {
        hearts_broken: bool,
        led_suit: Option<Suit>,
        trick_points: Vec<i32>,
    },
    Blackjack {
        dealer: Vec<Card>,
        dealer_total: Option<u8>,
        hidden_cards: usize,
        outcomes: Vec<Option<i32>>,
    },
}

/// Snapshot of a game from one seat's perspective.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub kind: GameKind,
    pub phase: Phase,
    pub current_player: Option<SeatIndex>,
    pub local_player_index: Option<SeatIndex>,
    pub hand_number: u32,
    pub players: Vec<PlayerView>,
    /// Cards on the table for the round or trick in progress.
    pub table: Vec<PlayedCard>,
    pub pending: Option<Continuation>,
    pub details: VariantView,
}

/// Player views for `viewer`, revealing only the viewer's own hand unless
/// `face_up` is set.
#[must_use]
pub fn player_views(players: &[Player], viewer: Option<SeatIndex>, face_up: bool) -> Vec<PlayerView> {
    players
        .iter()
        .map(|p| PlayerView::new(p, face_up || viewer == Some(p.seat)))
        .collect()
}
