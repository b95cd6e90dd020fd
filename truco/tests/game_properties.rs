/// Property-based tests for the deck, the round engine, the truco ladder and
/// turn order, using proptest.
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};
use std::collections::HashSet;
use truco::game::{
    CallOutcome, Card, CardGame, Deck, GameEvent, GameInstance, GameKind, PlayedCard, Player,
    PlayerAction, Rank, RoundResolver, Suit, Team, TrucoResponse, TrucoStakes, Username,
    ValueTable, constants::TRUCO_MAX_VALUE,
};
use uuid::Uuid;

fn player(seat: usize) -> Player {
    Player::new(Uuid::new_v4(), Username::new(&format!("p{seat}")), seat, false)
        .with_team(Team::for_seat(seat))
}

fn play(value: u8, seat: usize) -> PlayedCard {
    PlayedCard::new(Card::new(Rank::Five, Suit::Spade, value), &player(seat))
}

fn response_strategy() -> impl Strategy<Value = TrucoResponse> {
    prop_oneof![
        Just(TrucoResponse::Accept),
        Just(TrucoResponse::Reject),
        Just(TrucoResponse::Raise),
    ]
}

proptest! {
    #[test]
    fn test_shuffle_then_deal_partitions_the_deck(
        seed in any::<u64>(),
        hands in prop::sample::select(vec![1usize, 2, 4, 5, 8, 10]),
        standard in any::<bool>(),
    ) {
        let table = if standard { ValueTable::standard() } else { ValueTable::truco() };
        let mut deck = Deck::from_table(&table);
        deck.shuffle(&mut StdRng::seed_from_u64(seed));
        let per_hand = table.len() / hands;
        let dealt = deck.deal(hands, per_hand).unwrap();

        let mut seen = HashSet::new();
        for hand in &dealt {
            prop_assert_eq!(hand.len(), per_hand);
            for card in hand {
                prop_assert!(seen.insert((card.rank, card.suit)), "duplicate {}", card);
            }
        }
        for card in deck.cards() {
            prop_assert!(seen.insert((card.rank, card.suit)));
        }
        prop_assert_eq!(seen.len(), table.len());
    }

    #[test]
    fn test_deal_never_invents_cards(hands in 1usize..6, per_hand in 0usize..12) {
        let table = ValueTable::truco();
        let mut deck = Deck::from_table(&table);
        match deck.deal(hands, per_hand) {
            Ok(dealt) => {
                prop_assert!(hands * per_hand <= table.len());
                prop_assert_eq!(deck.len(), table.len() - hands * per_hand);
                prop_assert_eq!(dealt.len(), hands);
            }
            Err(_) => {
                prop_assert!(hands * per_hand > table.len());
                prop_assert_eq!(deck.len(), table.len());
            }
        }
    }

    #[test]
    fn test_lower_team_minimum_takes_the_round(
        a in prop::collection::vec(1u8..=40, 2),
        b in prop::collection::vec(1u8..=40, 2),
    ) {
        let played = vec![play(a[0], 0), play(b[0], 1), play(a[1], 2), play(b[1], 3)];
        let (min_a, min_b) = (a[0].min(a[1]), b[0].min(b[1]));
        let winner = RoundResolver::new().decide(&played).unwrap();
        match min_a.cmp(&min_b) {
            std::cmp::Ordering::Less => prop_assert_eq!(winner.map(|w| w.team), Some(Team::A)),
            std::cmp::Ordering::Greater => prop_assert_eq!(winner.map(|w| w.team), Some(Team::B)),
            std::cmp::Ordering::Equal => prop_assert_eq!(winner, None),
        }
    }

    #[test]
    fn test_ties_follow_last_decided_round(
        prior in prop::option::of(any::<bool>()),
        tie in 1u8..=40,
        ties in 1usize..3,
    ) {
        let mut resolver = RoundResolver::new();
        let expected = prior.map(|a_wins| {
            let (va, vb) = if a_wins { (1, 2) } else { (2, 1) };
            let team = resolver.decide(&[play(va, 0), play(vb, 1)]).unwrap().map(|w| w.team);
            team.unwrap_or(Team::A)
        });
        for _ in 0..ties {
            let winner = resolver.decide(&[play(tie, 0), play(tie, 1)]).unwrap();
            prop_assert_eq!(winner.map(|w| w.team), expected);
        }
        resolver.reset();
        prop_assert_eq!(resolver.decide(&[play(tie, 0), play(tie, 1)]).unwrap(), None);
    }

    #[test]
    fn test_ladder_never_passes_twelve(responses in prop::collection::vec(response_strategy(), 1..40)) {
        let mut stakes = TrucoStakes::new();
        let mut caller = 0usize;
        stakes.call(caller, Team::for_seat(caller), caller + 1).unwrap();

        for response in responses {
            let Some(state) = stakes.state() else {
                // Resolved: the other team calls next, if the hand allows it.
                if stakes.value() >= TRUCO_MAX_VALUE {
                    prop_assert!(!stakes.can_call());
                    break;
                }
                caller = 1 - caller;
                stakes.call(caller, Team::for_seat(caller), 1 - caller).unwrap();
                continue;
            };
            prop_assert!(state.potential_value <= TRUCO_MAX_VALUE);
            let seat = 1 - caller;
            let team = state.awaiting_team();
            match stakes.respond(seat, team, response) {
                Ok(CallOutcome::Raised { state: next, .. }) => {
                    prop_assert_eq!(next.potential_value, state.potential_value + 3);
                    prop_assert!(next.potential_value <= TRUCO_MAX_VALUE);
                    caller = seat;
                }
                Ok(CallOutcome::Accepted { value, .. }) => {
                    prop_assert_eq!(value, state.potential_value);
                }
                Ok(CallOutcome::Rejected { winner, value }) => {
                    prop_assert_eq!(winner, state.caller_team);
                    prop_assert_eq!(value, state.potential_value.saturating_sub(3).max(1));
                }
                Err(_) => {
                    prop_assert_eq!(response, TrucoResponse::Raise);
                    prop_assert_eq!(state.potential_value, TRUCO_MAX_VALUE);
                    prop_assert_eq!(stakes.state(), Some(state));
                }
            }
        }
    }

    #[test]
    fn test_turn_advances_one_seat_and_freezes_during_calls(
        seed in any::<u64>(),
        players in prop::sample::select(vec![2usize, 4]),
        picks in prop::collection::vec(any::<usize>(), 1..80),
    ) {
        let seats = (0..players).map(|i| (Uuid::new_v4(), Username::new(&format!("p{i}")), false));
        let mut game = GameInstance::with_seed(GameKind::Truco, seats, seed).unwrap();
        game.start().unwrap();
        game.drain_events();

        for pick in picks {
            if game.continuation().is_some() {
                game.resume().unwrap();
                game.drain_events();
                continue;
            }
            let Some(seat) = game.awaiting_seat() else { break };
            let legal = game.legal_actions(seat);
            prop_assert!(!legal.is_empty());
            let action = legal[pick % legal.len()];
            let before = game.view_for(None).current_player;
            game.apply(seat, action).unwrap();

            for event in game.drain_events() {
                if let GameEvent::CardPlayed { seat, next_player: Some(next), .. } = event {
                    prop_assert_eq!(next, (seat + 1) % players);
                }
            }
            let is_accept = action == PlayerAction::RespondTruco { response: TrucoResponse::Accept };
            let is_raise = action == PlayerAction::RespondTruco { response: TrucoResponse::Raise };
            if action == PlayerAction::CallTruco || is_accept || is_raise {
                prop_assert_eq!(game.view_for(None).current_player, before);
            }
        }
    }
}

#[test]
fn test_shuffle_moves_cards_around() {
    let table = ValueTable::truco();
    let first = Deck::from_table(&table).cards()[0];
    let mut rng = StdRng::seed_from_u64(2024);
    let trials = 4000;
    let mut positions = vec![0usize; table.len()];
    for _ in 0..trials {
        let mut deck = Deck::from_table(&table);
        deck.shuffle(&mut rng);
        let pos = deck.cards().iter().position(|c| *c == first).unwrap();
        positions[pos] += 1;
    }
    let expected = trials / table.len();
    assert!(positions.iter().all(|&n| n > 0), "{positions:?}");
    assert!(
        positions.iter().all(|&n| n > expected / 2 && n < expected * 2),
        "{positions:?}"
    );
}
