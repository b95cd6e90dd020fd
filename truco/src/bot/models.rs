//! Bot identities.

use rand::Rng;

use crate::game::{SeatIndex, Username};

const NAME_PREFIXES: [&str; 10] = [
    "Bot", "Card", "Truco", "Manilha", "Lucky", "Deck", "Trick", "Ace", "Joker", "Dealer",
];

const NAME_SUFFIXES: [&str; 10] = [
    "Master", "Pro", "King", "Queen", "Jack", "Shark", "Fish", "Player", "Ace", "Bluffer",
];

/// Random display name for a bot, suffixed with its seat so two bots in
/// one room never share a name.
pub fn bot_name<R: Rng + ?Sized>(seat: SeatIndex, rng: &mut R) -> Username {
    let prefix = NAME_PREFIXES[rng.random_range(0..NAME_PREFIXES.len())];
    let suffix = NAME_SUFFIXES[rng.random_range(0..NAME_SUFFIXES.len())];
    Username::new(&format!("{prefix}{suffix}_{seat}"))
}
