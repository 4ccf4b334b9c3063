//! Stimulus deck generation.
//!
//! The valid stimulus space is enumerated once per session: every color ×
//! shape × number combination that is unambiguous against the reference deck
//! (see [`ReferenceDeck::is_unambiguous`]). With any valid reference deck this
//! is exactly 4 × 3 × 2 = 24 cards. Draw `i` picks uniformly from that pool
//! using a SplitMix64 stream keyed by `(seed, i)`, so there is no
//! reject-and-retry loop and a draw is a pure function of the seed and index.

use crate::constants::{DECK_STREAM, VALUES_PER_DIMENSION};
use crate::prng::SplitMix64;
use crate::stimulus::ReferenceDeck;
use crate::types::Card;

pub struct DeckGenerator {
    seed: u64,
    pool: Vec<Card>,
}

impl DeckGenerator {
    pub fn new(reference: &ReferenceDeck, seed: u64) -> Self {
        Self {
            seed,
            pool: valid_stimuli(reference),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// All cards a draw can return, in (color, shape, number) order.
    pub fn pool(&self) -> &[Card] {
        &self.pool
    }

    /// Stimulus for draw `draw_index`.
    pub fn card_at(&self, draw_index: u64) -> Card {
        let mut rng = SplitMix64::keyed(self.seed, DECK_STREAM, draw_index);
        self.pool[rng.below(self.pool.len())]
    }

    /// Infinite stimulus sequence starting at draw 0. Bound it with `take`.
    pub fn iter(&self) -> Draws<'_> {
        Draws {
            deck: self,
            next_index: 0,
        }
    }
}

/// Iterator over successive draws of a [`DeckGenerator`].
pub struct Draws<'a> {
    deck: &'a DeckGenerator,
    next_index: u64,
}

impl Iterator for Draws<'_> {
    type Item = Card;

    fn next(&mut self) -> Option<Card> {
        let card = self.deck.card_at(self.next_index);
        self.next_index += 1;
        Some(card)
    }
}

/// Enumerate the unambiguous stimulus space for `reference`.
pub fn valid_stimuli(reference: &ReferenceDeck) -> Vec<Card> {
    let n = VALUES_PER_DIMENSION as u8;
    let mut pool = Vec::with_capacity(24);
    for color in 0..n {
        for shape in 0..n {
            for number in 0..n {
                let card = Card::new(color, shape, number);
                if reference.is_unambiguous(&card) {
                    pool.push(card);
                }
            }
        }
    }
    pool
}
