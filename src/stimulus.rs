//! Stimulus domain and reference deck.
//!
//! [`StimulusDomain`] names the values of each dimension (the palette). The
//! classic domain is 4 colors × 4 shapes × numbers 1..=4.
//!
//! [`ReferenceDeck`] holds the 4 fixed target cards. On every dimension the
//! reference values form a permutation of 0..4, so each value is carried by
//! exactly one reference card. A stimulus therefore always has exactly one
//! matching reference card per dimension; [`ReferenceDeck::matching_index`]
//! is a table lookup.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::{NUM_DIMENSIONS, NUM_REFERENCE_CARDS, VALUES_PER_DIMENSION};
use crate::error::{Result, WcstError};
use crate::types::{Card, Dimension};

/// Display labels for each dimension's values, indexed by value index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StimulusDomain {
    pub colors: Vec<String>,
    pub shapes: Vec<String>,
    pub numbers: Vec<String>,
}

impl Default for StimulusDomain {
    fn default() -> Self {
        Self::classic()
    }
}

impl StimulusDomain {
    /// Red/green/yellow/blue × triangle/star/cross/circle × 1..=4.
    pub fn classic() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        Self {
            colors: owned(&["red", "green", "yellow", "blue"]),
            shapes: owned(&["triangle", "star", "cross", "circle"]),
            numbers: owned(&["1", "2", "3", "4"]),
        }
    }

    pub fn values(&self, dim: Dimension) -> &[String] {
        match dim {
            Dimension::Color => &self.colors,
            Dimension::Shape => &self.shapes,
            Dimension::Number => &self.numbers,
        }
    }

    /// Label of value index `value` on `dim`.
    pub fn label(&self, dim: Dimension, value: u8) -> Option<&str> {
        self.values(dim).get(value as usize).map(String::as_str)
    }

    /// Inverse of [`label`](Self::label).
    pub fn value_of(&self, dim: Dimension, label: &str) -> Option<u8> {
        self.values(dim)
            .iter()
            .position(|v| v == label)
            .map(|i| i as u8)
    }

    /// Human-readable card description, e.g. `"2 green star"`.
    pub fn describe(&self, card: &Card) -> String {
        format!(
            "{} {} {}",
            self.label(Dimension::Number, card.number).unwrap_or("?"),
            self.label(Dimension::Color, card.color).unwrap_or("?"),
            self.label(Dimension::Shape, card.shape).unwrap_or("?"),
        )
    }

    /// Each dimension needs exactly 4 distinct, non-empty labels.
    pub fn validate(&self) -> Result<()> {
        for dim in Dimension::ALL {
            let values = self.values(dim);
            if values.len() != VALUES_PER_DIMENSION {
                return Err(WcstError::InvalidDomain(format!(
                    "{} needs {} values, got {}",
                    dim,
                    VALUES_PER_DIMENSION,
                    values.len()
                )));
            }
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(WcstError::InvalidDomain(format!("{} has an empty label", dim)));
            }
            let distinct: HashSet<&String> = values.iter().collect();
            if distinct.len() != values.len() {
                return Err(WcstError::InvalidDomain(format!(
                    "{} labels are not distinct",
                    dim
                )));
            }
        }
        Ok(())
    }
}

/// The four fixed target cards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Card>", into = "Vec<Card>")]
pub struct ReferenceDeck {
    cards: [Card; NUM_REFERENCE_CARDS],
    /// `by_value[dim][value]` = index of the reference card carrying `value` on `dim`.
    by_value: [[u8; VALUES_PER_DIMENSION]; NUM_DIMENSIONS],
}

impl Default for ReferenceDeck {
    fn default() -> Self {
        Self::classic()
    }
}

impl ReferenceDeck {
    /// 1 red triangle, 2 green stars, 3 yellow crosses, 4 blue circles.
    pub fn classic() -> Self {
        let cards = [
            Card::new(0, 0, 0),
            Card::new(1, 1, 1),
            Card::new(2, 2, 2),
            Card::new(3, 3, 3),
        ];
        Self {
            cards,
            by_value: [[0, 1, 2, 3]; NUM_DIMENSIONS],
        }
    }

    /// Build from arbitrary cards; every dimension must be a permutation of 0..4.
    pub fn new(cards: [Card; NUM_REFERENCE_CARDS]) -> Result<Self> {
        let mut by_value = [[u8::MAX; VALUES_PER_DIMENSION]; NUM_DIMENSIONS];
        for (i, card) in cards.iter().enumerate() {
            for dim in Dimension::ALL {
                let v = card.attribute(dim) as usize;
                if v >= VALUES_PER_DIMENSION {
                    return Err(WcstError::InvalidDomain(format!(
                        "reference card {} has {} value {} out of range",
                        i, dim, v
                    )));
                }
                let slot = &mut by_value[dim.index()][v];
                if *slot != u8::MAX {
                    return Err(WcstError::InvalidDomain(format!(
                        "reference cards {} and {} share {} value {}",
                        slot, i, dim, v
                    )));
                }
                *slot = i as u8;
            }
        }
        Ok(Self { cards, by_value })
    }

    pub fn cards(&self) -> &[Card; NUM_REFERENCE_CARDS] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    /// Index of the reference card sharing `stimulus`'s value on `dim`.
    #[inline]
    pub fn matching_index(&self, stimulus: &Card, dim: Dimension) -> usize {
        self.by_value[dim.index()][stimulus.attribute(dim) as usize] as usize
    }

    /// A stimulus is unambiguous iff the reference cards it matches on color,
    /// shape and number are pairwise distinct. Then every reference card is
    /// consistent with at most one rule, and the stimulus never equals a
    /// reference card.
    pub fn is_unambiguous(&self, stimulus: &Card) -> bool {
        let c = self.matching_index(stimulus, Dimension::Color);
        let s = self.matching_index(stimulus, Dimension::Shape);
        let n = self.matching_index(stimulus, Dimension::Number);
        c != s && s != n && c != n
    }

    /// Dimensions under which selecting reference `index` would be correct.
    pub fn rules_consistent_with(&self, stimulus: &Card, index: usize) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|&d| self.matching_index(stimulus, d) == index)
            .collect()
    }
}

impl TryFrom<Vec<Card>> for ReferenceDeck {
    type Error = WcstError;

    fn try_from(cards: Vec<Card>) -> Result<Self> {
        let arr: [Card; NUM_REFERENCE_CARDS] = cards.try_into().map_err(|v: Vec<Card>| {
            WcstError::InvalidDomain(format!(
                "reference deck needs {} cards, got {}",
                NUM_REFERENCE_CARDS,
                v.len()
            ))
        })?;
        Self::new(arr)
    }
}

impl From<ReferenceDeck> for Vec<Card> {
    fn from(deck: ReferenceDeck) -> Self {
        deck.cards.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_domain_valid() {
        let domain = StimulusDomain::classic();
        domain.validate().unwrap();
        assert_eq!(domain.label(Dimension::Color, 1), Some("green"));
        assert_eq!(domain.value_of(Dimension::Shape, "cross"), Some(2));
        assert_eq!(domain.value_of(Dimension::Shape, "hexagon"), None);
        assert_eq!(domain.describe(&Card::new(1, 1, 1)), "2 green star");
    }

    #[test]
    fn test_domain_rejects_duplicates_and_wrong_length() {
        let mut domain = StimulusDomain::classic();
        domain.colors[3] = "red".into();
        assert!(matches!(domain.validate(), Err(WcstError::InvalidDomain(_))));

        let mut domain = StimulusDomain::classic();
        domain.shapes.pop();
        assert!(matches!(domain.validate(), Err(WcstError::InvalidDomain(_))));
    }

    #[test]
    fn test_alternate_palette_accepted() {
        let mut domain = StimulusDomain::classic();
        domain.colors = vec!["cyan".into(), "magenta".into(), "orange".into(), "black".into()];
        domain.validate().unwrap();
    }

    #[test]
    fn test_classic_reference_matches_new() {
        let built = ReferenceDeck::new(*ReferenceDeck::classic().cards()).unwrap();
        assert_eq!(built, ReferenceDeck::classic());
    }

    #[test]
    fn test_reference_rejects_shared_value() {
        let cards = [
            Card::new(0, 0, 0),
            Card::new(0, 1, 1),
            Card::new(2, 2, 2),
            Card::new(3, 3, 3),
        ];
        assert!(ReferenceDeck::new(cards).is_err());
    }

    #[test]
    fn test_permuted_reference_lookup() {
        let deck = ReferenceDeck::new([
            Card::new(0, 3, 1),
            Card::new(1, 2, 0),
            Card::new(2, 1, 3),
            Card::new(3, 0, 2),
        ])
        .unwrap();
        let stim = Card::new(2, 0, 1);
        assert_eq!(deck.matching_index(&stim, Dimension::Color), 2);
        assert_eq!(deck.matching_index(&stim, Dimension::Shape), 3);
        assert_eq!(deck.matching_index(&stim, Dimension::Number), 0);
        assert!(deck.is_unambiguous(&stim));
    }

    #[test]
    fn test_ambiguity_detection() {
        let deck = ReferenceDeck::classic();
        // Matches card 0 on both color and shape.
        assert!(!deck.is_unambiguous(&Card::new(0, 0, 2)));
        // Identical to a reference card.
        assert!(!deck.is_unambiguous(&Card::new(3, 3, 3)));
        assert!(deck.is_unambiguous(&Card::new(0, 1, 2)));
        assert_eq!(
            deck.rules_consistent_with(&Card::new(0, 1, 2), 1),
            vec![Dimension::Shape]
        );
        assert!(deck.rules_consistent_with(&Card::new(0, 1, 2), 3).is_empty());
    }

    #[test]
    fn test_reference_serde_validates() {
        let json = serde_json::to_string(&ReferenceDeck::classic()).unwrap();
        let back: ReferenceDeck = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ReferenceDeck::classic());

        let bad = r#"[{"color":0,"shape":0,"number":0},{"color":0,"shape":1,"number":1}]"#;
        assert!(serde_json::from_str::<ReferenceDeck>(bad).is_err());
    }
}
