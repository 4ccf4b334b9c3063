//! Core value types: sorting dimensions and cards.
//!
//! A [`Card`] stores value *indices* (0..4) per dimension, not labels. Labels
//! ("red", "star", ...) live in [`crate::stimulus::StimulusDomain`] so the same
//! engine runs unchanged over any palette.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::NUM_DIMENSIONS;

/// A sorting dimension. The hidden rule is always one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Color,
    Shape,
    Number,
}

/// The hidden sorting rule is a dimension.
pub type Rule = Dimension;

impl Dimension {
    pub const ALL: [Dimension; NUM_DIMENSIONS] =
        [Dimension::Color, Dimension::Shape, Dimension::Number];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Color => "color",
            Dimension::Shape => "shape",
            Dimension::Number => "number",
        }
    }

    /// Position in [`Dimension::ALL`].
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Dimension::Color => 0,
            Dimension::Shape => 1,
            Dimension::Number => 2,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "color" | "colour" => Ok(Dimension::Color),
            "shape" | "form" => Ok(Dimension::Shape),
            "number" => Ok(Dimension::Number),
            other => Err(format!("unknown dimension '{}'", other)),
        }
    }
}

/// A card: one value index per dimension. Equal iff all three match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    pub color: u8,
    pub shape: u8,
    pub number: u8,
}

impl Card {
    pub const fn new(color: u8, shape: u8, number: u8) -> Self {
        Self {
            color,
            shape,
            number,
        }
    }

    /// Value index on dimension `dim`.
    #[inline]
    pub fn attribute(&self, dim: Dimension) -> u8 {
        match dim {
            Dimension::Color => self.color,
            Dimension::Shape => self.shape,
            Dimension::Number => self.number,
        }
    }

    /// True if both cards share the same value on `dim`.
    #[inline]
    pub fn matches_on(&self, other: &Card, dim: Dimension) -> bool {
        self.attribute(dim) == other.attribute(dim)
    }

    /// Dimensions on which the two cards agree, in [`Dimension::ALL`] order.
    pub fn matching_dimensions(&self, other: &Card) -> Vec<Dimension> {
        Dimension::ALL
            .into_iter()
            .filter(|&d| self.matches_on(other, d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_parse_roundtrip() {
        for d in Dimension::ALL {
            assert_eq!(d.as_str().parse::<Dimension>().unwrap(), d);
        }
        assert_eq!(" Colour ".parse::<Dimension>().unwrap(), Dimension::Color);
        assert!("texture".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_dimension_index_matches_all_order() {
        for (i, d) in Dimension::ALL.iter().enumerate() {
            assert_eq!(d.index(), i);
        }
    }

    #[test]
    fn test_card_matches_on() {
        let a = Card::new(0, 1, 2);
        let b = Card::new(0, 3, 2);
        assert!(a.matches_on(&b, Dimension::Color));
        assert!(!a.matches_on(&b, Dimension::Shape));
        assert!(a.matches_on(&b, Dimension::Number));
        assert_eq!(
            a.matching_dimensions(&b),
            vec![Dimension::Color, Dimension::Number]
        );
    }

    #[test]
    fn test_card_equality_requires_all_attributes() {
        assert_eq!(Card::new(1, 2, 3), Card::new(1, 2, 3));
        assert_ne!(Card::new(1, 2, 3), Card::new(1, 2, 0));
        assert_eq!(Card::new(1, 2, 3).matching_dimensions(&Card::new(1, 2, 3)).len(), 3);
    }

    #[test]
    fn test_dimension_serde_lowercase() {
        let json = serde_json::to_string(&Dimension::Shape).unwrap();
        assert_eq!(json, "\"shape\"");
        let back: Dimension = serde_json::from_str("\"number\"").unwrap();
        assert_eq!(back, Dimension::Number);
    }
}
