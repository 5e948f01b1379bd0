//! Occurrence bounds (`minOccurs` / `maxOccurs`)
//!
//! Every content-model node carries a bound. Element bounds limit how many
//! children a leaf may hold; indicator bounds limit how many repetitions of a
//! sequence, choice or group may be materialized.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::content::errors::CompileError;

/// Upper limit of an occurrence bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxOccurs {
    /// Finite upper limit
    Bounded(u32),
    /// `maxOccurs="unbounded"`
    Unbounded,
}

impl MaxOccurs {
    /// True if `n` does not exceed this limit
    pub fn admits(&self, n: u32) -> bool {
        match self {
            MaxOccurs::Bounded(max) => n <= *max,
            MaxOccurs::Unbounded => true,
        }
    }

    /// Finite value, if any
    pub fn as_finite(&self) -> Option<u32> {
        match self {
            MaxOccurs::Bounded(max) => Some(*max),
            MaxOccurs::Unbounded => None,
        }
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxOccurs::Bounded(max) => write!(f, "{}", max),
            MaxOccurs::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// A `(min, max)` occurrence bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bound {
    pub min: u32,
    pub max: MaxOccurs,
}

impl Default for Bound {
    fn default() -> Self {
        Self::ONCE
    }
}

impl Bound {
    /// Exactly once (the XSD default)
    pub const ONCE: Bound = Bound { min: 1, max: MaxOccurs::Bounded(1) };
    /// Zero or one
    pub const OPTIONAL: Bound = Bound { min: 0, max: MaxOccurs::Bounded(1) };
    /// Zero or more
    pub const ANY: Bound = Bound { min: 0, max: MaxOccurs::Unbounded };

    /// Create a bound, rejecting `min > max`
    pub fn new(min: u32, max: MaxOccurs) -> Result<Self, CompileError> {
        if !max.admits(min) {
            return Err(CompileError::InvalidOccurs {
                attribute: "minOccurs".to_string(),
                value: format!("{} > maxOccurs {}", min, max),
            });
        }
        Ok(Self { min, max })
    }

    /// Finite bound `min..=max`
    pub fn range(min: u32, max: u32) -> Result<Self, CompileError> {
        Self::new(min, MaxOccurs::Bounded(max))
    }

    /// `min..unbounded`
    pub fn at_least(min: u32) -> Self {
        Self { min, max: MaxOccurs::Unbounded }
    }

    /// Parse `minOccurs` / `maxOccurs` attribute text (defaults 1 / 1)
    pub fn from_attributes(min: Option<&str>, max: Option<&str>) -> Result<Self, CompileError> {
        let min_value = match min {
            Some(text) => text.trim().parse::<u32>().map_err(|_| CompileError::InvalidOccurs {
                attribute: "minOccurs".to_string(),
                value: text.to_string(),
            })?,
            None => 1,
        };

        let max_value = match max.map(str::trim) {
            Some("unbounded") => MaxOccurs::Unbounded,
            Some(text) => text.parse::<u32>().map(MaxOccurs::Bounded).map_err(|_| {
                CompileError::InvalidOccurs {
                    attribute: "maxOccurs".to_string(),
                    value: text.to_string(),
                }
            })?,
            None => MaxOccurs::Bounded(1),
        };

        Self::new(min_value, max_value)
    }

    /// True if `min <= n <= max`
    pub fn contains(&self, n: u32) -> bool {
        n >= self.min && self.max.admits(n)
    }

    /// True if a count of `n` can still grow by one
    pub fn allows_more(&self, n: u32) -> bool {
        self.max.admits(n.saturating_add(1))
    }

    /// True if a count of `n` meets the minimum
    pub fn is_satisfied_by(&self, n: u32) -> bool {
        n >= self.min
    }

    /// True if more than one instance is allowed
    pub fn repeats(&self) -> bool {
        self.allows_more(1)
    }

    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// Effective bound of a node with bound `other` nested inside `self`
    pub fn multiply(&self, other: &Bound) -> Bound {
        let min = self.min.saturating_mul(other.min);
        let max = match (self.max, other.max) {
            (MaxOccurs::Bounded(0), _) | (_, MaxOccurs::Bounded(0)) => MaxOccurs::Bounded(0),
            (MaxOccurs::Bounded(a), MaxOccurs::Bounded(b)) => MaxOccurs::Bounded(a.saturating_mul(b)),
            _ => MaxOccurs::Unbounded,
        };
        Bound { min, max }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_once() {
        let bound = Bound::from_attributes(None, None).unwrap();
        assert_eq!(bound, Bound::ONCE);
        assert!(bound.contains(1));
        assert!(!bound.contains(0));
        assert!(!bound.contains(2));
        assert!(!bound.repeats());
    }

    #[test]
    fn test_parse_unbounded() {
        let bound = Bound::from_attributes(Some("0"), Some("unbounded")).unwrap();
        assert_eq!(bound, Bound::ANY);
        assert!(bound.contains(10_000));
        assert!(bound.allows_more(u32::MAX - 1));
        assert!(bound.repeats());
    }

    #[test]
    fn test_min_greater_than_max_rejected() {
        let err = Bound::from_attributes(Some("3"), Some("2")).unwrap_err();
        assert!(matches!(err, CompileError::InvalidOccurs { .. }));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(Bound::from_attributes(Some("one"), None).is_err());
        assert!(Bound::from_attributes(None, Some("-1")).is_err());
    }

    #[test]
    fn test_allows_more() {
        let bound = Bound::range(0, 2).unwrap();
        assert!(bound.allows_more(0));
        assert!(bound.allows_more(1));
        assert!(!bound.allows_more(2));
    }

    #[test]
    fn test_multiply() {
        let outer = Bound::range(1, 2).unwrap();
        let inner = Bound::range(2, 3).unwrap();
        assert_eq!(outer.multiply(&inner), Bound::range(2, 6).unwrap());

        let unbounded = Bound::at_least(1);
        assert_eq!(unbounded.multiply(&inner).max, MaxOccurs::Unbounded);

        let never = Bound::range(0, 0).unwrap();
        assert_eq!(unbounded.multiply(&never).max, MaxOccurs::Bounded(0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Bound::ANY.to_string(), "0..unbounded");
        assert_eq!(Bound::ONCE.to_string(), "1..1");
    }
}
