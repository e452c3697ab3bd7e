//! Tri-state existential flags (`mz:is_current`, `mz:is_ceased`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Who's On First existential flag.
///
/// Serialised as its integer flag: `1` true, `0` false, `-1` unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Existential {
    True,
    False,
    #[default]
    Unknown,
}

impl Existential {
    pub fn flag(self) -> i64 {
        match self {
            Self::True => 1,
            Self::False => 0,
            Self::Unknown => -1,
        }
    }

    /// Parse an integer flag. Anything outside `-1..=1` is rejected.
    pub fn from_flag(flag: i64) -> Option<Self> {
        match flag {
            1 => Some(Self::True),
            0 => Some(Self::False),
            -1 => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }

    pub fn is_true(self) -> bool {
        self == Self::True
    }

    pub fn is_false(self) -> bool {
        self == Self::False
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

impl TryFrom<i64> for Existential {
    type Error = String;

    fn try_from(flag: i64) -> Result<Self, Self::Error> {
        Self::from_flag(flag).ok_or_else(|| format!("invalid existential flag: {}", flag))
    }
}

impl From<Existential> for i64 {
    fn from(value: Existential) -> Self {
        value.flag()
    }
}

impl fmt::Display for Existential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        assert_eq!(Existential::True.flag(), 1);
        assert_eq!(Existential::False.flag(), 0);
        assert_eq!(Existential::Unknown.flag(), -1);
        assert_eq!(Existential::from_flag(2), None);
        assert!(Existential::from_bool(false).is_false());
        assert!(!Existential::Unknown.is_known());
    }

    #[test]
    fn test_serde_as_integer() {
        let json = serde_json::to_string(&Existential::Unknown).unwrap();
        assert_eq!(json, "-1");

        let parsed: Existential = serde_json::from_str("1").unwrap();
        assert!(parsed.is_true());

        assert!(serde_json::from_str::<Existential>("7").is_err());
    }
}
