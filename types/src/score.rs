//! Impact score: an integer in `0..=100`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ScoreOutOfRange;

/// A verified environmental impact score.
///
/// The zero score is also what an unscored identity reads as; the two are
/// indistinguishable.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct ImpactScore(u8);

impl ImpactScore {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(100);

    pub fn new(value: u32) -> Result<Self, ScoreOutOfRange> {
        if value > Self::MAX.0 as u32 {
            return Err(ScoreOutOfRange(value));
        }
        Ok(Self(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for ImpactScore {
    type Error = ScoreOutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ImpactScore> for u32 {
    fn from(score: ImpactScore) -> Self {
        score.0 as u32
    }
}

impl fmt::Display for ImpactScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_are_inclusive() {
        assert_eq!(ImpactScore::new(0).unwrap(), ImpactScore::MIN);
        assert_eq!(ImpactScore::new(100).unwrap(), ImpactScore::MAX);
        assert_eq!(ImpactScore::new(101), Err(ScoreOutOfRange(101)));
    }

    #[test]
    fn deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<ImpactScore>("87").is_ok());
        assert!(serde_json::from_str::<ImpactScore>("250").is_err());
    }
}
