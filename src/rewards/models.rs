//! Reward data models.

use serde::{Deserialize, Serialize};

use crate::tournament::PlayerId;

/// Position bucket a finishing place falls into. The point lookup tables are
/// keyed by bucket, not by exact place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionBucket {
    Champion,
    RunnerUp,
    /// Places 3-4
    SemiFinalist,
    /// Places 5-8
    TopEight,
    /// Places 9-12
    TopTwelve,
    /// Places 13-16
    TopSixteen,
    /// Long-tail bucket for everyone past the paid depth
    Participation,
}

impl PositionBucket {
    /// Bucket for a 1-based finishing place.
    pub fn for_position(position: u32) -> Self {
        match position {
            1 => PositionBucket::Champion,
            2 => PositionBucket::RunnerUp,
            3..=4 => PositionBucket::SemiFinalist,
            5..=8 => PositionBucket::TopEight,
            9..=12 => PositionBucket::TopTwelve,
            13..=16 => PositionBucket::TopSixteen,
            _ => PositionBucket::Participation,
        }
    }
}

/// One position's reward line. Derived on demand, never stored by the
/// engine; recomputing it is side-effect free.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPosition {
    pub bucket: PositionBucket,
    /// 1-based place; `None` for the participation bucket
    pub position: Option<u32>,
    /// Cash award in minor currency units
    pub cash: i64,
    /// Rating (ELO) delta awarded for finishing here
    pub rating_points: i64,
    /// Club ladder points, scaled by the participant's rank tier
    pub tier_points: i64,
    /// Non-monetary items attached to the place
    pub items: Vec<String>,
}

/// A player's final standing derived from a decided bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalPlacement {
    pub player_id: PlayerId,
    pub position: u32,
    pub bucket: PositionBucket,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(PositionBucket::for_position(1), PositionBucket::Champion);
        assert_eq!(PositionBucket::for_position(2), PositionBucket::RunnerUp);
        assert_eq!(PositionBucket::for_position(3), PositionBucket::SemiFinalist);
        assert_eq!(PositionBucket::for_position(4), PositionBucket::SemiFinalist);
        assert_eq!(PositionBucket::for_position(5), PositionBucket::TopEight);
        assert_eq!(PositionBucket::for_position(8), PositionBucket::TopEight);
        assert_eq!(PositionBucket::for_position(9), PositionBucket::TopTwelve);
        assert_eq!(PositionBucket::for_position(13), PositionBucket::TopSixteen);
        assert_eq!(PositionBucket::for_position(17), PositionBucket::Participation);
    }
}
