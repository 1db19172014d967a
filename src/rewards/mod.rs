//! Position-based rewards.
//!
//! Computes per-place cash, rating, and ladder point awards from a prize
//! pool and field size. Everything here is a pure function of its inputs;
//! rewards are recomputed on demand and never persisted by the engine.

pub mod calculator;
pub mod models;

pub use calculator::{
    PAYOUT_DENOMINATOR, compute_rewards, paid_depth, payout_numerator, placements,
    rating_points, tier_points,
};
pub use models::{FinalPlacement, PositionBucket, RewardPosition};
