//! Reward calculation.
//!
//! Pure functions of the prize pool, field size, and rank tier. Cash shares
//! come from a fixed percentage table; rating and ladder points come from
//! fixed lookups keyed by (position bucket, rank tier) and are independent of
//! the pool.
//!
//! Shares are expressed as numerators over a 160 000 denominator so the
//! sub-percent rows stay exact in integer math (0.5625% = 900/160 000).
//! Every share is truncated, never rounded, and clamped to the remaining
//! pool in rank order, so the allocation can never exceed the pool.

use std::collections::HashMap;

use super::models::{FinalPlacement, PositionBucket, RewardPosition};
use crate::bracket::{
    Bracket, Match, MatchStatus, ROUND_LOSERS_A1, ROUND_LOSERS_A2,
    ROUND_LOSERS_A3, ROUND_LOSERS_B1, ROUND_LOSERS_B2, ROUND_SEMIFINALS, ROUND_WINNERS_3,
};
use crate::errors::{EngineError, EngineResult};
use crate::tournament::{RankTier, TournamentFormat};

/// Denominator for the payout share table.
pub const PAYOUT_DENOMINATOR: i128 = 160_000;

/// Payout share numerator for a 1-based place, over [`PAYOUT_DENOMINATOR`].
///
/// 40% / 24% / 16% / 8%, then 4% for 5-6, 2% for 7-8, 1.125% for 9-12 and
/// 0.5625% for 13-16.
pub fn payout_numerator(position: u32) -> Option<i128> {
    let numerator = match position {
        1 => 64_000,
        2 => 38_400,
        3 => 25_600,
        4 => 12_800,
        5..=6 => 6_400,
        7..=8 => 3_200,
        9..=12 => 1_800,
        13..=16 => 900,
        _ => return None,
    };
    Some(numerator)
}

/// Number of cash positions for a field of the given size.
pub fn paid_depth(field_size: usize) -> u32 {
    if field_size >= 16 {
        16
    } else if field_size >= 8 {
        8
    } else {
        4
    }
}

/// Rating (ELO) delta for a finishing bucket.
///
/// Keyed by tier as well: established tiers gain less from a placement than
/// climbing tiers do.
pub fn rating_points(bucket: PositionBucket, tier: RankTier) -> i64 {
    let base: i64 = match bucket {
        PositionBucket::Champion => 75,
        PositionBucket::RunnerUp => 45,
        PositionBucket::SemiFinalist => 30,
        PositionBucket::TopEight => 20,
        PositionBucket::TopTwelve => 12,
        PositionBucket::TopSixteen => 8,
        PositionBucket::Participation => 5,
    };
    let (num, den): (i64, i64) = match tier {
        RankTier::E | RankTier::F => (4, 5),
        RankTier::G | RankTier::H => (1, 1),
        RankTier::I | RankTier::K => (6, 5),
    };
    base * num / den
}

/// Club ladder points for a finishing bucket, scaled by tier weight.
pub fn tier_points(bucket: PositionBucket, tier: RankTier) -> i64 {
    let base: i64 = match bucket {
        PositionBucket::Champion => 1_000,
        PositionBucket::RunnerUp => 800,
        PositionBucket::SemiFinalist => 600,
        PositionBucket::TopEight => 400,
        PositionBucket::TopTwelve => 250,
        PositionBucket::TopSixteen => 150,
        PositionBucket::Participation => 100,
    };
    let weight: i64 = match tier {
        RankTier::E => 80,
        RankTier::F => 90,
        RankTier::G => 100,
        RankTier::H => 110,
        RankTier::I => 120,
        RankTier::K => 130,
    };
    base * weight / 100
}

fn default_items(bucket: PositionBucket) -> Vec<String> {
    match bucket {
        PositionBucket::Champion => vec!["trophy".to_string()],
        PositionBucket::RunnerUp => vec!["silver_medal".to_string()],
        PositionBucket::SemiFinalist => vec!["bronze_medal".to_string()],
        _ => Vec::new(),
    }
}

/// Compute the reward line for every paid place, plus a participation bucket
/// when the field extends past the paid depth.
///
/// `overrides` replaces the table share for specific places with explicit
/// cash amounts; overridden amounts are still clamped so the total never
/// exceeds the pool.
pub fn compute_rewards(
    prize_pool: i64,
    field_size: usize,
    tier: RankTier,
    overrides: &HashMap<u32, i64>,
) -> Vec<RewardPosition> {
    let depth = paid_depth(field_size).min(field_size as u32);
    let mut remaining = prize_pool.max(0);
    let mut positions = Vec::with_capacity(depth as usize + 1);

    for position in 1..=depth {
        let bucket = PositionBucket::for_position(position);
        let table_share = payout_numerator(position)
            .map(|num| ((prize_pool.max(0) as i128 * num) / PAYOUT_DENOMINATOR) as i64)
            .unwrap_or(0);
        let wanted = overrides.get(&position).copied().unwrap_or(table_share);
        let cash = wanted.clamp(0, remaining);
        remaining -= cash;

        positions.push(RewardPosition {
            bucket,
            position: Some(position),
            cash,
            rating_points: rating_points(bucket, tier),
            tier_points: tier_points(bucket, tier),
            items: default_items(bucket),
        });
    }

    if field_size as u32 > depth {
        positions.push(RewardPosition {
            bucket: PositionBucket::Participation,
            position: None,
            cash: 0,
            rating_points: rating_points(PositionBucket::Participation, tier),
            tier_points: tier_points(PositionBucket::Participation, tier),
            items: Vec::new(),
        });
    }

    positions
}

fn completed_loser(m: &Match) -> Option<crate::tournament::PlayerId> {
    if m.status == MatchStatus::Completed {
        m.loser_id()
    } else {
        None
    }
}

/// Derive final standings from a decided bracket.
///
/// Places inside a shared elimination group are ordered by slot number; the
/// ordering between groups follows how deep in the bracket the loss happened.
pub fn placements(bracket: &Bracket) -> EngineResult<Vec<FinalPlacement>> {
    let final_match = bracket
        .final_match()
        .ok_or_else(|| EngineError::CorruptBracket {
            tournament_id: bracket.tournament_id,
            detail: "bracket has no decisive match".to_string(),
        })?;
    if final_match.status != MatchStatus::Completed {
        return Err(EngineError::InvalidTournamentStatus {
            tournament_id: bracket.tournament_id,
            status: "in_progress".to_string(),
            expected: "completed".to_string(),
        });
    }

    let mut placements = Vec::with_capacity(bracket.seeding.len());
    let mut push = |player, position: u32| {
        placements.push(FinalPlacement {
            player_id: player,
            position,
            bucket: PositionBucket::for_position(position),
        });
    };

    let champion = final_match
        .winner_id
        .ok_or_else(|| EngineError::CorruptBracket {
            tournament_id: bracket.tournament_id,
            detail: "decided final has no winner".to_string(),
        })?;
    push(champion, 1);
    if let Some(loser) = final_match.loser_id() {
        push(loser, 2);
    }

    // Elimination groups, deepest exit first. Within a group, slot order.
    let groups: Vec<Vec<(i32, i32)>> = match bracket.format {
        TournamentFormat::DoubleElimination => vec![
            // 3rd-4th: semifinal losses
            vec![(ROUND_SEMIFINALS, 1), (ROUND_SEMIFINALS, 2)],
            // 5th-8th: winners round 3 and late losers bracket exits
            vec![
                (ROUND_WINNERS_3, 1),
                (ROUND_WINNERS_3, 2),
                (ROUND_LOSERS_B2, 1),
                (ROUND_LOSERS_A3, 1),
            ],
            // 9th-12th: mid losers bracket exits
            vec![
                (ROUND_LOSERS_B1, 1),
                (ROUND_LOSERS_B1, 2),
                (ROUND_LOSERS_A2, 1),
                (ROUND_LOSERS_A2, 2),
            ],
            // 13th-16th: first losers bracket round
            vec![
                (ROUND_LOSERS_A1, 1),
                (ROUND_LOSERS_A1, 2),
                (ROUND_LOSERS_A1, 3),
                (ROUND_LOSERS_A1, 4),
            ],
        ],
        TournamentFormat::SingleElimination => {
            // Round r losers finish in places 2^(R-r)+1 ..= 2^(R-r+1).
            let total = bracket.total_rounds as i32;
            (1..total)
                .rev()
                .map(|round| {
                    let size = 1 << (bracket.total_rounds - round as u32);
                    (1..=size).map(|slot| (round, slot)).collect()
                })
                .collect()
        }
    };

    let mut next_position = 3u32;
    for group in groups {
        let start = next_position;
        for (idx, (round, slot)) in group.iter().enumerate() {
            if let Some(loser) = bracket.match_at(*round, *slot).and_then(completed_loser) {
                push(loser, start + idx as u32);
            }
            next_position += 1;
        }
    }

    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> HashMap<u32, i64> {
        HashMap::new()
    }

    #[test]
    fn test_top_four_shares() {
        let rewards = compute_rewards(100_000, 16, RankTier::G, &no_overrides());
        assert_eq!(rewards[0].cash, 40_000);
        assert_eq!(rewards[1].cash, 24_000);
        assert_eq!(rewards[2].cash, 16_000);
        assert_eq!(rewards[3].cash, 8_000);
    }

    #[test]
    fn test_allocation_never_exceeds_pool() {
        for pool in [0i64, 1, 99, 1_000, 99_999, 100_000, 1_000_003] {
            let rewards = compute_rewards(pool, 16, RankTier::G, &no_overrides());
            let total: i64 = rewards.iter().map(|r| r.cash).sum();
            assert!(total <= pool.max(0), "pool {pool} allocated {total}");
        }
    }

    #[test]
    fn test_first_place_is_largest_share() {
        for pool in [1_000i64, 77_777, 100_000] {
            for field in [4usize, 8, 16, 32] {
                let rewards = compute_rewards(pool, field, RankTier::G, &no_overrides());
                let first = rewards[0].cash;
                for r in &rewards {
                    assert!(first >= r.cash);
                }
            }
        }
    }

    #[test]
    fn test_shares_truncate() {
        // 1.125% of 999 is 11.23...; the share must truncate, not round.
        assert_eq!((999i128 * 1_800 / PAYOUT_DENOMINATOR) as i64, 11);
        let rewards = compute_rewards(999, 16, RankTier::G, &no_overrides());
        assert_eq!(rewards[0].cash, 399); // 40% of 999 truncated
    }

    #[test]
    fn test_paid_depth_by_field() {
        assert_eq!(paid_depth(4), 4);
        assert_eq!(paid_depth(7), 4);
        assert_eq!(paid_depth(8), 8);
        assert_eq!(paid_depth(16), 16);
        assert_eq!(paid_depth(64), 16);
    }

    #[test]
    fn test_participation_bucket_when_field_exceeds_depth() {
        let rewards = compute_rewards(100_000, 32, RankTier::G, &no_overrides());
        let last = rewards.last().unwrap();
        assert_eq!(last.bucket, PositionBucket::Participation);
        assert_eq!(last.position, None);
        assert_eq!(last.cash, 0);
        assert!(last.tier_points > 0);
    }

    #[test]
    fn test_small_field_has_no_participation_bucket() {
        let rewards = compute_rewards(100_000, 4, RankTier::G, &no_overrides());
        assert_eq!(rewards.len(), 4);
        assert!(rewards.iter().all(|r| r.bucket != PositionBucket::Participation));
    }

    #[test]
    fn test_overrides_replace_table_share() {
        let mut overrides = HashMap::new();
        overrides.insert(1u32, 50_000i64);
        let rewards = compute_rewards(100_000, 4, RankTier::G, &overrides);
        assert_eq!(rewards[0].cash, 50_000);
        // Remaining places still come from the table.
        assert_eq!(rewards[1].cash, 24_000);
    }

    #[test]
    fn test_overrides_cannot_overdraw_pool() {
        let mut overrides = HashMap::new();
        overrides.insert(1u32, 90_000i64);
        overrides.insert(2u32, 90_000i64);
        let rewards = compute_rewards(100_000, 4, RankTier::G, &overrides);
        assert_eq!(rewards[0].cash, 90_000);
        assert_eq!(rewards[1].cash, 10_000);
        assert_eq!(rewards[2].cash, 0);
    }

    #[test]
    fn test_points_independent_of_pool() {
        let rich = compute_rewards(1_000_000, 16, RankTier::H, &no_overrides());
        let poor = compute_rewards(0, 16, RankTier::H, &no_overrides());
        for (a, b) in rich.iter().zip(poor.iter()) {
            assert_eq!(a.rating_points, b.rating_points);
            assert_eq!(a.tier_points, b.tier_points);
        }
    }

    #[test]
    fn test_tier_scaling() {
        // Climbing tiers earn more ladder points for the same finish.
        assert!(tier_points(PositionBucket::Champion, RankTier::K)
            > tier_points(PositionBucket::Champion, RankTier::E));
        assert_eq!(tier_points(PositionBucket::Champion, RankTier::G), 1_000);
        assert!(rating_points(PositionBucket::Champion, RankTier::K)
            > rating_points(PositionBucket::Champion, RankTier::E));
    }

    #[test]
    fn test_calculator_is_idempotent() {
        let a = compute_rewards(123_456, 16, RankTier::F, &no_overrides());
        let b = compute_rewards(123_456, 16, RankTier::F, &no_overrides());
        assert_eq!(a, b);
    }
}
