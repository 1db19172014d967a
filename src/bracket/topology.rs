//! Static advancement topology.
//!
//! Computes, per match address, where the winner advances and where the loser
//! drops. The generator calls these once and stamps the destinations onto the
//! matches; nothing re-derives topology at runtime.
//!
//! Double-elimination stage arithmetic (16 players, 27 matches):
//!
//! ```text
//! winners      1: 8 matches   2: 4   3: 2
//! losers one   101: 4 (winners-1 losers)   102: 2   103: 1
//! losers two   201: 2 (winners-2 losers)   202: 1
//! semifinals   250: 2  (winners-3 winners vs branch survivors, crossed)
//! grand final  300: 1
//! ```
//!
//! Winners-round-3 losers exit the bracket outright; that is what closes the
//! 27-match total.

use super::models::{
    Destination, ROUND_GRAND_FINAL, ROUND_LOSERS_A1, ROUND_LOSERS_A2, ROUND_LOSERS_A3,
    ROUND_LOSERS_B1, ROUND_LOSERS_B2, ROUND_SEMIFINALS, ROUND_WINNERS_1, ROUND_WINNERS_2,
    ROUND_WINNERS_3, SlotSide,
};

/// Winner/loser destinations for one match address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routes {
    pub winner: Option<Destination>,
    pub loser: Option<Destination>,
}

/// Side of the downstream slot fed by slot `k`: odd slots feed A, even feed B.
fn side_for(slot: i32) -> SlotSide {
    if slot % 2 == 1 { SlotSide::A } else { SlotSide::B }
}

/// Downstream slot index fed by slot `k` when a round halves.
fn half_slot(slot: i32) -> i32 {
    (slot + 1) / 2
}

fn dest(round: i32, slot: i32, side: SlotSide) -> Option<Destination> {
    Some(Destination { round, slot, side })
}

/// Routes for a single-elimination match. `total_rounds` is `log2(N)`.
pub fn single_elim_routes(total_rounds: u32, round: i32, slot: i32) -> Routes {
    let winner = if round < total_rounds as i32 {
        dest(round + 1, half_slot(slot), side_for(slot))
    } else {
        None
    };
    Routes { winner, loser: None }
}

/// Routes for a match in the fixed 16-player double-elimination format.
///
/// Returns `None` for a round number outside the format's vocabulary so the
/// generator can refuse to produce a structurally corrupt bracket.
pub fn de16_routes(round: i32, slot: i32) -> Option<Routes> {
    let routes = match round {
        ROUND_WINNERS_1 => Routes {
            winner: dest(ROUND_WINNERS_2, half_slot(slot), side_for(slot)),
            loser: dest(ROUND_LOSERS_A1, half_slot(slot), side_for(slot)),
        },
        ROUND_WINNERS_2 => Routes {
            winner: dest(ROUND_WINNERS_3, half_slot(slot), side_for(slot)),
            loser: dest(ROUND_LOSERS_B1, half_slot(slot), side_for(slot)),
        },
        // Undefeated finalists take the A slots of the semifinals. Their
        // opponents' losses here are terminal.
        ROUND_WINNERS_3 => Routes {
            winner: dest(ROUND_SEMIFINALS, slot, SlotSide::A),
            loser: None,
        },
        ROUND_LOSERS_A1 => Routes {
            winner: dest(ROUND_LOSERS_A2, half_slot(slot), side_for(slot)),
            loser: None,
        },
        ROUND_LOSERS_A2 => Routes {
            winner: dest(ROUND_LOSERS_A3, 1, side_for(slot)),
            loser: None,
        },
        // Branch survivors cross: branch two meets winners finalist 1,
        // branch one meets winners finalist 2.
        ROUND_LOSERS_A3 => Routes {
            winner: dest(ROUND_SEMIFINALS, 2, SlotSide::B),
            loser: None,
        },
        ROUND_LOSERS_B1 => Routes {
            winner: dest(ROUND_LOSERS_B2, 1, side_for(slot)),
            loser: None,
        },
        ROUND_LOSERS_B2 => Routes {
            winner: dest(ROUND_SEMIFINALS, 1, SlotSide::B),
            loser: None,
        },
        ROUND_SEMIFINALS => Routes {
            winner: dest(ROUND_GRAND_FINAL, 1, side_for(slot)),
            loser: None,
        },
        ROUND_GRAND_FINAL => Routes {
            winner: None,
            loser: None,
        },
        _ => return None,
    };
    Some(routes)
}

/// Matches per round in the fixed double-elimination format.
pub fn de16_round_size(round: i32) -> Option<i32> {
    match round {
        ROUND_WINNERS_1 => Some(8),
        ROUND_WINNERS_2 => Some(4),
        ROUND_WINNERS_3 => Some(2),
        ROUND_LOSERS_A1 => Some(4),
        ROUND_LOSERS_A2 => Some(2),
        ROUND_LOSERS_A3 => Some(1),
        ROUND_LOSERS_B1 => Some(2),
        ROUND_LOSERS_B2 => Some(1),
        ROUND_SEMIFINALS => Some(2),
        ROUND_GRAND_FINAL => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::models::DE16_ROUNDS;

    #[test]
    fn test_de16_round_sizes_total_27() {
        let total: i32 = DE16_ROUNDS
            .iter()
            .map(|&r| de16_round_size(r).expect("known round"))
            .sum();
        assert_eq!(total, 27);
    }

    #[test]
    fn test_single_elim_final_has_no_destination() {
        let routes = single_elim_routes(4, 4, 1);
        assert_eq!(routes.winner, None);
        assert_eq!(routes.loser, None);
    }

    #[test]
    fn test_single_elim_halving() {
        // Round 1 slots 1 and 2 both feed round 2 slot 1, on opposite sides.
        let a = single_elim_routes(4, 1, 1).winner.unwrap();
        let b = single_elim_routes(4, 1, 2).winner.unwrap();
        assert_eq!((a.round, a.slot, a.side), (2, 1, SlotSide::A));
        assert_eq!((b.round, b.slot, b.side), (2, 1, SlotSide::B));
    }

    #[test]
    fn test_de16_winners_one_losers_drop_to_branch_one() {
        let routes = de16_routes(ROUND_WINNERS_1, 5).unwrap();
        let loser = routes.loser.unwrap();
        assert_eq!((loser.round, loser.slot, loser.side), (ROUND_LOSERS_A1, 3, SlotSide::A));
    }

    #[test]
    fn test_de16_winners_two_losers_drop_to_branch_two() {
        let routes = de16_routes(ROUND_WINNERS_2, 4).unwrap();
        let loser = routes.loser.unwrap();
        assert_eq!((loser.round, loser.slot, loser.side), (ROUND_LOSERS_B1, 2, SlotSide::B));
    }

    #[test]
    fn test_de16_winners_three_loss_is_terminal() {
        let routes = de16_routes(ROUND_WINNERS_3, 1).unwrap();
        assert!(routes.loser.is_none());
        let winner = routes.winner.unwrap();
        assert_eq!((winner.round, winner.slot, winner.side), (ROUND_SEMIFINALS, 1, SlotSide::A));
    }

    #[test]
    fn test_de16_branch_survivors_cross() {
        let branch_one = de16_routes(ROUND_LOSERS_A3, 1).unwrap().winner.unwrap();
        let branch_two = de16_routes(ROUND_LOSERS_B2, 1).unwrap().winner.unwrap();
        assert_eq!((branch_one.round, branch_one.slot), (ROUND_SEMIFINALS, 2));
        assert_eq!((branch_two.round, branch_two.slot), (ROUND_SEMIFINALS, 1));
        assert_eq!(branch_one.side, SlotSide::B);
        assert_eq!(branch_two.side, SlotSide::B);
    }

    #[test]
    fn test_de16_unknown_round_is_rejected() {
        assert!(de16_routes(4, 1).is_none());
        assert!(de16_routes(104, 1).is_none());
        assert!(de16_routes(0, 1).is_none());
    }

    #[test]
    fn test_every_de16_slot_feeds_a_real_slot() {
        // Each destination must land inside the destination round's size.
        for &round in DE16_ROUNDS.iter() {
            let size = de16_round_size(round).unwrap();
            for slot in 1..=size {
                let routes = de16_routes(round, slot).unwrap();
                for d in [routes.winner, routes.loser].into_iter().flatten() {
                    let dest_size = de16_round_size(d.round).expect("destination round known");
                    assert!(d.slot >= 1 && d.slot <= dest_size);
                }
            }
        }
    }

    #[test]
    fn test_every_de16_slot_side_is_filled_exactly_once() {
        // Every (round, slot, side) past the first winners round must be fed
        // by exactly one upstream route, except the 16 seeded slots.
        use std::collections::HashMap;
        let mut fed: HashMap<(i32, i32, SlotSide), u32> = HashMap::new();
        for &round in DE16_ROUNDS.iter() {
            let size = de16_round_size(round).unwrap();
            for slot in 1..=size {
                let routes = de16_routes(round, slot).unwrap();
                for d in [routes.winner, routes.loser].into_iter().flatten() {
                    *fed.entry((d.round, d.slot, d.side)).or_insert(0) += 1;
                }
            }
        }
        // 19 downstream matches (everything past winners round 1), two
        // player slots each.
        assert_eq!(fed.len(), 19 * 2);
        for ((round, slot, _), count) in fed {
            assert_eq!(count, 1, "slot ({round},{slot}) fed {count} times");
        }
    }
}
