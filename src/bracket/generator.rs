//! Bracket generation.
//!
//! Consumes a seed assignment and a format and produces the complete set of
//! match slots, with advancement destinations stamped on. Generation is pure;
//! atomicity is the store's concern.

use chrono::Utc;
use uuid::Uuid;

use super::models::{
    Bracket, BracketSegment, DE16_FIELD_SIZE, DE16_ROUNDS, DE16_TOTAL_MATCHES, Match, MatchStatus,
    ROUND_GRAND_FINAL, ROUND_SEMIFINALS, ROUND_WINNERS_1,
};
use super::topology::{de16_round_size, de16_routes, single_elim_routes};
use crate::errors::{EngineError, EngineResult};
use crate::seeding::SeedAssignment;
use crate::tournament::{PlayerId, TournamentFormat, TournamentId};

fn blank_match(
    tournament_id: TournamentId,
    round: i32,
    segment: BracketSegment,
    slot: i32,
) -> Match {
    Match {
        id: Uuid::new_v4(),
        tournament_id,
        round_number: round,
        segment,
        slot_number: slot,
        player_a: None,
        player_b: None,
        score_a: None,
        score_b: None,
        status: MatchStatus::Scheduled,
        winner_id: None,
        completion: None,
        requires_review: false,
        winner_to: None,
        loser_to: None,
        scheduled_at: Utc::now(),
        started_at: None,
        completed_at: None,
    }
}

/// Cross-bracket "snake" pairing for an opening round of `n` seeds:
/// match `k` pairs seed `2k-1` against seed `n+2-2k`, so seeds 1 and 2 can
/// only meet in the final absent upsets.
fn opening_pair(n: usize, k: i32) -> (u32, u32) {
    let a = (2 * k - 1) as u32;
    let b = (n as i32 + 2 - 2 * k) as u32;
    (a, b)
}

/// Generate a single-elimination bracket for a power-of-two field.
pub fn generate_single_elimination(
    tournament_id: TournamentId,
    seeding: SeedAssignment,
) -> EngineResult<Bracket> {
    let n = seeding.len();
    if n < 2 {
        return Err(EngineError::InsufficientParticipants { needed: 2, current: n });
    }
    if !n.is_power_of_two() {
        return Err(EngineError::InvalidParticipantCount(n));
    }

    let total_rounds = n.ilog2();
    let mut matches = Vec::with_capacity(n - 1);

    for round in 1..=total_rounds as i32 {
        let round_size = (n >> round) as i32;
        let segment = if round == total_rounds as i32 {
            BracketSegment::Finals
        } else if round == total_rounds as i32 - 1 {
            BracketSegment::Semifinals
        } else {
            BracketSegment::Winners
        };

        for slot in 1..=round_size {
            let mut m = blank_match(tournament_id, round, segment, slot);
            if round == 1 {
                let (seed_a, seed_b) = opening_pair(n, slot);
                m.player_a = seed_player(&seeding, seed_a)?;
                m.player_b = seed_player(&seeding, seed_b)?;
            }
            let routes = single_elim_routes(total_rounds, round, slot);
            m.winner_to = routes.winner;
            m.loser_to = routes.loser;
            matches.push(m);
        }
    }

    Ok(Bracket {
        id: Uuid::new_v4(),
        tournament_id,
        format: TournamentFormat::SingleElimination,
        seeding,
        total_rounds,
        total_matches: matches.len(),
        matches,
        generated_at: Utc::now(),
    })
}

/// Generate the fixed 16-player double-elimination bracket: 27 matches over
/// the `1,2,3 / 101..103 / 201,202 / 250 / 300` round vocabulary.
pub fn generate_double_elimination(
    tournament_id: TournamentId,
    seeding: SeedAssignment,
) -> EngineResult<Bracket> {
    let n = seeding.len();
    if n != DE16_FIELD_SIZE {
        return Err(EngineError::UnsupportedParticipantCount(n));
    }

    let mut matches = Vec::with_capacity(DE16_TOTAL_MATCHES);
    for &round in DE16_ROUNDS.iter() {
        let round_size = de16_round_size(round).ok_or_else(|| EngineError::CorruptBracket {
            tournament_id,
            detail: format!("no stage size for round {round}"),
        })?;
        let segment = de16_segment(round);

        for slot in 1..=round_size {
            let mut m = blank_match(tournament_id, round, segment, slot);
            if round == ROUND_WINNERS_1 {
                let (seed_a, seed_b) = opening_pair(DE16_FIELD_SIZE, slot);
                m.player_a = seed_player(&seeding, seed_a)?;
                m.player_b = seed_player(&seeding, seed_b)?;
            }
            let routes = de16_routes(round, slot).ok_or_else(|| EngineError::CorruptBracket {
                tournament_id,
                detail: format!("no routes for round {round}"),
            })?;
            m.winner_to = routes.winner;
            m.loser_to = routes.loser;
            matches.push(m);
        }
    }

    debug_assert_eq!(matches.len(), DE16_TOTAL_MATCHES);

    Ok(Bracket {
        id: Uuid::new_v4(),
        tournament_id,
        format: TournamentFormat::DoubleElimination,
        seeding,
        // Three winners rounds, then losers play-down, semifinals, final.
        total_rounds: DE16_ROUNDS.len() as u32,
        total_matches: matches.len(),
        matches,
        generated_at: Utc::now(),
    })
}

/// Generate a bracket in the tournament's format.
pub fn generate(
    tournament_id: TournamentId,
    format: TournamentFormat,
    seeding: SeedAssignment,
) -> EngineResult<Bracket> {
    match format {
        TournamentFormat::SingleElimination => generate_single_elimination(tournament_id, seeding),
        TournamentFormat::DoubleElimination => generate_double_elimination(tournament_id, seeding),
    }
}

fn seed_player(seeding: &SeedAssignment, seed: u32) -> EngineResult<Option<PlayerId>> {
    match seeding.player_at(seed) {
        Some(id) => Ok(Some(id)),
        None => Err(EngineError::InvalidParticipantCount(seeding.len())),
    }
}

fn de16_segment(round: i32) -> BracketSegment {
    match round {
        ROUND_SEMIFINALS => BracketSegment::Semifinals,
        ROUND_GRAND_FINAL => BracketSegment::Finals,
        r if r >= 100 => BracketSegment::Losers,
        _ => BracketSegment::Winners,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::seeding::{SeedingMethod, assign_seeds};
    use crate::tournament::{Participant, RankTier};

    fn seeded_field(ratings: &[i32]) -> SeedAssignment {
        let start = Utc::now();
        let participants: Vec<Participant> = ratings
            .iter()
            .enumerate()
            .map(|(i, &rating)| Participant {
                player_id: Uuid::new_v4(),
                display_name: format!("p{i}"),
                rating,
                rank_tier: RankTier::from_rating(rating),
                registered_at: start + Duration::seconds(i as i64),
            })
            .collect();
        let mut rng = StdRng::seed_from_u64(7);
        assign_seeds(&participants, SeedingMethod::EloRanking, &mut rng).unwrap()
    }

    fn descending_field(n: usize) -> SeedAssignment {
        let ratings: Vec<i32> = (0..n).map(|i| 2000 - (i as i32) * 100).collect();
        seeded_field(&ratings)
    }

    #[test]
    fn test_single_elim_counts() {
        for n in [2usize, 4, 8, 16, 32] {
            let bracket =
                generate_single_elimination(Uuid::new_v4(), descending_field(n)).unwrap();
            assert_eq!(bracket.total_matches, n - 1, "field of {n}");
            assert_eq!(bracket.total_rounds, n.ilog2(), "field of {n}");
        }
    }

    #[test]
    fn test_single_elim_rejects_non_power_of_two() {
        let err = generate_single_elimination(Uuid::new_v4(), descending_field(12)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParticipantCount(12)));
    }

    #[test]
    fn test_opening_round_cross_seeding() {
        // Ratings 2000, 1900, ..., 1000: seed 1 must face seed 16, seed 2
        // must face seed 15.
        let bracket = generate_single_elimination(Uuid::new_v4(), descending_field(16)).unwrap();
        let seeding = &bracket.seeding;

        let m1 = bracket.match_at(1, 1).unwrap();
        assert_eq!(m1.player_a, seeding.player_at(1));
        assert_eq!(m1.player_b, seeding.player_at(16));

        let m8 = bracket.match_at(1, 8).unwrap();
        assert_eq!(m8.player_a, seeding.player_at(15));
        assert_eq!(m8.player_b, seeding.player_at(2));
    }

    #[test]
    fn test_top_two_seeds_meet_only_in_final() {
        // Walk winner destinations from both opening slots; paths must only
        // converge at the last round.
        let bracket = generate_single_elimination(Uuid::new_v4(), descending_field(16)).unwrap();
        let path = |mut round: i32, mut slot: i32| {
            let mut addresses = vec![(round, slot)];
            while let Some(d) = bracket.match_at(round, slot).unwrap().winner_to {
                addresses.push((d.round, d.slot));
                round = d.round;
                slot = d.slot;
            }
            addresses
        };
        let seed_one_path = path(1, 1);
        let seed_two_path = path(1, 8);
        let shared: Vec<_> = seed_one_path
            .iter()
            .filter(|addr| seed_two_path.contains(addr))
            .collect();
        assert_eq!(shared, vec![&(4, 1)]);
    }

    #[test]
    fn test_de16_structure() {
        let bracket = generate_double_elimination(Uuid::new_v4(), descending_field(16)).unwrap();
        assert_eq!(bracket.total_matches, DE16_TOTAL_MATCHES);
        assert_eq!(bracket.matches.len(), 27);

        for m in &bracket.matches {
            assert!(
                DE16_ROUNDS.contains(&m.round_number),
                "round {} outside vocabulary",
                m.round_number
            );
        }

        let count_in = |round: i32| {
            bracket
                .matches
                .iter()
                .filter(|m| m.round_number == round)
                .count()
        };
        assert_eq!(count_in(1), 8);
        assert_eq!(count_in(2), 4);
        assert_eq!(count_in(3), 2);
        assert_eq!(count_in(101), 4);
        assert_eq!(count_in(102), 2);
        assert_eq!(count_in(103), 1);
        assert_eq!(count_in(201), 2);
        assert_eq!(count_in(202), 1);
        assert_eq!(count_in(250), 2);
        assert_eq!(count_in(300), 1);
    }

    #[test]
    fn test_de16_rejects_wrong_field_size() {
        for n in [15usize, 17] {
            let ratings: Vec<i32> = (0..n).map(|i| 2000 - (i as i32) * 10).collect();
            let err =
                generate_double_elimination(Uuid::new_v4(), seeded_field(&ratings)).unwrap_err();
            assert!(matches!(err, EngineError::UnsupportedParticipantCount(c) if c == n));
        }
    }

    #[test]
    fn test_de16_only_opening_round_is_seeded() {
        let bracket = generate_double_elimination(Uuid::new_v4(), descending_field(16)).unwrap();
        for m in &bracket.matches {
            if m.round_number == ROUND_WINNERS_1 {
                assert!(m.is_ready());
            } else {
                assert!(m.player_a.is_none() && m.player_b.is_none());
            }
        }
    }

    #[test]
    fn test_de16_segments() {
        let bracket = generate_double_elimination(Uuid::new_v4(), descending_field(16)).unwrap();
        for m in &bracket.matches {
            let expected = match m.round_number {
                1..=3 => BracketSegment::Winners,
                101..=299 if m.round_number != 250 => BracketSegment::Losers,
                250 => BracketSegment::Semifinals,
                300 => BracketSegment::Finals,
                other => panic!("unexpected round {other}"),
            };
            assert_eq!(m.segment, expected, "round {}", m.round_number);
        }
    }

    #[test]
    fn test_every_match_has_stamped_routes() {
        let bracket = generate_double_elimination(Uuid::new_v4(), descending_field(16)).unwrap();
        for m in &bracket.matches {
            if m.round_number == ROUND_GRAND_FINAL {
                assert!(m.winner_to.is_none());
            } else {
                assert!(m.winner_to.is_some(), "round {} has no winner route", m.round_number);
            }
        }
        // Exactly the twelve winners-bracket matches with a second chance
        // route a loser somewhere.
        let with_loser_route = bracket.matches.iter().filter(|m| m.loser_to.is_some()).count();
        assert_eq!(with_loser_route, 12);
    }
}
