//! Advancement resolution.
//!
//! When a match completes, its stamped destinations say which downstream
//! slots receive the winner and, in double elimination, the loser. Placement
//! is idempotent: re-applying a completion that already advanced is a no-op.
//!
//! Re-advancement after a winner-changing score edit displaces the previous
//! occupant of a destination slot. Downstream matches that already started or
//! completed with the old occupant are flagged for manual review and reported
//! as conflicts; they are never silently rewritten or rolled back.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::bracket::{Bracket, Destination, Match, MatchId, MatchStatus, SlotSide};
use crate::errors::{EngineError, EngineResult};
use crate::tournament::PlayerId;

/// A downstream match whose progress consumed a player that a score edit has
/// since displaced. Requires operator review; the engine does not cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownstreamConflict {
    pub match_id: MatchId,
    pub round_number: i32,
    pub slot_number: i32,
    pub displaced_player: PlayerId,
    pub reason: String,
}

/// Result of resolving one completion.
#[derive(Debug, Clone, Default)]
pub struct AdvancementOutcome {
    /// Matches mutated by this resolution (slot writes and review flags)
    pub touched: Vec<MatchId>,
    /// Downstream matches flagged for manual review
    pub conflicts: Vec<DownstreamConflict>,
}

impl AdvancementOutcome {
    fn touch(&mut self, id: MatchId) {
        if !self.touched.contains(&id) {
            self.touched.push(id);
        }
    }
}

fn slot_ref(m: &mut Match, side: SlotSide) -> &mut Option<PlayerId> {
    match side {
        SlotSide::A => &mut m.player_a,
        SlotSide::B => &mut m.player_b,
    }
}

/// Write `player` into the destination slot. Returns the displaced occupant
/// when the slot previously held a different player.
fn place(
    bracket: &mut Bracket,
    dest: Destination,
    player: PlayerId,
    outcome: &mut AdvancementOutcome,
) -> EngineResult<Option<PlayerId>> {
    let tournament_id = bracket.tournament_id;
    if !bracket.round_is_valid(dest.round) {
        return Err(EngineError::CorruptBracket {
            tournament_id,
            detail: format!("destination round {} outside format vocabulary", dest.round),
        });
    }
    let target = bracket
        .match_at_mut(dest.round, dest.slot)
        .ok_or_else(|| EngineError::CorruptBracket {
            tournament_id,
            detail: format!("destination match ({}, {}) missing", dest.round, dest.slot),
        })?;

    let slot = slot_ref(target, dest.side);
    if *slot == Some(player) {
        return Ok(None);
    }
    let displaced = *slot;
    *slot = Some(player);
    outcome.touch(target.id);
    Ok(displaced)
}

/// Flag every downstream match that consumed `displaced` after it left
/// `from`, following completed matches transitively. Flagged matches keep
/// their players and results; resolving them is an operator decision.
fn flag_displaced_chain(
    bracket: &mut Bracket,
    from: Destination,
    displaced: PlayerId,
    outcome: &mut AdvancementOutcome,
) {
    let mut frontier = vec![from];
    while let Some(dest) = frontier.pop() {
        let Some(target) = bracket.match_at(dest.round, dest.slot) else {
            continue;
        };
        let target_id = target.id;
        let progressed = target.status != MatchStatus::Scheduled;
        let completed = target.status == MatchStatus::Completed;
        let winner_to = target.winner_to;
        let loser_to = target.loser_to;
        // The displaced player occupied one of this match's slots when it
        // ran, so a completed match carried them out through exactly one of
        // the two routes.
        let was_winner = target.winner_id == Some(displaced);
        let round = target.round_number;
        let slot = target.slot_number;

        if progressed {
            outcome.conflicts.push(DownstreamConflict {
                match_id: target_id,
                round_number: round,
                slot_number: slot,
                displaced_player: displaced,
                reason: format!(
                    "match ({round}, {slot}) already progressed using displaced player"
                ),
            });
            if let Some(m) = bracket.match_mut(target_id) {
                if !m.requires_review {
                    m.requires_review = true;
                    outcome.touch(target_id);
                }
            }
            warn!(
                "downstream conflict: match {target_id} (round {round}, slot {slot}) consumed displaced player {displaced}"
            );
        }

        // A completed match may have carried the displaced player further.
        if completed {
            let next = if was_winner { winner_to } else { loser_to };
            if let Some(next) = next {
                frontier.push(next);
            }
        }
    }
}

/// Resolve the downstream effects of a completed match.
///
/// Writes the winner (and routed loser) into their destination slots. On
/// re-resolution after a score edit, previous occupants are displaced and
/// their progressed downstream matches are flagged rather than cascaded.
pub fn advance(bracket: &mut Bracket, match_id: MatchId) -> EngineResult<AdvancementOutcome> {
    let tournament_id = bracket.tournament_id;
    let source = bracket
        .match_by_id(match_id)
        .ok_or(EngineError::MatchNotFound(match_id))?;

    if source.status != MatchStatus::Completed {
        return Err(EngineError::InvalidTransition {
            match_id,
            operation: "advance".to_string(),
            status: source.status.to_string(),
        });
    }
    if !bracket.round_is_valid(source.round_number) {
        return Err(EngineError::CorruptBracket {
            tournament_id,
            detail: format!(
                "match {match_id} carries round {} outside format vocabulary",
                source.round_number
            ),
        });
    }
    let winner = source.winner_id.ok_or_else(|| EngineError::CorruptBracket {
        tournament_id,
        detail: format!("completed match {match_id} has no winner"),
    })?;
    let loser = source.loser_id();
    let winner_to = source.winner_to;
    let loser_to = source.loser_to;

    let mut outcome = AdvancementOutcome::default();

    if let Some(dest) = winner_to
        && let Some(displaced) = place(bracket, dest, winner, &mut outcome)?
    {
        flag_displaced_chain(bracket, dest, displaced, &mut outcome);
    }

    if let Some(dest) = loser_to {
        let loser = loser.ok_or_else(|| EngineError::CorruptBracket {
            tournament_id,
            detail: format!("match {match_id} routes a loser but has none"),
        })?;
        if let Some(displaced) = place(bracket, dest, loser, &mut outcome)? {
            flag_displaced_chain(bracket, dest, displaced, &mut outcome);
        }
    }

    Ok(outcome)
}
