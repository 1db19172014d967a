//! The tournament engine.
//!
//! `TournamentEngine` exposes the operation surface callers integrate
//! against: bracket generation and validation, match lifecycle transitions,
//! score corrections, and reward computation. Every mutating operation runs
//! under that tournament's lock, commits its writes through the store as one
//! batch, and publishes a change event only after the commit.

pub mod locks;

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::bracket::{
    self, Bracket, BracketId, DE16_FIELD_SIZE, DE16_TOTAL_MATCHES, Match, MatchId, MatchStatus,
};
use crate::errors::{EngineError, EngineResult};
use crate::progression::{
    self, ActorRole, DownstreamConflict, ScorePolicy, advance,
};
use crate::rewards::{self, FinalPlacement, RewardPosition};
use crate::seeding::{SeedingMethod, assign_seeds};
use crate::store::{EngineStore, RoleProvider, RosterProvider};
use crate::sync::{ChangeEvent, ChangeKind, EventPublisher};
use crate::tournament::{
    PlayerId, RankTier, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};

use locks::TournamentLocks;

/// Engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub score_policy: ScorePolicy,
    /// Seed for the random seeding method; `None` uses entropy
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            score_policy: ScorePolicy::default(),
            rng_seed: None,
        }
    }
}

/// Result of a bracket generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedBracket {
    pub bracket_id: BracketId,
    pub match_count: usize,
}

/// Result of a structural validation pass. Validation reports instead of
/// failing; an invalid bracket is a finding, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketValidation {
    pub valid: bool,
    pub reason: Option<String>,
    pub participant_count: usize,
    pub bracket_exists: bool,
}

/// Result of a score edit: the corrected match and every downstream match
/// flagged for operator review.
#[derive(Debug, Clone)]
pub struct ScoreEditReport {
    pub match_record: Match,
    pub affected_downstream: Vec<DownstreamConflict>,
}

/// The engine. Hold it in an `Arc` and share it across callers; all
/// operations take `&self`.
pub struct TournamentEngine {
    store: Arc<dyn EngineStore>,
    roster: Arc<dyn RosterProvider>,
    roles: Arc<dyn RoleProvider>,
    publisher: Arc<dyn EventPublisher>,
    policy: ScorePolicy,
    locks: TournamentLocks,
    rng: Mutex<StdRng>,
}

impl TournamentEngine {
    pub fn new(
        store: Arc<dyn EngineStore>,
        roster: Arc<dyn RosterProvider>,
        roles: Arc<dyn RoleProvider>,
        publisher: Arc<dyn EventPublisher>,
        config: EngineConfig,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            store,
            roster,
            roles,
            publisher,
            policy: config.score_policy,
            locks: TournamentLocks::new(),
            rng: Mutex::new(rng),
        }
    }

    /// Generate (or forcibly regenerate) the bracket for a tournament.
    ///
    /// Atomic: either the full set of matches is persisted or nothing
    /// changes. Regeneration replaces the prior bracket and its seed
    /// assignment wholesale.
    pub async fn generate_bracket(
        &self,
        tournament_id: TournamentId,
        method: SeedingMethod,
        force_regenerate: bool,
    ) -> EngineResult<GeneratedBracket> {
        let _guard = self.locks.acquire(tournament_id).await;

        let tournament = self.store.tournament(tournament_id).await?;
        self.check_generation_status(&tournament, force_regenerate)?;

        let existing = self.store.bracket(tournament_id).await?;
        if existing.is_some() && !force_regenerate {
            return Err(EngineError::BracketAlreadyExists(tournament_id));
        }

        let participants = self.roster.confirmed_participants(tournament_id).await?;
        check_field_size(tournament.format, participants.len())?;

        let seeding = {
            let mut rng = self.rng.lock().await;
            assign_seeds(&participants, method, &mut *rng)?
        };
        let generated = bracket::generate(tournament_id, tournament.format, seeding)?;

        let regenerated = existing.is_some();
        if regenerated {
            self.store.replace_bracket(&generated).await?;
        } else {
            self.store.insert_bracket(&generated).await?;
        }
        self.store
            .update_tournament_status(tournament_id, TournamentStatus::InProgress)
            .await?;

        info!(
            "generated {} bracket for tournament {tournament_id}: {} matches (force={force_regenerate})",
            tournament.format, generated.total_matches
        );
        let kind = if regenerated {
            ChangeKind::BracketRegenerated
        } else {
            ChangeKind::BracketGenerated
        };
        self.publisher
            .publish(ChangeEvent::new(tournament_id, kind).with_bracket(generated.id));

        Ok(GeneratedBracket {
            bracket_id: generated.id,
            match_count: generated.total_matches,
        })
    }

    /// Structural health check for a tournament's bracket.
    pub async fn validate_bracket(
        &self,
        tournament_id: TournamentId,
    ) -> EngineResult<BracketValidation> {
        let tournament = self.store.tournament(tournament_id).await?;
        let participants = self.roster.confirmed_participants(tournament_id).await?;
        let bracket = self.store.bracket(tournament_id).await?;

        let participant_count = participants.len();
        let bracket_exists = bracket.is_some();
        let reason = validation_failure(&tournament, participant_count, bracket.as_ref());

        Ok(BracketValidation {
            valid: reason.is_none(),
            reason,
            participant_count,
            bracket_exists,
        })
    }

    /// Move a match from `scheduled` to `in_progress`.
    pub async fn start_match(&self, match_id: MatchId) -> EngineResult<Match> {
        let tournament_id = self.store.find_match(match_id).await?.tournament_id;
        let _guard = self.locks.acquire(tournament_id).await;

        let mut bracket = self.require_bracket(tournament_id).await?;
        let m = require_match(&mut bracket, match_id)?;
        progression::start(m)?;
        let updated = m.clone();

        self.store
            .update_matches(tournament_id, std::slice::from_ref(&updated))
            .await?;
        self.publisher.publish(
            ChangeEvent::new(tournament_id, ChangeKind::MatchStarted).with_match(match_id),
        );
        Ok(updated)
    }

    /// Record a final score; completes the match and advances winner and
    /// loser in one committed unit.
    pub async fn submit_score(
        &self,
        match_id: MatchId,
        score_a: i32,
        score_b: i32,
    ) -> EngineResult<Match> {
        let tournament_id = self.store.find_match(match_id).await?.tournament_id;
        let _guard = self.locks.acquire(tournament_id).await;

        let mut bracket = self.require_bracket(tournament_id).await?;
        let m = require_match(&mut bracket, match_id)?;
        progression::submit_score(m, score_a, score_b, self.policy)?;

        let updated = self
            .commit_completion(tournament_id, &mut bracket, match_id, false)
            .await?;
        Ok(updated)
    }

    /// Elevated override: complete a match without scores. Distinguished
    /// from normal completion in the audit trail and the change feed.
    pub async fn emergency_complete_match(
        &self,
        match_id: MatchId,
        winner_id: PlayerId,
        actor_role: ActorRole,
    ) -> EngineResult<Match> {
        let tournament_id = self.store.find_match(match_id).await?.tournament_id;
        let _guard = self.locks.acquire(tournament_id).await;

        let mut bracket = self.require_bracket(tournament_id).await?;
        let m = require_match(&mut bracket, match_id)?;
        progression::emergency_complete(m, winner_id, actor_role)?;
        warn!("match {match_id} emergency-completed, winner {winner_id}");

        let updated = self
            .commit_completion(tournament_id, &mut bracket, match_id, true)
            .await?;
        Ok(updated)
    }

    /// Correct the score of a completed match. Requires the club-owner role.
    ///
    /// When the correction flips the winner, advancement is re-run: still
    /// `scheduled` downstream slots are rewritten, anything that already
    /// progressed is flagged for review and reported, never cascaded.
    pub async fn edit_score(
        &self,
        match_id: MatchId,
        score_a: i32,
        score_b: i32,
        actor_id: PlayerId,
    ) -> EngineResult<ScoreEditReport> {
        let role = self.roles.role_of(actor_id).await?;
        if role != ActorRole::ClubOwner {
            return Err(EngineError::Unauthorized {
                operation: "score edit".to_string(),
                required: ActorRole::ClubOwner.to_string(),
            });
        }

        let tournament_id = self.store.find_match(match_id).await?.tournament_id;
        let _guard = self.locks.acquire(tournament_id).await;

        let mut bracket = self.require_bracket(tournament_id).await?;
        let m = require_match(&mut bracket, match_id)?;
        let outcome = progression::edit_score(m, score_a, score_b, self.policy)?;

        let mut conflicts = Vec::new();
        let mut touched = vec![match_id];
        if outcome.winner_changed {
            warn!(
                "score edit on match {match_id} by {actor_id} changed winner {} -> {}",
                outcome.previous_winner, outcome.new_winner
            );
            let advancement = advance(&mut bracket, match_id)?;
            conflicts = advancement.conflicts;
            touched.extend(advancement.touched);
        } else {
            info!("score edit on match {match_id} by {actor_id}: winner unchanged");
        }

        let updates = collect_matches(&bracket, &touched);
        self.store.update_matches(tournament_id, &updates).await?;
        self.publisher.publish(
            ChangeEvent::new(tournament_id, ChangeKind::ScoreEdited).with_match(match_id),
        );

        let match_record = bracket
            .match_by_id(match_id)
            .cloned()
            .ok_or(EngineError::MatchNotFound(match_id))?;
        Ok(ScoreEditReport {
            match_record,
            affected_downstream: conflicts,
        })
    }

    /// Cancel a scheduled or running match. Never triggers advancement.
    pub async fn cancel_match(&self, match_id: MatchId) -> EngineResult<Match> {
        let tournament_id = self.store.find_match(match_id).await?.tournament_id;
        let _guard = self.locks.acquire(tournament_id).await;

        let mut bracket = self.require_bracket(tournament_id).await?;
        let m = require_match(&mut bracket, match_id)?;
        progression::cancel(m)?;
        let updated = m.clone();

        self.store
            .update_matches(tournament_id, std::slice::from_ref(&updated))
            .await?;
        self.publisher.publish(
            ChangeEvent::new(tournament_id, ChangeKind::MatchCancelled).with_match(match_id),
        );
        Ok(updated)
    }

    /// Bring a cancelled match back to `scheduled`.
    pub async fn restore_match(&self, match_id: MatchId) -> EngineResult<Match> {
        let tournament_id = self.store.find_match(match_id).await?.tournament_id;
        let _guard = self.locks.acquire(tournament_id).await;

        let mut bracket = self.require_bracket(tournament_id).await?;
        let m = require_match(&mut bracket, match_id)?;
        progression::restore(m)?;
        let updated = m.clone();

        self.store
            .update_matches(tournament_id, std::slice::from_ref(&updated))
            .await?;
        self.publisher.publish(
            ChangeEvent::new(tournament_id, ChangeKind::MatchRestored).with_match(match_id),
        );
        Ok(updated)
    }

    /// Compute the reward table for a tournament. Pure; repeated calls are
    /// free of side effects.
    pub async fn compute_rewards(
        &self,
        tournament_id: TournamentId,
        rank_tier: Option<RankTier>,
    ) -> EngineResult<Vec<RewardPosition>> {
        let tournament = self.store.tournament(tournament_id).await?;
        let field_size = match self.store.bracket(tournament_id).await? {
            Some(bracket) => bracket.seeding.len(),
            None => tournament.capacity,
        };
        Ok(rewards::compute_rewards(
            tournament.prize_pool,
            field_size,
            rank_tier.unwrap_or(RankTier::G),
            &HashMap::new(),
        ))
    }

    /// Final standings of a decided bracket.
    pub async fn final_placements(
        &self,
        tournament_id: TournamentId,
    ) -> EngineResult<Vec<FinalPlacement>> {
        let bracket = self.require_bracket(tournament_id).await?;
        rewards::placements(&bracket)
    }

    async fn require_bracket(&self, tournament_id: TournamentId) -> EngineResult<Bracket> {
        self.store
            .bracket(tournament_id)
            .await?
            .ok_or(EngineError::BracketNotFound(tournament_id))
    }

    fn check_generation_status(
        &self,
        tournament: &Tournament,
        force_regenerate: bool,
    ) -> EngineResult<()> {
        let allowed = match tournament.status {
            TournamentStatus::RegistrationClosed => true,
            TournamentStatus::InProgress => force_regenerate,
            _ => false,
        };
        if !allowed {
            return Err(EngineError::InvalidTournamentStatus {
                tournament_id: tournament.id,
                status: tournament.status.to_string(),
                expected: TournamentStatus::RegistrationClosed.to_string(),
            });
        }
        Ok(())
    }

    /// Persist a completion together with its advancement writes, flip the
    /// tournament to completed when the decisive match is in, and publish.
    async fn commit_completion(
        &self,
        tournament_id: TournamentId,
        bracket: &mut Bracket,
        match_id: MatchId,
        emergency: bool,
    ) -> EngineResult<Match> {
        let advancement = advance(bracket, match_id)?;
        let mut touched = vec![match_id];
        touched.extend(advancement.touched);

        let updates = collect_matches(bracket, &touched);
        self.store.update_matches(tournament_id, &updates).await?;

        let decisive = bracket
            .final_match()
            .map(|f| f.id == match_id)
            .unwrap_or(false);
        if decisive {
            self.store
                .update_tournament_status(tournament_id, TournamentStatus::Completed)
                .await?;
            info!("tournament {tournament_id} completed");
        }

        let mut event =
            ChangeEvent::new(tournament_id, ChangeKind::MatchCompleted).with_match(match_id);
        if emergency {
            event = event.emergency();
        }
        self.publisher.publish(event);
        if decisive {
            self.publisher
                .publish(ChangeEvent::new(tournament_id, ChangeKind::TournamentCompleted));
        }

        bracket
            .match_by_id(match_id)
            .cloned()
            .ok_or(EngineError::MatchNotFound(match_id))
    }
}

/// First structural problem found in a tournament's bracket, if any.
fn validation_failure(
    tournament: &Tournament,
    participant_count: usize,
    bracket: Option<&Bracket>,
) -> Option<String> {
    if let Err(err) = check_field_size(tournament.format, participant_count) {
        return Some(err.to_string());
    }
    let bracket = match bracket {
        Some(b) => b,
        None => return Some("no bracket generated".to_string()),
    };

    let expected = match tournament.format {
        TournamentFormat::SingleElimination => participant_count.saturating_sub(1),
        TournamentFormat::DoubleElimination => DE16_TOTAL_MATCHES,
    };
    if bracket.matches.len() != expected {
        return Some(format!(
            "expected {expected} matches, found {}",
            bracket.matches.len()
        ));
    }
    if let Some(m) = bracket
        .matches
        .iter()
        .find(|m| !bracket.round_is_valid(m.round_number))
    {
        return Some(format!("round {} outside the format vocabulary", m.round_number));
    }
    if let Some(m) = bracket
        .matches
        .iter()
        .find(|m| m.status == MatchStatus::Completed && m.winner_id.is_none())
    {
        return Some(format!("completed match {} has no winner", m.id));
    }
    None
}

fn check_field_size(format: TournamentFormat, count: usize) -> EngineResult<()> {
    match format {
        TournamentFormat::SingleElimination => {
            if count < 2 {
                Err(EngineError::InsufficientParticipants { needed: 2, current: count })
            } else if !count.is_power_of_two() {
                Err(EngineError::InvalidParticipantCount(count))
            } else {
                Ok(())
            }
        }
        TournamentFormat::DoubleElimination => {
            if count == DE16_FIELD_SIZE {
                Ok(())
            } else {
                Err(EngineError::UnsupportedParticipantCount(count))
            }
        }
    }
}

fn require_match(bracket: &mut Bracket, match_id: MatchId) -> EngineResult<&mut Match> {
    bracket
        .match_mut(match_id)
        .ok_or(EngineError::MatchNotFound(match_id))
}

fn collect_matches(bracket: &Bracket, ids: &[MatchId]) -> Vec<Match> {
    let mut seen = Vec::with_capacity(ids.len());
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if seen.contains(id) {
            continue;
        }
        seen.push(*id);
        if let Some(m) = bracket.match_by_id(*id) {
            out.push(m.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_field_size_single_elim() {
        assert!(check_field_size(TournamentFormat::SingleElimination, 8).is_ok());
        assert!(matches!(
            check_field_size(TournamentFormat::SingleElimination, 12),
            Err(EngineError::InvalidParticipantCount(12))
        ));
        assert!(matches!(
            check_field_size(TournamentFormat::SingleElimination, 1),
            Err(EngineError::InsufficientParticipants { .. })
        ));
    }

    #[test]
    fn test_check_field_size_double_elim() {
        assert!(check_field_size(TournamentFormat::DoubleElimination, 16).is_ok());
        for n in [15usize, 17, 8] {
            assert!(matches!(
                check_field_size(TournamentFormat::DoubleElimination, n),
                Err(EngineError::UnsupportedParticipantCount(c)) if c == n
            ));
        }
    }
}
