//! Match lifecycle transitions.
//!
//! States: `scheduled -> in_progress -> completed`, with `cancelled`
//! reachable from `scheduled`/`in_progress` and `scheduled` re-reachable from
//! `cancelled` via restore. Emergency completion and score editing are the
//! elevated side doors; both keep the "winner is one of the two assigned
//! players" rule intact.
//!
//! These are pure functions over a single match. The engine calls them under
//! the tournament lock and commits the result together with any advancement
//! writes.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::bracket::{CompletionKind, Match, MatchStatus};
use crate::errors::{EngineError, EngineResult};
use crate::tournament::PlayerId;

/// Caller role for elevated operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Player,
    Referee,
    ClubOwner,
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repr = match self {
            ActorRole::Player => "player",
            ActorRole::Referee => "referee",
            ActorRole::ClubOwner => "club_owner",
        };
        write!(f, "{repr}")
    }
}

/// Score validity policy. The cap is an operational guard against fat-finger
/// entries, not a rule of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePolicy {
    pub max_score: i32,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self { max_score: 100 }
    }
}

/// Outcome of a score edit on a completed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreEditOutcome {
    pub previous_winner: PlayerId,
    pub new_winner: PlayerId,
    pub winner_changed: bool,
}

fn invalid_transition(m: &Match, operation: &str) -> EngineError {
    EngineError::InvalidTransition {
        match_id: m.id,
        operation: operation.to_string(),
        status: m.status.to_string(),
    }
}

fn validate_scores(m: &Match, score_a: i32, score_b: i32, policy: ScorePolicy) -> EngineResult<()> {
    let reason = if score_a == score_b {
        Some("draws are not representable")
    } else if score_a < 0 || score_b < 0 {
        Some("scores cannot be negative")
    } else if score_a > policy.max_score || score_b > policy.max_score {
        Some("score exceeds the format maximum")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(EngineError::InvalidScore {
            match_id: m.id,
            score_a,
            score_b,
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

fn derive_winner(m: &Match, score_a: i32, score_b: i32) -> EngineResult<PlayerId> {
    let winner = if score_a > score_b { m.player_a } else { m.player_b };
    winner.ok_or_else(|| invalid_transition(m, "complete without both players"))
}

/// `scheduled -> in_progress`. Requires both players assigned.
pub fn start(m: &mut Match) -> EngineResult<()> {
    if m.status != MatchStatus::Scheduled {
        return Err(invalid_transition(m, "start"));
    }
    if !m.is_ready() {
        return Err(invalid_transition(m, "start without both players"));
    }
    m.status = MatchStatus::InProgress;
    m.started_at = Some(Utc::now());
    Ok(())
}

/// Record a final score and complete the match. Valid from `scheduled` or
/// `in_progress`; the winner is the higher-scoring player.
pub fn submit_score(
    m: &mut Match,
    score_a: i32,
    score_b: i32,
    policy: ScorePolicy,
) -> EngineResult<()> {
    if !matches!(m.status, MatchStatus::Scheduled | MatchStatus::InProgress) {
        return Err(invalid_transition(m, "submit a score"));
    }
    if !m.is_ready() {
        return Err(invalid_transition(m, "score without both players"));
    }
    validate_scores(m, score_a, score_b, policy)?;

    m.winner_id = Some(derive_winner(m, score_a, score_b)?);
    m.score_a = Some(score_a);
    m.score_b = Some(score_b);
    m.status = MatchStatus::Completed;
    m.completion = Some(CompletionKind::Normal);
    m.completed_at = Some(Utc::now());
    Ok(())
}

/// `scheduled`/`in_progress` -> `cancelled`. Never triggers advancement.
pub fn cancel(m: &mut Match) -> EngineResult<()> {
    if !matches!(m.status, MatchStatus::Scheduled | MatchStatus::InProgress) {
        return Err(invalid_transition(m, "cancel"));
    }
    m.status = MatchStatus::Cancelled;
    Ok(())
}

/// `cancelled -> scheduled`. Clears any partial result.
pub fn restore(m: &mut Match) -> EngineResult<()> {
    if m.status != MatchStatus::Cancelled {
        return Err(invalid_transition(m, "restore"));
    }
    m.status = MatchStatus::Scheduled;
    m.score_a = None;
    m.score_b = None;
    m.winner_id = None;
    m.completion = None;
    m.started_at = None;
    m.completed_at = None;
    Ok(())
}

/// Operational override: complete a match without scores.
///
/// Requires the club-owner role; the winner must still be one of the two
/// assigned players. On a role or player failure the match is left untouched.
pub fn emergency_complete(
    m: &mut Match,
    winner_id: PlayerId,
    actor_role: ActorRole,
) -> EngineResult<()> {
    if actor_role != ActorRole::ClubOwner {
        return Err(EngineError::Unauthorized {
            operation: "emergency completion".to_string(),
            required: ActorRole::ClubOwner.to_string(),
        });
    }
    if !matches!(m.status, MatchStatus::Scheduled | MatchStatus::InProgress) {
        return Err(invalid_transition(m, "emergency-complete"));
    }
    if !m.has_player(winner_id) {
        return Err(EngineError::PlayerNotInMatch {
            match_id: m.id,
            player_id: winner_id,
        });
    }

    m.winner_id = Some(winner_id);
    m.score_a = None;
    m.score_b = None;
    m.status = MatchStatus::Completed;
    m.completion = Some(CompletionKind::Emergency);
    m.completed_at = Some(Utc::now());
    Ok(())
}

/// Correct the score of an already-completed match, re-deriving the winner.
///
/// The caller is responsible for re-running advancement when
/// `winner_changed` comes back true.
pub fn edit_score(
    m: &mut Match,
    score_a: i32,
    score_b: i32,
    policy: ScorePolicy,
) -> EngineResult<ScoreEditOutcome> {
    if m.status != MatchStatus::Completed {
        return Err(invalid_transition(m, "edit the score of"));
    }
    let previous_winner = m
        .winner_id
        .ok_or_else(|| EngineError::CorruptBracket {
            tournament_id: m.tournament_id,
            detail: format!("completed match {} has no winner", m.id),
        })?;
    validate_scores(m, score_a, score_b, policy)?;

    let new_winner = derive_winner(m, score_a, score_b)?;
    m.score_a = Some(score_a);
    m.score_b = Some(score_b);
    m.winner_id = Some(new_winner);
    m.completion = Some(CompletionKind::Normal);

    Ok(ScoreEditOutcome {
        previous_winner,
        new_winner,
        winner_changed: new_winner != previous_winner,
    })
}
