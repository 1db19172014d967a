//! Engine error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the tournament engine.
///
/// Every variant carries enough context (ids, offending values) for a caller
/// to render a user-facing message without re-querying the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Tournament not found
    #[error("Tournament not found: {0}")]
    TournamentNotFound(Uuid),

    /// Match not found
    #[error("Match not found: {0}")]
    MatchNotFound(Uuid),

    /// No bracket has been generated for the tournament
    #[error("No bracket exists for tournament {0}")]
    BracketNotFound(Uuid),

    /// Fewer participants than the format's minimum
    #[error("Insufficient participants: need at least {needed}, have {current}")]
    InsufficientParticipants { needed: usize, current: usize },

    /// Participant count invalid for single elimination (must be a power of two)
    #[error("Invalid participant count for single elimination: {0} (must be a power of two)")]
    InvalidParticipantCount(usize),

    /// Participant count invalid for the fixed double-elimination format
    #[error("Unsupported participant count for double elimination: {0} (format requires exactly {expected})", expected = crate::bracket::DE16_FIELD_SIZE)]
    UnsupportedParticipantCount(usize),

    /// A live bracket already exists and regeneration was not forced
    #[error("Bracket already exists for tournament {0}")]
    BracketAlreadyExists(Uuid),

    /// Score pair rejected (draw, negative, or above the format maximum)
    #[error("Invalid score {score_a}-{score_b} for match {match_id}: {reason}")]
    InvalidScore {
        match_id: Uuid,
        score_a: i32,
        score_b: i32,
        reason: String,
    },

    /// Operation not valid from the match's current status
    #[error("Invalid transition for match {match_id}: cannot {operation} while {status}")]
    InvalidTransition {
        match_id: Uuid,
        operation: String,
        status: String,
    },

    /// Declared winner is not one of the match's assigned players
    #[error("Player {player_id} is not assigned to match {match_id}")]
    PlayerNotInMatch { match_id: Uuid, player_id: Uuid },

    /// Elevated operation attempted without the required role
    #[error("Unauthorized: {operation} requires {required} role")]
    Unauthorized { operation: String, required: String },

    /// Advancement would overwrite a match that already progressed
    #[error("Downstream conflict: match {match_id} already progressed past scheduling")]
    DownstreamConflict { match_id: Uuid },

    /// Tournament is not in a status that permits the operation
    #[error("Tournament {tournament_id} is {status}; expected {expected}")]
    InvalidTournamentStatus {
        tournament_id: Uuid,
        status: String,
        expected: String,
    },

    /// Structural corruption in a generated bracket. Advancement halts on the
    /// bracket rather than guessing.
    #[error("Corrupt bracket for tournament {tournament_id}: {detail}")]
    CorruptBracket { tournament_id: Uuid, detail: String },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
