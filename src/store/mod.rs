//! Persistence and collaborator boundaries.
//!
//! The engine reads and writes tournament state only through these traits,
//! which keeps the bracket logic testable and lets callers inject their own
//! storage. `MemoryStore` backs the test suites; `PgEngineStore` is the
//! PostgreSQL implementation.
//!
//! Atomicity contract: `insert_bracket`, `replace_bracket`, and
//! `update_matches` each commit all of their writes or none of them. A match
//! state transition plus its advancement writes arrive as one
//! `update_matches` batch.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::bracket::{Bracket, Match, MatchId};
use crate::errors::EngineResult;
use crate::progression::ActorRole;
use crate::tournament::{Participant, PlayerId, Tournament, TournamentId, TournamentStatus};

/// Storage boundary for tournament, bracket, and match records.
#[async_trait]
pub trait EngineStore: Send + Sync {
    /// Load a tournament record
    async fn tournament(&self, id: TournamentId) -> EngineResult<Tournament>;

    /// Persist a tournament lifecycle change
    async fn update_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> EngineResult<()>;

    /// Load the live bracket for a tournament, if one exists
    async fn bracket(&self, tournament_id: TournamentId) -> EngineResult<Option<Bracket>>;

    /// Persist a freshly generated bracket. Fails with
    /// `BracketAlreadyExists` when the tournament already has one.
    async fn insert_bracket(&self, bracket: &Bracket) -> EngineResult<()>;

    /// Atomically delete any existing bracket and persist the replacement.
    async fn replace_bracket(&self, bracket: &Bracket) -> EngineResult<()>;

    /// Load a single match by id
    async fn find_match(&self, id: MatchId) -> EngineResult<Match>;

    /// Persist a batch of match updates as one unit
    async fn update_matches(
        &self,
        tournament_id: TournamentId,
        matches: &[Match],
    ) -> EngineResult<()>;
}

/// Roster source: confirmed registrants with ratings.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    async fn confirmed_participants(
        &self,
        tournament_id: TournamentId,
    ) -> EngineResult<Vec<Participant>>;
}

/// Actor/role check for elevated operations.
#[async_trait]
pub trait RoleProvider: Send + Sync {
    async fn role_of(&self, actor_id: PlayerId) -> EngineResult<ActorRole>;
}

pub use memory::MemoryStore;
pub use postgres::PgEngineStore;
