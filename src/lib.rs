//! # Pool Tournament
//!
//! A bracket and match-progression engine for pool/billiards competitions.
//!
//! The engine owns the parts of a competition platform with real
//! state-machine semantics: generating structurally valid elimination
//! brackets from a seeded roster, advancing winners and losers through
//! rounds under strict invariants, out-of-band correction (emergency
//! completion, score edits), and position-based reward computation.
//! Identity, storage, payments, and transports stay behind trait
//! boundaries.
//!
//! ## Architecture
//!
//! Data flows one direction at generation time and cyclically afterwards:
//!
//! - [`seeding`]: roster in, ordered seed assignment out
//! - [`bracket`]: seed assignment in, full match set out, with advancement
//!   destinations stamped on every match
//! - [`progression`]: match lifecycle transitions and advancement resolution
//! - [`rewards`]: per-position cash, rating, and ladder point awards
//! - [`sync`]: change events for live observers (at-least-once, re-fetch to
//!   reconcile)
//! - [`store`]: persistence and collaborator trait boundaries
//! - [`engine`]: the operation surface tying it all together
//!
//! ## Example
//!
//! ```no_run
//! use pool_tournament::engine::{EngineConfig, TournamentEngine};
//! use pool_tournament::seeding::SeedingMethod;
//! use pool_tournament::store::MemoryStore;
//! use pool_tournament::sync::NullPublisher;
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let engine = TournamentEngine::new(
//!         store.clone(),
//!         store.clone(),
//!         store.clone(),
//!         Arc::new(NullPublisher),
//!         EngineConfig::default(),
//!     );
//!
//!     let tournament_id = Uuid::new_v4();
//!     let generated = engine
//!         .generate_bracket(tournament_id, SeedingMethod::EloRanking, false)
//!         .await?;
//!     println!("bracket {} with {} matches", generated.bracket_id, generated.match_count);
//!
//!     Ok(())
//! }
//! ```

pub mod bracket;
pub mod cache;
pub mod engine;
pub mod errors;
pub mod progression;
pub mod rewards;
pub mod seeding;
pub mod store;
pub mod sync;
pub mod tournament;

pub use bracket::{Bracket, BracketSegment, Match, MatchId, MatchStatus};
pub use engine::{
    BracketValidation, EngineConfig, GeneratedBracket, ScoreEditReport, TournamentEngine,
};
pub use errors::{EngineError, EngineResult};
pub use progression::{ActorRole, DownstreamConflict, ScorePolicy};
pub use rewards::{FinalPlacement, PositionBucket, RewardPosition};
pub use seeding::{SeedAssignment, SeedingMethod};
pub use sync::{BroadcastHub, ChangeEvent, ChangeKind, EventPublisher, NullPublisher};
pub use tournament::{
    Participant, PlayerId, RankTier, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};
