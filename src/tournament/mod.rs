//! Tournament and participant models.
//!
//! The engine does not own tournament CRUD or registration; those happen in
//! external collaborators. This module defines the records the engine reads
//! (format, capacity, prize pool, lifecycle status) and the participant shape
//! the roster provider hands back.

pub mod models;

pub use models::{
    Participant, PlayerId, RankTier, Tournament, TournamentFormat, TournamentId, TournamentStatus,
};
