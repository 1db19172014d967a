//! Tournament data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tournament ID type
pub type TournamentId = Uuid;

/// Player ID type
pub type PlayerId = Uuid;

/// Bracket format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Knockout bracket, one loss eliminates
    SingleElimination,
    /// Fixed 16-player double-elimination bracket
    DoubleElimination,
}

impl std::fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentFormat::SingleElimination => write!(f, "single_elimination"),
            TournamentFormat::DoubleElimination => write!(f, "double_elimination"),
        }
    }
}

/// Tournament lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Draft,
    RegistrationOpen,
    RegistrationClosed,
    InProgress,
    Completed,
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repr = match self {
            TournamentStatus::Draft => "draft",
            TournamentStatus::RegistrationOpen => "registration_open",
            TournamentStatus::RegistrationClosed => "registration_closed",
            TournamentStatus::InProgress => "in_progress",
            TournamentStatus::Completed => "completed",
        };
        write!(f, "{repr}")
    }
}

/// Club ladder rank tier, strongest first. Used by the reward point tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankTier {
    E,
    F,
    G,
    H,
    I,
    K,
}

impl RankTier {
    /// Classify a rating value into a tier using the club ladder cutoffs.
    pub fn from_rating(rating: i32) -> Self {
        match rating {
            r if r >= 1900 => RankTier::E,
            r if r >= 1700 => RankTier::F,
            r if r >= 1500 => RankTier::G,
            r if r >= 1300 => RankTier::H,
            r if r >= 1100 => RankTier::I,
            _ => RankTier::K,
        }
    }
}

/// Tournament record as read from the organizing platform.
///
/// The engine mutates only `status`; everything else is owned by the external
/// registration flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: TournamentFormat,
    /// Field size: a power of two for single elimination, 16 for double
    pub capacity: usize,
    /// Prize pool in minor currency units
    pub prize_pool: i64,
    pub status: TournamentStatus,
    pub created_at: DateTime<Utc>,
}

/// A confirmed registrant. Immutable once a bracket has been generated;
/// re-seeding requires regenerating the bracket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub player_id: PlayerId,
    pub display_name: String,
    /// Comparable rating used for seeding
    pub rating: i32,
    pub rank_tier: RankTier,
    pub registered_at: DateTime<Utc>,
}
