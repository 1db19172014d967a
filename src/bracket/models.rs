//! Match and bracket data models.
//!
//! Round numbers are a protocol contract consumed by downstream rendering:
//! winners rounds count `1, 2, 3, ...`; the fixed double-elimination format
//! additionally uses `101..103` (losers branch one), `201..202` (losers
//! branch two), `250` (semifinals) and `300` (grand final). The engine must
//! reproduce this vocabulary exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::seeding::SeedAssignment;
use crate::tournament::{PlayerId, TournamentFormat, TournamentId};

/// Match ID type
pub type MatchId = Uuid;

/// Bracket ID type
pub type BracketId = Uuid;

/// Winners bracket round 1
pub const ROUND_WINNERS_1: i32 = 1;
/// Winners bracket round 2
pub const ROUND_WINNERS_2: i32 = 2;
/// Winners bracket round 3
pub const ROUND_WINNERS_3: i32 = 3;
/// Losers branch one, stage 1 (receives winners round 1 losers)
pub const ROUND_LOSERS_A1: i32 = 101;
/// Losers branch one, stage 2
pub const ROUND_LOSERS_A2: i32 = 102;
/// Losers branch one, stage 3
pub const ROUND_LOSERS_A3: i32 = 103;
/// Losers branch two, stage 1 (receives winners round 2 losers)
pub const ROUND_LOSERS_B1: i32 = 201;
/// Losers branch two, stage 2
pub const ROUND_LOSERS_B2: i32 = 202;
/// Semifinals
pub const ROUND_SEMIFINALS: i32 = 250;
/// Grand final
pub const ROUND_GRAND_FINAL: i32 = 300;

/// The complete double-elimination round vocabulary.
pub const DE16_ROUNDS: [i32; 10] = [
    ROUND_WINNERS_1,
    ROUND_WINNERS_2,
    ROUND_WINNERS_3,
    ROUND_LOSERS_A1,
    ROUND_LOSERS_A2,
    ROUND_LOSERS_A3,
    ROUND_LOSERS_B1,
    ROUND_LOSERS_B2,
    ROUND_SEMIFINALS,
    ROUND_GRAND_FINAL,
];

/// Fixed field size of the double-elimination format
pub const DE16_FIELD_SIZE: usize = 16;

/// Fixed match count of the double-elimination format
pub const DE16_TOTAL_MATCHES: usize = 27;

/// Bracket segment a match belongs to.
///
/// `ThirdPlace` is part of the serialization vocabulary for downstream
/// consumers even though neither generator currently emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSegment {
    Winners,
    Losers,
    Semifinals,
    Finals,
    ThirdPlace,
}

/// Match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repr = match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::InProgress => "in_progress",
            MatchStatus::Completed => "completed",
            MatchStatus::Cancelled => "cancelled",
        };
        write!(f, "{repr}")
    }
}

/// How a completed match was resolved. Emergency completion must stay
/// distinguishable from normal completion in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    Normal,
    Emergency,
}

/// Which player slot of a match a destination points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSide {
    A,
    B,
}

/// A downstream player slot, addressed by round and slot number.
///
/// Destinations are stamped onto matches at generation time; advancement
/// reads them back instead of re-deriving the topology at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub round: i32,
    pub slot: i32,
    pub side: SlotSide,
}

/// One match slot in a bracket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    pub round_number: i32,
    pub segment: BracketSegment,
    /// 1-based slot within the round
    pub slot_number: i32,
    /// Unresolved until the upstream match completes
    pub player_a: Option<PlayerId>,
    pub player_b: Option<PlayerId>,
    pub score_a: Option<i32>,
    pub score_b: Option<i32>,
    pub status: MatchStatus,
    pub winner_id: Option<PlayerId>,
    pub completion: Option<CompletionKind>,
    /// Set when a score edit displaced a player this match already consumed
    pub requires_review: bool,
    /// Where the winner advances to, if anywhere
    pub winner_to: Option<Destination>,
    /// Where the loser drops to (double elimination), if anywhere
    pub loser_to: Option<Destination>,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    /// True if the given player occupies one of this match's slots
    pub fn has_player(&self, player_id: PlayerId) -> bool {
        self.player_a == Some(player_id) || self.player_b == Some(player_id)
    }

    /// Both players assigned
    pub fn is_ready(&self) -> bool {
        self.player_a.is_some() && self.player_b.is_some()
    }

    /// The loser of a completed match, if it completed with scores or an
    /// emergency winner and both players were assigned.
    pub fn loser_id(&self) -> Option<PlayerId> {
        let winner = self.winner_id?;
        match (self.player_a, self.player_b) {
            (Some(a), Some(b)) if winner == a => Some(b),
            (Some(a), Some(b)) if winner == b => Some(a),
            _ => None,
        }
    }
}

/// The full set of matches for one tournament run plus derived metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bracket {
    pub id: BracketId,
    pub tournament_id: TournamentId,
    pub format: TournamentFormat,
    pub seeding: SeedAssignment,
    pub matches: Vec<Match>,
    pub total_rounds: u32,
    pub total_matches: usize,
    pub generated_at: DateTime<Utc>,
}

impl Bracket {
    pub fn match_by_id(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn match_mut(&mut self, id: MatchId) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.id == id)
    }

    /// Look up a match by its topology address.
    pub fn match_at(&self, round: i32, slot: i32) -> Option<&Match> {
        self.matches
            .iter()
            .find(|m| m.round_number == round && m.slot_number == slot)
    }

    pub fn match_at_mut(&mut self, round: i32, slot: i32) -> Option<&mut Match> {
        self.matches
            .iter_mut()
            .find(|m| m.round_number == round && m.slot_number == slot)
    }

    /// True once the decisive match (grand final or single-elim final) has
    /// completed.
    pub fn is_decided(&self) -> bool {
        self.final_match()
            .map(|m| m.status == MatchStatus::Completed)
            .unwrap_or(false)
    }

    /// The decisive match of the bracket.
    pub fn final_match(&self) -> Option<&Match> {
        match self.format {
            TournamentFormat::DoubleElimination => self.match_at(ROUND_GRAND_FINAL, 1),
            TournamentFormat::SingleElimination => {
                self.match_at(self.total_rounds as i32, 1)
            }
        }
    }

    /// Round numbers that are legal for this bracket's format.
    pub fn round_is_valid(&self, round: i32) -> bool {
        match self.format {
            TournamentFormat::DoubleElimination => DE16_ROUNDS.contains(&round),
            TournamentFormat::SingleElimination => {
                round >= 1 && round <= self.total_rounds as i32
            }
        }
    }
}
