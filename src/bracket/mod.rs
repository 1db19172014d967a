//! Bracket models, generation, and static advancement topology.
//!
//! This module provides:
//! - Match and bracket records with the fixed round-number vocabulary
//! - Single-elimination generation for power-of-two fields
//! - The fixed 16-player double-elimination format (27 matches)
//! - Advancement destinations stamped onto every match at generation time

pub mod generator;
pub mod models;
pub mod topology;

pub use generator::{generate, generate_double_elimination, generate_single_elimination};
pub use models::{
    Bracket, BracketId, BracketSegment, CompletionKind, DE16_FIELD_SIZE, DE16_ROUNDS,
    DE16_TOTAL_MATCHES, Destination, Match, MatchId, MatchStatus, ROUND_GRAND_FINAL,
    ROUND_LOSERS_A1, ROUND_LOSERS_A2, ROUND_LOSERS_A3, ROUND_LOSERS_B1, ROUND_LOSERS_B2,
    ROUND_SEMIFINALS, ROUND_WINNERS_1, ROUND_WINNERS_2, ROUND_WINNERS_3, SlotSide,
};
pub use topology::{Routes, de16_round_size, de16_routes, single_elim_routes};
