//! Match progression: lifecycle transitions and advancement resolution.
//!
//! `state_machine` owns single-match transitions; `advancement` moves
//! winners and losers into the downstream slots stamped on each match at
//! generation time. The engine commits a transition and its advancement
//! writes as one unit.

pub mod advancement;
pub mod state_machine;

pub use advancement::{AdvancementOutcome, DownstreamConflict, advance};
pub use state_machine::{
    ActorRole, ScoreEditOutcome, ScorePolicy, cancel, edit_score, emergency_complete, restore,
    start, submit_score,
};
