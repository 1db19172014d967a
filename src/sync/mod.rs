//! Live sync layer.
//!
//! Propagates bracket and match mutations to interested observers. The
//! contract is deliberately weak so any transport (poll, push, socket) can
//! satisfy it:
//!
//! - delivery is at-least-once; duplicates and reordering are allowed
//! - payloads carry ids only; subscribers reconcile by re-fetching
//!   authoritative state, never by trusting event contents or ordering
//! - publishing is fire-and-forget and must never block or fail the state
//!   transition that produced the event
//!
//! Events carry a monotonically increasing `seq` per hub so a subscriber can
//! notice gaps and fall back to a full re-fetch.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use crate::bracket::{BracketId, MatchId};
use crate::tournament::TournamentId;

/// What changed. Enough for a subscriber to decide which entity to re-fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    BracketGenerated,
    BracketRegenerated,
    MatchStarted,
    MatchCompleted,
    ScoreEdited,
    MatchCancelled,
    MatchRestored,
    TournamentCompleted,
}

/// A change notification. Ids only; the authoritative state lives in the
/// store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Hub-assigned sequence number, monotonically increasing per hub
    pub seq: u64,
    pub tournament_id: TournamentId,
    pub kind: ChangeKind,
    pub match_id: Option<MatchId>,
    pub bracket_id: Option<BracketId>,
    /// True when the change came through the emergency-completion side door
    pub emergency: bool,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Build an unsequenced event; the publisher assigns `seq`.
    pub fn new(tournament_id: TournamentId, kind: ChangeKind) -> Self {
        Self {
            seq: 0,
            tournament_id,
            kind,
            match_id: None,
            bracket_id: None,
            emergency: false,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_match(mut self, match_id: MatchId) -> Self {
        self.match_id = Some(match_id);
        self
    }

    pub fn with_bracket(mut self, bracket_id: BracketId) -> Self {
        self.bracket_id = Some(bracket_id);
        self
    }

    pub fn emergency(mut self) -> Self {
        self.emergency = true;
        self
    }
}

/// Publish side of the sync layer. Implementations must be non-blocking and
/// infallible from the caller's point of view.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}

/// Publisher that drops everything. For callers that do not observe changes.
#[derive(Debug, Default)]
pub struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish(&self, _event: ChangeEvent) {}
}

/// In-process broadcast hub backed by `tokio::sync::broadcast`.
///
/// Slow subscribers lag and lose old events rather than blocking the
/// publisher; a lagged receiver re-fetches state, which the reconciliation
/// contract requires anyway.
pub struct BroadcastHub {
    tx: broadcast::Sender<ChangeEvent>,
    next_seq: AtomicU64,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            next_seq: AtomicU64::new(1),
        }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventPublisher for BroadcastHub {
    fn publish(&self, mut event: ChangeEvent) {
        event.seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        // No receivers is not an error; the state transition already
        // committed.
        if self.tx.send(event).is_err() {
            debug!("change event dropped: no subscribers");
        }
    }
}
