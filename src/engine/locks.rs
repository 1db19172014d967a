//! Per-tournament mutual exclusion.
//!
//! Generation and match transitions serialize per tournament, not globally;
//! two tournaments never contend with each other.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::tournament::TournamentId;

#[derive(Default)]
pub struct TournamentLocks {
    inner: Mutex<HashMap<TournamentId, Arc<Mutex<()>>>>,
}

impl TournamentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for one tournament, creating it on first use. The
    /// guard is held across the whole read-mutate-persist cycle.
    pub async fn acquire(&self, id: TournamentId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_same_tournament_serializes() {
        let locks = Arc::new(TournamentLocks::new());
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).await;
        let locks_clone = locks.clone();
        let contender = tokio::spawn(async move { locks_clone.acquire(id).await });

        // The second acquire cannot finish while the first guard is held.
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(guard);
        let _guard = contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_tournaments_do_not_contend() {
        let locks = TournamentLocks::new();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let _b = locks.acquire(Uuid::new_v4()).await;
    }
}
