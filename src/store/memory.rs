//! In-memory store for tests and embedded use.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{EngineStore, RoleProvider, RosterProvider};
use crate::bracket::{Bracket, Match, MatchId};
use crate::errors::{EngineError, EngineResult};
use crate::progression::ActorRole;
use crate::tournament::{Participant, PlayerId, Tournament, TournamentId, TournamentStatus};

/// Hash-map backed store. Also provides the roster and role lookups so a
/// single instance can serve as every collaborator in tests.
#[derive(Default)]
pub struct MemoryStore {
    tournaments: RwLock<HashMap<TournamentId, Tournament>>,
    brackets: RwLock<HashMap<TournamentId, Bracket>>,
    rosters: RwLock<HashMap<TournamentId, Vec<Participant>>>,
    roles: RwLock<HashMap<PlayerId, ActorRole>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_tournament(&self, tournament: Tournament) {
        self.tournaments
            .write()
            .await
            .insert(tournament.id, tournament);
    }

    pub async fn put_roster(&self, tournament_id: TournamentId, roster: Vec<Participant>) {
        self.rosters.write().await.insert(tournament_id, roster);
    }

    pub async fn put_role(&self, actor_id: PlayerId, role: ActorRole) {
        self.roles.write().await.insert(actor_id, role);
    }

    /// Number of live brackets held for the tournament (0 or 1).
    pub async fn bracket_count(&self, tournament_id: TournamentId) -> usize {
        usize::from(self.brackets.read().await.contains_key(&tournament_id))
    }
}

#[async_trait]
impl EngineStore for MemoryStore {
    async fn tournament(&self, id: TournamentId) -> EngineResult<Tournament> {
        self.tournaments
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(EngineError::TournamentNotFound(id))
    }

    async fn update_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> EngineResult<()> {
        let mut tournaments = self.tournaments.write().await;
        let tournament = tournaments
            .get_mut(&id)
            .ok_or(EngineError::TournamentNotFound(id))?;
        tournament.status = status;
        Ok(())
    }

    async fn bracket(&self, tournament_id: TournamentId) -> EngineResult<Option<Bracket>> {
        Ok(self.brackets.read().await.get(&tournament_id).cloned())
    }

    async fn insert_bracket(&self, bracket: &Bracket) -> EngineResult<()> {
        let mut brackets = self.brackets.write().await;
        if brackets.contains_key(&bracket.tournament_id) {
            return Err(EngineError::BracketAlreadyExists(bracket.tournament_id));
        }
        brackets.insert(bracket.tournament_id, bracket.clone());
        Ok(())
    }

    async fn replace_bracket(&self, bracket: &Bracket) -> EngineResult<()> {
        self.brackets
            .write()
            .await
            .insert(bracket.tournament_id, bracket.clone());
        Ok(())
    }

    async fn find_match(&self, id: MatchId) -> EngineResult<Match> {
        let brackets = self.brackets.read().await;
        brackets
            .values()
            .flat_map(|b| b.matches.iter())
            .find(|m| m.id == id)
            .cloned()
            .ok_or(EngineError::MatchNotFound(id))
    }

    async fn update_matches(
        &self,
        tournament_id: TournamentId,
        matches: &[Match],
    ) -> EngineResult<()> {
        let mut brackets = self.brackets.write().await;
        let bracket = brackets
            .get_mut(&tournament_id)
            .ok_or(EngineError::BracketNotFound(tournament_id))?;
        for updated in matches {
            let slot = bracket
                .matches
                .iter_mut()
                .find(|m| m.id == updated.id)
                .ok_or(EngineError::MatchNotFound(updated.id))?;
            *slot = updated.clone();
        }
        Ok(())
    }
}

#[async_trait]
impl RosterProvider for MemoryStore {
    async fn confirmed_participants(
        &self,
        tournament_id: TournamentId,
    ) -> EngineResult<Vec<Participant>> {
        Ok(self
            .rosters
            .read()
            .await
            .get(&tournament_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl RoleProvider for MemoryStore {
    async fn role_of(&self, actor_id: PlayerId) -> EngineResult<ActorRole> {
        Ok(self
            .roles
            .read()
            .await
            .get(&actor_id)
            .copied()
            .unwrap_or(ActorRole::Player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::tournament::TournamentFormat;

    fn tournament() -> Tournament {
        Tournament {
            id: Uuid::new_v4(),
            name: "Test Open".to_string(),
            format: TournamentFormat::SingleElimination,
            capacity: 8,
            prize_pool: 100_000,
            status: TournamentStatus::RegistrationClosed,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_tournament_round_trip() {
        let store = MemoryStore::new();
        let t = tournament();
        let id = t.id;
        store.put_tournament(t).await;

        let loaded = store.tournament(id).await.unwrap();
        assert_eq!(loaded.id, id);

        store
            .update_tournament_status(id, TournamentStatus::InProgress)
            .await
            .unwrap();
        let loaded = store.tournament(id).await.unwrap();
        assert_eq!(loaded.status, TournamentStatus::InProgress);
    }

    #[tokio::test]
    async fn test_missing_tournament() {
        let store = MemoryStore::new();
        let err = store.tournament(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, EngineError::TournamentNotFound(_)));
    }

    #[tokio::test]
    async fn test_default_role_is_player() {
        let store = MemoryStore::new();
        let role = store.role_of(Uuid::new_v4()).await.unwrap();
        assert_eq!(role, ActorRole::Player);

        let owner = Uuid::new_v4();
        store.put_role(owner, ActorRole::ClubOwner).await;
        assert_eq!(store.role_of(owner).await.unwrap(), ActorRole::ClubOwner);
    }
}
