//! In-memory [`TournamentStore`]: a `RwLock` over plain maps.

use super::{ConfrontationPatch, MatchFilter, MatchPatch, ParticipantPatch, TournamentStore};
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Category, CategoryId, Confrontation, ConfrontationId, Match, MatchId, Participant,
    ParticipantId, Tournament, TournamentId,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Records {
    tournaments: HashMap<TournamentId, Tournament>,
    categories: HashMap<CategoryId, Category>,
    participants: HashMap<ParticipantId, Participant>,
    matches: HashMap<MatchId, Match>,
    confrontations: HashMap<ConfrontationId, Confrontation>,
}

/// Thread-safe in-memory store.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Records>> {
        self.records
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Records>> {
        self.records
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    pub fn insert_tournament(&self, tournament: Tournament) -> StoreResult<()> {
        self.write()?.tournaments.insert(tournament.id, tournament);
        Ok(())
    }

    pub fn insert_category(&self, category: Category) -> StoreResult<()> {
        let mut records = self.write()?;
        if !records.tournaments.contains_key(&category.tournament_id) {
            return Err(StoreError::NotFound(format!(
                "tournament {}",
                category.tournament_id
            )));
        }
        records.categories.insert(category.id, category);
        Ok(())
    }

    pub fn insert_participant(&self, participant: Participant) -> StoreResult<()> {
        self.write()?.participants.insert(participant.id, participant);
        Ok(())
    }

    pub fn list_tournaments(&self) -> StoreResult<Vec<Tournament>> {
        Ok(self.read()?.tournaments.values().cloned().collect())
    }

    pub fn get_participant(&self, id: ParticipantId) -> StoreResult<Option<Participant>> {
        Ok(self.read()?.participants.get(&id).cloned())
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        Ok(self.read()?.tournaments.get(&id).cloned())
    }

    async fn get_category(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> StoreResult<Option<Category>> {
        Ok(self
            .read()?
            .categories
            .get(&category_id)
            .filter(|c| c.tournament_id == tournament_id)
            .cloned())
    }

    async fn list_matches(&self, filter: &MatchFilter) -> StoreResult<Vec<Match>> {
        let mut matches: Vec<Match> = self
            .read()?
            .matches
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.round, m.position));
        Ok(matches)
    }

    async fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>> {
        Ok(self.read()?.matches.get(&id).cloned())
    }

    async fn update_match(&self, id: MatchId, patch: MatchPatch) -> StoreResult<()> {
        let mut records = self.write()?;
        let m = records
            .matches
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("match {id}")))?;
        patch.apply(m);
        Ok(())
    }

    async fn insert_matches(&self, matches: Vec<Match>) -> StoreResult<()> {
        let mut records = self.write()?;
        if let Some(dup) = matches.iter().find(|m| records.matches.contains_key(&m.id)) {
            return Err(StoreError::Conflict(format!("match {} already exists", dup.id)));
        }
        for m in matches {
            records.matches.insert(m.id, m);
        }
        Ok(())
    }

    async fn list_participants(
        &self,
        tournament_id: TournamentId,
        category_id: Option<CategoryId>,
    ) -> StoreResult<Vec<Participant>> {
        let mut participants: Vec<Participant> = self
            .read()?
            .participants
            .values()
            .filter(|p| p.tournament_id == tournament_id)
            .filter(|p| category_id.map_or(true, |c| p.category_id == c))
            .cloned()
            .collect();
        participants.sort_by_key(|p| p.registration_order);
        Ok(participants)
    }

    async fn update_participant(&self, id: ParticipantId, patch: ParticipantPatch) -> StoreResult<()> {
        let mut records = self.write()?;
        let p = records
            .participants
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("participant {id}")))?;
        patch.apply(p);
        Ok(())
    }

    async fn list_confrontations(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> StoreResult<Vec<Confrontation>> {
        let mut confrontations: Vec<Confrontation> = self
            .read()?
            .confrontations
            .values()
            .filter(|c| c.tournament_id == tournament_id && c.category_id == category_id)
            .cloned()
            .collect();
        confrontations.sort_by_key(|c| (c.round, c.position));
        Ok(confrontations)
    }

    async fn get_confrontation(&self, id: ConfrontationId) -> StoreResult<Option<Confrontation>> {
        Ok(self.read()?.confrontations.get(&id).cloned())
    }

    async fn update_confrontation(
        &self,
        id: ConfrontationId,
        patch: ConfrontationPatch,
    ) -> StoreResult<()> {
        let mut records = self.write()?;
        let c = records
            .confrontations
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("confrontation {id}")))?;
        patch.apply(c);
        Ok(())
    }

    async fn insert_confrontations(&self, confrontations: Vec<Confrontation>) -> StoreResult<()> {
        let mut records = self.write()?;
        for c in confrontations {
            records.confrontations.insert(c.id, c);
        }
        Ok(())
    }
}
