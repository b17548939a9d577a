//! Record store the engine reads from and writes to.
//!
//! Persistence is owned by the surrounding application; the engine only needs
//! these record-oriented operations. [`MemoryStore`] implements them in memory
//! for the web host and for tests.

mod memory;

pub use memory::MemoryStore;

use crate::error::StoreResult;
use crate::models::{
    Category, CategoryId, Competitor, Confrontation, ConfrontationGame, ConfrontationId, Match,
    MatchId, MatchStatus, Participant, ParticipantId, Round, SetScore, Slot, Tournament,
    TournamentId,
};
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// Which matches to list. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchFilter {
    pub tournament_id: TournamentId,
    pub category_id: Option<CategoryId>,
    pub round: Option<Round>,
    pub status: Option<MatchStatus>,
}

impl MatchFilter {
    pub fn tournament(tournament_id: TournamentId) -> Self {
        Self {
            tournament_id,
            ..Self::default()
        }
    }

    pub fn category(tournament_id: TournamentId, category_id: CategoryId) -> Self {
        Self {
            tournament_id,
            category_id: Some(category_id),
            ..Self::default()
        }
    }

    pub fn round(mut self, round: Round) -> Self {
        self.round = Some(round);
        self
    }

    pub fn status(mut self, status: MatchStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, m: &Match) -> bool {
        m.tournament_id == self.tournament_id
            && self.category_id.map_or(true, |c| m.category_id == c)
            && self.round.map_or(true, |r| m.round == r)
            && self.status.map_or(true, |s| m.status == s)
    }
}

/// Partial update of a match. `None` leaves a field untouched; nullable fields
/// use `Some(None)` to clear.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MatchPatch {
    pub team1: Option<Option<Competitor>>,
    pub team2: Option<Option<Competitor>>,
    pub sets: Option<Vec<SetScore>>,
    pub status: Option<MatchStatus>,
    pub winner: Option<Option<Slot>>,
    pub court: Option<Option<u32>>,
    pub scheduled_at: Option<Option<NaiveDateTime>>,
}

impl MatchPatch {
    /// Write (or clear) a single slot.
    pub fn slot(slot: Slot, competitor: Option<Competitor>) -> Self {
        let mut patch = Self::default();
        match slot {
            Slot::Team1 => patch.team1 = Some(competitor),
            Slot::Team2 => patch.team2 = Some(competitor),
        }
        patch
    }

    /// Fill both slots at once.
    pub fn sides(team1: Option<Competitor>, team2: Option<Competitor>) -> Self {
        Self {
            team1: Some(team1),
            team2: Some(team2),
            ..Self::default()
        }
    }

    pub fn apply(self, m: &mut Match) {
        if let Some(v) = self.team1 {
            m.team1 = v;
        }
        if let Some(v) = self.team2 {
            m.team2 = v;
        }
        if let Some(v) = self.sets {
            m.sets = v;
        }
        if let Some(v) = self.status {
            m.status = v;
        }
        if let Some(v) = self.winner {
            m.winner = v;
        }
        if let Some(v) = self.court {
            m.court = v;
        }
        if let Some(v) = self.scheduled_at {
            m.scheduled_at = v;
        }
    }
}

/// Partial update of a participant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParticipantPatch {
    pub group_name: Option<Option<String>>,
    pub final_position: Option<Option<u32>>,
}

impl ParticipantPatch {
    pub fn final_position(position: Option<u32>) -> Self {
        Self {
            final_position: Some(position),
            ..Self::default()
        }
    }

    pub fn group_name(group: Option<String>) -> Self {
        Self {
            group_name: Some(group),
            ..Self::default()
        }
    }

    pub fn apply(self, p: &mut Participant) {
        if let Some(v) = self.group_name {
            p.group_name = v;
        }
        if let Some(v) = self.final_position {
            p.final_position = v;
        }
    }
}

/// Partial update of a confrontation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfrontationPatch {
    pub team1: Option<Option<ParticipantId>>,
    pub team2: Option<Option<ParticipantId>>,
    pub games: Option<Vec<ConfrontationGame>>,
    pub status: Option<MatchStatus>,
    pub winner: Option<Option<Slot>>,
}

impl ConfrontationPatch {
    pub fn slot(slot: Slot, team: Option<ParticipantId>) -> Self {
        let mut patch = Self::default();
        match slot {
            Slot::Team1 => patch.team1 = Some(team),
            Slot::Team2 => patch.team2 = Some(team),
        }
        patch
    }

    pub fn apply(self, c: &mut Confrontation) {
        if let Some(v) = self.team1 {
            c.team1 = v;
        }
        if let Some(v) = self.team2 {
            c.team2 = v;
        }
        if let Some(v) = self.games {
            c.games = v;
        }
        if let Some(v) = self.status {
            c.status = v;
        }
        if let Some(v) = self.winner {
            c.winner = v;
        }
    }
}

/// Record-oriented persistence used by the engine.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>>;

    async fn get_category(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> StoreResult<Option<Category>>;

    /// Matches ordered by round, then position.
    async fn list_matches(&self, filter: &MatchFilter) -> StoreResult<Vec<Match>>;

    async fn get_match(&self, id: MatchId) -> StoreResult<Option<Match>>;

    async fn update_match(&self, id: MatchId, patch: MatchPatch) -> StoreResult<()>;

    async fn insert_matches(&self, matches: Vec<Match>) -> StoreResult<()>;

    /// Participants ordered by registration order.
    async fn list_participants(
        &self,
        tournament_id: TournamentId,
        category_id: Option<CategoryId>,
    ) -> StoreResult<Vec<Participant>>;

    async fn update_participant(&self, id: ParticipantId, patch: ParticipantPatch) -> StoreResult<()>;

    async fn list_confrontations(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> StoreResult<Vec<Confrontation>>;

    async fn get_confrontation(&self, id: ConfrontationId) -> StoreResult<Option<Confrontation>>;

    async fn update_confrontation(
        &self,
        id: ConfrontationId,
        patch: ConfrontationPatch,
    ) -> StoreResult<()>;

    async fn insert_confrontations(&self, confrontations: Vec<Confrontation>) -> StoreResult<()>;
}
