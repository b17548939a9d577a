//! Shared setup for the engine integration tests.
#![allow(dead_code)]

use racquet_tournament::engine::{Engine, EngineConfig};
use racquet_tournament::models::{
    Category, CategoryId, Competitor, Gender, Match, MatchStatus, Participant, ParticipantId,
    Round, SetScore, Tournament, TournamentFormat, TournamentId,
};
use racquet_tournament::store::{MatchFilter, MemoryStore, TournamentStore};
use std::cell::Cell;
use std::sync::Arc;

pub struct Fixture {
    pub engine: Engine<MemoryStore>,
    pub tournament: Tournament,
    pub category: Category,
    registered: Cell<u32>,
}

impl Fixture {
    /// Tournament with one explicit category of the given format.
    pub fn new(format: TournamentFormat) -> Self {
        Self::with_category(format, |_| {})
    }

    pub fn with_category(format: TournamentFormat, configure: impl FnOnce(&mut Category)) -> Self {
        let store = Arc::new(MemoryStore::new());
        let tournament = Tournament::new("Spring open", format);
        let mut category = Category::new(tournament.id, "Open", format);
        configure(&mut category);
        store.insert_tournament(tournament.clone()).unwrap();
        store.insert_category(category.clone()).unwrap();
        Self {
            engine: Engine::new(store, EngineConfig::seeded(2024)),
            tournament,
            category,
            registered: Cell::new(0),
        }
    }

    pub fn ids(&self) -> (TournamentId, CategoryId) {
        (self.tournament.id, self.category.id)
    }

    pub fn teams(&self, names: &[&str], group: Option<&str>) -> Vec<ParticipantId> {
        let offset = self.next_orders(names.len());
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let mut p = Participant::team(self.tournament.id, self.category.id, *name, offset + i as u32);
                if let Some(g) = group {
                    p = p.in_group(g);
                }
                self.engine.store().insert_participant(p.clone()).unwrap();
                p.id
            })
            .collect()
    }

    pub fn players(&self, count: usize, gender: Option<Gender>, group: Option<&str>) -> Vec<ParticipantId> {
        let offset = self.next_orders(count);
        (0..count)
            .map(|i| {
                let order = offset + i as u32;
                let mut p = Participant::individual(
                    self.tournament.id,
                    self.category.id,
                    format!("P{order}"),
                    gender,
                    order,
                );
                if let Some(g) = group {
                    p = p.in_group(g);
                }
                self.engine.store().insert_participant(p.clone()).unwrap();
                p.id
            })
            .collect()
    }

    fn next_orders(&self, count: usize) -> u32 {
        let first = self.registered.get();
        self.registered.set(first + count as u32);
        first
    }

    pub async fn participants(&self) -> Vec<Participant> {
        self.engine
            .store()
            .list_participants(self.tournament.id, Some(self.category.id))
            .await
            .unwrap()
    }

    pub async fn matches(&self) -> Vec<Match> {
        self.engine
            .store()
            .list_matches(&MatchFilter::category(self.tournament.id, self.category.id))
            .await
            .unwrap()
    }

    pub async fn round(&self, round: Round) -> Vec<Match> {
        self.engine
            .store()
            .list_matches(&MatchFilter::category(self.tournament.id, self.category.id).round(round))
            .await
            .unwrap()
    }

    /// Insert one match per pair of sides, positions in order.
    pub async fn insert_round(&self, round: Round, sides: Vec<(Competitor, Competitor)>) -> Vec<Match> {
        let matches: Vec<Match> = sides
            .into_iter()
            .enumerate()
            .map(|(i, (a, b))| {
                Match::new(self.tournament.id, self.category.id, round, i as u32).with_sides(Some(a), Some(b))
            })
            .collect();
        self.engine.store().insert_matches(matches.clone()).await.unwrap();
        matches
    }

    /// Complete every playable match, side one winning, until nothing is left.
    /// Returns how many results were recorded.
    pub async fn play_all(&self) -> usize {
        let mut played = 0;
        loop {
            let pending: Vec<Match> = self
                .matches()
                .await
                .into_iter()
                .filter(|m| m.status != MatchStatus::Completed && m.team1.is_some() && m.team2.is_some())
                .collect();
            if pending.is_empty() {
                return played;
            }
            for m in pending {
                self.engine.record_result(m.id, team1_wins()).await.unwrap();
                played += 1;
            }
        }
    }

    pub async fn positions(&self) -> Vec<(ParticipantId, Option<u32>)> {
        self.participants()
            .await
            .into_iter()
            .map(|p| (p.id, p.final_position))
            .collect()
    }
}

pub fn team1_wins() -> Vec<SetScore> {
    vec![SetScore::new(6, 2), SetScore::new(6, 3)]
}

pub fn team2_wins() -> Vec<SetScore> {
    vec![SetScore::new(2, 6), SetScore::new(3, 6)]
}

pub fn team(id: ParticipantId) -> Competitor {
    Competitor::team(id)
}

/// Round-robin group matches: every earlier-registered team plays side one.
pub fn round_robin(ids: &[ParticipantId]) -> Vec<(Competitor, Competitor)> {
    ids.iter()
        .enumerate()
        .flat_map(|(i, a)| ids[i + 1..].iter().map(move |b| (team(*a), team(*b))))
        .collect()
}

pub fn position_of(positions: &[(ParticipantId, Option<u32>)], id: ParticipantId) -> Option<u32> {
    positions.iter().find(|(p, _)| *p == id).and_then(|(_, pos)| *pos)
}

/// Positions sorted; a complete category gives exactly 1..=n.
pub fn sorted_positions(positions: &[(ParticipantId, Option<u32>)]) -> Vec<u32> {
    let mut numbers: Vec<u32> = positions.iter().filter_map(|(_, p)| *p).collect();
    numbers.sort();
    numbers
}
