//! Engine: the entry points an event handler calls, one per trigger.
//!
//! Every entry point that writes holds the category's lock for its whole
//! read-compute-write sequence, so two sibling completions in one category run
//! one after the other. Randomness comes from one seedable generator; each call
//! takes its own child generator from it. Pooled bracket draws use a fixed seed
//! per engine instead, so replaying a reverted result draws the same sides.

use crate::error::{EngineError, EngineResult};
use crate::logic::{
    advance, advance_confrontation, build_confrontation_round, build_crossed_first_round,
    build_knockout_round, build_placement_tiers, clear_final_positions, first_open_tier,
    generate_americano_round, generate_mixed_gender_round, group_matches, qualify,
    qualify_for_stage, rank_across_groups, revert, standings_by_group, write_final_positions,
    AdvanceReport, BracketContext, GreedyAmericano, GreedyMixedScheduler, MixedScheduler,
    Pairing, PairingGenerator, RevertReport, SlotFinder,
};
use crate::models::{
    decide_winner, Category, CategoryId, Confrontation, ConfrontationGame, ConfrontationId,
    Gender, Match, MatchId, MatchStatus, Participant, ParticipantId, Round, SetScore, Tournament,
    TournamentFormat, TournamentId, MAX_SETS,
};
use crate::store::{ConfrontationPatch, MatchFilter, MatchPatch, ParticipantPatch, TournamentStore};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Engine settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Fixed seed for every shuffle; entropy when None.
    pub seed: Option<u64>,
}

impl EngineConfig {
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

/// What finishing a group stage produced.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GroupStageOutcome {
    /// Qualifiers in seeding order.
    pub qualified: Vec<ParticipantId>,
    pub matches_created: usize,
    pub skipped: Option<String>,
}

impl GroupStageOutcome {
    fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            ..Self::default()
        }
    }
}

pub struct Engine<S: TournamentStore> {
    store: Arc<S>,
    rng: Mutex<StdRng>,
    pool_seed: u64,
    locks: Mutex<HashMap<CategoryId, Arc<tokio::sync::Mutex<()>>>>,
    mixed: Box<dyn MixedScheduler>,
    americano: Box<dyn PairingGenerator>,
}

impl<S: TournamentStore> Engine<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let pool_seed = config.seed.unwrap_or_else(|| rng.next_u64());
        Self {
            store,
            rng: Mutex::new(rng),
            pool_seed,
            locks: Mutex::new(HashMap::new()),
            mixed: Box::new(GreedyMixedScheduler),
            americano: Box::new(GreedyAmericano),
        }
    }

    /// Swap the pairing generators.
    pub fn with_generators(
        mut self,
        mixed: Box<dyn MixedScheduler>,
        americano: Box<dyn PairingGenerator>,
    ) -> Self {
        self.mixed = mixed;
        self.americano = americano;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn child_rng(&self) -> StdRng {
        let mut parent = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        StdRng::seed_from_u64(parent.next_u64())
    }

    fn bracket<'a>(
        &self,
        tournament: &'a Tournament,
        category: &'a Category,
    ) -> BracketContext<'a> {
        BracketContext::new(tournament, category).with_seed(self.pool_seed)
    }

    fn category_lock(&self, id: CategoryId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(id).or_default().clone()
    }

    /// Tournament and category; a tournament without categories is its own category.
    async fn context(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> EngineResult<(Tournament, Category)> {
        let tournament = self
            .store
            .get_tournament(tournament_id)
            .await?
            .ok_or(EngineError::TournamentNotFound(tournament_id))?;
        let category = match self.store.get_category(tournament_id, category_id).await? {
            Some(category) => category,
            None if category_id == tournament_id => Category::implicit_for(&tournament),
            None => return Err(EngineError::CategoryNotFound(category_id)),
        };
        Ok((tournament, category))
    }

    async fn load_match(&self, id: MatchId) -> EngineResult<Match> {
        self.store
            .get_match(id)
            .await?
            .ok_or(EngineError::MatchNotFound(id))
    }

    /// Store the sets of a match, mark it completed and advance the bracket.
    pub async fn record_result(
        &self,
        match_id: MatchId,
        sets: Vec<SetScore>,
    ) -> EngineResult<AdvanceReport> {
        if sets.is_empty() || sets.len() > MAX_SETS {
            return Err(EngineError::InvalidScore(format!(
                "expected 1 to {MAX_SETS} sets, got {}",
                sets.len()
            )));
        }
        let m = self.load_match(match_id).await?;
        let (tournament, category) = self.context(m.tournament_id, m.category_id).await?;
        let lock = self.category_lock(category.id);
        let _guard = lock.lock().await;

        let winner = decide_winner(&sets);
        self.store
            .update_match(
                match_id,
                MatchPatch {
                    sets: Some(sets),
                    status: Some(MatchStatus::Completed),
                    winner: Some(winner),
                    ..MatchPatch::default()
                },
            )
            .await?;
        let ctx = self.bracket(&tournament, &category);
        advance(self.store.as_ref(), &ctx, match_id).await
    }

    /// Advance a match whose result was stored elsewhere. Safe to repeat.
    pub async fn on_match_completed(&self, match_id: MatchId) -> EngineResult<AdvanceReport> {
        let m = self.load_match(match_id).await?;
        let (tournament, category) = self.context(m.tournament_id, m.category_id).await?;
        let lock = self.category_lock(category.id);
        let _guard = lock.lock().await;
        let ctx = self.bracket(&tournament, &category);
        advance(self.store.as_ref(), &ctx, match_id).await
    }

    pub async fn revert_match(&self, match_id: MatchId) -> EngineResult<RevertReport> {
        let m = self.load_match(match_id).await?;
        let (tournament, category) = self.context(m.tournament_id, m.category_id).await?;
        let lock = self.category_lock(category.id);
        let _guard = lock.lock().await;
        let ctx = self.bracket(&tournament, &category);
        revert(self.store.as_ref(), &ctx, match_id).await
    }

    /// Recompute and store final positions; 0 while the championship is undecided.
    pub async fn compute_final_positions(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> EngineResult<usize> {
        let (tournament, category) = self.context(tournament_id, category_id).await?;
        let lock = self.category_lock(category.id);
        let _guard = lock.lock().await;
        let ctx = self.bracket(&tournament, &category);
        let matches = self
            .store
            .list_matches(&MatchFilter::category(tournament.id, category.id))
            .await?;
        write_final_positions(self.store.as_ref(), &ctx, &matches).await
    }

    /// Null every final position of a category.
    pub async fn clear_final_positions(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> EngineResult<usize> {
        let (tournament, category) = self.context(tournament_id, category_id).await?;
        let lock = self.category_lock(category.id);
        let _guard = lock.lock().await;
        clear_final_positions(self.store.as_ref(), &self.bracket(&tournament, &category)).await
    }

    /// Rank the groups, select qualifiers and insert the first knockout round
    /// (plus placement-tier semifinals for individual formats).
    pub async fn finish_group_stage(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
    ) -> EngineResult<GroupStageOutcome> {
        let (tournament, category) = self.context(tournament_id, category_id).await?;
        let lock = self.category_lock(category.id);
        let _guard = lock.lock().await;

        let matches = self
            .store
            .list_matches(&MatchFilter::category(tournament.id, category.id))
            .await?;
        if matches.iter().any(|m| !m.round.is_group()) {
            log::info!("Category {} already has knockout matches", category.id);
            return Ok(GroupStageOutcome::skipped("knockout already seeded"));
        }
        let mut participants = self
            .store
            .list_participants(tournament.id, Some(category.id))
            .await?;
        self.backfill_group_names(&mut participants, &matches).await?;

        let standings = standings_by_group(&participants, &matches);
        if standings.is_empty() {
            log::info!("Category {} has no groups to rank", category.id);
            return Ok(GroupStageOutcome::skipped("no groups"));
        }
        let played = group_matches(&matches);

        let mut created = Vec::new();
        let qualified: Vec<ParticipantId>;
        if category.format == TournamentFormat::CrossedPlayoffs {
            let Some(round) = build_crossed_first_round(&category, &standings) else {
                log::info!(
                    "Crossed playoffs need 3 groups of 4, category {} has {} group(s)",
                    category.id,
                    standings.len()
                );
                return Ok(GroupStageOutcome::skipped("crossed playoffs need 3 groups of 4"));
            };
            qualified = round.iter().flat_map(|m| m.participants()).collect();
            created.extend(round);
        } else {
            qualified = match category.knockout_stage {
                Some(stage) => qualify_for_stage(&standings, stage, &played),
                None => qualify(&standings, category.qualified_per_group as usize, &played),
            };
            let Some(round) = build_knockout_round(&category, &qualified) else {
                log::info!(
                    "{} qualifier(s) in category {} do not form a bracket",
                    qualified.len(),
                    category.id
                );
                return Ok(GroupStageOutcome::skipped("qualifiers do not form a bracket"));
            };
            let first = round.first().map(|m| m.round);
            created.extend(round);
            if let Some(tier) = first.filter(|_| category.format.is_individual()).and_then(first_open_tier) {
                let taken: HashSet<ParticipantId> = qualified.iter().copied().collect();
                let rest: Vec<ParticipantId> = rank_across_groups(&standings, &played)
                    .into_iter()
                    .filter(|id| !taken.contains(id))
                    .collect();
                created.extend(build_placement_tiers(&category, tier, &rest));
            }
        }

        self.schedule(&tournament, &mut created).await?;
        let count = created.len();
        self.store.insert_matches(created).await?;
        log::info!(
            "Group stage of category {} finished: {} qualified, {} match(es) created",
            category.id,
            qualified.len(),
            count
        );
        Ok(GroupStageOutcome {
            qualified,
            matches_created: count,
            skipped: None,
        })
    }

    /// Give participants without a group the group of the matches they played in.
    async fn backfill_group_names(
        &self,
        participants: &mut [Participant],
        matches: &[Match],
    ) -> EngineResult<()> {
        for p in participants.iter_mut().filter(|p| p.group_name.is_none()) {
            let label = matches
                .iter()
                .filter(|m| m.round.is_group() && m.side_of(p.id).is_some())
                .find_map(|m| m.round.group_label());
            if let Some(label) = label {
                self.store
                    .update_participant(p.id, ParticipantPatch::group_name(Some(label.clone())))
                    .await?;
                p.group_name = Some(label);
            }
        }
        Ok(())
    }

    /// Courts and times for a batch, starting in a fresh time slot.
    async fn schedule(&self, tournament: &Tournament, batch: &mut [Match]) -> EngineResult<()> {
        let existing = self.store.list_matches(&MatchFilter::tournament(tournament.id)).await?;
        let mut finder = SlotFinder::new(tournament, &existing);
        finder.start_new_timeslot();
        for m in batch.iter_mut() {
            finder.assign(m);
        }
        Ok(())
    }

    /// Turn pairings into matches of `round`, numbered after the round's existing
    /// matches; each generated round number gets its own time slot.
    async fn insert_pairings(
        &self,
        tournament: &Tournament,
        category: &Category,
        round: Round,
        pairings: Vec<Pairing>,
    ) -> EngineResult<Vec<Match>> {
        let filter = MatchFilter::category(tournament.id, category.id).round(round);
        let offset = self.store.list_matches(&filter).await?.len() as u32;
        let existing = self.store.list_matches(&MatchFilter::tournament(tournament.id)).await?;
        let mut finder = SlotFinder::new(tournament, &existing);
        let mut current_round = None;
        let mut created = Vec::with_capacity(pairings.len());
        for (i, pairing) in pairings.into_iter().enumerate() {
            if current_round != Some(pairing.round_number) {
                finder.start_new_timeslot();
                current_round = Some(pairing.round_number);
            }
            let mut m = Match::new(tournament.id, category.id, round, offset + i as u32)
                .with_sides(Some(pairing.team1), Some(pairing.team2));
            finder.assign(&mut m);
            created.push(m);
        }
        self.store.insert_matches(created.clone()).await?;
        Ok(created)
    }

    fn split_by_gender(participants: &[Participant]) -> (Vec<ParticipantId>, Vec<ParticipantId>) {
        let with = |g: Gender| -> Vec<ParticipantId> {
            participants
                .iter()
                .filter(|p| p.gender() == Some(g))
                .map(|p| p.id)
                .collect()
        };
        (with(Gender::Male), with(Gender::Female))
    }

    fn group_round(participants: &[Participant], group: Option<&str>) -> Round {
        group
            .or_else(|| participants.iter().find_map(|p| p.group_name.as_deref()))
            .and_then(Round::group)
            .unwrap_or(Round::Group('A'))
    }

    /// Generate and store a whole Mixed American schedule.
    pub async fn generate_mixed_american_schedule(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
        matches_per_player: u32,
    ) -> EngineResult<Vec<Match>> {
        let (tournament, category) = self.context(tournament_id, category_id).await?;
        let lock = self.category_lock(category.id);
        let _guard = lock.lock().await;

        let participants = self
            .store
            .list_participants(tournament.id, Some(category.id))
            .await?;
        let (men, women) = Self::split_by_gender(&participants);
        let smaller = men.len().min(women.len());
        if smaller < 2 {
            return Err(EngineError::NotEnoughPlayers { needed: 2, got: smaller });
        }
        let pairings = self
            .mixed
            .schedule(&men, &women, matches_per_player, &mut self.child_rng());
        let round = Self::group_round(&participants, None);
        let created = self.insert_pairings(&tournament, &category, round, pairings).await?;
        log::info!(
            "Mixed American schedule for category {}: {} match(es) for {} men and {} women",
            category.id,
            created.len(),
            men.len(),
            women.len()
        );
        Ok(created)
    }

    /// Generate and store one Americano round, optionally restricted to a group.
    /// The mixed gender format only pairs a man with a woman.
    pub async fn generate_americano_round(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
        group: Option<String>,
    ) -> EngineResult<Vec<Match>> {
        let (tournament, category) = self.context(tournament_id, category_id).await?;
        let lock = self.category_lock(category.id);
        let _guard = lock.lock().await;

        let mut participants = self
            .store
            .list_participants(tournament.id, Some(category.id))
            .await?;
        if let Some(label) = group.as_deref() {
            participants.retain(|p| p.group_name.as_deref() == Some(label));
        }
        let mut rng = self.child_rng();
        let pairings = if category.format == TournamentFormat::MixedGender {
            let (men, women) = Self::split_by_gender(&participants);
            let smaller = men.len().min(women.len());
            if smaller < 2 {
                return Err(EngineError::NotEnoughPlayers { needed: 2, got: smaller });
            }
            generate_mixed_gender_round(self.americano.as_ref(), &men, &women, &mut rng)
        } else {
            let players: Vec<ParticipantId> = participants.iter().map(|p| p.id).collect();
            if players.len() < 4 {
                return Err(EngineError::NotEnoughPlayers { needed: 4, got: players.len() });
            }
            generate_americano_round(self.americano.as_ref(), &players, &mut rng)
        };
        let round = Self::group_round(&participants, group.as_deref());
        let created = self.insert_pairings(&tournament, &category, round, pairings).await?;
        log::info!("Americano round for category {}: {} match(es)", category.id, created.len());
        Ok(created)
    }

    /// First round of a super-teams bracket from teams in seeding order.
    pub async fn start_confrontation_bracket(
        &self,
        tournament_id: TournamentId,
        category_id: CategoryId,
        seeded: Vec<ParticipantId>,
    ) -> EngineResult<Vec<Confrontation>> {
        let (tournament, category) = self.context(tournament_id, category_id).await?;
        if category.format != TournamentFormat::SuperTeams {
            return Err(EngineError::InvalidFormat(format!("{:?} has no confrontations", category.format)));
        }
        let lock = self.category_lock(category.id);
        let _guard = lock.lock().await;

        let teams: HashSet<ParticipantId> = self
            .store
            .list_participants(tournament.id, Some(category.id))
            .await?
            .into_iter()
            .filter(Participant::is_team)
            .map(|p| p.id)
            .collect();
        if let Some(unknown) = seeded.iter().find(|id| !teams.contains(id)) {
            return Err(EngineError::ParticipantNotFound(*unknown));
        }
        if !self
            .store
            .list_confrontations(tournament.id, category.id)
            .await?
            .is_empty()
        {
            log::info!("Category {} already has confrontations", category.id);
            return Ok(Vec::new());
        }
        let Some(round) = build_confrontation_round(&category, &seeded) else {
            log::info!("{} team(s) do not form a confrontation bracket", seeded.len());
            return Ok(Vec::new());
        };
        self.store.insert_confrontations(round.clone()).await?;
        Ok(round)
    }

    /// Store the games of a confrontation and advance its winner.
    pub async fn record_confrontation(
        &self,
        id: ConfrontationId,
        games: Vec<ConfrontationGame>,
    ) -> EngineResult<AdvanceReport> {
        if games.is_empty() || games.len() > 3 {
            return Err(EngineError::InvalidScore(format!(
                "expected 1 to 3 games, got {}",
                games.len()
            )));
        }
        let mut c = self
            .store
            .get_confrontation(id)
            .await?
            .ok_or(EngineError::ConfrontationNotFound(id))?;
        let (tournament, category) = self.context(c.tournament_id, c.category_id).await?;
        let lock = self.category_lock(category.id);
        let _guard = lock.lock().await;

        c.games = games.clone();
        c.status = MatchStatus::Completed;
        let winner = c.winning_slot();
        self.store
            .update_confrontation(
                id,
                ConfrontationPatch {
                    games: Some(games),
                    status: Some(MatchStatus::Completed),
                    winner: Some(winner),
                    ..ConfrontationPatch::default()
                },
            )
            .await?;
        advance_confrontation(self.store.as_ref(), &self.bracket(&tournament, &category), id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn setup(format: TournamentFormat) -> (Engine<MemoryStore>, Tournament) {
        let store = Arc::new(MemoryStore::new());
        let tournament = Tournament::new("Club night", format);
        store.insert_tournament(tournament.clone()).unwrap();
        (Engine::new(store, EngineConfig::seeded(1)), tournament)
    }

    #[tokio::test]
    async fn tournament_without_categories_is_its_own_category() {
        let (engine, t) = setup(TournamentFormat::GroupsKnockout);
        let (_, category) = engine.context(t.id, t.id).await.unwrap();
        assert_eq!(category.id, t.id);
        assert_eq!(category.format, TournamentFormat::GroupsKnockout);
    }

    #[tokio::test]
    async fn unknown_category_is_an_error() {
        let (engine, t) = setup(TournamentFormat::GroupsKnockout);
        let err = engine.context(t.id, uuid::Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, EngineError::CategoryNotFound(_)));
    }

    #[tokio::test]
    async fn too_many_sets_are_rejected() {
        let (engine, _) = setup(TournamentFormat::SingleElimination);
        let sets = vec![SetScore::new(6, 4); 4];
        let err = engine.record_result(uuid::Uuid::new_v4(), sets).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidScore(_)));
    }

    #[tokio::test]
    async fn americano_needs_four_players() {
        let (engine, t) = setup(TournamentFormat::RoundRobinIndividual);
        for i in 0..3 {
            engine
                .store()
                .insert_participant(Participant::individual(t.id, t.id, format!("P{i}"), None, i))
                .unwrap();
        }
        let err = engine.generate_americano_round(t.id, t.id, None).await.unwrap_err();
        assert!(matches!(err, EngineError::NotEnoughPlayers { needed: 4, got: 3 }));
    }

    #[test]
    fn same_seed_gives_same_child_generators() {
        let store = Arc::new(MemoryStore::new());
        let a = Engine::new(store.clone(), EngineConfig::seeded(7));
        let b = Engine::new(store, EngineConfig::seeded(7));
        assert_eq!(a.child_rng().next_u64(), b.child_rng().next_u64());
    }
}
