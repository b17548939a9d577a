//! Bracket advancement: moving winners and losers through the stage graph.
//!
//! Processing a completed match writes its winner (and loser, where the graph
//! says so) into destination matches that already exist. Once the match's
//! round and all its sibling rounds are decided, missing destination rounds
//! are created and pooled destinations are seeded. Every write is addressed to
//! a `(match, slot)` and skipped when the slot already holds that competitor,
//! so processing the same match twice changes nothing.

use crate::error::{EngineError, EngineResult};
use crate::logic::final_positions::calculate_final_positions;
use crate::logic::scheduling::SlotFinder;
use crate::logic::stage_graph::{Edge, Outcome, SlotRule, StageGraph};
use crate::models::{
    Category, CategoryId, Competitor, Match, MatchId, MatchStatus, Round, Slot, Tournament,
};
use crate::store::{MatchFilter, MatchPatch, ParticipantPatch, TournamentStore};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// What one advancement pass did.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct AdvanceReport {
    pub slots_written: usize,
    pub matches_created: usize,
    pub final_positions_written: usize,
    /// Why nothing could be done, when the pass was a no-op by necessity.
    pub skipped: Option<String>,
}

impl AdvanceReport {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            skipped: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// What a revert undid.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct RevertReport {
    pub slots_cleared: usize,
    pub positions_cleared: usize,
    pub skipped: Option<String>,
}

/// Tournament, category and the graph their format implies.
pub struct BracketContext<'a> {
    pub tournament: &'a Tournament,
    pub category: &'a Category,
    pub graph: StageGraph,
    /// Seed of every pooled draw in this category.
    pub seed: u64,
}

impl<'a> BracketContext<'a> {
    pub fn new(tournament: &'a Tournament, category: &'a Category) -> Self {
        Self {
            tournament,
            category,
            graph: StageGraph::for_category(category),
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Generator for the draw into `round`. The same seed, category and round
    /// always draw the same sides, so replaying a reverted result restores them.
    fn pool_rng(&self, round: Round) -> StdRng {
        pool_rng(self.seed, self.category.id, round)
    }
}

fn pool_rng(seed: u64, category: CategoryId, round: Round) -> StdRng {
    let mut hasher = DefaultHasher::new();
    (seed, category, round).hash(&mut hasher);
    StdRng::seed_from_u64(hasher.finish())
}

/// Snapshot of a category's matches, kept in sync with the writes of one pass.
pub(crate) struct Bracket {
    pub(crate) matches: Vec<Match>,
}

impl Bracket {
    pub(crate) async fn load<S: TournamentStore + ?Sized>(
        store: &S,
        ctx: &BracketContext<'_>,
    ) -> EngineResult<Self> {
        let matches = store
            .list_matches(&MatchFilter::category(ctx.tournament.id, ctx.category.id))
            .await?;
        Ok(Self { matches })
    }

    fn round(&self, round: Round) -> Vec<&Match> {
        self.matches.iter().filter(|m| m.round == round).collect()
    }

    fn has_round(&self, round: Round) -> bool {
        self.matches.iter().any(|m| m.round == round)
    }

    fn find(&self, round: Round, position: u32) -> Option<&Match> {
        self.matches
            .iter()
            .find(|m| m.round == round && m.position == position)
    }

    fn set_slot(&mut self, id: MatchId, slot: Slot, competitor: Option<Competitor>) {
        if let Some(m) = self.matches.iter_mut().find(|m| m.id == id) {
            match slot {
                Slot::Team1 => m.team1 = competitor,
                Slot::Team2 => m.team2 = competitor,
            }
        }
    }

    /// The round and its siblings all exist and every match in them is decided.
    fn round_complete(&self, round: Round) -> bool {
        round.siblings().into_iter().all(|r| {
            let matches = self.round(r);
            !matches.is_empty() && matches.iter().all(|m| m.is_decided())
        })
    }

    /// Championship decided, every knockout match decided, and no round still
    /// waiting for a destination to be created.
    fn is_complete(&self, graph: &StageGraph) -> bool {
        let championship = graph.shape().championship();
        if !self.round(championship).iter().any(|m| m.is_decided()) {
            return false;
        }
        let knockout: Vec<&Match> = self.matches.iter().filter(|m| !m.round.is_group()).collect();
        if !knockout.iter().all(|m| m.is_decided()) {
            return false;
        }
        let rounds: BTreeSet<Round> = knockout.iter().map(|m| m.round).collect();
        rounds
            .iter()
            .all(|r| graph.edges_from(*r).iter().all(|e| self.has_round(e.to)))
    }
}

fn outcome_of(m: &Match, outcome: Outcome) -> Option<Competitor> {
    match outcome {
        Outcome::Winner => m.winner_competitor(),
        Outcome::Loser => m.loser_competitor(),
    }
}

/// Destination position and fixed slot (None = first empty) for a non-pooled edge.
fn target(source: &Match, rule: SlotRule) -> Option<(u32, Option<Slot>)> {
    match rule {
        SlotRule::Halved => Some((source.position / 2, Some(Slot::for_position(source.position)))),
        SlotRule::HalvedFirstEmpty => Some((source.position / 2, None)),
        SlotRule::Fixed(slot) => Some((0, Some(slot))),
        SlotRule::Pooled => None,
    }
}

/// Process a completed match.
pub async fn advance<S: TournamentStore + ?Sized>(
    store: &S,
    ctx: &BracketContext<'_>,
    match_id: MatchId,
) -> EngineResult<AdvanceReport> {
    let m = store
        .get_match(match_id)
        .await?
        .ok_or(EngineError::MatchNotFound(match_id))?;

    if !m.is_completed() {
        return Ok(AdvanceReport::skipped("match not completed"));
    }
    if m.team1.is_none() || m.team2.is_none() {
        log::info!("{} match {} has an unresolved slot, not advancing", m.round, m.id);
        return Ok(AdvanceReport::skipped("slot unresolved"));
    }
    if m.winning_slot().is_none() {
        log::info!("{} match {} is tied on games, no winner to advance", m.round, m.id);
        return Ok(AdvanceReport::skipped("tied on games"));
    }

    let mut bracket = Bracket::load(store, ctx).await?;
    let mut report = AdvanceReport::default();

    if m.round.is_group() {
        report.final_positions_written = settle_positions(store, ctx, &bracket).await?;
        return Ok(report);
    }

    for edge in ctx.graph.edges_from(m.round) {
        if edge.rule != SlotRule::Pooled && bracket.has_round(edge.to) {
            report.slots_written += place(store, &mut bracket, &m, *edge).await?;
        }
    }

    if bracket.round_complete(m.round) {
        for to in ctx.graph.destinations_of_siblings(m.round) {
            if !bracket.has_round(to) {
                report.matches_created += create_round(store, ctx, &mut bracket, to).await?;
            } else if is_pooled(&ctx.graph, to) {
                report.slots_written += fill_pooled(store, ctx, &mut bracket, to).await?;
            }
        }
    } else {
        log::debug!(
            "{} of category {} not complete yet, destinations wait",
            m.round,
            ctx.category.id
        );
    }

    report.final_positions_written = settle_positions(store, ctx, &bracket).await?;
    log::info!(
        "Advanced {} match {}: {} slot(s) written, {} match(es) created",
        m.round,
        m.id,
        report.slots_written,
        report.matches_created
    );
    Ok(report)
}

fn is_pooled(graph: &StageGraph, round: Round) -> bool {
    graph
        .sources_of(round)
        .iter()
        .any(|(_, e)| e.rule == SlotRule::Pooled)
}

/// Write one outcome of `source` into an existing destination match.
async fn place<S: TournamentStore + ?Sized>(
    store: &S,
    bracket: &mut Bracket,
    source: &Match,
    edge: Edge,
) -> EngineResult<usize> {
    let Some(competitor) = outcome_of(source, edge.outcome) else {
        return Ok(0);
    };
    let Some((position, fixed)) = target(source, edge.rule) else {
        return Ok(0);
    };
    let Some(dest) = bracket.find(edge.to, position) else {
        log::warn!("{} has no match at position {}", edge.to, position);
        return Ok(0);
    };
    if dest.slot_of(competitor).is_some() {
        return Ok(0);
    }
    let slot = match fixed.or_else(|| dest.first_empty_slot()) {
        Some(slot) => slot,
        None => {
            log::warn!("{} match {} has no empty slot left", edge.to, dest.id);
            return Ok(0);
        }
    };
    if dest.side(slot).is_some() {
        log::warn!("Overwriting {:?} of {} match {}", slot, edge.to, dest.id);
    }
    let dest_id = dest.id;
    store
        .update_match(dest_id, MatchPatch::slot(slot, Some(competitor)))
        .await?;
    bracket.set_slot(dest_id, slot, Some(competitor));
    Ok(1)
}

/// Everyone the (pooled) sources send to `to`, shuffled into two sides.
fn pooled_sides(
    bracket: &Bracket,
    ctx: &BracketContext<'_>,
    to: Round,
) -> (Option<Competitor>, Option<Competitor>) {
    let mut rng = ctx.pool_rng(to);
    let mut entrants: Vec<Competitor> = ctx
        .graph
        .sources_of(to)
        .into_iter()
        .flat_map(|(from, edge)| {
            bracket
                .round(from)
                .into_iter()
                .filter_map(move |m| outcome_of(m, edge.outcome))
                .collect::<Vec<_>>()
        })
        .collect();

    let all_pairs = entrants
        .iter()
        .all(|c| matches!(c, Competitor::Pair { .. }));
    if all_pairs {
        let mut players: Vec<_> = entrants.iter().flat_map(|c| c.participants()).collect();
        if players.len() != 4 {
            log::warn!("{} pooled {} players, expected 4", to, players.len());
        }
        players.sort();
        players.shuffle(&mut rng);
        entrants = players
            .chunks_exact(2)
            .map(|p| Competitor::pair(p[0], p[1]))
            .collect();
    } else {
        entrants.sort_by_key(|c| c.participants());
        entrants.shuffle(&mut rng);
    }
    let mut sides = entrants.into_iter();
    (sides.next(), sides.next())
}

/// Seed an existing pooled destination whose slots are still empty.
async fn fill_pooled<S: TournamentStore + ?Sized>(
    store: &S,
    ctx: &BracketContext<'_>,
    bracket: &mut Bracket,
    to: Round,
) -> EngineResult<usize> {
    let Some(dest) = bracket.find(to, 0) else {
        return Ok(0);
    };
    if dest.team1.is_some() || dest.team2.is_some() {
        return Ok(0);
    }
    let dest_id = dest.id;
    let (team1, team2) = pooled_sides(bracket, ctx, to);
    store
        .update_match(dest_id, MatchPatch::sides(team1, team2))
        .await?;
    bracket.set_slot(dest_id, Slot::Team1, team1);
    bracket.set_slot(dest_id, Slot::Team2, team2);
    Ok(usize::from(team1.is_some()) + usize::from(team2.is_some()))
}

/// Create every match of `to`, fill its slots from all decided sources, and
/// schedule it on the first free courts.
async fn create_round<S: TournamentStore + ?Sized>(
    store: &S,
    ctx: &BracketContext<'_>,
    bracket: &mut Bracket,
    to: Round,
) -> EngineResult<usize> {
    let sources = ctx.graph.sources_of(to);
    let size = sources
        .iter()
        .map(|(from, edge)| edge.destination_size(bracket.round(*from).len()))
        .max()
        .unwrap_or(1);
    let mut created: Vec<Match> = (0..size as u32)
        .map(|p| Match::new(ctx.tournament.id, ctx.category.id, to, p))
        .collect();

    if is_pooled(&ctx.graph, to) {
        let (team1, team2) = pooled_sides(bracket, ctx, to);
        created[0].team1 = team1;
        created[0].team2 = team2;
    } else {
        for (from, edge) in &sources {
            for source in bracket.round(*from) {
                let (Some(competitor), Some((position, fixed))) =
                    (outcome_of(source, edge.outcome), target(source, edge.rule))
                else {
                    continue;
                };
                let Some(dest) = created.get_mut(position as usize) else {
                    continue;
                };
                if dest.slot_of(competitor).is_some() {
                    continue;
                }
                match fixed.or_else(|| dest.first_empty_slot()) {
                    Some(Slot::Team1) => dest.team1 = Some(competitor),
                    Some(Slot::Team2) => dest.team2 = Some(competitor),
                    None => log::warn!("{} match {} is full", to, position),
                }
            }
        }
    }

    let everything = store
        .list_matches(&MatchFilter::tournament(ctx.tournament.id))
        .await?;
    let mut finder = SlotFinder::new(ctx.tournament, &everything);
    for m in &mut created {
        finder.assign(m);
    }

    let count = created.len();
    log::info!(
        "Creating {} {} match(es) for category {}",
        count,
        to,
        ctx.category.id
    );
    store.insert_matches(created.clone()).await?;
    bracket.matches.extend(created);
    Ok(count)
}

/// Write final positions once the bracket is complete. Returns how many changed.
async fn settle_positions<S: TournamentStore + ?Sized>(
    store: &S,
    ctx: &BracketContext<'_>,
    bracket: &Bracket,
) -> EngineResult<usize> {
    if !bracket.is_complete(&ctx.graph) {
        return Ok(0);
    }
    write_final_positions(store, ctx, &bracket.matches).await
}

/// Compute and store final positions from `matches`; only changed values are written.
pub async fn write_final_positions<S: TournamentStore + ?Sized>(
    store: &S,
    ctx: &BracketContext<'_>,
    matches: &[Match],
) -> EngineResult<usize> {
    let participants = store
        .list_participants(ctx.tournament.id, Some(ctx.category.id))
        .await?;
    let Some(positions) = calculate_final_positions(ctx.graph.shape(), &participants, matches) else {
        log::info!("Category {} has no decided championship yet", ctx.category.id);
        return Ok(0);
    };
    let mut written = 0;
    for (id, position) in positions {
        let current = participants
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| p.final_position);
        if current != Some(position) {
            store
                .update_participant(id, ParticipantPatch::final_position(Some(position)))
                .await?;
            written += 1;
        }
    }
    log::info!("Final positions settled for category {} ({} written)", ctx.category.id, written);
    Ok(written)
}

/// Undo a completed match: clear its result, the downstream slots it filled,
/// and every final position in the category.
pub async fn revert<S: TournamentStore + ?Sized>(
    store: &S,
    ctx: &BracketContext<'_>,
    match_id: MatchId,
) -> EngineResult<RevertReport> {
    let m = store
        .get_match(match_id)
        .await?
        .ok_or(EngineError::MatchNotFound(match_id))?;
    if !m.is_completed() && m.sets.is_empty() {
        return Ok(RevertReport {
            skipped: Some("nothing to revert".to_string()),
            ..RevertReport::default()
        });
    }

    store
        .update_match(
            m.id,
            MatchPatch {
                sets: Some(Vec::new()),
                status: Some(MatchStatus::Scheduled),
                winner: Some(None),
                ..MatchPatch::default()
            },
        )
        .await?;

    let mut report = RevertReport::default();
    let bracket = Bracket::load(store, ctx).await?;
    for edge in ctx.graph.edges_from(m.round) {
        report.slots_cleared += clear_downstream(store, &bracket, &m, *edge).await?;
    }
    report.positions_cleared = clear_final_positions(store, ctx).await?;
    log::info!(
        "Reverted {} match {}: {} slot(s) and {} position(s) cleared",
        m.round,
        m.id,
        report.slots_cleared,
        report.positions_cleared
    );
    Ok(report)
}

async fn clear_downstream<S: TournamentStore + ?Sized>(
    store: &S,
    bracket: &Bracket,
    source: &Match,
    edge: Edge,
) -> EngineResult<usize> {
    let mut cleared = 0;
    if edge.rule == SlotRule::Pooled {
        // A shuffled pool depended on every source; none of its seeding survives.
        for dest in bracket.round(edge.to) {
            if dest.team1.is_none() && dest.team2.is_none() {
                continue;
            }
            if dest.is_completed() {
                log::warn!("{} match {} was already played; clearing its slots", edge.to, dest.id);
            }
            cleared += usize::from(dest.team1.is_some()) + usize::from(dest.team2.is_some());
            store
                .update_match(dest.id, MatchPatch::sides(None, None))
                .await?;
        }
        return Ok(cleared);
    }

    let (Some(competitor), Some((position, _))) =
        (outcome_of(source, edge.outcome), target(source, edge.rule))
    else {
        return Ok(0);
    };
    if let Some(dest) = bracket.find(edge.to, position) {
        if let Some(slot) = dest.slot_of(competitor) {
            if dest.is_completed() {
                log::warn!("{} match {} was already played; clearing {:?}", edge.to, dest.id, slot);
            }
            store.update_match(dest.id, MatchPatch::slot(slot, None)).await?;
            cleared += 1;
        }
    }
    Ok(cleared)
}

/// Null every final position in the category.
pub async fn clear_final_positions<S: TournamentStore + ?Sized>(
    store: &S,
    ctx: &BracketContext<'_>,
) -> EngineResult<usize> {
    let participants = store
        .list_participants(ctx.tournament.id, Some(ctx.category.id))
        .await?;
    let mut cleared = 0;
    for p in participants.iter().filter(|p| p.final_position.is_some()) {
        store
            .update_participant(p.id, ParticipantPatch::final_position(None))
            .await?;
        cleared += 1;
    }
    Ok(cleared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use uuid::Uuid;

    #[test]
    fn pooled_draw_depends_only_on_seed_category_and_round() {
        let category = Uuid::new_v4();
        let a = pool_rng(5, category, Round::Final).next_u64();
        assert_eq!(a, pool_rng(5, category, Round::Final).next_u64());
        assert_ne!(a, pool_rng(5, category, Round::ThirdPlace).next_u64());
        assert_ne!(a, pool_rng(6, category, Round::Final).next_u64());
    }
}
