//! Super-teams: a single-elimination bracket of confrontations between team
//! participants. Winners move on by the same halving rule as match brackets and
//! the next round is created once the current one is fully decided.

use crate::error::{EngineError, EngineResult};
use crate::logic::advancement::{AdvanceReport, BracketContext};
use crate::logic::seeding::{first_round_for, fold};
use crate::logic::stage_graph::{BracketShape, SlotRule, StageGraph};
use crate::models::{Category, Confrontation, ConfrontationId, ParticipantId, Round, Slot};
use crate::store::{ConfrontationPatch, TournamentStore};

/// First round of confrontations, seed `i` against seed `n-1-i`.
pub fn build_confrontation_round(
    category: &Category,
    seeded: &[ParticipantId],
) -> Option<Vec<Confrontation>> {
    let round = first_round_for(seeded.len(), false)?;
    Some(
        fold(seeded)
            .into_iter()
            .enumerate()
            .map(|(position, (a, b))| {
                Confrontation::new(category.tournament_id, category.id, round, position as u32)
                    .with_teams(Some(a), Some(b))
            })
            .collect(),
    )
}

fn graph() -> StageGraph {
    StageGraph::for_shape(BracketShape::TeamElimination { third_place: false })
}

/// Move the winner of a completed confrontation into the next round.
pub async fn advance_confrontation<S: TournamentStore + ?Sized>(
    store: &S,
    ctx: &BracketContext<'_>,
    id: ConfrontationId,
) -> EngineResult<AdvanceReport> {
    let c = store
        .get_confrontation(id)
        .await?
        .ok_or(EngineError::ConfrontationNotFound(id))?;
    let Some(winner) = c.winner_team() else {
        log::info!("Confrontation {} has no winner yet", c.id);
        return Ok(AdvanceReport::skipped("confrontation undecided"));
    };

    let all = store
        .list_confrontations(ctx.tournament.id, ctx.category.id)
        .await?;
    let graph = graph();
    let mut report = AdvanceReport::default();

    for edge in graph.edges_from(c.round) {
        if edge.rule != SlotRule::Halved {
            continue;
        }
        let position = c.position / 2;
        let slot = Slot::for_position(c.position);
        let destination = all
            .iter()
            .find(|d| d.round == edge.to && d.position == position);

        match destination {
            Some(dest) if dest.side(slot) == Some(winner) => {}
            Some(dest) => {
                if dest.side(slot).is_some() {
                    log::warn!("Overwriting {:?} of confrontation {}", slot, dest.id);
                }
                store
                    .update_confrontation(dest.id, ConfrontationPatch::slot(slot, Some(winner)))
                    .await?;
                report.slots_written += 1;
            }
            None if all.iter().any(|d| d.round == edge.to) => {
                log::warn!("{} has no confrontation at position {}", edge.to, position);
            }
            None => {
                let current: Vec<&Confrontation> = all.iter().filter(|o| o.round == c.round).collect();
                let decided: Vec<&Confrontation> = current
                    .iter()
                    .copied()
                    .filter(|o| o.id == c.id || o.winner_team().is_some())
                    .collect();
                if decided.len() < current.len() {
                    log::debug!("{} of confrontations not complete yet", c.round);
                    continue;
                }
                let next = next_round(ctx, &current, edge.to, edge.destination_size(current.len()));
                report.matches_created += next.len();
                log::info!("Creating {} {} confrontation(s)", next.len(), edge.to);
                store.insert_confrontations(next).await?;
            }
        }
    }
    Ok(report)
}

fn next_round(
    ctx: &BracketContext<'_>,
    current: &[&Confrontation],
    to: Round,
    size: usize,
) -> Vec<Confrontation> {
    let mut next: Vec<Confrontation> = (0..size as u32)
        .map(|p| Confrontation::new(ctx.tournament.id, ctx.category.id, to, p))
        .collect();
    for c in current {
        let Some(dest) = next.get_mut((c.position / 2) as usize) else {
            continue;
        };
        match Slot::for_position(c.position) {
            Slot::Team1 => dest.team1 = c.winner_team(),
            Slot::Team2 => dest.team2 = c.winner_team(),
        }
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchStatus, TournamentFormat};
    use uuid::Uuid;

    #[test]
    fn eight_teams_open_with_four_quarterfinals() {
        let category = Category::new(Uuid::new_v4(), "Super", TournamentFormat::SuperTeams);
        let seeds: Vec<ParticipantId> = (0..8).map(|_| Uuid::new_v4()).collect();
        let round = build_confrontation_round(&category, &seeds).unwrap();
        assert_eq!(round.len(), 4);
        assert!(round.iter().all(|c| c.round == Round::QuarterFinal));
        assert_eq!(round[0].team1, Some(seeds[0]));
        assert_eq!(round[0].team2, Some(seeds[7]));
        assert_eq!(round[3].position, 3);
        assert!(round.iter().all(|c| c.status == MatchStatus::Scheduled));
    }

    #[test]
    fn odd_counts_do_not_form_a_bracket() {
        let category = Category::new(Uuid::new_v4(), "Super", TournamentFormat::SuperTeams);
        let seeds: Vec<ParticipantId> = (0..6).map(|_| Uuid::new_v4()).collect();
        assert!(build_confrontation_round(&category, &seeds).is_none());
    }
}
