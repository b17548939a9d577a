//! Group stage: per-competitor records and resolved standings per group.

use crate::logic::tiebreak::{resolve, resolve_ids, CompetitorStats};
use crate::models::{games_per_side, Match, Participant, ParticipantId, Round};
use std::collections::{BTreeMap, HashMap};

/// Resolved order of one group, best first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupStanding {
    pub label: String,
    pub ranked: Vec<CompetitorStats>,
}

impl GroupStanding {
    pub fn ids(&self) -> Vec<ParticipantId> {
        self.ranked.iter().map(|s| s.id).collect()
    }

    /// 0-based rank of a participant in this group.
    pub fn rank_of(&self, id: ParticipantId) -> Option<usize> {
        self.ranked.iter().position(|s| s.id == id)
    }
}

/// Completed group matches of a set of matches.
pub fn group_matches(matches: &[Match]) -> Vec<Match> {
    matches
        .iter()
        .filter(|m| m.round.is_group() && m.is_completed())
        .cloned()
        .collect()
}

/// Build a record for every participant from completed group matches.
///
/// A pair credits both of its players. A match with tied games counts as a draw
/// for everyone on court.
pub fn compute_group_stats(
    participants: &[Participant],
    matches: &[Match],
) -> HashMap<ParticipantId, CompetitorStats> {
    let mut stats: HashMap<ParticipantId, CompetitorStats> = participants
        .iter()
        .map(|p| (p.id, CompetitorStats::new(p.id, p.registration_order)))
        .collect();

    for m in matches.iter().filter(|m| m.round.is_group() && m.is_completed()) {
        let (Some(team1), Some(team2)) = (m.team1, m.team2) else {
            continue;
        };
        let (g1, g2) = games_per_side(&m.sets);
        let winner = m.winning_slot();
        for (side, won, lost) in [
            (team1, g1, g2),
            (team2, g2, g1),
        ] {
            for id in side.participants() {
                let Some(s) = stats.get_mut(&id) else {
                    continue;
                };
                s.games_won = s.games_won.saturating_add(won);
                s.games_lost = s.games_lost.saturating_add(lost);
                match winner {
                    None => s.draws += 1,
                    Some(_) if won > lost => s.wins += 1,
                    Some(_) => {}
                }
            }
        }
    }
    stats
}

/// Resolve every group of the given participants. Participants without a group
/// are left out.
pub fn standings_by_group(participants: &[Participant], matches: &[Match]) -> Vec<GroupStanding> {
    let stats = compute_group_stats(participants, matches);
    let mut members: BTreeMap<String, Vec<CompetitorStats>> = BTreeMap::new();
    for p in participants {
        if let Some(label) = &p.group_name {
            if let Some(s) = stats.get(&p.id) {
                members.entry(label.clone()).or_default().push(s.clone());
            }
        }
    }

    members
        .into_iter()
        .map(|(label, group)| {
            let in_group: Vec<Match> = match Round::group(&label) {
                Some(round) => matches
                    .iter()
                    .filter(|m| m.round == round && m.is_completed())
                    .cloned()
                    .collect(),
                None => Vec::new(),
            };
            GroupStanding {
                ranked: resolve(&group, &in_group),
                label,
            }
        })
        .collect()
}

/// Everyone across groups: all group winners first, then all runners-up, and so
/// on, each rank resolved by the tiebreak rules. Used for placing non-qualifiers.
pub fn rank_across_groups(standings: &[GroupStanding], matches: &[Match]) -> Vec<ParticipantId> {
    let deepest = standings.iter().map(|g| g.ranked.len()).max().unwrap_or(0);
    (0..deepest)
        .flat_map(|rank| {
            let pool: Vec<CompetitorStats> = standings
                .iter()
                .filter_map(|g| g.ranked.get(rank).cloned())
                .collect();
            resolve_ids(&pool, matches)
        })
        .collect()
}
