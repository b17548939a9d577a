//! Ordering competitors that share a group.
//!
//! Criteria, in priority order:
//! 1. wins, descending;
//! 2. head-to-head between the two competitors being compared, when they met
//!    and the aggregate game count of that match was not tied;
//! 3. game difference, descending;
//! 4. games won, descending;
//! 5. registration order, ascending.
//!
//! Criterion 2 only ever looks at the pair under comparison, so three-way
//! head-to-head cycles are not resolved globally; they fall through to the
//! later criteria wherever the sort happens to compare them.

use crate::models::{games_per_side, Match, ParticipantId, Slot};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Group-stage record of one competitor.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompetitorStats {
    pub id: ParticipantId,
    pub wins: u32,
    pub draws: u32,
    pub games_won: u32,
    pub games_lost: u32,
    pub registration_order: u32,
}

impl CompetitorStats {
    pub fn new(id: ParticipantId, registration_order: u32) -> Self {
        Self {
            id,
            registration_order,
            ..Self::default()
        }
    }

    pub fn game_difference(&self) -> i64 {
        i64::from(self.games_won) - i64::from(self.games_lost)
    }
}

/// Winner of the direct match between `a` and `b`, if they met on opposite
/// sides of a completed match and the games were not tied.
pub fn head_to_head(a: ParticipantId, b: ParticipantId, matches: &[Match]) -> Option<ParticipantId> {
    let m = matches.iter().filter(|m| m.is_completed()).find(|m| {
        match (m.side_of(a), m.side_of(b)) {
            (Some(sa), Some(sb)) => sa != sb,
            _ => false,
        }
    })?;
    let (g1, g2) = games_per_side(&m.sets);
    let winning = match g1.cmp(&g2) {
        Ordering::Greater => Slot::Team1,
        Ordering::Less => Slot::Team2,
        Ordering::Equal => return None,
    };
    if m.side_of(a) == Some(winning) {
        Some(a)
    } else {
        Some(b)
    }
}

/// Pairwise comparator; `Less` means `a` ranks higher.
pub fn compare(a: &CompetitorStats, b: &CompetitorStats, matches: &[Match]) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then_with(|| match head_to_head(a.id, b.id, matches) {
            Some(w) if w == a.id => Ordering::Less,
            Some(_) => Ordering::Greater,
            None => Ordering::Equal,
        })
        .then_with(|| b.game_difference().cmp(&a.game_difference()))
        .then_with(|| b.games_won.cmp(&a.games_won))
        .then_with(|| a.registration_order.cmp(&b.registration_order))
}

/// Order `stats` best first.
pub fn resolve(stats: &[CompetitorStats], matches: &[Match]) -> Vec<CompetitorStats> {
    let mut ordered: Vec<CompetitorStats> = Vec::with_capacity(stats.len());
    // Stable insertion sort: `compare` is not guaranteed transitive and the
    // std sorts may panic on comparators that are not total orders.
    for s in stats {
        let at = ordered
            .iter()
            .position(|o| compare(s, o, matches) == Ordering::Less)
            .unwrap_or(ordered.len());
        ordered.insert(at, s.clone());
    }
    ordered
}

/// Ids of `stats` best first.
pub fn resolve_ids(stats: &[CompetitorStats], matches: &[Match]) -> Vec<ParticipantId> {
    resolve(stats, matches).into_iter().map(|s| s.id).collect()
}
