//! Qualification: which group-stage finishers advance to the knockout stage.

use crate::logic::group_play::GroupStanding;
use crate::logic::tiebreak::{resolve_ids, CompetitorStats};
use crate::models::{KnockoutStage, Match, ParticipantId};

/// The top `qualified_per_group` of every group, rank-major: all group winners
/// (in group order), then all runners-up, and so on.
///
/// With two qualifiers per group and a total that is not a power of two, the
/// best third-placed finishers (resolved across groups) fill up to the next
/// power of two. If the thirds run out, fourths are used, and so on.
pub fn qualify(
    standings: &[GroupStanding],
    qualified_per_group: usize,
    matches: &[Match],
) -> Vec<ParticipantId> {
    let mut qualified = take_top(standings, qualified_per_group);
    if qualified_per_group == 2 && !qualified.len().is_power_of_two() && !qualified.is_empty() {
        let target = qualified.len().next_power_of_two();
        let needed = target - qualified.len();
        log::debug!(
            "{} qualified from {} groups, promoting {} best from rank {}",
            qualified.len(),
            standings.len(),
            needed,
            qualified_per_group + 1
        );
        qualified.extend(best_from_rank(standings, qualified_per_group, needed, matches));
    }
    qualified
}

/// Qualifiers for a target first knockout stage: each group guarantees
/// `bracket_size / groups` places; any remainder goes to the best of the next
/// rank across all groups.
pub fn qualify_for_stage(
    standings: &[GroupStanding],
    stage: KnockoutStage,
    matches: &[Match],
) -> Vec<ParticipantId> {
    if standings.is_empty() {
        return Vec::new();
    }
    let target = stage.bracket_size();
    let per_group = target / standings.len();
    let mut qualified = take_top(standings, per_group);
    qualified.truncate(target);
    let needed = target - qualified.len();
    if needed > 0 {
        qualified.extend(best_from_rank(standings, per_group, needed, matches));
    }
    qualified
}

fn take_top(standings: &[GroupStanding], per_group: usize) -> Vec<ParticipantId> {
    (0..per_group)
        .flat_map(|rank| standings.iter().filter_map(move |g| g.ranked.get(rank)))
        .map(|s| s.id)
        .collect()
}

/// Up to `needed` participants, pooling rank `from_rank` across groups first
/// and moving to deeper ranks only when a pool is exhausted.
fn best_from_rank(
    standings: &[GroupStanding],
    from_rank: usize,
    needed: usize,
    matches: &[Match],
) -> Vec<ParticipantId> {
    let mut picked = Vec::with_capacity(needed);
    let mut rank = from_rank;
    while picked.len() < needed {
        let pool: Vec<CompetitorStats> = standings
            .iter()
            .filter_map(|g| g.ranked.get(rank).cloned())
            .collect();
        if pool.is_empty() {
            log::info!(
                "Qualification short by {} places: no finishers left at rank {}",
                needed - picked.len(),
                rank + 1
            );
            break;
        }
        let take = needed - picked.len();
        picked.extend(resolve_ids(&pool, matches).into_iter().take(take));
        rank += 1;
    }
    picked
}
