//! Seeding: turning qualifiers into the first knockout round.

use crate::logic::group_play::GroupStanding;
use crate::models::{Category, Competitor, CrossedMatch, Match, ParticipantId, Round, Tier};

/// First knockout round for `count` entrants, or None when the count does not
/// form a full bracket. Individual entrants play in pairs, so their rounds hold
/// twice as many players.
pub fn first_round_for(count: usize, individual: bool) -> Option<Round> {
    let teams = if individual {
        if count % 2 != 0 {
            return None;
        }
        count / 2
    } else {
        count
    };
    match teams {
        16 => Some(Round::RoundOf16),
        8 => Some(Round::QuarterFinal),
        4 => Some(Round::SemiFinal),
        2 => Some(Round::Final),
        _ => None,
    }
}

/// Strongest with weakest: `(ids[0], ids[n-1])`, `(ids[1], ids[n-2])`, ...
pub fn fold<T: Copy>(ids: &[T]) -> Vec<(T, T)> {
    let n = ids.len();
    (0..n / 2).map(|i| (ids[i], ids[n - 1 - i])).collect()
}

/// Competitors in seed order: teams as they are, individuals folded into pairs.
pub fn competitors(ids: &[ParticipantId], individual: bool) -> Vec<Competitor> {
    if individual {
        fold(ids)
            .into_iter()
            .map(|(a, b)| Competitor::pair(a, b))
            .collect()
    } else {
        ids.iter().copied().map(Competitor::team).collect()
    }
}

/// Matches of `round`, pairing seed `i` with seed `n-1-i` at position `i`.
pub fn seeded_round(category: &Category, round: Round, seeds: &[Competitor]) -> Vec<Match> {
    fold(seeds)
        .into_iter()
        .enumerate()
        .map(|(position, (a, b))| {
            Match::new(category.tournament_id, category.id, round, position as u32)
                .with_sides(Some(a), Some(b))
        })
        .collect()
}

/// First knockout round for the qualified participants, in qualification order.
///
/// Seeding is purely by qualification rank: seed `i` meets seed `n-1-i` with
/// no group separation, so two finishers of one group can meet in the first
/// round (with three groups plus two thirds, `C1` plays `C2`).
pub fn build_knockout_round(category: &Category, qualified: &[ParticipantId]) -> Option<Vec<Match>> {
    let individual = category.format.is_individual();
    let round = first_round_for(qualified.len(), individual)?;
    Some(seeded_round(category, round, &competitors(qualified, individual)))
}

/// Tier the first block of non-qualifiers starts in, given where the main bracket starts.
pub fn first_open_tier(main: Round) -> Option<Tier> {
    match main {
        // Round-of-16 losers take places 9 to 16.
        Round::RoundOf16 => Some(Tier::Seventeenth),
        // Quarter-final losers already fill the 5th tier.
        Round::QuarterFinal => Some(Tier::Ninth),
        Round::SemiFinal | Round::Final => Some(Tier::Fifth),
        _ => None,
    }
}

/// Players per placement tier: two semifinals of two pairs each.
pub const TIER_SIZE: usize = 8;

/// Placement-tier semifinals for individual non-qualifiers, in blocks of eight.
/// A trailing block smaller than eight is left out.
pub fn build_placement_tiers(category: &Category, first: Tier, rest: &[ParticipantId]) -> Vec<Match> {
    let mut matches = Vec::new();
    let mut tier = Some(first);
    for block in rest.chunks_exact(TIER_SIZE) {
        let Some(t) = tier else {
            break;
        };
        matches.extend(seeded_round(category, Round::TierSemifinal(t), &competitors(block, true)));
        tier = t.next();
    }
    matches
}

/// Crossed playoff round 1 from exactly three groups of at least four players:
/// J1 = (A1, C4) v (B2, C3), J2 = (B1, A4) v (C2, A3), J3 = (C1, B4) v (A2, B3).
pub fn build_crossed_first_round(category: &Category, standings: &[GroupStanding]) -> Option<Vec<Match>> {
    let [a, b, c] = standings else {
        return None;
    };
    let seed = |g: &GroupStanding, rank: usize| g.ranked.get(rank - 1).map(|s| s.id);
    let pair = |x: Option<ParticipantId>, y: Option<ParticipantId>| Some(Competitor::pair(x?, y?));
    let wiring = [
        (CrossedMatch::J1, pair(seed(a, 1), seed(c, 4))?, pair(seed(b, 2), seed(c, 3))?),
        (CrossedMatch::J2, pair(seed(b, 1), seed(a, 4))?, pair(seed(c, 2), seed(a, 3))?),
        (CrossedMatch::J3, pair(seed(c, 1), seed(b, 4))?, pair(seed(a, 2), seed(b, 3))?),
    ];
    Some(
        wiring
            .into_iter()
            .map(|(j, t1, t2)| {
                Match::new(category.tournament_id, category.id, Round::Crossed(j), 0)
                    .with_sides(Some(t1), Some(t2))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::tiebreak::CompetitorStats;
    use crate::models::TournamentFormat;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn ids(n: usize) -> Vec<ParticipantId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn first_round_sizes() {
        assert_eq!(first_round_for(8, false), Some(Round::QuarterFinal));
        assert_eq!(first_round_for(16, true), Some(Round::QuarterFinal));
        assert_eq!(first_round_for(8, true), Some(Round::SemiFinal));
        assert_eq!(first_round_for(6, false), None);
    }

    #[test]
    fn top_seed_meets_bottom_seed() {
        let c = Category::new(Uuid::new_v4(), "Open", TournamentFormat::GroupsKnockout);
        let q = ids(8);
        let round = build_knockout_round(&c, &q).unwrap();
        assert_eq!(round.len(), 4);
        assert_eq!(round[0].team1, Some(Competitor::team(q[0])));
        assert_eq!(round[0].team2, Some(Competitor::team(q[7])));
        assert_eq!(round[3].team1, Some(Competitor::team(q[3])));
        assert_eq!(round[3].team2, Some(Competitor::team(q[4])));
        assert!(round.iter().all(|m| m.round == Round::QuarterFinal));
    }

    #[test]
    fn individuals_are_paired_before_matching() {
        let c = Category::new(Uuid::new_v4(), "Open", TournamentFormat::IndividualGroupsKnockout);
        let q = ids(8);
        let round = build_knockout_round(&c, &q).unwrap();
        assert_eq!(round.len(), 2);
        assert_eq!(round[0].round, Round::SemiFinal);
        assert_eq!(round[0].team1, Some(Competitor::pair(q[0], q[7])));
        assert_eq!(round[0].team2, Some(Competitor::pair(q[3], q[4])));
    }

    #[test]
    fn tiers_take_blocks_of_eight() {
        let c = Category::new(Uuid::new_v4(), "Open", TournamentFormat::IndividualGroupsKnockout);
        let rest = ids(19);
        let matches = build_placement_tiers(&c, Tier::Ninth, &rest);
        assert_eq!(matches.len(), 4);
        assert_eq!(matches[0].round, Round::TierSemifinal(Tier::Ninth));
        assert_eq!(matches[3].round, Round::TierSemifinal(Tier::Thirteenth));
    }

    #[test]
    fn non_qualifiers_start_below_the_main_bracket() {
        assert_eq!(first_open_tier(Round::RoundOf16), Some(Tier::Seventeenth));
        assert_eq!(first_open_tier(Round::QuarterFinal), Some(Tier::Ninth));
        assert_eq!(first_open_tier(Round::SemiFinal), Some(Tier::Fifth));
    }

    #[test]
    fn crossed_first_round_uses_all_twelve() {
        let c = Category::new(Uuid::new_v4(), "Crossed", TournamentFormat::CrossedPlayoffs);
        let groups: Vec<GroupStanding> = ["A", "B", "C"]
            .iter()
            .map(|l| GroupStanding {
                label: l.to_string(),
                ranked: ids(4).into_iter().map(|id| CompetitorStats::new(id, 0)).collect(),
            })
            .collect();
        let round = build_crossed_first_round(&c, &groups).unwrap();
        assert_eq!(round.len(), 3);
        let players: HashSet<_> = round.iter().flat_map(|m| m.participants()).collect();
        assert_eq!(players.len(), 12);
        assert_eq!(round[0].team1, Some(Competitor::pair(groups[0].ranked[0].id, groups[2].ranked[3].id)));
    }

    #[test]
    fn crossed_needs_four_per_group() {
        let c = Category::new(Uuid::new_v4(), "Crossed", TournamentFormat::CrossedPlayoffs);
        let groups: Vec<GroupStanding> = ["A", "B", "C"]
            .iter()
            .map(|l| GroupStanding {
                label: l.to_string(),
                ranked: ids(3).into_iter().map(|id| CompetitorStats::new(id, 0)).collect(),
            })
            .collect();
        assert!(build_crossed_first_round(&c, &groups).is_none());
    }
}
