//! Final positions: a dense 1..N ranking of a category once its bracket is decided.
//!
//! Terminal matches are read in order (final, 3rd place, the 5th-place tier,
//! round-of-16 losers, then the non-qualifier tiers), winners before losers.
//! Where a dedicated placement match does not exist, the eliminated
//! competitors of that stage are ranked together by their group-stage records.
//! Everybody left over is ranked last, by group rank.

use crate::logic::group_play::{compute_group_stats, group_matches, rank_across_groups, standings_by_group};
use crate::logic::stage_graph::BracketShape;
use crate::logic::tiebreak::{resolve_ids, CompetitorStats};
use crate::models::{Competitor, CrossedMatch, Match, Participant, ParticipantId, Round, Tier};
use std::collections::{HashMap, HashSet};

struct Placer<'a> {
    stats: HashMap<ParticipantId, CompetitorStats>,
    group_matches: Vec<Match>,
    matches: &'a [Match],
    order: Vec<ParticipantId>,
    placed: HashSet<ParticipantId>,
}

impl<'a> Placer<'a> {
    fn new(participants: &[Participant], matches: &'a [Match]) -> Self {
        Self {
            stats: compute_group_stats(participants, matches),
            group_matches: group_matches(matches),
            matches,
            order: Vec::new(),
            placed: HashSet::new(),
        }
    }

    fn round(&self, round: Round) -> Vec<&'a Match> {
        self.matches.iter().filter(|m| m.round == round).collect()
    }

    fn exists(&self, round: Round) -> bool {
        self.matches.iter().any(|m| m.round == round)
    }

    /// Append `ids` not yet placed, best group-stage record first.
    fn place_block(&mut self, ids: Vec<ParticipantId>) {
        let block: Vec<CompetitorStats> = ids
            .into_iter()
            .filter(|id| !self.placed.contains(id))
            .filter_map(|id| self.stats.get(&id).cloned())
            .collect();
        for id in resolve_ids(&block, &self.group_matches) {
            if self.placed.insert(id) {
                self.order.push(id);
            }
        }
    }

    fn side_ids(side: Option<Competitor>) -> Vec<ParticipantId> {
        side.map(|c| c.participants()).unwrap_or_default()
    }

    /// Winners then losers of a decided match; everyone on court as one block otherwise.
    fn place_match(&mut self, m: &Match) {
        if m.is_decided() {
            self.place_block(Self::side_ids(m.winner_competitor()));
            self.place_block(Self::side_ids(m.loser_competitor()));
        } else {
            self.place_block(m.participants());
        }
    }

    fn place_round(&mut self, round: Round) {
        for m in self.round(round) {
            self.place_match(m);
        }
    }

    /// Losers of a whole round, ranked together.
    fn place_losers_of(&mut self, round: Round) {
        let losers: Vec<ParticipantId> = self
            .round(round)
            .into_iter()
            .flat_map(|m| Self::side_ids(m.loser_competitor()))
            .collect();
        self.place_block(losers);
    }

    fn place_tier(&mut self, tier: Tier) {
        if self.exists(Round::TierFinal(tier)) || self.exists(Round::TierConsolation(tier)) {
            self.place_round(Round::TierFinal(tier));
            self.place_round(Round::TierConsolation(tier));
        } else if self.exists(Round::TierSemifinal(tier)) {
            let semis = self.round(Round::TierSemifinal(tier));
            let winners: Vec<ParticipantId> = semis
                .iter()
                .flat_map(|m| Self::side_ids(m.winner_competitor()))
                .collect();
            self.place_block(winners);
            self.place_losers_of(Round::TierSemifinal(tier));
            let rest: Vec<ParticipantId> = semis.iter().flat_map(|m| m.participants()).collect();
            self.place_block(rest);
        } else if tier == Tier::Fifth {
            self.place_losers_of(Round::QuarterFinal);
        }
    }

    fn place_rest(&mut self, participants: &[Participant]) {
        let standings = standings_by_group(participants, self.matches);
        let grouped = rank_across_groups(&standings, &self.group_matches);
        self.place_block(grouped);
        let ungrouped: Vec<ParticipantId> = participants.iter().map(|p| p.id).collect();
        self.place_block(ungrouped);
    }
}

/// Positions for every participant of the category, or None while the
/// championship match is not decided.
pub fn calculate_final_positions(
    shape: BracketShape,
    participants: &[Participant],
    matches: &[Match],
) -> Option<Vec<(ParticipantId, u32)>> {
    let championship = matches
        .iter()
        .find(|m| m.round == shape.championship())?;
    if !championship.is_decided() {
        return None;
    }

    let mut placer = Placer::new(participants, matches);
    match shape {
        BracketShape::CrossedPlayoffs => {
            for j in [CrossedMatch::J7, CrossedMatch::J8, CrossedMatch::J6] {
                placer.place_round(Round::Crossed(j));
            }
        }
        _ => {
            placer.place_round(Round::Final);
            if placer.exists(Round::ThirdPlace) {
                placer.place_round(Round::ThirdPlace);
            } else {
                placer.place_losers_of(Round::SemiFinal);
            }
            placer.place_tier(Tier::Fifth);
            // Later tiers hold non-qualifiers, who rank below every bracket loser.
            placer.place_losers_of(Round::RoundOf16);
            for tier in Tier::ALL.into_iter().filter(|t| *t != Tier::Fifth) {
                placer.place_tier(tier);
            }
        }
    }
    placer.place_rest(participants);

    let known: HashSet<ParticipantId> = participants.iter().map(|p| p.id).collect();
    Some(
        placer
            .order
            .into_iter()
            .filter(|id| known.contains(id))
            .zip(1u32..)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchStatus, SetScore};
    use uuid::Uuid;

    fn teams(n: u32) -> Vec<Participant> {
        (0..n)
            .map(|i| Participant::team(Uuid::nil(), Uuid::nil(), format!("T{i}"), i))
            .collect()
    }

    fn played(round: Round, position: u32, a: Competitor, b: Competitor, a_wins: bool) -> Match {
        let mut m = Match::new(Uuid::nil(), Uuid::nil(), round, position).with_sides(Some(a), Some(b));
        m.sets = if a_wins {
            vec![SetScore::new(6, 2), SetScore::new(6, 3)]
        } else {
            vec![SetScore::new(2, 6), SetScore::new(3, 6)]
        };
        m.status = MatchStatus::Completed;
        m
    }

    fn position_of(positions: &[(ParticipantId, u32)], id: ParticipantId) -> u32 {
        positions.iter().find(|(p, _)| *p == id).map(|(_, pos)| *pos).unwrap()
    }

    #[test]
    fn four_team_bracket_without_third_place_match() {
        let t = teams(4);
        let (a, b, c, d) = (t[0].id, t[1].id, t[2].id, t[3].id);
        let matches = vec![
            played(Round::SemiFinal, 0, Competitor::team(a), Competitor::team(b), true),
            played(Round::SemiFinal, 1, Competitor::team(c), Competitor::team(d), false),
            played(Round::Final, 0, Competitor::team(a), Competitor::team(d), true),
        ];
        let shape = BracketShape::TeamElimination { third_place: false };
        let positions = calculate_final_positions(shape, &t, &matches).unwrap();
        assert_eq!(position_of(&positions, a), 1);
        assert_eq!(position_of(&positions, d), 2);
        assert_eq!(position_of(&positions, b), 3);
        assert_eq!(position_of(&positions, c), 4);
    }

    #[test]
    fn third_place_match_decides_third() {
        let t = teams(4);
        let (a, b, c, d) = (t[0].id, t[1].id, t[2].id, t[3].id);
        let matches = vec![
            played(Round::SemiFinal, 0, Competitor::team(a), Competitor::team(b), true),
            played(Round::SemiFinal, 1, Competitor::team(c), Competitor::team(d), false),
            played(Round::Final, 0, Competitor::team(a), Competitor::team(d), false),
            played(Round::ThirdPlace, 0, Competitor::team(b), Competitor::team(c), false),
        ];
        let shape = BracketShape::TeamElimination { third_place: true };
        let positions = calculate_final_positions(shape, &t, &matches).unwrap();
        assert_eq!(position_of(&positions, d), 1);
        assert_eq!(position_of(&positions, a), 2);
        assert_eq!(position_of(&positions, c), 3);
        assert_eq!(position_of(&positions, b), 4);
    }

    #[test]
    fn undecided_final_gives_nothing() {
        let t = teams(2);
        let mut m = played(Round::Final, 0, Competitor::team(t[0].id), Competitor::team(t[1].id), true);
        m.sets = vec![SetScore::new(6, 6)];
        let shape = BracketShape::TeamElimination { third_place: false };
        assert!(calculate_final_positions(shape, &t, &[m]).is_none());
    }

    #[test]
    fn non_qualifiers_follow_by_group_rank() {
        let mut t = teams(6);
        for (i, p) in t.iter_mut().enumerate() {
            p.group_name = Some(if i % 2 == 0 { "A" } else { "B" }.to_string());
        }
        let ids: Vec<ParticipantId> = t.iter().map(|p| p.id).collect();
        // Group A: 0 > 2 > 4, group B: 1 > 3 > 5.
        let mut matches = vec![
            played(Round::Group('A'), 0, Competitor::team(ids[0]), Competitor::team(ids[2]), true),
            played(Round::Group('A'), 1, Competitor::team(ids[0]), Competitor::team(ids[4]), true),
            played(Round::Group('A'), 2, Competitor::team(ids[2]), Competitor::team(ids[4]), true),
            played(Round::Group('B'), 0, Competitor::team(ids[1]), Competitor::team(ids[3]), true),
            played(Round::Group('B'), 1, Competitor::team(ids[1]), Competitor::team(ids[5]), true),
            played(Round::Group('B'), 2, Competitor::team(ids[3]), Competitor::team(ids[5]), true),
        ];
        matches.push(played(Round::SemiFinal, 0, Competitor::team(ids[0]), Competitor::team(ids[3]), true));
        matches.push(played(Round::SemiFinal, 1, Competitor::team(ids[1]), Competitor::team(ids[2]), true));
        matches.push(played(Round::Final, 0, Competitor::team(ids[0]), Competitor::team(ids[1]), true));

        let shape = BracketShape::TeamElimination { third_place: false };
        let positions = calculate_final_positions(shape, &t, &matches).unwrap();
        let mut numbers: Vec<u32> = positions.iter().map(|(_, p)| *p).collect();
        numbers.sort();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(position_of(&positions, ids[4]), 5);
        assert_eq!(position_of(&positions, ids[5]), 6);
    }
}
