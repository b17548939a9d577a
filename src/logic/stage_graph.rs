//! Declarative stage graph: where winners and losers of each round go.
//!
//! The graph is built once per bracket shape and holds, for every source round,
//! its outgoing edges (outcome, destination round, slot rule). Advancement,
//! revert and completion checks all read from it.

use crate::models::{Category, CrossedMatch, Round, Slot, Tier, TournamentFormat};
use std::collections::HashMap;

/// Which side of a decided match an edge carries.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Outcome {
    Winner,
    Loser,
}

/// How a destination slot is chosen.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SlotRule {
    /// Match `position / 2`, `team1` for even positions, `team2` for odd.
    Halved,
    /// Match `position / 2`, first empty slot.
    HalvedFirstEmpty,
    /// The destination round's single match, fixed slot.
    Fixed(Slot),
    /// Wait for the whole source round, then shuffle everyone it sends here into
    /// the destination round's single match.
    Pooled,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Edge {
    pub outcome: Outcome,
    pub to: Round,
    pub rule: SlotRule,
}

impl Edge {
    fn new(outcome: Outcome, to: Round, rule: SlotRule) -> Self {
        Self { outcome, to, rule }
    }

    /// Number of matches the destination round needs, given the source round size.
    pub fn destination_size(&self, source_matches: usize) -> usize {
        match self.rule {
            SlotRule::Halved | SlotRule::HalvedFirstEmpty => source_matches.div_ceil(2).max(1),
            SlotRule::Fixed(_) | SlotRule::Pooled => 1,
        }
    }
}

/// Shape of the elimination part of a category.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BracketShape {
    /// Teams (or confrontations): winners move on, optional 3rd-place match.
    TeamElimination { third_place: bool },
    /// Individuals: main bracket plus placement tiers down to 24th place.
    IndividualPlacement,
    /// Fixed three-round cross-group playoff.
    CrossedPlayoffs,
}

impl BracketShape {
    pub fn for_category(category: &Category) -> Self {
        match category.format {
            TournamentFormat::CrossedPlayoffs => BracketShape::CrossedPlayoffs,
            format if format.is_individual() => BracketShape::IndividualPlacement,
            _ => BracketShape::TeamElimination {
                third_place: category.third_place_match,
            },
        }
    }

    /// The round whose result crowns the winner.
    pub fn championship(self) -> Round {
        match self {
            BracketShape::CrossedPlayoffs => Round::Crossed(CrossedMatch::J7),
            _ => Round::Final,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StageGraph {
    shape: BracketShape,
    edges: HashMap<Round, Vec<Edge>>,
}

impl StageGraph {
    pub fn for_category(category: &Category) -> Self {
        Self::for_shape(BracketShape::for_category(category))
    }

    pub fn for_shape(shape: BracketShape) -> Self {
        use Outcome::{Loser, Winner};
        let mut edges: HashMap<Round, Vec<Edge>> = HashMap::new();
        let mut add = |from: Round, outcome: Outcome, to: Round, rule: SlotRule| {
            edges.entry(from).or_default().push(Edge::new(outcome, to, rule));
        };

        match shape {
            BracketShape::TeamElimination { third_place } => {
                add(Round::RoundOf16, Winner, Round::QuarterFinal, SlotRule::Halved);
                add(Round::QuarterFinal, Winner, Round::SemiFinal, SlotRule::Halved);
                add(Round::SemiFinal, Winner, Round::Final, SlotRule::Halved);
                if third_place {
                    add(Round::SemiFinal, Loser, Round::ThirdPlace, SlotRule::HalvedFirstEmpty);
                }
            }
            BracketShape::IndividualPlacement => {
                add(Round::RoundOf16, Winner, Round::QuarterFinal, SlotRule::Halved);
                add(Round::QuarterFinal, Winner, Round::SemiFinal, SlotRule::Halved);
                add(
                    Round::QuarterFinal,
                    Loser,
                    Round::TierSemifinal(Tier::Fifth),
                    SlotRule::HalvedFirstEmpty,
                );
                add(Round::SemiFinal, Winner, Round::Final, SlotRule::Pooled);
                add(Round::SemiFinal, Loser, Round::ThirdPlace, SlotRule::Pooled);
                for tier in Tier::ALL {
                    let semis = Round::TierSemifinal(tier);
                    add(semis, Winner, Round::TierFinal(tier), SlotRule::Pooled);
                    add(semis, Loser, Round::TierConsolation(tier), SlotRule::Pooled);
                }
            }
            BracketShape::CrossedPlayoffs => {
                use CrossedMatch::*;
                let wiring = [
                    (J1, Winner, J4, Slot::Team1),
                    (J1, Loser, J5, Slot::Team2),
                    (J2, Winner, J4, Slot::Team2),
                    (J2, Loser, J6, Slot::Team1),
                    (J3, Winner, J5, Slot::Team1),
                    (J3, Loser, J6, Slot::Team2),
                    (J4, Winner, J7, Slot::Team1),
                    (J4, Loser, J8, Slot::Team1),
                    (J5, Winner, J7, Slot::Team2),
                    (J5, Loser, J8, Slot::Team2),
                ];
                for (from, outcome, to, slot) in wiring {
                    add(Round::Crossed(from), outcome, Round::Crossed(to), SlotRule::Fixed(slot));
                }
            }
        }

        Self { shape, edges }
    }

    pub fn shape(&self) -> BracketShape {
        self.shape
    }

    pub fn edges_from(&self, round: Round) -> &[Edge] {
        self.edges.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Rounds with no outgoing edges are where placements are settled.
    pub fn is_terminal(&self, round: Round) -> bool {
        self.edges_from(round).is_empty()
    }

    /// Every (source round, edge) pair that feeds `round`.
    pub fn sources_of(&self, round: Round) -> Vec<(Round, Edge)> {
        let mut sources: Vec<(Round, Edge)> = self
            .edges
            .iter()
            .flat_map(|(from, edges)| edges.iter().map(move |e| (*from, *e)))
            .filter(|(_, e)| e.to == round)
            .collect();
        sources.sort_by_key(|(from, e)| (*from, e.outcome == Outcome::Loser));
        sources
    }

    /// Destinations of a round and all its siblings, deduplicated, in bracket order.
    pub fn destinations_of_siblings(&self, round: Round) -> Vec<Round> {
        let mut to: Vec<Round> = round
            .siblings()
            .into_iter()
            .flat_map(|r| self.edges_from(r).iter().map(|e| e.to))
            .collect();
        to.sort();
        to.dedup();
        to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_elimination_chain() {
        let g = StageGraph::for_shape(BracketShape::TeamElimination { third_place: false });
        assert_eq!(
            g.edges_from(Round::QuarterFinal),
            &[Edge::new(Outcome::Winner, Round::SemiFinal, SlotRule::Halved)]
        );
        assert!(g.is_terminal(Round::Final));
        assert!(g.edges_from(Round::SemiFinal).len() == 1);
    }

    #[test]
    fn third_place_takes_semifinal_losers() {
        let g = StageGraph::for_shape(BracketShape::TeamElimination { third_place: true });
        let sources = g.sources_of(Round::ThirdPlace);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].0, Round::SemiFinal);
        assert_eq!(sources[0].1.outcome, Outcome::Loser);
    }

    #[test]
    fn placement_tiers_feed_winner_and_loser_matches() {
        let g = StageGraph::for_shape(BracketShape::IndividualPlacement);
        let edges = g.edges_from(Round::TierSemifinal(Tier::Fifth));
        assert!(edges.contains(&Edge::new(
            Outcome::Winner,
            Round::TierFinal(Tier::Fifth),
            SlotRule::Pooled
        )));
        assert!(edges.contains(&Edge::new(
            Outcome::Loser,
            Round::TierConsolation(Tier::Fifth),
            SlotRule::Pooled
        )));
        let qf_losers = g
            .edges_from(Round::QuarterFinal)
            .iter()
            .find(|e| e.outcome == Outcome::Loser)
            .map(|e| e.to);
        assert_eq!(qf_losers, Some(Round::TierSemifinal(Tier::Fifth)));
        for tier in Tier::ALL {
            assert!(g.is_terminal(Round::TierFinal(tier)));
            assert!(g.is_terminal(Round::TierConsolation(tier)));
        }
        assert!(g.is_terminal(Round::ThirdPlace));
    }

    #[test]
    fn crossed_wiring_fills_every_slot_once() {
        let g = StageGraph::for_shape(BracketShape::CrossedPlayoffs);
        for m in [CrossedMatch::J4, CrossedMatch::J5, CrossedMatch::J6, CrossedMatch::J7, CrossedMatch::J8] {
            let slots: Vec<SlotRule> = g
                .sources_of(Round::Crossed(m))
                .into_iter()
                .map(|(_, e)| e.rule)
                .collect();
            assert_eq!(slots.len(), 2, "{m:?}");
            assert!(slots.contains(&SlotRule::Fixed(Slot::Team1)));
            assert!(slots.contains(&SlotRule::Fixed(Slot::Team2)));
        }
        assert_eq!(
            g.destinations_of_siblings(Round::Crossed(CrossedMatch::J3)),
            vec![
                Round::Crossed(CrossedMatch::J4),
                Round::Crossed(CrossedMatch::J5),
                Round::Crossed(CrossedMatch::J6)
            ]
        );
    }

    #[test]
    fn destination_sizes() {
        let halved = Edge::new(Outcome::Winner, Round::QuarterFinal, SlotRule::Halved);
        assert_eq!(halved.destination_size(8), 4);
        assert_eq!(halved.destination_size(1), 1);
        let pooled = Edge::new(Outcome::Winner, Round::Final, SlotRule::Pooled);
        assert_eq!(pooled.destination_size(2), 1);
    }
}
