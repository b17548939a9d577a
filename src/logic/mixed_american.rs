//! Mixed American: a round-robin of man+woman doubles.
//!
//! Each round, the least-played men and women go first (ties broken randomly),
//! then match slots are filled greedily: every combination of two available
//! men, two available women and the two ways to pair them is scored, and the
//! best one is taken. Rounds are repeated `matches_per_player` times.

use crate::logic::americano::Pairing;
use crate::models::{Competitor, ParticipantId};
use rand::{Rng, RngCore};
use std::collections::HashMap;

const REPEATED_PARTNERSHIP_PENALTY: i64 = 200;
const REPEATED_OPPONENT_PENALTY: i64 = 100;
const NEW_PARTNERSHIP_BONUS: i64 = 50;

/// Builds a whole Mixed American schedule.
pub trait MixedScheduler: Send + Sync {
    fn schedule(
        &self,
        men: &[ParticipantId],
        women: &[ParticipantId],
        matches_per_player: u32,
        rng: &mut dyn RngCore,
    ) -> Vec<Pairing>;
}

/// Round-by-round greedy scheduler, fairness first.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyMixedScheduler;

type PairKey = (ParticipantId, ParticipantId);

fn key(a: ParticipantId, b: ParticipantId) -> PairKey {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Default)]
struct History {
    played: HashMap<ParticipantId, u32>,
    partnerships: HashMap<PairKey, u32>,
    opponents: HashMap<PairKey, u32>,
}

impl History {
    fn partnership_count(&self, a: ParticipantId, b: ParticipantId) -> u32 {
        self.partnerships.get(&key(a, b)).copied().unwrap_or(0)
    }

    fn opponent_count(&self, a: ParticipantId, b: ParticipantId) -> u32 {
        self.opponents.get(&key(a, b)).copied().unwrap_or(0)
    }

    /// Score for (m1, w1) vs (m2, w2).
    fn score(&self, team1: PairKey, team2: PairKey) -> i64 {
        let mut score = 0;
        for (m, w) in [team1, team2] {
            let count = self.partnership_count(m, w);
            score -= REPEATED_PARTNERSHIP_PENALTY * i64::from(count);
            if count == 0 {
                score += NEW_PARTNERSHIP_BONUS;
            }
        }
        for a in [team1.0, team1.1] {
            for b in [team2.0, team2.1] {
                score -= REPEATED_OPPONENT_PENALTY * i64::from(self.opponent_count(a, b));
            }
        }
        score
    }

    fn record(&mut self, team1: PairKey, team2: PairKey) {
        for (m, w) in [team1, team2] {
            *self.partnerships.entry(key(m, w)).or_default() += 1;
            *self.played.entry(m).or_default() += 1;
            *self.played.entry(w).or_default() += 1;
        }
        for a in [team1.0, team1.1] {
            for b in [team2.0, team2.1] {
                *self.opponents.entry(key(a, b)).or_default() += 1;
            }
        }
    }

    /// Least-played first, random among equals.
    fn by_fewest_played(&self, players: &[ParticipantId], rng: &mut dyn RngCore) -> Vec<ParticipantId> {
        let mut keyed: Vec<(ParticipantId, u32, u32)> = players
            .iter()
            .map(|p| (*p, self.played.get(p).copied().unwrap_or(0), rng.gen::<u32>()))
            .collect();
        keyed.sort_by_key(|(_, played, tiebreak)| (*played, *tiebreak));
        keyed.into_iter().map(|(p, _, _)| p).collect()
    }
}

impl MixedScheduler for GreedyMixedScheduler {
    fn schedule(
        &self,
        men: &[ParticipantId],
        women: &[ParticipantId],
        matches_per_player: u32,
        rng: &mut dyn RngCore,
    ) -> Vec<Pairing> {
        let matches_per_round = men.len().min(women.len()) / 2;
        if matches_per_round == 0 {
            log::info!(
                "Mixed American needs 2 men and 2 women, got {} and {}",
                men.len(),
                women.len()
            );
            return Vec::new();
        }
        let players_per_round = 2 * matches_per_round;
        let mut history = History::default();
        let mut schedule = Vec::new();

        for round_number in 1..=matches_per_player {
            let mut round_men = history.by_fewest_played(men, rng);
            let mut round_women = history.by_fewest_played(women, rng);
            round_men.truncate(players_per_round);
            round_women.truncate(players_per_round);

            for _ in 0..matches_per_round {
                let Some((team1, team2)) = best_combination(&history, &round_men, &round_women) else {
                    break;
                };
                round_men.retain(|p| *p != team1.0 && *p != team2.0);
                round_women.retain(|p| *p != team1.1 && *p != team2.1);
                history.record(team1, team2);
                schedule.push(Pairing {
                    round_number,
                    team1: Competitor::pair(team1.0, team1.1),
                    team2: Competitor::pair(team2.0, team2.1),
                });
            }
        }
        schedule
    }
}

/// Highest-scoring (man, woman) vs (man, woman) among the available players;
/// the first one found wins ties.
fn best_combination(
    history: &History,
    men: &[ParticipantId],
    women: &[ParticipantId],
) -> Option<(PairKey, PairKey)> {
    let mut best: Option<(i64, PairKey, PairKey)> = None;
    for (i, &m1) in men.iter().enumerate() {
        for &m2 in &men[i + 1..] {
            for (k, &w1) in women.iter().enumerate() {
                for &w2 in &women[k + 1..] {
                    for (team1, team2) in [((m1, w1), (m2, w2)), ((m1, w2), (m2, w1))] {
                        let score = history.score(team1, team2);
                        if best.map_or(true, |(b, _, _)| score > b) {
                            best = Some((score, team1, team2));
                        }
                    }
                }
            }
        }
    }
    best.map(|(_, t1, t2)| (t1, t2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use uuid::Uuid;

    fn players(n: usize) -> Vec<ParticipantId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    fn counts(schedule: &[Pairing]) -> HashMap<ParticipantId, u32> {
        let mut counts = HashMap::new();
        for m in schedule {
            for p in m.players() {
                *counts.entry(p).or_default() += 1;
            }
        }
        counts
    }

    #[test]
    fn six_by_six_everyone_plays_their_share() {
        let men = players(6);
        let women = players(6);
        let mut rng = StdRng::seed_from_u64(42);
        let schedule = GreedyMixedScheduler.schedule(&men, &women, 5, &mut rng);
        assert_eq!(schedule.len(), 15);
        let counts = counts(&schedule);
        for p in men.iter().chain(women.iter()) {
            let c = counts.get(p).copied().unwrap_or(0);
            assert!((4..=5).contains(&c), "player played {c}");
        }
    }

    #[test]
    fn every_team_is_one_man_and_one_woman() {
        let men = players(5);
        let women = players(4);
        let mut rng = StdRng::seed_from_u64(1);
        let schedule = GreedyMixedScheduler.schedule(&men, &women, 3, &mut rng);
        assert_eq!(schedule.len(), 6);
        for m in &schedule {
            for team in [m.team1, m.team2] {
                let p = team.participants();
                assert!(men.contains(&p[0]));
                assert!(women.contains(&p[1]));
            }
        }
    }

    #[test]
    fn second_round_switches_partners() {
        let men = players(2);
        let women = players(2);
        let mut rng = StdRng::seed_from_u64(9);
        let schedule = GreedyMixedScheduler.schedule(&men, &women, 2, &mut rng);
        assert_eq!(schedule.len(), 2);
        let first: Vec<PairKey> = [schedule[0].team1, schedule[0].team2]
            .iter()
            .map(|c| {
                let p = c.participants();
                key(p[0], p[1])
            })
            .collect();
        for team in [schedule[1].team1, schedule[1].team2] {
            let p = team.participants();
            assert!(!first.contains(&key(p[0], p[1])));
        }
    }

    #[test]
    fn no_partnership_repeats_while_fresh_ones_exist() {
        // Four rounds with four women: each man can have a new partner every round.
        let men = players(4);
        let women = players(4);
        let mut rng = StdRng::seed_from_u64(5);
        let schedule = GreedyMixedScheduler.schedule(&men, &women, 2, &mut rng);
        let mut partnerships: HashMap<PairKey, u32> = HashMap::new();
        for m in &schedule {
            for team in [m.team1, m.team2] {
                let p = team.participants();
                *partnerships.entry(key(p[0], p[1])).or_default() += 1;
            }
        }
        assert!(partnerships.values().all(|c| *c == 1));
    }

    #[test]
    fn too_small_pool_gives_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(GreedyMixedScheduler
            .schedule(&players(1), &players(4), 3, &mut rng)
            .is_empty());
    }
}
