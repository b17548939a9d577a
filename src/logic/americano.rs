//! Americano: one round of doubles from a flat pool, never repeating a partnership.

use crate::models::{Competitor, ParticipantId};
use rand::seq::SliceRandom;
use rand::RngCore;
use std::collections::HashSet;

/// A generated doubles match, not yet persisted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pairing {
    /// 1-based round (timeslot) inside the generated schedule.
    pub round_number: u32,
    pub team1: Competitor,
    pub team2: Competitor,
}

impl Pairing {
    pub fn players(&self) -> Vec<ParticipantId> {
        let mut players = self.team1.participants();
        players.extend(self.team2.participants());
        players
    }
}

/// Produces doubles pairings from candidate partnerships.
pub trait PairingGenerator: Send + Sync {
    /// Combine `pairs` (unordered partnerships) into matches of two disjoint pairs.
    fn combine(&self, pairs: Vec<(ParticipantId, ParticipantId)>, rng: &mut dyn RngCore) -> Vec<Pairing>;
}

/// Single-pass greedy matching over shuffled partnerships. It may produce fewer
/// matches than a maximum matching would.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyAmericano;

impl PairingGenerator for GreedyAmericano {
    fn combine(&self, mut pairs: Vec<(ParticipantId, ParticipantId)>, rng: &mut dyn RngCore) -> Vec<Pairing> {
        pairs.shuffle(rng);
        let mut used = vec![false; pairs.len()];
        let mut matches = Vec::new();

        for i in 0..pairs.len() {
            if used[i] {
                continue;
            }
            let (a, b) = pairs[i];
            let partner = (i + 1..pairs.len()).find(|&j| {
                let (c, d) = pairs[j];
                !used[j] && c != a && c != b && d != a && d != b
            });
            if let Some(j) = partner {
                used[i] = true;
                used[j] = true;
                let (c, d) = pairs[j];
                matches.push(Pairing {
                    round_number: 1,
                    team1: Competitor::pair(a, b),
                    team2: Competitor::pair(c, d),
                });
            }
        }
        matches
    }
}

/// Every unordered partnership in `players`.
pub fn all_pairs(players: &[ParticipantId]) -> Vec<(ParticipantId, ParticipantId)> {
    players
        .iter()
        .enumerate()
        .flat_map(|(i, a)| players[i + 1..].iter().map(move |b| (*a, *b)))
        .collect()
}

/// Every man+woman partnership.
pub fn mixed_pairs(men: &[ParticipantId], women: &[ParticipantId]) -> Vec<(ParticipantId, ParticipantId)> {
    men.iter()
        .flat_map(|m| women.iter().map(move |w| (*m, *w)))
        .collect()
}

/// Number pairings so that nobody plays twice in one round: each goes to the
/// first round none of its players is in yet. Returned round by round.
pub fn pack_into_rounds(pairings: Vec<Pairing>) -> Vec<Pairing> {
    let mut busy: Vec<HashSet<ParticipantId>> = Vec::new();
    let mut packed = Vec::with_capacity(pairings.len());
    for mut pairing in pairings {
        let players = pairing.players();
        let index = match busy
            .iter()
            .position(|round| players.iter().all(|id| !round.contains(id)))
        {
            Some(index) => index,
            None => {
                busy.push(HashSet::new());
                busy.len() - 1
            }
        };
        busy[index].extend(players);
        pairing.round_number = index as u32 + 1;
        packed.push(pairing);
    }
    packed.sort_by_key(|p| p.round_number);
    packed
}

/// One Americano round over a flat pool of at least four players.
pub fn generate_americano_round(
    generator: &dyn PairingGenerator,
    players: &[ParticipantId],
    rng: &mut dyn RngCore,
) -> Vec<Pairing> {
    if players.len() < 4 {
        log::info!("Americano round needs 4 players, got {}", players.len());
        return Vec::new();
    }
    pack_into_rounds(generator.combine(all_pairs(players), rng))
}

/// One Americano round where every partnership is one man and one woman.
pub fn generate_mixed_gender_round(
    generator: &dyn PairingGenerator,
    men: &[ParticipantId],
    women: &[ParticipantId],
    rng: &mut dyn RngCore,
) -> Vec<Pairing> {
    if men.len() < 2 || women.len() < 2 {
        log::info!(
            "Mixed gender round needs 2 men and 2 women, got {} and {}",
            men.len(),
            women.len()
        );
        return Vec::new();
    }
    pack_into_rounds(generator.combine(mixed_pairs(men, women), rng))
}
