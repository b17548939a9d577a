//! Tournament business logic: group play, qualification, seeding, advancement, pairings.

mod advancement;
mod americano;
mod confrontations;
mod final_positions;
mod group_play;
mod mixed_american;
mod qualification;
mod scheduling;
mod seeding;
mod stage_graph;
mod tiebreak;

pub use advancement::{
    advance, clear_final_positions, revert, write_final_positions, AdvanceReport, BracketContext,
    RevertReport,
};
pub use americano::{
    all_pairs, generate_americano_round, generate_mixed_gender_round, mixed_pairs,
    pack_into_rounds, GreedyAmericano, Pairing, PairingGenerator,
};
pub use confrontations::{advance_confrontation, build_confrontation_round};
pub use final_positions::calculate_final_positions;
pub use group_play::{
    compute_group_stats, group_matches, rank_across_groups, standings_by_group, GroupStanding,
};
pub use mixed_american::{GreedyMixedScheduler, MixedScheduler};
pub use qualification::{qualify, qualify_for_stage};
pub use scheduling::SlotFinder;
pub use seeding::{
    build_crossed_first_round, build_knockout_round, build_placement_tiers, competitors,
    first_open_tier, first_round_for, fold, seeded_round, TIER_SIZE,
};
pub use stage_graph::{BracketShape, Edge, Outcome, SlotRule, StageGraph};
pub use tiebreak::{compare, head_to_head, resolve, resolve_ids, CompetitorStats};
