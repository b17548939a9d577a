//! Data structures for the tournament engine: tournaments, participants, matches, rounds.

mod confrontation;
mod game;
mod participant;
mod round;
mod tournament;

pub use confrontation::{Confrontation, ConfrontationGame, ConfrontationId, GameKind};
pub use game::{
    decide_winner, games_per_side, Competitor, Match, MatchId, MatchStatus, SetScore, Slot,
    MAX_SETS,
};
pub use participant::{Gender, Participant, ParticipantId, ParticipantKind};
pub use round::{CrossedMatch, Round, Tier, UnknownRound};
pub use tournament::{
    Category, CategoryId, KnockoutStage, Tournament, TournamentFormat, TournamentId,
};
