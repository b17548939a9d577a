//! Racquet tournament engine: group ranking, qualification, bracket advancement,
//! final positions and doubles pairing schedules, behind an async record store.

pub mod engine;
pub mod error;
pub mod logic;
pub mod models;
pub mod store;

pub use engine::{Engine, EngineConfig, GroupStageOutcome};
pub use error::{EngineError, EngineResult, StoreError, StoreResult};
pub use logic::{AdvanceReport, RevertReport};
pub use models::{
    Category, CategoryId, Competitor, Confrontation, ConfrontationGame, ConfrontationId, GameKind,
    Gender, KnockoutStage, Match, MatchId, MatchStatus, Participant, ParticipantId,
    ParticipantKind, Round, SetScore, Slot, Tournament, TournamentFormat, TournamentId,
};
pub use store::{MemoryStore, TournamentStore};
