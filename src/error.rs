//! Engine and store error types.

use crate::models::{CategoryId, ConfrontationId, MatchId, ParticipantId, TournamentId};
use thiserror::Error;

/// Failures reported by a record store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by engine operations. Missing prerequisites are not errors;
/// those are reported through the operation's outcome value and logged.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Confrontation not found: {0}")]
    ConfrontationNotFound(ConfrontationId),

    #[error("Participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    #[error("Invalid score: {0}")]
    InvalidScore(String),

    #[error("Not enough players: need {needed}, got {got}")]
    NotEnoughPlayers { needed: usize, got: usize },

    #[error("Operation not available for this format: {0}")]
    InvalidFormat(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

pub type StoreResult<T> = Result<T, StoreError>;
