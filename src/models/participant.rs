//! Participant: a registered team (two players) or an individual player.

use crate::models::tournament::{CategoryId, TournamentId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a participant (team or individual player).
pub type ParticipantId = Uuid;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// What kind of competitor a participant is.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParticipantKind {
    /// A fixed team; owns its two player references.
    Team { player1: Uuid, player2: Uuid },
    /// A single player, paired with others per match.
    Individual { gender: Option<Gender> },
}

/// A participant in a category.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub tournament_id: TournamentId,
    pub category_id: CategoryId,
    pub name: String,
    #[serde(flatten)]
    pub kind: ParticipantKind,
    /// Group label (`A`, `B`, ...); None before groups are drawn or in formats without groups.
    pub group_name: Option<String>,
    /// Written only by the final position calculator.
    pub final_position: Option<u32>,
    /// Last tiebreak: earlier registration ranks higher.
    pub registration_order: u32,
}

impl Participant {
    /// New team participant with fresh player references.
    pub fn team(
        tournament_id: TournamentId,
        category_id: CategoryId,
        name: impl Into<String>,
        registration_order: u32,
    ) -> Self {
        Self::with_kind(
            tournament_id,
            category_id,
            name,
            ParticipantKind::Team {
                player1: Uuid::new_v4(),
                player2: Uuid::new_v4(),
            },
            registration_order,
        )
    }

    /// New individual participant.
    pub fn individual(
        tournament_id: TournamentId,
        category_id: CategoryId,
        name: impl Into<String>,
        gender: Option<Gender>,
        registration_order: u32,
    ) -> Self {
        Self::with_kind(
            tournament_id,
            category_id,
            name,
            ParticipantKind::Individual { gender },
            registration_order,
        )
    }

    fn with_kind(
        tournament_id: TournamentId,
        category_id: CategoryId,
        name: impl Into<String>,
        kind: ParticipantKind,
        registration_order: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            category_id,
            name: name.into(),
            kind,
            group_name: None,
            final_position: None,
            registration_order,
        }
    }

    /// Place the participant in a group (builder style, used during setup).
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group_name = Some(group.into());
        self
    }

    pub fn is_team(&self) -> bool {
        matches!(self.kind, ParticipantKind::Team { .. })
    }

    pub fn gender(&self) -> Option<Gender> {
        match self.kind {
            ParticipantKind::Individual { gender } => gender,
            ParticipantKind::Team { .. } => None,
        }
    }
}
