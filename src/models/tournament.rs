//! Tournament, Category and the format enums that decide how a category progresses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tournament.
pub type TournamentId = Uuid;

/// Unique identifier for a category inside a tournament.
pub type CategoryId = Uuid;

/// Declared competition format of a tournament or category.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    #[default]
    SingleElimination,
    RoundRobinIndividual,
    RoundRobinTeams,
    GroupsKnockout,
    IndividualGroupsKnockout,
    CrossedPlayoffs,
    MixedGender,
    SuperTeams,
    MixedAmerican,
}

impl TournamentFormat {
    /// Formats where participants are individual players paired per match.
    pub fn is_individual(self) -> bool {
        matches!(
            self,
            TournamentFormat::RoundRobinIndividual
                | TournamentFormat::IndividualGroupsKnockout
                | TournamentFormat::CrossedPlayoffs
                | TournamentFormat::MixedGender
                | TournamentFormat::MixedAmerican
        )
    }
}

/// Target size of the first knockout round.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnockoutStage {
    #[serde(rename = "round_of_16")]
    RoundOf16,
    Quarterfinals,
    Semifinals,
    Final,
}

impl KnockoutStage {
    /// Number of competitors entering this stage.
    pub fn bracket_size(self) -> usize {
        match self {
            KnockoutStage::RoundOf16 => 16,
            KnockoutStage::Quarterfinals => 8,
            KnockoutStage::Semifinals => 4,
            KnockoutStage::Final => 2,
        }
    }
}

/// A tournament as consumed by the engine. Scheduling parameters are only read
/// when the engine has to place lazily created matches on courts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub format: TournamentFormat,
    pub court_count: u32,
    pub match_duration_minutes: u32,
    /// First slot of the day; None leaves new matches unscheduled until something else is.
    pub start_time: Option<NaiveDateTime>,
}

impl Tournament {
    pub fn new(name: impl Into<String>, format: TournamentFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            format,
            court_count: 1,
            match_duration_minutes: 60,
            start_time: None,
        }
    }

    /// Builder-style court/time parameters.
    pub fn with_schedule(
        mut self,
        court_count: u32,
        match_duration_minutes: u32,
        start_time: Option<NaiveDateTime>,
    ) -> Self {
        self.court_count = court_count.max(1);
        self.match_duration_minutes = match_duration_minutes.max(1);
        self.start_time = start_time;
        self
    }
}

/// Sub-division of a tournament with its own format and qualification rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub tournament_id: TournamentId,
    pub name: String,
    pub format: TournamentFormat,
    pub number_of_groups: u32,
    pub qualified_per_group: u32,
    pub knockout_stage: Option<KnockoutStage>,
    /// Team formats only: play a 3rd-place match alongside the final.
    #[serde(default)]
    pub third_place_match: bool,
}

impl Category {
    pub fn new(tournament_id: TournamentId, name: impl Into<String>, format: TournamentFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            tournament_id,
            name: name.into(),
            format,
            number_of_groups: 0,
            qualified_per_group: 2,
            knockout_stage: None,
            third_place_match: false,
        }
    }

    /// A category standing in for a tournament that has no categories of its own.
    pub fn implicit_for(tournament: &Tournament) -> Self {
        Self {
            id: tournament.id,
            ..Self::new(tournament.id, tournament.name.clone(), tournament.format)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn individual_formats() {
        assert!(TournamentFormat::IndividualGroupsKnockout.is_individual());
        assert!(TournamentFormat::CrossedPlayoffs.is_individual());
        assert!(!TournamentFormat::GroupsKnockout.is_individual());
        assert!(!TournamentFormat::SuperTeams.is_individual());
    }

    #[test]
    fn knockout_stage_serializes_snake_case() {
        let json = serde_json::to_string(&KnockoutStage::RoundOf16).unwrap();
        assert_eq!(json, "\"round_of_16\"");
        assert_eq!(KnockoutStage::Quarterfinals.bracket_size(), 8);
    }
}
