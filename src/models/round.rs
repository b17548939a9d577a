//! Round names: the closed vocabulary shared with the rendering layer.
//!
//! Every round a match can belong to is a variant of [`Round`]. The wire strings
//! (`group_A`, `quarter_final`, `5th_semifinal`, `crossed_r2_j5`, ...) are produced
//! by `Display` and accepted by `FromStr`, together with the legacy crossed-playoff
//! aliases. Changing any of these strings is an API break.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A lower placement tier. Tier 1 is the main bracket (`semi_final`, `final`, `3rd_place`).
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Tier {
    Fifth,
    Ninth,
    Thirteenth,
    Seventeenth,
    TwentyFirst,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Fifth,
        Tier::Ninth,
        Tier::Thirteenth,
        Tier::Seventeenth,
        Tier::TwentyFirst,
    ];

    /// First place decided by this tier (5, 9, 13, 17, 21).
    pub fn base(self) -> u32 {
        match self {
            Tier::Fifth => 5,
            Tier::Ninth => 9,
            Tier::Thirteenth => 13,
            Tier::Seventeenth => 17,
            Tier::TwentyFirst => 21,
        }
    }

    pub fn from_base(base: u32) -> Option<Tier> {
        Tier::ALL.into_iter().find(|t| t.base() == base)
    }

    pub fn next(self) -> Option<Tier> {
        Tier::from_base(self.base() + 4)
    }
}

/// The eight fixed matches of the crossed playoffs.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CrossedMatch {
    J1,
    J2,
    J3,
    J4,
    J5,
    J6,
    J7,
    J8,
}

impl CrossedMatch {
    pub const ALL: [CrossedMatch; 8] = [
        CrossedMatch::J1,
        CrossedMatch::J2,
        CrossedMatch::J3,
        CrossedMatch::J4,
        CrossedMatch::J5,
        CrossedMatch::J6,
        CrossedMatch::J7,
        CrossedMatch::J8,
    ];

    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    /// Playoff round (1..=3) this match is played in.
    pub fn stage(self) -> u8 {
        match self {
            CrossedMatch::J1 | CrossedMatch::J2 | CrossedMatch::J3 => 1,
            CrossedMatch::J4 | CrossedMatch::J5 | CrossedMatch::J6 => 2,
            CrossedMatch::J7 | CrossedMatch::J8 => 3,
        }
    }

    fn from_number(n: u8) -> Option<CrossedMatch> {
        CrossedMatch::ALL.into_iter().find(|m| m.number() == n)
    }
}

/// Stage a match belongs to; also its node in the stage graph.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Round {
    Group(char),
    RoundOf16,
    QuarterFinal,
    SemiFinal,
    Final,
    ThirdPlace,
    /// `5th_semifinal`, `9th_semifinal`, ...
    TierSemifinal(Tier),
    /// Winners' match of a tier: `5th_place`, `9th_place`, ...
    TierFinal(Tier),
    /// Losers' match of a tier: `7th_place`, `11th_place`, ...
    TierConsolation(Tier),
    Crossed(CrossedMatch),
}

impl Round {
    pub fn is_group(self) -> bool {
        matches!(self, Round::Group(_))
    }

    /// Group label for group rounds (`"A"` for `group_A`).
    pub fn group_label(self) -> Option<String> {
        match self {
            Round::Group(c) => Some(c.to_string()),
            _ => None,
        }
    }

    /// Group round for a label; only the first character is significant.
    pub fn group(label: &str) -> Option<Round> {
        label.chars().next().map(|c| Round::Group(c.to_ascii_uppercase()))
    }

    /// Rounds that must complete together before their destinations are derived.
    pub fn siblings(self) -> Vec<Round> {
        match self {
            Round::Crossed(m) => CrossedMatch::ALL
                .into_iter()
                .filter(|o| o.stage() == m.stage())
                .map(Round::Crossed)
                .collect(),
            other => vec![other],
        }
    }

    /// All non-group rounds, in bracket order.
    pub fn knockout_rounds() -> Vec<Round> {
        let mut rounds = vec![
            Round::RoundOf16,
            Round::QuarterFinal,
            Round::SemiFinal,
            Round::Final,
            Round::ThirdPlace,
        ];
        for tier in Tier::ALL {
            rounds.push(Round::TierSemifinal(tier));
            rounds.push(Round::TierFinal(tier));
            rounds.push(Round::TierConsolation(tier));
        }
        rounds.extend(CrossedMatch::ALL.into_iter().map(Round::Crossed));
        rounds
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Round::Group(c) => write!(f, "group_{c}"),
            Round::RoundOf16 => write!(f, "round_of_16"),
            Round::QuarterFinal => write!(f, "quarter_final"),
            Round::SemiFinal => write!(f, "semi_final"),
            Round::Final => write!(f, "final"),
            Round::ThirdPlace => write!(f, "3rd_place"),
            Round::TierSemifinal(t) => write!(f, "{}_semifinal", ordinal(t.base())),
            Round::TierFinal(t) => write!(f, "{}_place", ordinal(t.base())),
            Round::TierConsolation(t) => write!(f, "{}_place", ordinal(t.base() + 2)),
            Round::Crossed(m) => write!(f, "crossed_r{}_j{}", m.stage(), m.number()),
        }
    }
}

/// Round name outside the known vocabulary.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown round name: {0}")]
pub struct UnknownRound(pub String);

impl FromStr for Round {
    type Err = UnknownRound;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownRound(s.to_string());
        let round = match s {
            "round_of_16" => Round::RoundOf16,
            "quarter_final" => Round::QuarterFinal,
            "semi_final" | "1st_semifinal" => Round::SemiFinal,
            "final" => Round::Final,
            "3rd_place" => Round::ThirdPlace,
            // Legacy crossed-playoff names.
            "crossed_r1_match1" => Round::Crossed(CrossedMatch::J1),
            "crossed_r1_match2" => Round::Crossed(CrossedMatch::J2),
            "crossed_r1_match3" => Round::Crossed(CrossedMatch::J3),
            "crossed_r2_semifinal1" => Round::Crossed(CrossedMatch::J4),
            "crossed_r2_semifinal2" => Round::Crossed(CrossedMatch::J5),
            "crossed_r2_5th_place" => Round::Crossed(CrossedMatch::J6),
            "crossed_r3_final" => Round::Crossed(CrossedMatch::J7),
            "crossed_r3_3rd_place" => Round::Crossed(CrossedMatch::J8),
            _ => {
                if let Some(label) = s.strip_prefix("group_") {
                    let mut chars = label.chars();
                    return match (chars.next(), chars.next()) {
                        (Some(c), None) if c.is_ascii_alphabetic() => {
                            Ok(Round::Group(c.to_ascii_uppercase()))
                        }
                        _ => Err(unknown()),
                    };
                }
                if let Some(rest) = s.strip_prefix("crossed_r") {
                    return parse_crossed(rest).ok_or_else(unknown);
                }
                return parse_tier(s).ok_or_else(unknown);
            }
        };
        Ok(round)
    }
}

fn parse_crossed(rest: &str) -> Option<Round> {
    let (stage, number) = rest.split_once("_j")?;
    let stage: u8 = stage.parse().ok()?;
    let m = CrossedMatch::from_number(number.parse().ok()?)?;
    (m.stage() == stage).then_some(Round::Crossed(m))
}

fn parse_tier(s: &str) -> Option<Round> {
    let (place, kind) = s.split_once('_')?;
    let digits: String = place.chars().take_while(|c| c.is_ascii_digit()).collect();
    let n: u32 = digits.parse().ok()?;
    if ordinal(n) != place {
        return None;
    }
    match kind {
        "semifinal" => Tier::from_base(n).map(Round::TierSemifinal),
        "place" => Tier::from_base(n)
            .map(Round::TierFinal)
            .or_else(|| n.checked_sub(2).and_then(Tier::from_base).map(Round::TierConsolation)),
        _ => None,
    }
}

impl Serialize for Round {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Round {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
