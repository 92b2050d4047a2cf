//! Unlock requirement predicates.
//!
//! Requirements arrive from content either as tagged JSON objects
//! (`{"kind": "plot_flag", "name": "lobby-lights"}`) or in the compact
//! notation used by content authors (`"plotFlag(lobby-lights)"`,
//! `"anomalyLevel>=40"`). Anything that cannot be understood becomes
//! [`Requirement::Unrecognized`], which never evaluates as satisfied.

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

use crate::progress::PuzzlePhase;
use crate::state::{AvatarTier, GameState};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requirement {
    AnomalyLevel { min: u8 },
    DiscoveredClue { id: String },
    SpecialSkill { id: String },
    PlotFlag { name: String },
    NightElkActive,
    RuleViolationCount { min: u32 },
    GamePhase { phase: PuzzlePhase },
    AvatarTier { tier: AvatarTier },
    MaintenancePeriodActive,
    UnlockedRule { id: String },
    DiscoveredSecret { id: String },
    #[serde(other)]
    Unrecognized,
}

impl Requirement {
    /// Evaluate against the current store. Pure; never mutates.
    #[must_use]
    pub fn is_met(&self, state: &GameState) -> bool {
        match self {
            Self::AnomalyLevel { min } => state.progress.anomaly_level() >= *min,
            Self::DiscoveredClue { id } => state.player.discovered_clues.contains(id),
            Self::SpecialSkill { id } => state.player.special_skills.contains(id),
            Self::PlotFlag { name } => state.has_plot_flag(name),
            Self::NightElkActive => state.night_elk_active,
            Self::RuleViolationCount { min } => state.player.violation_count() >= *min,
            Self::GamePhase { phase } => state.progress.phase() == *phase,
            Self::AvatarTier { tier } => state.player.avatar_tier == *tier,
            Self::MaintenancePeriodActive => state.hotel.maintenance_active(),
            Self::UnlockedRule { id } => state.player.unlocked_rules().contains(id),
            Self::DiscoveredSecret { id } => state.player.discovered_secrets().contains(id),
            Self::Unrecognized => false,
        }
    }

    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnomalyLevel { min } => write!(f, "anomalyLevel>={min}"),
            Self::DiscoveredClue { id } => write!(f, "discoveredClue({id})"),
            Self::SpecialSkill { id } => write!(f, "specialSkill({id})"),
            Self::PlotFlag { name } => write!(f, "plotFlag({name})"),
            Self::NightElkActive => f.write_str("nightElkActive"),
            Self::RuleViolationCount { min } => write!(f, "ruleViolationCount>={min}"),
            Self::GamePhase { phase } => write!(f, "gamePhase({phase})"),
            Self::AvatarTier { tier } => write!(f, "avatarTier({tier})"),
            Self::MaintenancePeriodActive => f.write_str("maintenancePeriodActive"),
            Self::UnlockedRule { id } => write!(f, "unlockedRule({id})"),
            Self::DiscoveredSecret { id } => write!(f, "discoveredSecret({id})"),
            Self::Unrecognized => f.write_str("unrecognized"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementParseError {
    #[error("requirement is empty")]
    Empty,
    #[error("unknown requirement kind `{0}`")]
    UnknownKind(String),
    #[error("requirement `{kind}` needs an argument")]
    MissingArgument { kind: String },
    #[error("requirement `{kind}` expects a number, got `{value}`")]
    InvalidNumber { kind: String, value: String },
    #[error("unknown game phase `{0}`")]
    InvalidPhase(String),
    #[error("unknown avatar tier `{0}`")]
    InvalidTier(String),
    #[error("malformed requirement `{0}`")]
    Malformed(String),
}

fn compact_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| {
            Regex::new(r"^(?P<kind>[A-Za-z]+)\s*(?:>=\s*(?P<min>\S+)|\(\s*(?P<arg>[^()]*?)\s*\))?$")
                .ok()
        })
        .as_ref()
}

impl FromStr for Requirement {
    type Err = RequirementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(RequirementParseError::Empty);
        }
        let caps = compact_pattern()
            .and_then(|pattern| pattern.captures(text))
            .ok_or_else(|| RequirementParseError::Malformed(text.to_string()))?;
        let kind = &caps["kind"];
        let min = caps.name("min").map(|m| m.as_str());
        let arg = caps
            .name("arg")
            .map(|m| m.as_str())
            .filter(|arg| !arg.is_empty());

        let needs_arg = || {
            arg.map(str::to_string)
                .ok_or_else(|| RequirementParseError::MissingArgument {
                    kind: kind.to_string(),
                })
        };
        let number = |value: Option<&str>| -> Result<u32, RequirementParseError> {
            let value = value.ok_or_else(|| RequirementParseError::MissingArgument {
                kind: kind.to_string(),
            })?;
            value
                .parse::<u32>()
                .map_err(|_| RequirementParseError::InvalidNumber {
                    kind: kind.to_string(),
                    value: value.to_string(),
                })
        };

        match kind {
            "anomalyLevel" => {
                let min = number(min)?;
                Ok(Self::AnomalyLevel {
                    min: u8::try_from(min.min(100)).unwrap_or(100),
                })
            }
            "ruleViolationCount" => Ok(Self::RuleViolationCount { min: number(min)? }),
            "discoveredClue" => Ok(Self::DiscoveredClue { id: needs_arg()? }),
            "specialSkill" => Ok(Self::SpecialSkill { id: needs_arg()? }),
            "plotFlag" => Ok(Self::PlotFlag { name: needs_arg()? }),
            "unlockedRule" => Ok(Self::UnlockedRule { id: needs_arg()? }),
            "discoveredSecret" => Ok(Self::DiscoveredSecret { id: needs_arg()? }),
            "gamePhase" => {
                let raw = needs_arg()?;
                raw.parse::<PuzzlePhase>()
                    .map(|phase| Self::GamePhase { phase })
                    .map_err(|()| RequirementParseError::InvalidPhase(raw))
            }
            "avatarTier" => {
                let raw = needs_arg()?;
                raw.parse::<AvatarTier>()
                    .map(|tier| Self::AvatarTier { tier })
                    .map_err(|()| RequirementParseError::InvalidTier(raw))
            }
            "nightElkActive" => Ok(Self::NightElkActive),
            "maintenancePeriodActive" => Ok(Self::MaintenancePeriodActive),
            other => Err(RequirementParseError::UnknownKind(other.to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequirementRepr {
    Compact(String),
    Tagged(Requirement),
}

/// Deserialize a requirement list, accepting both the tagged and compact
/// forms. Entries that cannot be parsed fail closed as `Unrecognized`.
///
/// # Errors
///
/// Returns an error only when the value is not a list of strings or objects.
pub fn deserialize_requirements<'de, D>(deserializer: D) -> Result<Vec<Requirement>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<RequirementRepr>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|repr| match repr {
            RequirementRepr::Tagged(Requirement::Unrecognized) => {
                log::warn!("unrecognized requirement kind; treating as unmet");
                Requirement::Unrecognized
            }
            RequirementRepr::Tagged(requirement) => requirement,
            RequirementRepr::Compact(text) => text.parse().unwrap_or_else(|err| {
                log::warn!("requirement `{text}` not understood ({err}); treating as unmet");
                Requirement::Unrecognized
            }),
        })
        .collect())
}

/// Met and unmet requirements of one procedure, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RequirementCheck {
    pub met: Vec<Requirement>,
    pub unmet: Vec<Requirement>,
}

impl RequirementCheck {
    #[must_use]
    pub fn evaluate(requirements: &[Requirement], state: &GameState) -> Self {
        let (met, unmet) = requirements
            .iter()
            .cloned()
            .partition(|requirement| requirement.is_met(state));
        Self { met, unmet }
    }

    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.unmet.is_empty()
    }
}
