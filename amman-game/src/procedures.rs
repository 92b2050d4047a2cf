//! Supplementary hotel procedures: the unlockable rule catalog.
//!
//! Procedures are defined once at load time and never change afterwards.
//! Their status moves `Locked → Unlocked → Active`, each step at most once.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::notify::NotificationKind;
use crate::requirements::{Requirement, deserialize_requirements};

/// One beat of a staged reveal, delivered as a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealStep {
    /// Seconds after the previous step (or after scheduling, for the first).
    pub delay_secs: u64,
    #[serde(default = "default_reveal_kind")]
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub message: String,
}

const fn default_reveal_kind() -> NotificationKind {
    NotificationKind::Info
}

/// Effect applied when the player activates an unlocked procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ProcedureEffect {
    AddPuzzleProgress { amount: i32 },
    AddAnomaly { amount: i32 },
    SetPlotFlag { name: String },
    UnlockRule { id: String },
    DiscoverSecret { id: String },
    DiscoverClue { id: String },
    OpenFloor { floor: i32 },
    Notify {
        kind: NotificationKind,
        title: String,
        #[serde(default)]
        message: String,
    },
    ScheduleReveal {
        sequence: String,
        stages: Vec<RevealStep>,
    },
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, deserialize_with = "deserialize_requirements")]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub effects: Vec<ProcedureEffect>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProcedureStatus {
    #[default]
    Locked,
    Unlocked,
    Active,
}

impl ProcedureStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
            Self::Active => "active",
        }
    }

    #[must_use]
    pub const fn is_available(self) -> bool {
        !matches!(self, Self::Locked)
    }
}

impl fmt::Display for ProcedureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable, ordered procedure catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcedureCatalog(Vec<Procedure>);

impl ProcedureCatalog {
    #[must_use]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub const fn new(procedures: Vec<Procedure>) -> Self {
        Self(procedures)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Procedure> {
        self.0.iter().find(|procedure| procedure.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Procedure> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First id that appears more than once, if any.
    #[must_use]
    pub fn duplicate_id(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.0
            .iter()
            .map(|procedure| procedure.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

impl<'a> IntoIterator for &'a ProcedureCatalog {
    type Item = &'a Procedure;
    type IntoIter = std::slice::Iter<'a, Procedure>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
