//! Puzzle progress and anomaly accumulation.
//!
//! Both scores saturate into `[0, 100]` inside the store itself so no call
//! site has to guard them. Puzzle thresholds fire at most once per session
//! and the puzzle phase only ever moves forward.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::constants::{
    COMPLETION_THRESHOLD, INVESTIGATION_THRESHOLD, REVELATION_THRESHOLD, SCORE_MAX, SCORE_MIN,
};

/// Coarse stage of the Night Elk storyline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PuzzlePhase {
    #[default]
    Discovery,
    Investigation,
    Revelation,
    Completion,
}

impl PuzzlePhase {
    pub const ALL: &'static [Self] = &[
        Self::Discovery,
        Self::Investigation,
        Self::Revelation,
        Self::Completion,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Investigation => "investigation",
            Self::Revelation => "revelation",
            Self::Completion => "completion",
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Discovery => Some(Self::Investigation),
            Self::Investigation => Some(Self::Revelation),
            Self::Revelation => Some(Self::Completion),
            Self::Completion => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completion)
    }
}

impl fmt::Display for PuzzlePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PuzzlePhase {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "discovery" => Ok(Self::Discovery),
            "investigation" => Ok(Self::Investigation),
            "revelation" => Ok(Self::Revelation),
            "completion" => Ok(Self::Completion),
            _ => Err(()),
        }
    }
}

/// Descriptive banding of the anomaly level; gates cosmetic effects only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyBand {
    Calm,
    Uneasy,
    Disturbed,
    Distorted,
    Fractured,
}

impl AnomalyBand {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Uneasy => "uneasy",
            Self::Disturbed => "disturbed",
            Self::Distorted => "distorted",
            Self::Fractured => "fractured",
        }
    }

    /// Band for `level`, given ascending band floors (20/40/60/80 by default).
    #[must_use]
    pub fn from_level(level: u8, floors: &[u8]) -> Self {
        match floors.iter().filter(|floor| level >= **floor).count() {
            0 => Self::Calm,
            1 => Self::Uneasy,
            2 => Self::Disturbed,
            3 => Self::Distorted,
            _ => Self::Fractured,
        }
    }
}

impl fmt::Display for AnomalyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress values that move the puzzle out of each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseThresholds {
    #[serde(default = "PhaseThresholds::default_investigation")]
    pub investigation: u8,
    #[serde(default = "PhaseThresholds::default_revelation")]
    pub revelation: u8,
    #[serde(default = "PhaseThresholds::default_completion")]
    pub completion: u8,
}

impl PhaseThresholds {
    const fn default_investigation() -> u8 {
        INVESTIGATION_THRESHOLD
    }

    const fn default_revelation() -> u8 {
        REVELATION_THRESHOLD
    }

    const fn default_completion() -> u8 {
        COMPLETION_THRESHOLD
    }

    /// Furthest phase the given progress value entitles the puzzle to.
    #[must_use]
    pub const fn phase_for(&self, progress: u8) -> PuzzlePhase {
        if progress >= self.completion {
            PuzzlePhase::Completion
        } else if progress >= self.revelation {
            PuzzlePhase::Revelation
        } else if progress >= self.investigation {
            PuzzlePhase::Investigation
        } else {
            PuzzlePhase::Discovery
        }
    }
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            investigation: Self::default_investigation(),
            revelation: Self::default_revelation(),
            completion: Self::default_completion(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransition {
    pub from: PuzzlePhase,
    pub to: PuzzlePhase,
}

pub type PhaseTransitions = SmallVec<[PhaseTransition; 3]>;

/// Outcome of a single puzzle-progress accumulation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressReport {
    pub previous: u8,
    pub current: u8,
    /// Thresholds that fired for the first time on this call, ascending.
    pub thresholds_crossed: SmallVec<[u8; 4]>,
    pub transitions: PhaseTransitions,
}

impl ProgressReport {
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.thresholds_crossed.is_empty() && self.transitions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnomalyChange {
    pub previous: u8,
    pub current: u8,
    /// Band floors reached for the first time on this call, ascending.
    pub bands_entered: SmallVec<[u8; 4]>,
}

/// Clamp an arbitrary accumulation into the score range.
#[must_use]
pub fn clamp_score(value: i64) -> u8 {
    let clamped = value.clamp(i64::from(SCORE_MIN), i64::from(SCORE_MAX));
    u8::try_from(clamped).unwrap_or(SCORE_MAX)
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressState {
    puzzle_progress: u8,
    anomaly_level: u8,
    phase: PuzzlePhase,
    #[serde(default)]
    fired_thresholds: BTreeSet<u8>,
    #[serde(default)]
    fired_bands: BTreeSet<u8>,
}

impl ProgressState {
    #[must_use]
    pub const fn puzzle_progress(&self) -> u8 {
        self.puzzle_progress
    }

    #[must_use]
    pub const fn anomaly_level(&self) -> u8 {
        self.anomaly_level
    }

    #[must_use]
    pub const fn phase(&self) -> PuzzlePhase {
        self.phase
    }

    #[must_use]
    pub const fn fired_thresholds(&self) -> &BTreeSet<u8> {
        &self.fired_thresholds
    }

    #[must_use]
    pub const fn fired_bands(&self) -> &BTreeSet<u8> {
        &self.fired_bands
    }

    pub fn add_puzzle_progress(
        &mut self,
        delta: i32,
        thresholds: &[u8],
        phases: &PhaseThresholds,
    ) -> ProgressReport {
        let previous = self.puzzle_progress;
        self.puzzle_progress = clamp_score(i64::from(previous) + i64::from(delta));

        let mut report = ProgressReport {
            previous,
            current: self.puzzle_progress,
            ..ProgressReport::default()
        };

        let mut ordered: SmallVec<[u8; 4]> = thresholds.iter().copied().collect();
        ordered.sort_unstable();
        for threshold in ordered {
            if self.puzzle_progress >= threshold && self.fired_thresholds.insert(threshold) {
                report.thresholds_crossed.push(threshold);
            }
        }

        report.transitions = self.advance_phase_to(phases.phase_for(self.puzzle_progress));
        report
    }

    /// Band floors behave like puzzle thresholds: each fires once.
    pub fn add_anomaly_level(&mut self, delta: i32, band_floors: &[u8]) -> AnomalyChange {
        let previous = self.anomaly_level;
        self.anomaly_level = clamp_score(i64::from(previous) + i64::from(delta));

        let mut change = AnomalyChange {
            previous,
            current: self.anomaly_level,
            ..AnomalyChange::default()
        };
        let mut ordered: SmallVec<[u8; 4]> = band_floors.iter().copied().collect();
        ordered.sort_unstable();
        for floor in ordered {
            if self.anomaly_level >= floor && self.fired_bands.insert(floor) {
                change.bands_entered.push(floor);
            }
        }
        change
    }

    /// Step the phase forward until it reaches `target`; never moves back.
    pub fn advance_phase_to(&mut self, target: PuzzlePhase) -> PhaseTransitions {
        let mut transitions = PhaseTransitions::new();
        while self.phase < target {
            let Some(next) = self.phase.next() else {
                break;
            };
            transitions.push(PhaseTransition {
                from: self.phase,
                to: next,
            });
            self.phase = next;
        }
        transitions
    }
}
