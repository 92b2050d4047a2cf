//! Session configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//! Call [`HotelConfig::validate`] before handing a config to a session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::{HourWindow, default_start_time};
use crate::constants::{
    ANOMALY_BANDS, NIGHT_ELK_ANOMALY_BUMP, NIGHT_ELK_MIN_ANOMALY, NIGHT_ELK_NIGHT_END_HOUR,
    NIGHT_ELK_NIGHT_START_HOUR, NIGHT_ELK_SIGHTING_CHANCE, NIGHT_ELK_SIGHTING_SECS,
    NOTIFICATION_DISPLAY_SECS, PUZZLE_THRESHOLDS, SCORE_MAX, UNLOCK_POLL_INTERVAL_SECS,
};
use crate::progress::PhaseThresholds;

/// How locked procedures get re-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UnlockMode {
    /// Sweep after every state mutation.
    #[default]
    Reactive,
    /// Sweep from a recurring deferred event.
    Polling {
        #[serde(default = "UnlockMode::default_interval_secs")]
        interval_secs: u64,
    },
}

impl UnlockMode {
    const fn default_interval_secs() -> u64 {
        UNLOCK_POLL_INTERVAL_SECS
    }

    #[must_use]
    pub const fn polling() -> Self {
        Self::Polling {
            interval_secs: UNLOCK_POLL_INTERVAL_SECS,
        }
    }

    #[must_use]
    pub const fn is_reactive(self) -> bool {
        matches!(self, Self::Reactive)
    }

    /// Sweep interval, or `None` in reactive mode.
    #[must_use]
    pub const fn interval_secs(self) -> Option<u64> {
        match self {
            Self::Reactive => None,
            Self::Polling { interval_secs } => Some(interval_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightElkConfig {
    /// Chance of a sighting per simulated hour inside the night window.
    #[serde(default = "NightElkConfig::default_sighting_chance")]
    pub sighting_chance: f32,
    #[serde(default = "NightElkConfig::default_min_anomaly")]
    pub min_anomaly: u8,
    #[serde(default = "NightElkConfig::default_night")]
    pub night: HourWindow,
    #[serde(default = "NightElkConfig::default_sighting_secs")]
    pub sighting_secs: u64,
    #[serde(default = "NightElkConfig::default_anomaly_bump")]
    pub anomaly_bump: i32,
}

impl NightElkConfig {
    const fn default_sighting_chance() -> f32 {
        NIGHT_ELK_SIGHTING_CHANCE
    }

    const fn default_min_anomaly() -> u8 {
        NIGHT_ELK_MIN_ANOMALY
    }

    const fn default_night() -> HourWindow {
        HourWindow::new(NIGHT_ELK_NIGHT_START_HOUR, NIGHT_ELK_NIGHT_END_HOUR)
    }

    const fn default_sighting_secs() -> u64 {
        NIGHT_ELK_SIGHTING_SECS
    }

    const fn default_anomaly_bump() -> i32 {
        NIGHT_ELK_ANOMALY_BUMP
    }

    fn validate(&self) -> Result<(), HotelConfigError> {
        if !(0.0..=1.0).contains(&self.sighting_chance) {
            return Err(HotelConfigError::RangeViolation {
                field: "night_elk.sighting_chance",
                min: 0.0,
                max: 1.0,
                value: self.sighting_chance,
            });
        }
        if self.min_anomaly > SCORE_MAX {
            return Err(HotelConfigError::ScoreOutOfRange {
                field: "night_elk.min_anomaly",
                value: self.min_anomaly,
            });
        }
        if !self.night.is_well_formed() {
            return Err(HotelConfigError::MalformedWindow {
                field: "night_elk.night",
                window: self.night,
            });
        }
        if self.sighting_secs == 0 {
            return Err(HotelConfigError::ZeroDuration {
                field: "night_elk.sighting_secs",
            });
        }
        Ok(())
    }
}

impl Default for NightElkConfig {
    fn default() -> Self {
        Self {
            sighting_chance: Self::default_sighting_chance(),
            min_anomaly: Self::default_min_anomaly(),
            night: Self::default_night(),
            sighting_secs: Self::default_sighting_secs(),
            anomaly_bump: Self::default_anomaly_bump(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelConfig {
    #[serde(default = "HotelConfig::default_display_secs")]
    pub notification_display_secs: u64,
    #[serde(default)]
    pub unlock_mode: UnlockMode,
    #[serde(default = "HotelConfig::default_puzzle_thresholds")]
    pub puzzle_thresholds: Vec<u8>,
    #[serde(default = "HotelConfig::default_anomaly_bands")]
    pub anomaly_bands: Vec<u8>,
    #[serde(default)]
    pub phases: PhaseThresholds,
    #[serde(default)]
    pub night_elk: NightElkConfig,
    #[serde(default = "default_start_time")]
    pub start_time: DateTime<Utc>,
}

impl HotelConfig {
    const fn default_display_secs() -> u64 {
        NOTIFICATION_DISPLAY_SECS
    }

    fn default_puzzle_thresholds() -> Vec<u8> {
        PUZZLE_THRESHOLDS.to_vec()
    }

    fn default_anomaly_bands() -> Vec<u8> {
        ANOMALY_BANDS.to_vec()
    }

    /// Parse a config from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns `HotelConfigError::Parse` for malformed JSON and any
    /// validation error otherwise.
    pub fn from_json(json: &str) -> Result<Self, HotelConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `HotelConfigError` when any field violates its documented bounds.
    pub fn validate(&self) -> Result<(), HotelConfigError> {
        if self.notification_display_secs == 0 {
            return Err(HotelConfigError::ZeroDuration {
                field: "notification_display_secs",
            });
        }
        if let UnlockMode::Polling { interval_secs: 0 } = self.unlock_mode {
            return Err(HotelConfigError::ZeroDuration {
                field: "unlock_mode.interval_secs",
            });
        }
        validate_ascending("puzzle_thresholds", &self.puzzle_thresholds)?;
        validate_ascending("anomaly_bands", &self.anomaly_bands)?;
        self.validate_phases()?;
        self.night_elk.validate()
    }

    fn validate_phases(&self) -> Result<(), HotelConfigError> {
        let PhaseThresholds {
            investigation,
            revelation,
            completion,
        } = self.phases;
        if completion > SCORE_MAX {
            return Err(HotelConfigError::ScoreOutOfRange {
                field: "phases.completion",
                value: completion,
            });
        }
        if !(investigation <= revelation && revelation <= completion) {
            return Err(HotelConfigError::PhaseOrder {
                investigation,
                revelation,
                completion,
            });
        }
        Ok(())
    }
}

fn validate_ascending(field: &'static str, values: &[u8]) -> Result<(), HotelConfigError> {
    if let Some(value) = values.iter().copied().find(|value| *value > SCORE_MAX) {
        return Err(HotelConfigError::ScoreOutOfRange { field, value });
    }
    if values.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(HotelConfigError::NotAscending { field });
    }
    Ok(())
}

impl Default for HotelConfig {
    fn default() -> Self {
        Self {
            notification_display_secs: Self::default_display_secs(),
            unlock_mode: UnlockMode::default(),
            puzzle_thresholds: Self::default_puzzle_thresholds(),
            anomaly_bands: Self::default_anomaly_bands(),
            phases: PhaseThresholds::default(),
            night_elk: NightElkConfig::default(),
            start_time: default_start_time(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HotelConfigError {
    #[error("failed to parse hotel config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("{field} value {value} exceeds the 0-100 score range")]
    ScoreOutOfRange { field: &'static str, value: u8 },
    #[error("{field} must be strictly ascending")]
    NotAscending { field: &'static str },
    #[error(
        "phase thresholds out of order: investigation {investigation}, revelation {revelation}, completion {completion}"
    )]
    PhaseOrder {
        investigation: u8,
        revelation: u8,
        completion: u8,
    },
    #[error("{field} window {window:?} uses hours outside 0-23")]
    MalformedWindow {
        field: &'static str,
        window: HourWindow,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() {
        let config = HotelConfig::from_json("{}").unwrap();
        assert_eq!(config, HotelConfig::default());
        assert_eq!(config.notification_display_secs, 5);
        assert!(config.unlock_mode.is_reactive());
        assert_eq!(config.puzzle_thresholds, vec![50, 75, 90, 100]);
    }

    #[test]
    fn polling_mode_parses_with_default_interval() {
        let config = HotelConfig::from_json(r#"{"unlock_mode": {"mode": "polling"}}"#).unwrap();
        assert_eq!(config.unlock_mode, UnlockMode::polling());
    }

    #[test]
    fn rejects_zero_durations() {
        let config = HotelConfig {
            notification_display_secs: 0,
            ..HotelConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(HotelConfigError::ZeroDuration {
                field: "notification_display_secs"
            })
        ));

        let config = HotelConfig {
            unlock_mode: UnlockMode::Polling { interval_secs: 0 },
            ..HotelConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unsorted_or_oversized_thresholds() {
        let config = HotelConfig {
            puzzle_thresholds: vec![75, 50],
            ..HotelConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(HotelConfigError::NotAscending {
                field: "puzzle_thresholds"
            })
        ));

        let config = HotelConfig {
            anomaly_bands: vec![20, 140],
            ..HotelConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(HotelConfigError::ScoreOutOfRange { value: 140, .. })
        ));
    }

    #[test]
    fn rejects_bad_night_elk_settings() {
        let mut config = HotelConfig::default();
        config.night_elk.sighting_chance = 1.5;
        assert!(matches!(
            config.validate(),
            Err(HotelConfigError::RangeViolation { .. })
        ));

        let mut config = HotelConfig::default();
        config.night_elk.night = HourWindow::new(22, 30);
        assert!(matches!(
            config.validate(),
            Err(HotelConfigError::MalformedWindow { .. })
        ));
    }

    #[test]
    fn rejects_phase_thresholds_out_of_order() {
        let err = HotelConfig::from_json(
            r#"{"phases": {"investigation": 95, "revelation": 90, "completion": 100}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, HotelConfigError::PhaseOrder { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            HotelConfig::from_json("{ nope"),
            Err(HotelConfigError::Parse(_))
        ));
    }
}
