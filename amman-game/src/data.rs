//! Hotel content: the starting guest, the building layout and the procedure
//! catalog, parsed from JSON and checked before a session sees it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use thiserror::Error;

use crate::clock::{HourWindow, SimClock};
use crate::config::HotelConfig;
use crate::procedures::{Procedure, ProcedureCatalog};
use crate::state::{Area, AvatarTier, GameState, HotelState, InventoryItem, PlayerState, WaterRule};

const BUNDLED_HOTEL_JSON: &str = include_str!("../assets/hotel.json");

/// Starting profile of the guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PlayerProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub avatar_tier: AvatarTier,
    #[serde(default)]
    pub traits: BTreeMap<String, i32>,
    #[serde(default)]
    pub current_floor: i32,
    #[serde(default)]
    pub special_skills: BTreeSet<String>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
}

/// Static building layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HotelLayout {
    #[serde(default)]
    pub floors: BTreeMap<i32, bool>,
    #[serde(default)]
    pub areas: BTreeMap<String, Area>,
    #[serde(default)]
    pub water: BTreeMap<i32, WaterRule>,
    #[serde(default)]
    pub maintenance: Vec<HourWindow>,
    #[serde(default = "default_front_desk")]
    pub front_desk_present: bool,
}

const fn default_front_desk() -> bool {
    true
}

/// Container for all hotel content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HotelData {
    #[serde(default)]
    pub player: PlayerProfile,
    #[serde(default)]
    pub hotel: HotelLayout,
    #[serde(default)]
    pub procedures: Vec<Procedure>,
}

impl HotelData {
    /// Create empty hotel data (useful for tests)
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load hotel data from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the content is inconsistent.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let data: Self = serde_json::from_str(json)?;
        data.validate()?;
        Ok(data)
    }

    /// Load the hotel bundled with the crate. Falls back to empty content
    /// when the bundled asset fails to load.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(BUNDLED_HOTEL_JSON).unwrap_or_else(|err| {
            log::warn!("bundled hotel content rejected: {err}");
            Self::empty()
        })
    }

    /// Shared, lazily parsed copy of the bundled hotel.
    #[must_use]
    pub fn default_data() -> &'static Self {
        static DATA: OnceLock<HotelData> = OnceLock::new();
        DATA.get_or_init(Self::load_from_static)
    }

    /// # Errors
    ///
    /// Returns `DataError` when procedure ids repeat or are blank, an area
    /// sits on an undeclared floor, or a layout window uses hours outside 0-23.
    pub fn validate(&self) -> Result<(), DataError> {
        if let Some(id) = self.catalog().duplicate_id() {
            return Err(DataError::DuplicateProcedure(id.to_string()));
        }
        if let Some(procedure) = self.procedures.iter().find(|p| p.id.trim().is_empty()) {
            return Err(DataError::BlankProcedureId {
                title: procedure.title.clone(),
            });
        }
        for (name, area) in &self.hotel.areas {
            if !self.hotel.floors.contains_key(&area.floor) {
                return Err(DataError::AreaOnUnknownFloor {
                    area: name.clone(),
                    floor: area.floor,
                });
            }
        }
        let malformed_water = self.hotel.water.values().find_map(|rule| match rule {
            WaterRule::Hours(window) if !window.is_well_formed() => Some(*window),
            _ => None,
        });
        let malformed = malformed_water.or_else(|| {
            self.hotel
                .maintenance
                .iter()
                .copied()
                .find(|window| !window.is_well_formed())
        });
        if let Some(window) = malformed {
            return Err(DataError::MalformedWindow(window));
        }
        Ok(())
    }

    #[must_use]
    pub fn catalog(&self) -> ProcedureCatalog {
        ProcedureCatalog::new(self.procedures.clone())
    }

    /// Build the initial store for a new session.
    #[must_use]
    pub fn initial_state(&self, config: &HotelConfig) -> GameState {
        let player = PlayerState::from_profile(&self.player);
        let hotel = HotelState {
            clock: SimClock::new(config.start_time),
            floors: self.hotel.floors.clone(),
            areas: self.hotel.areas.clone(),
            water: self.hotel.water.clone(),
            maintenance: self.hotel.maintenance.clone(),
            front_desk_present: self.hotel.front_desk_present,
        };
        GameState {
            player,
            hotel,
            ..GameState::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to parse hotel content: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("procedure id `{0}` is defined more than once")]
    DuplicateProcedure(String),
    #[error("procedure `{title}` has a blank id")]
    BlankProcedureId { title: String },
    #[error("area `{area}` sits on unknown floor {floor}")]
    AreaOnUnknownFloor { area: String, floor: i32 },
    #[error("window {0:?} uses hours outside 0-23")]
    MalformedWindow(HourWindow),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::Requirement;

    #[test]
    fn test_hotel_data_from_json() {
        let json = r#"{
            "player": {"name": "Test Guest", "avatar_tier": "premium", "current_floor": 1},
            "hotel": {
                "floors": {"1": true, "13": false},
                "areas": {"lobby": {"floor": 1, "size": 40}},
                "water": {"1": {"rule": "hours", "from_hour": 6, "until_hour": 23}}
            },
            "procedures": [
                {
                    "id": "quiet-hours",
                    "title": "Quiet Hours",
                    "requirements": ["plotFlag(lobby-bell)", {"kind": "night_elk_active"}]
                }
            ]
        }"#;

        let data = HotelData::from_json(json).unwrap();
        assert_eq!(data.player.avatar_tier, AvatarTier::Premium);
        assert!(data.hotel.front_desk_present);
        assert_eq!(data.procedures[0].requirements[1], Requirement::NightElkActive);

        let state = data.initial_state(&HotelConfig::default());
        assert_eq!(state.player.name, "Test Guest");
        assert!(state.hotel.floor_accessible(1));
        assert!(!state.hotel.floor_accessible(13));
    }

    #[test]
    fn duplicate_procedures_are_rejected() {
        let json = r#"{"procedures": [
            {"id": "a", "title": "A"},
            {"id": "a", "title": "Again"}
        ]}"#;
        assert!(matches!(
            HotelData::from_json(json),
            Err(DataError::DuplicateProcedure(id)) if id == "a"
        ));
    }

    #[test]
    fn areas_must_sit_on_known_floors() {
        let json = r#"{"hotel": {"floors": {"1": true}, "areas": {"roof": {"floor": 9}}}}"#;
        assert!(matches!(
            HotelData::from_json(json),
            Err(DataError::AreaOnUnknownFloor { floor: 9, .. })
        ));
    }

    #[test]
    fn bundled_data_loads() {
        let data = HotelData::default_data();
        assert!(!data.procedures.is_empty());
        assert!(data.validate().is_ok());
    }
}
