//! The hotel's single source of truth.
//!
//! `GameState` is an explicit context object owned by the session and handed
//! to components by reference. Player discovery sets are insert-only; no API
//! removes a discovered secret or an unlocked rule.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::clock::{HourWindow, SimClock, SimTime};
use crate::data::PlayerProfile;
use crate::progress::ProgressState;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AvatarTier {
    #[default]
    Standard,
    Premium,
    Vip,
    Staff,
}

impl AvatarTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Premium => "premium",
            Self::Vip => "vip",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for AvatarTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvatarTier {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "premium" => Ok(Self::Premium),
            "vip" => Ok(Self::Vip),
            "staff" => Ok(Self::Staff),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule_id: String,
    pub at: SimTime,
    #[serde(default)]
    pub handled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub equipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    pub avatar_tier: AvatarTier,
    #[serde(default)]
    pub traits: BTreeMap<String, i32>,
    #[serde(default)]
    pub current_room: Option<String>,
    #[serde(default)]
    pub current_floor: i32,
    #[serde(default)]
    pub completed_tasks: Vec<String>,
    #[serde(default)]
    unlocked_rules: BTreeSet<String>,
    #[serde(default)]
    discovered_secrets: BTreeSet<String>,
    #[serde(default)]
    pub discovered_clues: BTreeSet<String>,
    #[serde(default)]
    pub special_skills: BTreeSet<String>,
    #[serde(default)]
    pub violations: Vec<RuleViolation>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
}

impl PlayerState {
    /// Fresh guest built from a starting profile; progress sets start empty.
    #[must_use]
    pub fn from_profile(profile: &PlayerProfile) -> Self {
        Self {
            name: profile.name.clone(),
            avatar_tier: profile.avatar_tier,
            traits: profile.traits.clone(),
            current_floor: profile.current_floor,
            special_skills: profile.special_skills.clone(),
            inventory: profile.inventory.clone(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn unlocked_rules(&self) -> &BTreeSet<String> {
        &self.unlocked_rules
    }

    #[must_use]
    pub const fn discovered_secrets(&self) -> &BTreeSet<String> {
        &self.discovered_secrets
    }

    /// Returns `true` when the rule was not unlocked before.
    pub fn unlock_rule(&mut self, rule_id: impl Into<String>) -> bool {
        self.unlocked_rules.insert(rule_id.into())
    }

    /// Returns `true` when the secret was not discovered before.
    pub fn discover_secret(&mut self, secret_id: impl Into<String>) -> bool {
        self.discovered_secrets.insert(secret_id.into())
    }

    /// Records a completed task once; repeat completions are ignored.
    pub fn complete_task(&mut self, task_id: impl Into<String>) -> bool {
        let task_id = task_id.into();
        if self.completed_tasks.contains(&task_id) {
            return false;
        }
        self.completed_tasks.push(task_id);
        true
    }

    #[must_use]
    pub fn violation_count(&self) -> u32 {
        u32::try_from(self.violations.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn item(&self, item_id: &str) -> Option<&InventoryItem> {
        self.inventory.iter().find(|item| item.id == item_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Area {
    pub floor: i32,
    #[serde(default = "default_true")]
    pub accessible: bool,
    #[serde(default)]
    pub size: u32,
}

/// Whether a floor has running water.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum WaterRule {
    Static { available: bool },
    Hours(HourWindow),
}

impl WaterRule {
    #[must_use]
    pub const fn available_at(self, hour: u32) -> bool {
        match self {
            Self::Static { available } => available,
            Self::Hours(window) => window.contains(hour),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HotelState {
    #[serde(default)]
    pub clock: SimClock,
    #[serde(default)]
    pub floors: BTreeMap<i32, bool>,
    #[serde(default)]
    pub areas: BTreeMap<String, Area>,
    #[serde(default)]
    pub water: BTreeMap<i32, WaterRule>,
    #[serde(default)]
    pub maintenance: Vec<HourWindow>,
    #[serde(default)]
    pub front_desk_present: bool,
}

impl HotelState {
    /// Unknown floors are treated as inaccessible.
    #[must_use]
    pub fn floor_accessible(&self, floor: i32) -> bool {
        self.floors.get(&floor).copied().unwrap_or(false)
    }

    /// Floors without a water rule have water around the clock.
    #[must_use]
    pub fn water_available(&self, floor: i32) -> bool {
        self.water
            .get(&floor)
            .is_none_or(|rule| rule.available_at(self.clock.hour_of_day()))
    }

    #[must_use]
    pub fn maintenance_active(&self) -> bool {
        let hour = self.clock.hour_of_day();
        self.maintenance.iter().any(|window| window.contains(hour))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameState {
    pub player: PlayerState,
    pub hotel: HotelState,
    #[serde(default)]
    pub progress: ProgressState,
    #[serde(default)]
    pub plot_flags: BTreeSet<String>,
    #[serde(default)]
    pub night_elk_active: bool,
}

impl GameState {
    #[must_use]
    pub const fn now(&self) -> SimTime {
        self.hotel.clock.now()
    }

    #[must_use]
    pub fn has_plot_flag(&self, name: &str) -> bool {
        self.plot_flags.contains(name)
    }
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SECS_PER_HOUR;

    #[test]
    fn discovery_sets_are_insert_only() {
        let mut player = PlayerState::default();
        assert!(player.discover_secret("ledger"));
        assert!(!player.discover_secret("ledger"));
        assert!(player.unlock_rule("rule-7"));
        assert!(!player.unlock_rule("rule-7"));
        assert_eq!(player.discovered_secrets().len(), 1);
        assert_eq!(player.unlocked_rules().len(), 1);
    }

    #[test]
    fn tasks_complete_once_in_order() {
        let mut player = PlayerState::default();
        assert!(player.complete_task("check-in"));
        assert!(player.complete_task("find-key"));
        assert!(!player.complete_task("check-in"));
        assert_eq!(player.completed_tasks, vec!["check-in", "find-key"]);
    }

    #[test]
    fn water_follows_time_of_day() {
        let mut hotel = HotelState::default();
        hotel.water.insert(3, WaterRule::Hours(HourWindow::new(6, 22)));
        hotel.water.insert(4, WaterRule::Static { available: false });

        // Clock starts at 18:00.
        assert!(hotel.water_available(3));
        assert!(!hotel.water_available(4));
        assert!(hotel.water_available(1));

        hotel.clock.advance(5 * SECS_PER_HOUR);
        assert!(!hotel.water_available(3));
    }

    #[test]
    fn maintenance_and_floor_access() {
        let mut hotel = HotelState::default();
        hotel.floors.insert(1, true);
        hotel.floors.insert(13, false);
        hotel.maintenance.push(HourWindow::new(2, 4));

        assert!(hotel.floor_accessible(1));
        assert!(!hotel.floor_accessible(13));
        assert!(!hotel.floor_accessible(99));
        assert!(!hotel.maintenance_active());

        hotel.clock.advance(8 * SECS_PER_HOUR + 30 * 60);
        assert!(hotel.maintenance_active());
    }

    #[test]
    fn water_rule_serializes_with_tag() {
        let rule = WaterRule::Hours(HourWindow::new(6, 22));
        let json = serde_json::to_value(rule).unwrap();
        assert_eq!(json["rule"], "hours");
        assert_eq!(json["from_hour"], 6);
        let parsed: WaterRule =
            serde_json::from_str(r#"{"rule":"static","available":true}"#).unwrap();
        assert_eq!(parsed, WaterRule::Static { available: true });
    }

    #[test]
    fn avatar_tier_parses() {
        assert_eq!("vip".parse::<AvatarTier>(), Ok(AvatarTier::Vip));
        assert!("platinum".parse::<AvatarTier>().is_err());
    }

    #[test]
    fn profile_seeds_player_with_empty_progress_sets() {
        let profile = PlayerProfile {
            name: "Rania".into(),
            avatar_tier: AvatarTier::Premium,
            current_floor: 3,
            special_skills: BTreeSet::from(["lockpicking".to_string()]),
            inventory: vec![InventoryItem {
                id: "room-key-314".into(),
                kind: "key".into(),
                equipped: false,
            }],
            ..PlayerProfile::default()
        };
        let player = PlayerState::from_profile(&profile);
        assert_eq!(player.name, "Rania");
        assert_eq!(player.current_floor, 3);
        assert!(player.special_skills.contains("lockpicking"));
        assert!(player.item("room-key-314").is_some());
        assert!(player.unlocked_rules().is_empty());
        assert!(player.discovered_secrets().is_empty());
        assert_eq!(player.current_room, None);
    }
}
