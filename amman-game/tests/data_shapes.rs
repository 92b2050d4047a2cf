use std::collections::BTreeSet;

use amman_game::{
    DeferredKind, EventQueue, HotelConfig, HotelData, ProcedureEffect, Requirement, SimTime,
    WaterRule,
};
use serde_json::{Value, json};

fn bundled() -> HotelData {
    HotelData::from_json(include_str!("../assets/hotel.json")).unwrap()
}

#[test]
fn bundled_procedures_are_unique_and_parseable() {
    let data = bundled();
    let ids: BTreeSet<_> = data.procedures.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids.len(), data.procedures.len());

    let unrecognized: Vec<_> = data
        .procedures
        .iter()
        .filter(|p| p.requirements.iter().any(|r| !r.is_recognized()))
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(unrecognized, vec!["staff-only-memo"]);

    let unknown_effects = data
        .procedures
        .iter()
        .flat_map(|p| &p.effects)
        .filter(|effect| **effect == ProcedureEffect::Unrecognized)
        .count();
    assert_eq!(unknown_effects, 0);
}

#[test]
fn recognized_requirements_survive_compact_round_trip() {
    for procedure in &bundled().procedures {
        for requirement in procedure.requirements.iter().filter(|r| r.is_recognized()) {
            let text = requirement.to_string();
            let reparsed: Requirement = text.parse().unwrap();
            assert_eq!(&reparsed, requirement, "{} in {}", text, procedure.id);
        }
    }
}

#[test]
fn bundled_layout_is_consistent() {
    let data = bundled();
    for (name, area) in &data.hotel.areas {
        assert!(
            data.hotel.floors.contains_key(&area.floor),
            "{name} on undeclared floor {}",
            area.floor
        );
    }
    assert!(matches!(
        data.hotel.water.get(&7),
        Some(WaterRule::Static { available: false })
    ));
    assert_eq!(data.hotel.maintenance.len(), 1);
    assert_eq!(data, *HotelData::default_data());
}

#[test]
fn default_config_serializes_with_stable_keys() {
    let value = serde_json::to_value(HotelConfig::default()).unwrap();
    let Value::Object(map) = &value else {
        panic!("config should serialize to an object");
    };
    let keys: Vec<_> = map.keys().map(String::as_str).collect();
    let mut expected = vec![
        "anomaly_bands",
        "night_elk",
        "notification_display_secs",
        "phases",
        "puzzle_thresholds",
        "start_time",
        "unlock_mode",
    ];
    expected.sort_unstable();
    let mut keys = keys;
    keys.sort_unstable();
    assert_eq!(keys, expected);
    assert_eq!(value["unlock_mode"], json!({"mode": "reactive"}));
    assert_eq!(value["start_time"], "2024-03-14T18:00:00Z");

    let back: HotelConfig = serde_json::from_value(value).unwrap();
    assert_eq!(back, HotelConfig::default());
}

#[test]
fn deferred_events_serialize_flat() {
    let mut queue = EventQueue::new();
    queue.schedule(DeferredKind::UnlockSweep, SimTime(30), Value::Null);
    queue.schedule(
        DeferredKind::SetPlotFlag {
            name: "lobby-bell".into(),
        },
        SimTime(45),
        json!({"source": "test"}),
    );
    let events = serde_json::to_value(queue.pending()).unwrap();
    assert_eq!(
        events,
        json!([
            {"handle": 0, "kind": "unlock_sweep", "fire_at": 30},
            {"handle": 1, "kind": "set_plot_flag", "name": "lobby-bell", "fire_at": 45,
             "payload": {"source": "test"}}
        ])
    );
}
