use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

use amman_game::constants::SECS_PER_HOUR;
use amman_game::{
    AvatarTier, HotelConfig, HotelData, HotelEngine, HotelSession, NotificationKind,
    ProcedureStatus, PuzzlePhase, StaticLoader, UnlockMode,
};

/// End-of-run snapshot reported for each passing iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaySummary {
    pub puzzle_progress: u8,
    pub anomaly_level: u8,
    pub phase: PuzzlePhase,
    pub notifications: usize,
    pub unlocked: usize,
}

impl StaySummary {
    fn of(session: &HotelSession) -> Self {
        let progress = &session.state().progress;
        Self {
            puzzle_progress: progress.puzzle_progress(),
            anomaly_level: progress.anomaly_level(),
            phase: progress.phase(),
            notifications: session.notifications().history().len(),
            unlocked: session.unlocked_procedures().len(),
        }
    }
}

pub type ScenarioFn = fn(u64) -> Result<StaySummary>;

#[derive(Clone, Copy)]
pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    pub run: ScenarioFn,
}

const CATALOG: &[Scenario] = &[
    Scenario {
        key: "smoke",
        description: "Check in and confirm the lobby procedure unlocks",
        run: smoke,
    },
    Scenario {
        key: "unlock-cascade",
        description: "Clues, rules and anomaly unlock procedures reactively",
        run: unlock_cascade,
    },
    Scenario {
        key: "progress-phases",
        description: "Thresholds fire once and phases only move forward",
        run: progress_phases,
    },
    Scenario {
        key: "notifications",
        description: "Notifications expire from view but stay in history",
        run: notifications,
    },
    Scenario {
        key: "polling-unlocks",
        description: "Polling sweeps reach the same unlocks as reactive mode",
        run: polling_unlocks,
    },
    Scenario {
        key: "night-watch",
        description: "A certain Night Elk sighting comes and goes overnight",
        run: night_watch,
    },
    Scenario {
        key: "full-stay",
        description: "Walk the bundled hotel from check-in to completion",
        run: full_stay,
    },
];

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    CATALOG
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

pub fn scenario_keys() -> Vec<String> {
    CATALOG
        .iter()
        .map(|scenario| scenario.key.to_string())
        .collect()
}

pub fn get_scenario(key: &str) -> Option<Scenario> {
    CATALOG.iter().copied().find(|scenario| scenario.key == key)
}

fn bundled_session(seed: u64, config: HotelConfig) -> Result<HotelSession> {
    HotelSession::new(seed, HotelData::default_data(), config)
        .context("bundled hotel rejected the config")
}

fn expect_status(session: &HotelSession, id: &str, status: ProcedureStatus) -> Result<()> {
    let actual = session
        .status(id)
        .ok_or_else(|| anyhow!("procedure `{id}` missing from the catalog"))?;
    ensure!(
        actual == status,
        "procedure `{id}` is {actual}, expected {status}"
    );
    Ok(())
}

fn smoke(seed: u64) -> Result<StaySummary> {
    let mut session = HotelEngine::new(StaticLoader)
        .create_session(seed)
        .context("creating session")?;
    session.check_in("Smoke Test")?;
    ensure!(
        session.state().player.name == "Smoke Test",
        "check-in did not record the guest name"
    );
    expect_status(&session, "front-desk-etiquette", ProcedureStatus::Unlocked)?;
    ensure!(
        session.unread_count() > 0,
        "check-in produced no notifications"
    );
    Ok(StaySummary::of(&session))
}

fn unlock_cascade(seed: u64) -> Result<StaySummary> {
    let mut session = bundled_session(seed, HotelConfig::default())?;
    expect_status(&session, "elevator-protocol", ProcedureStatus::Locked)?;
    session.discover_clue("elevator-chime")?;
    expect_status(&session, "elevator-protocol", ProcedureStatus::Unlocked)?;

    session.add_anomaly_level(25);
    expect_status(&session, "quiet-hours", ProcedureStatus::Locked)?;
    session.activate_procedure("front-desk-etiquette")?;
    expect_status(&session, "quiet-hours", ProcedureStatus::Unlocked)?;

    session.activate_procedure("quiet-hours")?;
    ensure!(
        session.state().has_plot_flag("quiet-hours-observed"),
        "quiet hours did not raise its plot flag"
    );
    ensure!(
        session.activate_procedure("quiet-hours").is_err(),
        "activation is not one-shot"
    );
    expect_status(&session, "staff-only-memo", ProcedureStatus::Locked)?;
    Ok(StaySummary::of(&session))
}

fn progress_phases(seed: u64) -> Result<StaySummary> {
    let mut session = HotelSession::new(seed, &HotelData::empty(), HotelConfig::default())?;
    let report = session.add_puzzle_progress(55);
    ensure!(
        report.thresholds_crossed.as_slice() == [50],
        "expected threshold 50, got {:?}",
        report.thresholds_crossed
    );
    ensure!(
        session.state().progress.phase() == PuzzlePhase::Investigation,
        "55 progress should be investigation"
    );

    session.add_puzzle_progress(-55);
    let report = session.add_puzzle_progress(55);
    ensure!(report.thresholds_crossed.is_empty(), "threshold 50 fired twice");

    let report = session.add_puzzle_progress(1_000);
    ensure!(report.current == 100, "progress escaped its range");
    ensure!(
        session.state().progress.phase() == PuzzlePhase::Completion,
        "full progress should complete the puzzle"
    );
    session.add_puzzle_progress(-100);
    ensure!(
        session.state().progress.phase() == PuzzlePhase::Completion,
        "phase moved backwards"
    );
    Ok(StaySummary::of(&session))
}

fn notifications(seed: u64) -> Result<StaySummary> {
    let mut session = HotelSession::new(seed, &HotelData::empty(), HotelConfig::default())?;
    let id = session.notify(NotificationKind::Success, "qa.notice", "hello");
    ensure!(
        session.visible_notifications().len() == 1,
        "notification not shown"
    );
    session.advance_clock(session.config().notification_display_secs - 1);
    ensure!(
        session.visible_notifications().len() == 1,
        "notification expired early"
    );
    session.advance_clock(1);
    ensure!(
        session.visible_notifications().is_empty(),
        "notification never expired"
    );
    ensure!(session.mark_read(id), "expired notification lost from history");
    ensure!(session.unread_count() == 0, "unread count ignored mark_read");
    Ok(StaySummary::of(&session))
}

fn polling_unlocks(seed: u64) -> Result<StaySummary> {
    let config = HotelConfig {
        unlock_mode: UnlockMode::polling(),
        ..HotelConfig::default()
    };
    let interval = config.unlock_mode.interval_secs().unwrap_or_default();
    let mut session = bundled_session(seed, config)?;
    session.set_avatar_tier(AvatarTier::Vip);
    expect_status(&session, "vip-lounge", ProcedureStatus::Locked)?;
    session.advance_clock(interval);
    expect_status(&session, "vip-lounge", ProcedureStatus::Unlocked)?;
    Ok(StaySummary::of(&session))
}

fn night_watch(seed: u64) -> Result<StaySummary> {
    let mut config = HotelConfig::default();
    config.night_elk.sighting_chance = 1.0;
    let sighting_secs = config.night_elk.sighting_secs;
    let mut session = bundled_session(seed, config)?;
    session.add_anomaly_level(60);

    // 18:00 start; the night window opens four hours in.
    session.advance_clock(4 * SECS_PER_HOUR);
    ensure!(session.state().night_elk_active, "no sighting at 22:00");
    session.advance_clock(sighting_secs);
    ensure!(!session.state().night_elk_active, "the elk never left");
    Ok(StaySummary::of(&session))
}

fn full_stay(seed: u64) -> Result<StaySummary> {
    let mut config = HotelConfig::default();
    config.night_elk.sighting_chance = 1.0;
    let mut session = bundled_session(seed, config)?;
    session.check_in("Full Stay")?;
    session.activate_procedure("front-desk-etiquette")?;
    session.discover_clue("elevator-chime")?;
    session.activate_procedure("elevator-protocol")?;
    session.add_anomaly_level(25);
    session.activate_procedure("quiet-hours")?;
    session.record_violation("no-running")?;
    session.discover_clue("fogged-mirror")?;
    session.activate_procedure("mirror-etiquette")?;
    session.advance_clock(10);
    session.record_violation("mirror-answered")?;
    session.activate_procedure("floor-13-access")?;
    session.move_to_floor(13)?;
    session.add_anomaly_level(10);
    session.advance_clock(4 * SECS_PER_HOUR);
    session
        .activate_procedure("night-porter")
        .context("night porter after the sighting")?;
    session.learn_skill("lockpicking")?;
    session.add_puzzle_progress(5);
    session.activate_procedure("revelation-rite")?;

    let summary = StaySummary::of(&session);
    ensure!(
        summary.phase == PuzzlePhase::Completion,
        "stay ended in {}",
        summary.phase
    );
    ensure!(
        session.state().has_plot_flag("checkout-earned"),
        "checkout never earned"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_keys_are_unique() {
        let mut keys = scenario_keys();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn every_scenario_passes_for_a_fixed_seed() {
        for scenario in CATALOG {
            let result = (scenario.run)(1337);
            assert!(result.is_ok(), "{}: {result:?}", scenario.key);
        }
    }

    #[test]
    fn unknown_scenario_is_none() {
        assert!(get_scenario("smoke").is_some());
        assert!(get_scenario("browser-only").is_none());
    }
}
