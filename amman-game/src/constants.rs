//! Centralized tuning constants for the Amman Hotel engine.
//!
//! Defaults for `HotelConfig` live here so the numbers the game ships with
//! are reviewed in one place. Content (procedure text, floor layout) comes
//! from JSON assets instead.

// Notification keys --------------------------------------------------------
// Engine-generated notifications carry presentation keys as titles; the
// rendering layer maps them to localized text.
pub(crate) const NOTIFY_PROCEDURE_UNLOCKED: &str = "notify.procedure.unlocked";
pub(crate) const NOTIFY_PROCEDURE_ACTIVATED: &str = "notify.procedure.activated";
pub(crate) const NOTIFY_PROGRESS_MILESTONE: &str = "notify.progress.milestone";
pub(crate) const NOTIFY_PHASE_PREFIX: &str = "notify.phase.";
pub(crate) const NOTIFY_ANOMALY_BAND_PREFIX: &str = "notify.anomaly.";
pub(crate) const NOTIFY_CLUE_DISCOVERED: &str = "notify.clue.discovered";
pub(crate) const NOTIFY_SECRET_DISCOVERED: &str = "notify.secret.discovered";
pub(crate) const NOTIFY_RULE_UNLOCKED: &str = "notify.rule.unlocked";
pub(crate) const NOTIFY_RULE_VIOLATION: &str = "notify.rule.violation";
pub(crate) const NOTIFY_CHECKED_IN: &str = "notify.reservation.checked-in";
pub(crate) const NOTIFY_FLOOR_ARRIVED: &str = "notify.elevator.arrived";
pub(crate) const NOTIFY_ACTION_REJECTED: &str = "notify.action.rejected";
pub(crate) const NOTIFY_NIGHT_ELK_SIGHTED: &str = "notify.night-elk.sighted";
pub(crate) const NOTIFY_NIGHT_ELK_DEPARTED: &str = "notify.night-elk.departed";
pub(crate) const NOTIFY_FRONT_DESK_RETURNED: &str = "notify.front-desk.returned";
pub(crate) const NOTIFY_MAINTENANCE_STARTED: &str = "notify.maintenance.started";
pub(crate) const NOTIFY_MAINTENANCE_ENDED: &str = "notify.maintenance.ended";

// Score bounds -------------------------------------------------------------
pub const SCORE_MIN: u8 = 0;
pub const SCORE_MAX: u8 = 100;

// Timing -------------------------------------------------------------------
pub const NOTIFICATION_DISPLAY_SECS: u64 = 5;
pub const UNLOCK_POLL_INTERVAL_SECS: u64 = 30;
pub const SECS_PER_HOUR: u64 = 3_600;
/// 2024-03-14 18:00:00 UTC, the evening the guest arrives.
pub const DEFAULT_START_TIMESTAMP: i64 = 1_710_439_200;

// Progress -----------------------------------------------------------------
pub const PUZZLE_THRESHOLDS: [u8; 4] = [50, 75, 90, 100];
pub const ANOMALY_BANDS: [u8; 4] = [20, 40, 60, 80];
pub const INVESTIGATION_THRESHOLD: u8 = 50;
pub const REVELATION_THRESHOLD: u8 = 90;
pub const COMPLETION_THRESHOLD: u8 = 100;

// Night Elk ----------------------------------------------------------------
pub const NIGHT_ELK_SIGHTING_CHANCE: f32 = 0.25;
pub const NIGHT_ELK_MIN_ANOMALY: u8 = 40;
pub const NIGHT_ELK_NIGHT_START_HOUR: u32 = 22;
pub const NIGHT_ELK_NIGHT_END_HOUR: u32 = 5;
pub const NIGHT_ELK_SIGHTING_SECS: u64 = 900;
pub const NIGHT_ELK_ANOMALY_BUMP: i32 = 5;
