//! A single hotel stay: the store plus every component wired around it.
//!
//! `HotelSession` is the surface a rendering layer talks to. Player actions
//! mutate the store through here so unlocks are re-evaluated after every
//! change, and time only moves through [`HotelSession::advance_clock`].

use chrono::Timelike;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::clock::SimTime;
use crate::config::{HotelConfig, HotelConfigError, UnlockMode};
use crate::constants::{
    NOTIFY_ACTION_REJECTED, NOTIFY_ANOMALY_BAND_PREFIX, NOTIFY_CHECKED_IN, NOTIFY_CLUE_DISCOVERED,
    NOTIFY_FLOOR_ARRIVED, NOTIFY_FRONT_DESK_RETURNED, NOTIFY_MAINTENANCE_ENDED,
    NOTIFY_MAINTENANCE_STARTED, NOTIFY_NIGHT_ELK_DEPARTED, NOTIFY_NIGHT_ELK_SIGHTED,
    NOTIFY_PHASE_PREFIX, NOTIFY_PROCEDURE_ACTIVATED, NOTIFY_PROCEDURE_UNLOCKED,
    NOTIFY_PROGRESS_MILESTONE, NOTIFY_RULE_UNLOCKED, NOTIFY_RULE_VIOLATION,
    NOTIFY_SECRET_DISCOVERED, SECS_PER_HOUR,
};
use crate::data::HotelData;
use crate::events::{DeferredEvent, DeferredKind, EventHandle, EventQueue};
use crate::night_elk;
use crate::notify::{
    Notification, NotificationId, NotificationKind, NotificationSink, Notifier, NullSink,
};
use crate::procedures::{Procedure, ProcedureEffect, ProcedureStatus, RevealStep};
use crate::progress::{AnomalyBand, AnomalyChange, PhaseTransitions, ProgressReport, PuzzlePhase};
use crate::requirements::RequirementCheck;
use crate::state::{AvatarTier, GameState, InventoryItem, RuleViolation};
use crate::unlock::UnlockEvaluator;

/// Player action refused by the session. The store is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("unknown procedure `{0}`")]
    UnknownProcedure(String),
    #[error("procedure `{0}` is still locked")]
    ProcedureLocked(String),
    #[error("procedure `{0}` is already active")]
    AlreadyActive(String),
    #[error("floor {0} is not accessible")]
    FloorInaccessible(i32),
    #[error("unknown area `{0}`")]
    UnknownArea(String),
    #[error("area `{0}` is closed")]
    AreaInaccessible(String),
    #[error("area `{area}` is on floor {floor}, not floor {current}")]
    WrongFloor { area: String, floor: i32, current: i32 },
    #[error("no inventory item `{0}`")]
    UnknownItem(String),
    #[error("no rule violation #{0}")]
    UnknownViolation(usize),
    #[error("{0} must not be blank")]
    BlankInput(&'static str),
}

pub struct HotelSession {
    seed: u64,
    config: HotelConfig,
    state: GameState,
    unlocks: UnlockEvaluator,
    notifier: Notifier,
    queue: EventQueue,
    rng: ChaCha20Rng,
    sink: Box<dyn NotificationSink>,
    poll_handle: Option<EventHandle>,
    maintenance_end: Option<EventHandle>,
}

impl fmt::Debug for HotelSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotelSession")
            .field("seed", &self.seed)
            .field("now", &self.state.now())
            .field("state", &self.state)
            .field("unlocks", &self.unlocks)
            .field("pending_events", &self.queue.pending().len())
            .field("notifications", &self.notifier.history().len())
            .finish_non_exhaustive()
    }
}

impl HotelSession {
    /// Start a stay with headless notifications.
    ///
    /// # Errors
    ///
    /// Returns `HotelConfigError` when the config fails validation.
    pub fn new(
        seed: u64,
        data: &HotelData,
        config: HotelConfig,
    ) -> Result<Self, HotelConfigError> {
        Self::with_sink(seed, data, config, Box::new(NullSink))
    }

    /// Start a stay that reports notifications to `sink`.
    ///
    /// # Errors
    ///
    /// Returns `HotelConfigError` when the config fails validation.
    pub fn with_sink(
        seed: u64,
        data: &HotelData,
        config: HotelConfig,
        sink: Box<dyn NotificationSink>,
    ) -> Result<Self, HotelConfigError> {
        config.validate()?;
        let state = data.initial_state(&config);
        let mut session = Self {
            seed,
            state,
            unlocks: UnlockEvaluator::new(data.catalog()),
            notifier: Notifier::new(),
            queue: EventQueue::new(),
            rng: ChaCha20Rng::seed_from_u64(seed),
            sink,
            poll_handle: None,
            maintenance_end: None,
            config,
        };
        if session.state.hotel.maintenance_active() {
            session.schedule_maintenance_end();
        }
        match session.config.unlock_mode {
            UnlockMode::Reactive => {
                session.refresh_unlocks();
            }
            UnlockMode::Polling { .. } => session.arm_unlock_poll(),
        }
        log::debug!("session seeded with {seed}");
        Ok(session)
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn config(&self) -> &HotelConfig {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub const fn now(&self) -> SimTime {
        self.state.now()
    }

    #[must_use]
    pub const fn notifications(&self) -> &Notifier {
        &self.notifier
    }

    #[must_use]
    pub const fn events(&self) -> &EventQueue {
        &self.queue
    }

    #[must_use]
    pub const fn unlocks(&self) -> &UnlockEvaluator {
        &self.unlocks
    }

    // Notifications ---------------------------------------------------------

    /// Show a notification and schedule its expiry.
    pub fn notify(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> NotificationId {
        let now = self.state.now();
        let notification = self.notifier.push(kind, title, message, now);
        log::debug!(
            "notify [{}] {} at {now}",
            notification.kind,
            notification.title
        );
        self.sink.on_notification(notification);
        let id = notification.id;
        self.queue.schedule_after(
            DeferredKind::ExpireNotification { id },
            now,
            self.config.notification_display_secs,
            Value::Null,
        );
        id
    }

    pub fn mark_read(&mut self, id: NotificationId) -> bool {
        self.notifier.mark_read(id)
    }

    pub fn mark_all_read(&mut self) -> usize {
        self.notifier.mark_all_read()
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.notifier.unread_count()
    }

    #[must_use]
    pub fn visible_notifications(&self) -> Vec<&Notification> {
        self.notifier.visible().collect()
    }

    // Unlocks ---------------------------------------------------------------

    #[must_use]
    pub fn evaluate(&self, procedure_id: &str) -> bool {
        self.unlocks.evaluate(procedure_id, &self.state)
    }

    #[must_use]
    pub fn explain(&self, procedure_id: &str) -> Option<RequirementCheck> {
        self.unlocks.explain(procedure_id, &self.state)
    }

    #[must_use]
    pub fn status(&self, procedure_id: &str) -> Option<ProcedureStatus> {
        self.unlocks.status(procedure_id)
    }

    #[must_use]
    pub fn unlocked_procedures(&self) -> Vec<&Procedure> {
        self.unlocks.available().collect()
    }

    pub fn try_unlock(&mut self, procedure_id: &str) -> bool {
        if !self.unlocks.try_unlock(procedure_id, &self.state) {
            return false;
        }
        self.announce_unlock(procedure_id);
        true
    }

    /// Unlock every locked procedure whose requirements now hold.
    pub fn refresh_unlocks(&mut self) -> Vec<String> {
        let unlocked = self.unlocks.sweep(&self.state);
        for id in &unlocked {
            self.announce_unlock(id);
        }
        unlocked
    }

    fn announce_unlock(&mut self, procedure_id: &str) {
        let title = self
            .unlocks
            .catalog()
            .get(procedure_id)
            .map_or_else(|| procedure_id.to_string(), |p| p.title.clone());
        self.notify(NotificationKind::Success, NOTIFY_PROCEDURE_UNLOCKED, title);
    }

    /// Activate an unlocked procedure and apply its effects in order.
    ///
    /// # Errors
    ///
    /// Returns `ActionError` when the procedure is unknown, locked, or
    /// already active.
    pub fn activate_procedure(&mut self, procedure_id: &str) -> Result<(), ActionError> {
        let effects = match self.unlocks.activate(procedure_id) {
            Ok(effects) => effects,
            Err(err) => return self.reject(err),
        };
        let title = self
            .unlocks
            .catalog()
            .get(procedure_id)
            .map_or_else(String::new, |p| p.title.clone());
        self.notify(NotificationKind::Success, NOTIFY_PROCEDURE_ACTIVATED, title);
        for effect in effects {
            self.apply_effect(effect);
        }
        self.after_mutation();
        Ok(())
    }

    fn apply_effect(&mut self, effect: ProcedureEffect) {
        match effect {
            ProcedureEffect::AddPuzzleProgress { amount } => {
                self.add_puzzle_progress(amount);
            }
            ProcedureEffect::AddAnomaly { amount } => {
                self.add_anomaly_level(amount);
            }
            ProcedureEffect::SetPlotFlag { name } => {
                self.state.plot_flags.insert(name);
            }
            ProcedureEffect::UnlockRule { id } => self.record_rule(id),
            ProcedureEffect::DiscoverSecret { id } => self.record_secret(id),
            ProcedureEffect::DiscoverClue { id } => self.record_clue(id),
            ProcedureEffect::OpenFloor { floor } => {
                self.state.hotel.floors.insert(floor, true);
                log::info!("floor {floor} opened");
            }
            ProcedureEffect::Notify {
                kind,
                title,
                message,
            } => {
                self.notify(kind, title, message);
            }
            ProcedureEffect::ScheduleReveal { sequence, stages } => {
                self.schedule_reveal(&sequence, &stages);
            }
            ProcedureEffect::Unrecognized => {
                log::warn!("skipping unrecognized procedure effect");
            }
        }
    }

    fn after_mutation(&mut self) {
        if self.config.unlock_mode.is_reactive() {
            self.refresh_unlocks();
        }
    }

    fn reject<T>(&mut self, err: ActionError) -> Result<T, ActionError> {
        log::debug!("action rejected: {err}");
        self.notify(
            NotificationKind::Warning,
            NOTIFY_ACTION_REJECTED,
            err.to_string(),
        );
        Err(err)
    }

    fn require_text(&mut self, field: &'static str, value: &str) -> Result<(), ActionError> {
        if value.trim().is_empty() {
            return self.reject(ActionError::BlankInput(field));
        }
        Ok(())
    }

    // Progress --------------------------------------------------------------

    pub fn add_puzzle_progress(&mut self, delta: i32) -> ProgressReport {
        let report = self.state.progress.add_puzzle_progress(
            delta,
            &self.config.puzzle_thresholds,
            &self.config.phases,
        );
        for threshold in report.thresholds_crossed.clone() {
            self.notify(
                NotificationKind::Success,
                NOTIFY_PROGRESS_MILESTONE,
                threshold.to_string(),
            );
        }
        self.announce_transitions(&report.transitions);
        self.after_mutation();
        report
    }

    /// Adjust the anomaly level. Each band is announced the first time it
    /// is reached and never again.
    pub fn add_anomaly_level(&mut self, delta: i32) -> AnomalyChange {
        let change = self
            .state
            .progress
            .add_anomaly_level(delta, &self.config.anomaly_bands);
        for floor in change.bands_entered.clone() {
            let band = AnomalyBand::from_level(floor, &self.config.anomaly_bands);
            self.notify(
                NotificationKind::Warning,
                format!("{NOTIFY_ANOMALY_BAND_PREFIX}{band}"),
                "",
            );
        }
        self.after_mutation();
        change
    }

    /// Move the puzzle forward to `phase`, e.g. when a key clue is solved.
    pub fn advance_phase_to(&mut self, phase: PuzzlePhase) -> PhaseTransitions {
        let transitions = self.state.progress.advance_phase_to(phase);
        self.announce_transitions(&transitions);
        self.after_mutation();
        transitions
    }

    fn announce_transitions(&mut self, transitions: &PhaseTransitions) {
        for transition in transitions {
            log::info!("puzzle phase {} -> {}", transition.from, transition.to);
            self.notify(
                NotificationKind::Info,
                format!("{NOTIFY_PHASE_PREFIX}{}", transition.to),
                "",
            );
        }
    }

    #[must_use]
    pub fn anomaly_band(&self) -> AnomalyBand {
        AnomalyBand::from_level(
            self.state.progress.anomaly_level(),
            &self.config.anomaly_bands,
        )
    }

    // Deferred events -------------------------------------------------------

    pub fn schedule(&mut self, kind: DeferredKind, delay_secs: u64, payload: Value) -> EventHandle {
        self.queue
            .schedule_after(kind, self.state.now(), delay_secs, payload)
    }

    pub fn cancel_event(&mut self, handle: EventHandle) -> bool {
        if self.poll_handle == Some(handle) {
            self.poll_handle = None;
        }
        if self.maintenance_end == Some(handle) {
            self.maintenance_end = None;
        }
        self.queue.cancel(handle)
    }

    /// Cancel pending deferred work, returning how many events were dropped.
    ///
    /// Notification expiry survives the reset. Events that restore hotel
    /// state (the elk leaving, the clerk returning, maintenance ending) are
    /// resolved on the spot so no flag is left stuck. Polling sessions keep
    /// polling.
    pub fn reset_events(&mut self) -> usize {
        let pending = self.queue.pending().to_vec();
        self.queue.clear();
        self.poll_handle = None;
        self.maintenance_end = None;

        let mut dropped = 0;
        for event in pending {
            match event.kind {
                DeferredKind::ExpireNotification { .. } => {
                    self.queue.schedule(event.kind, event.fire_at, event.payload);
                }
                DeferredKind::NightElkDeparts
                | DeferredKind::FrontDeskReturns
                | DeferredKind::MaintenanceEnds => self.dispatch(event),
                _ => dropped += 1,
            }
        }
        if matches!(self.config.unlock_mode, UnlockMode::Polling { .. }) {
            self.arm_unlock_poll();
        }
        log::debug!("cancelled {dropped} pending events");
        dropped
    }

    /// Queue a staged reveal; each step's delay counts from the previous one.
    pub fn schedule_reveal(&mut self, sequence: &str, stages: &[RevealStep]) -> Vec<EventHandle> {
        let mut delay = 0_u64;
        let mut handles = Vec::with_capacity(stages.len());
        for (stage, step) in (0_u32..).zip(stages) {
            delay = delay.saturating_add(step.delay_secs);
            handles.push(self.schedule(
                DeferredKind::RevealStage {
                    sequence: sequence.to_string(),
                    stage,
                    level: step.kind,
                    title: step.title.clone(),
                    message: step.message.clone(),
                },
                delay,
                Value::Null,
            ));
        }
        handles
    }

    /// Raise a plot flag once `delay_secs` have passed.
    pub fn set_plot_flag_after(&mut self, name: &str, delay_secs: u64) -> EventHandle {
        self.schedule(
            DeferredKind::SetPlotFlag {
                name: name.to_string(),
            },
            delay_secs,
            Value::Null,
        )
    }

    fn arm_unlock_poll(&mut self) {
        if let UnlockMode::Polling { interval_secs } = self.config.unlock_mode {
            self.poll_handle =
                Some(self.schedule(DeferredKind::UnlockSweep, interval_secs, Value::Null));
        }
    }

    fn schedule_maintenance_end(&mut self) {
        let clock = &self.state.hotel.clock;
        let hour = clock.hour_of_day();
        let Some(window) = self
            .state
            .hotel
            .maintenance
            .iter()
            .find(|window| window.contains(hour))
        else {
            return;
        };
        let hours_left = u64::from((window.until_hour + 24 - hour) % 24);
        let datetime = clock.datetime();
        let into_hour = u64::from(datetime.minute()) * 60 + u64::from(datetime.second());
        let delay = (hours_left * SECS_PER_HOUR).saturating_sub(into_hour);
        self.maintenance_end =
            Some(self.schedule(DeferredKind::MaintenanceEnds, delay, Value::Null));
    }

    // Clock -----------------------------------------------------------------

    /// Advance simulated time one second at a time, firing due events.
    pub fn advance_clock(&mut self, secs: u64) {
        for _ in 0..secs {
            let previous = self.state.now();
            self.state.hotel.clock.advance(1);
            if self.state.hotel.clock.crossed_hour_since(previous) {
                self.on_hour_boundary();
            }
            self.run_due_events();
        }
    }

    fn on_hour_boundary(&mut self) {
        log::debug!(
            "hour boundary: {:02}:00 at {}",
            self.state.hotel.clock.hour_of_day(),
            self.state.now()
        );
        if self.maintenance_end.is_none() && self.state.hotel.maintenance_active() {
            self.notify(NotificationKind::Warning, NOTIFY_MAINTENANCE_STARTED, "");
            self.schedule_maintenance_end();
        }
        if night_elk::roll_sighting(&self.config.night_elk, &self.state, &mut self.rng) {
            self.night_elk_sighted();
        }
        self.after_mutation();
    }

    fn night_elk_sighted(&mut self) {
        log::info!("night elk sighted at {}", self.state.now());
        self.state.night_elk_active = true;
        self.notify(NotificationKind::Warning, NOTIFY_NIGHT_ELK_SIGHTED, "");
        self.add_anomaly_level(self.config.night_elk.anomaly_bump);
        self.schedule(
            DeferredKind::NightElkDeparts,
            self.config.night_elk.sighting_secs,
            Value::Null,
        );
    }

    fn run_due_events(&mut self) {
        self.queue.begin_tick(self.state.now());
        while let Some(event) = self.queue.pop_due() {
            self.dispatch(event);
        }
        self.queue.end_tick();
    }

    fn dispatch(&mut self, event: DeferredEvent) {
        log::debug!(
            "dispatch {} (handle {}) at {}",
            event.kind.label(),
            event.handle.0,
            self.state.now()
        );
        match event.kind {
            DeferredKind::ExpireNotification { id } => {
                if self.notifier.expire(id) {
                    self.sink.on_expired(id);
                }
            }
            DeferredKind::RevealStage {
                sequence,
                stage,
                level,
                title,
                message,
            } => {
                log::debug!("reveal `{sequence}` stage {stage}");
                self.notify(level, title, message);
            }
            DeferredKind::UnlockSweep => {
                self.refresh_unlocks();
                self.arm_unlock_poll();
            }
            DeferredKind::NightElkDeparts => {
                self.state.night_elk_active = false;
                self.notify(NotificationKind::Info, NOTIFY_NIGHT_ELK_DEPARTED, "");
                self.after_mutation();
            }
            DeferredKind::FrontDeskReturns => {
                self.state.hotel.front_desk_present = true;
                self.notify(NotificationKind::Info, NOTIFY_FRONT_DESK_RETURNED, "");
                self.after_mutation();
            }
            DeferredKind::MaintenanceEnds => {
                self.maintenance_end = None;
                if self.state.hotel.maintenance_active() {
                    // An adjoining window keeps the work going.
                    self.schedule_maintenance_end();
                } else {
                    self.notify(NotificationKind::Info, NOTIFY_MAINTENANCE_ENDED, "");
                    self.after_mutation();
                }
            }
            DeferredKind::SetPlotFlag { name } => {
                self.state.plot_flags.insert(name);
                self.after_mutation();
            }
            DeferredKind::Unrecognized => {
                log::warn!(
                    "ignoring unrecognized deferred event (handle {})",
                    event.handle.0
                );
            }
        }
    }

    // Player actions --------------------------------------------------------

    /// Take the elevator to `floor`.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::FloorInaccessible` for closed or unknown floors.
    pub fn move_to_floor(&mut self, floor: i32) -> Result<(), ActionError> {
        if !self.state.hotel.floor_accessible(floor) {
            return self.reject(ActionError::FloorInaccessible(floor));
        }
        self.state.player.current_floor = floor;
        self.state.player.current_room = None;
        self.notify(
            NotificationKind::Info,
            NOTIFY_FLOOR_ARRIVED,
            floor.to_string(),
        );
        self.after_mutation();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `ActionError` when the area is unknown, closed, or on
    /// another floor.
    pub fn enter_area(&mut self, area: &str) -> Result<(), ActionError> {
        let current = self.state.player.current_floor;
        let check = match self.state.hotel.areas.get(area) {
            None => Err(ActionError::UnknownArea(area.to_string())),
            Some(found) if !found.accessible => {
                Err(ActionError::AreaInaccessible(area.to_string()))
            }
            Some(found) if found.floor != current => Err(ActionError::WrongFloor {
                area: area.to_string(),
                floor: found.floor,
                current,
            }),
            Some(_) => Ok(()),
        };
        if let Err(err) = check {
            return self.reject(err);
        }
        self.state.player.current_room = Some(area.to_string());
        self.after_mutation();
        Ok(())
    }

    /// Returns whether the clue is new.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::BlankInput` for an empty id.
    pub fn discover_clue(&mut self, clue_id: &str) -> Result<bool, ActionError> {
        self.require_text("clue id", clue_id)?;
        let fresh = !self.state.player.discovered_clues.contains(clue_id);
        self.record_clue(clue_id.to_string());
        self.after_mutation();
        Ok(fresh)
    }

    /// Returns whether the secret is new.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::BlankInput` for an empty id.
    pub fn discover_secret(&mut self, secret_id: &str) -> Result<bool, ActionError> {
        self.require_text("secret id", secret_id)?;
        let fresh = !self.state.player.discovered_secrets().contains(secret_id);
        self.record_secret(secret_id.to_string());
        self.after_mutation();
        Ok(fresh)
    }

    /// Returns whether the rule is new.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::BlankInput` for an empty id.
    pub fn unlock_rule(&mut self, rule_id: &str) -> Result<bool, ActionError> {
        self.require_text("rule id", rule_id)?;
        let fresh = !self.state.player.unlocked_rules().contains(rule_id);
        self.record_rule(rule_id.to_string());
        self.after_mutation();
        Ok(fresh)
    }

    fn record_clue(&mut self, clue_id: String) {
        if self.state.player.discovered_clues.insert(clue_id.clone()) {
            self.notify(NotificationKind::Success, NOTIFY_CLUE_DISCOVERED, clue_id);
        }
    }

    fn record_secret(&mut self, secret_id: String) {
        if self.state.player.discover_secret(secret_id.clone()) {
            self.notify(
                NotificationKind::Success,
                NOTIFY_SECRET_DISCOVERED,
                secret_id,
            );
        }
    }

    fn record_rule(&mut self, rule_id: String) {
        if self.state.player.unlock_rule(rule_id.clone()) {
            self.notify(NotificationKind::Info, NOTIFY_RULE_UNLOCKED, rule_id);
        }
    }

    /// # Errors
    ///
    /// Returns `ActionError::BlankInput` for an empty name.
    pub fn set_plot_flag(&mut self, name: &str) -> Result<bool, ActionError> {
        self.require_text("plot flag", name)?;
        let fresh = self.state.plot_flags.insert(name.to_string());
        self.after_mutation();
        Ok(fresh)
    }

    /// # Errors
    ///
    /// Returns `ActionError::BlankInput` for an empty id.
    pub fn learn_skill(&mut self, skill_id: &str) -> Result<bool, ActionError> {
        self.require_text("skill id", skill_id)?;
        let fresh = self.state.player.special_skills.insert(skill_id.to_string());
        self.after_mutation();
        Ok(fresh)
    }

    /// # Errors
    ///
    /// Returns `ActionError::BlankInput` for an empty id.
    pub fn complete_task(&mut self, task_id: &str) -> Result<bool, ActionError> {
        self.require_text("task id", task_id)?;
        let fresh = self.state.player.complete_task(task_id);
        self.after_mutation();
        Ok(fresh)
    }

    /// Log a broken hotel rule, returning its index for
    /// [`Self::handle_violation`].
    ///
    /// # Errors
    ///
    /// Returns `ActionError::BlankInput` for an empty rule id.
    pub fn record_violation(&mut self, rule_id: &str) -> Result<usize, ActionError> {
        self.require_text("rule id", rule_id)?;
        let at = self.state.now();
        self.state.player.violations.push(RuleViolation {
            rule_id: rule_id.to_string(),
            at,
            handled: false,
        });
        self.notify(
            NotificationKind::Error,
            NOTIFY_RULE_VIOLATION,
            rule_id.to_string(),
        );
        self.after_mutation();
        Ok(self.state.player.violations.len() - 1)
    }

    /// # Errors
    ///
    /// Returns `ActionError::UnknownViolation` for an out-of-range index.
    pub fn handle_violation(&mut self, index: usize) -> Result<(), ActionError> {
        let Some(violation) = self.state.player.violations.get_mut(index) else {
            return self.reject(ActionError::UnknownViolation(index));
        };
        violation.handled = true;
        self.after_mutation();
        Ok(())
    }

    /// Returns `false` when an item with that id is already carried.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::BlankInput` for an empty id or kind.
    pub fn add_item(&mut self, item_id: &str, kind: &str) -> Result<bool, ActionError> {
        self.require_text("item id", item_id)?;
        self.require_text("item kind", kind)?;
        if self.state.player.item(item_id).is_some() {
            return Ok(false);
        }
        self.state.player.inventory.push(InventoryItem {
            id: item_id.to_string(),
            kind: kind.to_string(),
            equipped: false,
        });
        self.after_mutation();
        Ok(true)
    }

    /// Equip an item, unequipping any other item of the same kind.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::UnknownItem` when the item is not carried.
    pub fn equip_item(&mut self, item_id: &str) -> Result<(), ActionError> {
        let Some(kind) = self.state.player.item(item_id).map(|item| item.kind.clone()) else {
            return self.reject(ActionError::UnknownItem(item_id.to_string()));
        };
        for item in &mut self.state.player.inventory {
            if item.kind == kind {
                item.equipped = item.id == item_id;
            }
        }
        self.after_mutation();
        Ok(())
    }

    pub fn set_avatar_tier(&mut self, tier: AvatarTier) {
        self.state.player.avatar_tier = tier;
        self.after_mutation();
    }

    pub fn set_front_desk_present(&mut self, present: bool) {
        self.state.hotel.front_desk_present = present;
        self.after_mutation();
    }

    /// Send the clerk away; they return after `secs`.
    pub fn front_desk_away_for(&mut self, secs: u64) -> EventHandle {
        self.set_front_desk_present(false);
        self.schedule(DeferredKind::FrontDeskReturns, secs, Value::Null)
    }

    /// Register the guest at the front desk.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::BlankInput` for an empty name.
    pub fn check_in(&mut self, name: &str) -> Result<(), ActionError> {
        self.require_text("guest name", name)?;
        let name = name.trim().to_string();
        self.state.player.name.clone_from(&name);
        self.state.player.complete_task("check-in");
        self.notify(NotificationKind::Success, NOTIFY_CHECKED_IN, name);
        self.after_mutation();
        Ok(())
    }

    // Queries ---------------------------------------------------------------

    #[must_use]
    pub fn water_available(&self, floor: i32) -> bool {
        self.state.hotel.water_available(floor)
    }

    #[must_use]
    pub fn maintenance_active(&self) -> bool {
        self.state.hotel.maintenance_active()
    }
}
