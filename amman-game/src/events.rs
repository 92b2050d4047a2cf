//! Deferred event queue keyed to the simulated clock.
//!
//! Events fire once, in insertion order, on the first tick whose timestamp
//! reaches their `fire_at`. A tick only considers events that were pending
//! when it began: anything scheduled by a handler during dispatch waits for
//! a later tick, and a non-positive delay is bumped to one second past the
//! tick being dispatched.

use serde::{Deserialize, Serialize};

use crate::clock::SimTime;
use crate::notify::{NotificationId, NotificationKind};

/// Cancellation handle returned by [`EventQueue::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeferredKind {
    ExpireNotification {
        id: NotificationId,
    },
    RevealStage {
        sequence: String,
        stage: u32,
        level: NotificationKind,
        title: String,
        #[serde(default)]
        message: String,
    },
    UnlockSweep,
    NightElkDeparts,
    FrontDeskReturns,
    MaintenanceEnds,
    SetPlotFlag {
        name: String,
    },
    #[serde(other)]
    Unrecognized,
}

impl DeferredKind {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ExpireNotification { .. } => "expire_notification",
            Self::RevealStage { .. } => "reveal_stage",
            Self::UnlockSweep => "unlock_sweep",
            Self::NightElkDeparts => "night_elk_departs",
            Self::FrontDeskReturns => "front_desk_returns",
            Self::MaintenanceEnds => "maintenance_ends",
            Self::SetPlotFlag { .. } => "set_plot_flag",
            Self::Unrecognized => "unrecognized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredEvent {
    pub handle: EventHandle,
    #[serde(flatten)]
    pub kind: DeferredKind,
    pub fire_at: SimTime,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct TickBarrier {
    now: SimTime,
    first_unseen: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventQueue {
    next_handle: u64,
    pending: Vec<DeferredEvent>,
    #[serde(skip)]
    barrier: Option<TickBarrier>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(
        &mut self,
        kind: DeferredKind,
        fire_at: SimTime,
        payload: serde_json::Value,
    ) -> EventHandle {
        let fire_at = match self.barrier {
            Some(barrier) if fire_at <= barrier.now => {
                log::debug!(
                    "{} scheduled for {fire_at} while dispatching {}; deferring one second",
                    kind.label(),
                    barrier.now
                );
                barrier.now.after(1)
            }
            _ => fire_at,
        };
        let handle = EventHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.push(DeferredEvent {
            handle,
            kind,
            fire_at,
            payload,
        });
        handle
    }

    pub fn schedule_after(
        &mut self,
        kind: DeferredKind,
        now: SimTime,
        delay_secs: u64,
        payload: serde_json::Value,
    ) -> EventHandle {
        self.schedule(kind, now.after(delay_secs), payload)
    }

    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|event| event.handle != handle);
        self.pending.len() != before
    }

    /// Cancel every pending event, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    #[must_use]
    pub fn pending(&self) -> &[DeferredEvent] {
        &self.pending
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn next_due(&self) -> Option<SimTime> {
        self.pending.iter().map(|event| event.fire_at).min()
    }

    /// Open a dispatch window at `now`. Pair with [`Self::end_tick`].
    pub fn begin_tick(&mut self, now: SimTime) {
        self.barrier = Some(TickBarrier {
            now,
            first_unseen: self.next_handle,
        });
    }

    /// Remove and return the oldest event due in the open tick.
    pub fn pop_due(&mut self) -> Option<DeferredEvent> {
        let barrier = self.barrier?;
        let idx = self.pending.iter().position(|event| {
            event.fire_at <= barrier.now && event.handle.0 < barrier.first_unseen
        })?;
        Some(self.pending.remove(idx))
    }

    pub fn end_tick(&mut self) {
        self.barrier = None;
    }

    /// Dispatch every event due at `now`, returning how many fired.
    pub fn tick<F>(&mut self, now: SimTime, mut dispatch: F) -> usize
    where
        F: FnMut(&mut Self, DeferredEvent),
    {
        self.begin_tick(now);
        let mut fired = 0;
        while let Some(event) = self.pop_due() {
            dispatch(self, event);
            fired += 1;
        }
        self.end_tick();
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn flag(name: &str) -> DeferredKind {
        DeferredKind::SetPlotFlag {
            name: name.to_string(),
        }
    }

    #[test]
    fn fires_only_due_events() {
        let mut queue = EventQueue::new();
        queue.schedule(flag("first"), SimTime(10), Value::Null);
        queue.schedule(flag("second"), SimTime(20), Value::Null);

        let mut fired = Vec::new();
        assert_eq!(queue.tick(SimTime(15), |_, ev| fired.push(ev.kind)), 1);
        assert_eq!(fired, vec![flag("first")]);
        assert_eq!(queue.pending().len(), 1);

        assert_eq!(queue.tick(SimTime(25), |_, ev| fired.push(ev.kind)), 1);
        assert_eq!(fired, vec![flag("first"), flag("second")]);
        assert!(queue.is_empty());
    }

    #[test]
    fn due_events_fire_in_insertion_order() {
        let mut queue = EventQueue::new();
        queue.schedule(flag("late-scheduled-early-due"), SimTime(5), Value::Null);
        queue.schedule(flag("b"), SimTime(3), Value::Null);
        queue.schedule(flag("c"), SimTime(4), Value::Null);

        let mut order = Vec::new();
        queue.tick(SimTime(5), |_, ev| order.push(ev.kind));
        assert_eq!(
            order,
            vec![flag("late-scheduled-early-due"), flag("b"), flag("c")]
        );
    }

    #[test]
    fn handlers_cannot_fire_within_the_same_tick() {
        let mut queue = EventQueue::new();
        queue.schedule(flag("seed"), SimTime(1), Value::Null);

        let fired = queue.tick(SimTime(1), |queue, _| {
            queue.schedule(flag("echo"), SimTime(0), Value::Null);
        });
        assert_eq!(fired, 1);
        assert_eq!(queue.pending().len(), 1);
        assert_eq!(queue.pending()[0].fire_at, SimTime(2));

        assert_eq!(queue.tick(SimTime(2), |_, _| {}), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn cancel_and_clear() {
        let mut queue = EventQueue::new();
        let a = queue.schedule(DeferredKind::UnlockSweep, SimTime(30), Value::Null);
        queue.schedule(DeferredKind::NightElkDeparts, SimTime(40), Value::Null);
        assert!(queue.cancel(a));
        assert!(!queue.cancel(a));
        assert_eq!(queue.next_due(), Some(SimTime(40)));
        assert_eq!(queue.clear(), 1);
        assert_eq!(queue.tick(SimTime(100), |_, _| {}), 0);
    }

    #[test]
    fn handler_can_cancel_a_sibling_due_in_the_same_tick() {
        let mut queue = EventQueue::new();
        queue.schedule(flag("canceller"), SimTime(1), Value::Null);
        let victim = queue.schedule(flag("victim"), SimTime(1), Value::Null);

        let fired = queue.tick(SimTime(1), |queue, _| {
            queue.cancel(victim);
        });
        assert_eq!(fired, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn unknown_kinds_deserialize_as_unrecognized() {
        let event: DeferredEvent = serde_json::from_value(json!({
            "handle": 4,
            "kind": "summon_bellhop",
            "fire_at": 12
        }))
        .unwrap();
        assert_eq!(event.kind, DeferredKind::Unrecognized);
        assert!(event.payload.is_null());

        let stage: DeferredEvent = serde_json::from_value(json!({
            "handle": 5,
            "kind": "reveal_stage",
            "sequence": "mirror",
            "stage": 0,
            "level": "warning",
            "title": "reveal.mirror.fog",
            "fire_at": 3,
            "payload": {"room": "314"}
        }))
        .unwrap();
        assert_eq!(stage.kind.label(), "reveal_stage");
        assert_eq!(stage.payload["room"], "314");
    }
}
