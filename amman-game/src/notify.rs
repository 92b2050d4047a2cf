//! Notification dispatcher.
//!
//! Every notification lands in the history and, for a fixed display
//! duration, in the visible queue. Expiry only removes it from the visible
//! queue. The rendering layer is reached through [`NotificationSink`].

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::clock::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: SimTime,
    pub read: bool,
}

/// Rendering-layer hook. Called synchronously from the session.
pub trait NotificationSink {
    fn on_notification(&mut self, notification: &Notification);

    fn on_expired(&mut self, _id: NotificationId) {}
}

/// Sink for headless sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn on_notification(&mut self, _notification: &Notification) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Notifier {
    next_id: u64,
    history: Vec<Notification>,
    visible: VecDeque<NotificationId>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notification to the history and the visible queue.
    pub fn push(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        now: SimTime,
    ) -> &Notification {
        let id = NotificationId(self.next_id);
        self.next_id += 1;
        self.visible.push_back(id);
        self.history.push(Notification {
            id,
            kind,
            title: title.into(),
            message: message.into(),
            created_at: now,
            read: false,
        });
        &self.history[self.history.len() - 1]
    }

    /// Drop a notification from the visible queue; history is untouched.
    pub fn expire(&mut self, id: NotificationId) -> bool {
        let before = self.visible.len();
        self.visible.retain(|visible| *visible != id);
        self.visible.len() != before
    }

    #[must_use]
    pub fn get(&self, id: NotificationId) -> Option<&Notification> {
        self.history
            .binary_search_by_key(&id, |notification| notification.id)
            .ok()
            .map(|idx| &self.history[idx])
    }

    pub fn mark_read(&mut self, id: NotificationId) -> bool {
        let Ok(idx) = self
            .history
            .binary_search_by_key(&id, |notification| notification.id)
        else {
            return false;
        };
        let notification = &mut self.history[idx];
        let changed = !notification.read;
        notification.read = true;
        changed
    }

    /// Mark everything read, returning how many were unread.
    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for notification in self.history.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        changed
    }

    #[must_use]
    pub fn unread_count(&self) -> usize {
        self.history.iter().filter(|n| !n.read).count()
    }

    /// Currently displayed notifications, oldest first.
    pub fn visible(&self) -> impl Iterator<Item = &Notification> + '_ {
        self.visible.iter().filter_map(|id| self.get(*id))
    }

    #[must_use]
    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    #[must_use]
    pub fn history(&self) -> &[Notification] {
        &self.history
    }
}
