//! Simulated hotel clock.
//!
//! Time inside a session is a monotonic count of simulated seconds since
//! check-in. Wall-clock views (hour of day, calendar date) are derived by
//! offsetting that count from a fixed start instant.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{DEFAULT_START_TIMESTAMP, SECS_PER_HOUR};

/// Absolute simulated timestamp, in seconds since the session started.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn secs(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn after(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Whole simulated hours elapsed since the session started.
    #[must_use]
    pub const fn hours(self) -> u64 {
        self.0 / SECS_PER_HOUR
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t+{}s", self.0)
    }
}

/// Hour-of-day range, `from_hour` inclusive and `until_hour` exclusive.
///
/// Windows wrap past midnight when `from_hour > until_hour`
/// (22 → 5 covers 22:00 through 04:59). Equal bounds describe an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HourWindow {
    pub from_hour: u32,
    pub until_hour: u32,
}

impl HourWindow {
    #[must_use]
    pub const fn new(from_hour: u32, until_hour: u32) -> Self {
        Self {
            from_hour,
            until_hour,
        }
    }

    #[must_use]
    pub const fn contains(self, hour: u32) -> bool {
        if self.from_hour <= self.until_hour {
            hour >= self.from_hour && hour < self.until_hour
        } else {
            hour >= self.from_hour || hour < self.until_hour
        }
    }

    #[must_use]
    pub const fn is_well_formed(self) -> bool {
        self.from_hour < 24 && self.until_hour < 24
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimClock {
    start: DateTime<Utc>,
    now: SimTime,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(default_start_time())
    }
}

impl SimClock {
    #[must_use]
    pub const fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            now: SimTime::ZERO,
        }
    }

    #[must_use]
    pub const fn now(&self) -> SimTime {
        self.now
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Move the clock forward, returning the new timestamp.
    pub fn advance(&mut self, secs: u64) -> SimTime {
        self.now = self.now.after(secs);
        self.now
    }

    #[must_use]
    pub fn datetime(&self) -> DateTime<Utc> {
        let offset = i64::try_from(self.now.secs()).unwrap_or(i64::MAX);
        Duration::try_seconds(offset)
            .and_then(|delta| self.start.checked_add_signed(delta))
            .unwrap_or(self.start)
    }

    #[must_use]
    pub fn hour_of_day(&self) -> u32 {
        self.datetime().hour()
    }

    /// True when the wall-clock hour changed between `previous` and now.
    #[must_use]
    pub fn crossed_hour_since(&self, previous: SimTime) -> bool {
        let offset = u64::from(self.start.minute()) * 60 + u64::from(self.start.second());
        previous.secs().saturating_add(offset) / SECS_PER_HOUR
            != self.now.secs().saturating_add(offset) / SECS_PER_HOUR
    }
}

#[must_use]
pub fn default_start_time() -> DateTime<Utc> {
    Utc.timestamp_opt(DEFAULT_START_TIMESTAMP, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
