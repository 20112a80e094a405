//! Wall-clock source for event timestamps
//!
//! Timestamps are reporting data only; nothing in the rules reads them.

use std::cell::Cell;

use chrono::{DateTime, Duration, TimeZone, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Real time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock that advances a fixed step on every read
#[derive(Debug, Clone)]
pub struct FixedClock {
    next: Cell<DateTime<Utc>>,
    step: Duration,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            next: Cell::new(start),
            step,
        }
    }

    /// Starts at the Unix epoch and advances one millisecond per read
    pub fn epoch() -> Self {
        let start = Utc
            .timestamp_opt(0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::new(start, Duration::milliseconds(1))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        let current = self.next.get();
        self.next.set(current + self.step);
        current
    }
}
