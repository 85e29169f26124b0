//! Monotonic wall clock for mutation timestamps
//!
//! `updated_at` must never move backwards for a record, even when the host
//! clock is adjusted. `MonotonicClock` returns the wall-clock time clamped to
//! be strictly later than any value it has already handed out.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Strictly increasing UTC timestamps with microsecond resolution
#[derive(Debug, Default)]
pub struct MonotonicClock {
    /// Last issued timestamp, microseconds since the Unix epoch
    last_micros: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            last_micros: AtomicI64::new(0),
        }
    }

    /// Current time, never earlier than or equal to a previous result
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let mut previous = self.last_micros.load(Ordering::Relaxed);

        loop {
            let next = wall.max(previous + 1);
            match self.last_micros.compare_exchange_weak(
                previous,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Self::from_micros(next),
                Err(current) => previous = current,
            }
        }
    }

    fn from_micros(micros: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
    }
}
