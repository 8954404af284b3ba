//! Wall-clock source for transaction timestamps and analysis.
//!
//! RULE: Nothing in the ledger reads the system time directly.
//! All "now" values flow through a Clock handed to the Ledger,
//! so tests can pin and advance time deterministically.

use crate::types::Timestamp;
use std::{cell::Cell, rc::Rc};

pub trait Clock {
    /// Current wall-clock time in seconds since the Unix epoch.
    fn now(&self) -> Timestamp;
}

/// Reads the real UTC clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle
/// and give another to the ledger.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { now: Rc::new(Cell::new(start)) }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    /// Advance by `secs` seconds. Returns the new time.
    pub fn advance(&self, secs: i64) -> Timestamp {
        let next = self.now.get() + secs;
        self.now.set(next);
        next
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000);
        let handle = clock.clone();
        handle.advance(60);
        assert_eq!(clock.now(), 1_060);
        clock.set(5);
        assert_eq!(handle.now(), 5);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800);
    }
}
