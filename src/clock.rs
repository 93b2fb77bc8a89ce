//! Wall-clock access for dates and status expiry.

use chrono::NaiveDate;
use std::time::Instant;

/// Source of "today" and "now" for the workflow.
pub trait Clock {
    /// Current local calendar date.
    fn today(&self) -> NaiveDate;
    /// Monotonic instant used for status expiry.
    fn now(&self) -> Instant;
}

/// Clock backed by the local timezone.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
pub use manual::ManualClock;
