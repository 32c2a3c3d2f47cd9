//! Time source for fixture timestamps
//!
//! Every "now" default (event capture time, fix and snooze dates) is read
//! through a [`Clock`]. The process-wide clock starts as [`SystemClock`] and
//! can be swapped so a whole test binary runs against controlled time; a
//! single fixture set can also carry its own clock.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the operating system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests
///
/// Clones share the same instant, so advancing one advances all of them.
#[derive(Debug, Clone)]
pub struct FixedClock {
    current_time: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    /// Create a clock frozen at `time`
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(time)),
        }
    }

    /// Advance the clock by a duration
    pub fn advance_by(&self, duration: Duration) -> DateTime<Utc> {
        let mut current = self.current_time.lock();
        *current += duration;
        *current
    }

    /// Set the clock to a specific time
    pub fn set_time(&self, time: DateTime<Utc>) {
        *self.current_time.lock() = time;
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current_time.lock()
    }
}

static GLOBAL_CLOCK: LazyLock<RwLock<Arc<dyn Clock>>> =
    LazyLock::new(|| RwLock::new(Arc::new(SystemClock)));

/// The process-wide clock
pub fn global() -> Arc<dyn Clock> {
    GLOBAL_CLOCK.read().clone()
}

/// Replace the process-wide clock, returning the previous one
pub fn set_global(clock: Arc<dyn Clock>) -> Arc<dyn Clock> {
    std::mem::replace(&mut *GLOBAL_CLOCK.write(), clock)
}

/// Restore the process-wide clock to [`SystemClock`]
pub fn reset_global() {
    set_global(Arc::new(SystemClock));
}
