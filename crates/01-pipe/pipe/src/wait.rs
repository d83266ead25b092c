//! Timeout-bounded condition waits used by the pipe monitor.
//!
//! A caller-supplied [`Duration`] is turned into a [`Deadline`] once, when the
//! operation starts, so repeated wakeups never extend the total time a caller
//! can be blocked. Durations too large to be represented as an [`Instant`]
//! wait without a bound.

use std::time::{Duration, Instant};

use parking_lot::{Condvar, MutexGuard};

/// Result of parking on a condition until a deadline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitResult {
    /// The caller was woken (by a notify or spuriously) before the deadline.
    Woken,
    /// The deadline passed while parked.
    TimedOut,
}

impl WaitResult {
    pub fn timed_out(self) -> bool {
        matches!(self, WaitResult::TimedOut)
    }
}

/// Absolute point in time after which a blocked operation gives up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Deadline {
    At(Instant),
    Never,
}

impl Deadline {
    /// Deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(at) => Deadline::At(at),
            None => Deadline::Never,
        }
    }

    /// Time left before the deadline, `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            Deadline::At(at) => Some(at.saturating_duration_since(Instant::now())),
            Deadline::Never => None,
        }
    }

    pub fn has_elapsed(&self) -> bool {
        match self {
            Deadline::At(at) => Instant::now() >= *at,
            Deadline::Never => false,
        }
    }

    /// Parks on `condvar`, releasing `guard` until woken or the deadline passes.
    ///
    /// Callers must re-check their predicate afterwards regardless of the result.
    pub fn wait<T>(&self, condvar: &Condvar, guard: &mut MutexGuard<'_, T>) -> WaitResult {
        match self {
            Deadline::At(at) => {
                if condvar.wait_until(guard, *at).timed_out() {
                    WaitResult::TimedOut
                } else {
                    WaitResult::Woken
                }
            }
            Deadline::Never => {
                condvar.wait(guard);
                WaitResult::Woken
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn zero_timeout_elapses_immediately() {
        let lock = Mutex::new(());
        let cv = Condvar::new();
        let deadline = Deadline::after(Duration::ZERO);
        let mut guard = lock.lock();
        assert_eq!(deadline.wait(&cv, &mut guard), WaitResult::TimedOut);
        assert!(deadline.has_elapsed());
        assert_eq!(deadline.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn bounded_wait_respects_duration() {
        let lock = Mutex::new(());
        let cv = Condvar::new();
        let timeout = Duration::from_millis(50);
        let start = Instant::now();
        let deadline = Deadline::after(timeout);
        let mut guard = lock.lock();
        while !deadline.wait(&cv, &mut guard).timed_out() {}
        assert!(start.elapsed() >= timeout);
    }

    #[test]
    fn huge_timeout_is_unbounded() {
        let deadline = Deadline::after(Duration::MAX);
        assert_eq!(deadline, Deadline::Never);
        assert_eq!(deadline.remaining(), None);
        assert!(!deadline.has_elapsed());
    }
}
