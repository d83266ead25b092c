use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::PipeError;

/// Running counters for a pipe. Updated with relaxed ordering; snapshots are
/// advisory and may lag concurrent operations.
#[derive(Default)]
pub(crate) struct PipeMetrics {
    produced: AtomicU64,
    consumed: AtomicU64,
    timed_out: AtomicU64,
    rejected: AtomicU64,
    closed_empty: AtomicU64,
    interrupted: AtomicU64,
    discarded: AtomicU64,
}

impl PipeMetrics {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_consumed(&self) {
        self.consumed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, count: usize) {
        self.discarded.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self, err: &PipeError) {
        let counter = match err {
            PipeError::Timeout => &self.timed_out,
            PipeError::Closed => &self.rejected,
            PipeError::ClosedEmpty => &self.closed_empty,
            PipeError::Interrupted => &self.interrupted,
            PipeError::InvalidCapacity { .. } | PipeError::InvalidTimeout(_) => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> PipeMetricsSnapshot {
        PipeMetricsSnapshot {
            produced: self.produced.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            closed_empty: self.closed_empty.load(Ordering::Relaxed),
            interrupted: self.interrupted.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipeMetricsSnapshot {
    pub produced: u64,
    pub consumed: u64,
    pub timed_out: u64,
    /// Produce calls refused because the pipe was closing or closed.
    pub rejected: u64,
    /// Consume calls that found the pipe closed with nothing left to drain.
    /// A stream ending normally counts one here.
    pub closed_empty: u64,
    pub interrupted: u64,
    /// Items dropped by a close without being consumed.
    pub discarded: u64,
}
