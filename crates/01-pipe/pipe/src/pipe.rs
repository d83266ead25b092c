//! Bounded hand-off queue guarded by a single monitor lock.
//!
//! Every operation takes the same [`Mutex`], checks its predicate, parks on one
//! of three conditions if it has to, mutates the buffer and signals. Close
//! transitions run under that lock too and broadcast every condition, so a
//! blocked caller observes the new state as soon as it is scheduled instead of
//! sleeping out its own timeout.

use std::collections::VecDeque;
use std::fmt;
use std::mem;
use std::time::Duration;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, trace, warn};

use crate::config::PipeConfig;
use crate::error::{PipeError, PipeResult, ProduceError};
use crate::metrics::{PipeMetrics, PipeMetricsSnapshot};
use crate::state::{CloseOutcome, PipeState};
use crate::stream::ConsumeStream;
use crate::wait::Deadline;

/// Upper bound on the slots reserved up front; larger pipes grow on demand.
const PREALLOC_LIMIT: usize = 1024;

struct Shared<T> {
    items: VecDeque<T>,
    state: PipeState,
    /// Bumped by [`BoundedPipe::interrupt`]; waiters compare against the value
    /// they saw on entry.
    interrupt_epoch: u64,
}

/// Bounded FIFO pipe shared between producer and consumer threads.
///
/// Share it behind an `Arc` (or a scoped borrow); all operations take `&self`.
pub struct BoundedPipe<T> {
    capacity: usize,
    grace_window: Duration,
    shared: Mutex<Shared<T>>,
    space_available: Condvar,
    item_available: Condvar,
    drained: Condvar,
    metrics: PipeMetrics,
}

impl<T> BoundedPipe<T> {
    /// Creates an open, empty pipe holding at most `capacity` items.
    pub fn new(capacity: usize) -> PipeResult<Self> {
        Self::with_config(PipeConfig::with_capacity(capacity))
    }

    pub fn with_config(config: PipeConfig) -> PipeResult<Self> {
        config.validate()?;
        trace!(capacity = config.capacity, "pipe created");
        Ok(Self {
            capacity: config.capacity,
            grace_window: config.grace_window,
            shared: Mutex::new(Shared {
                items: VecDeque::with_capacity(config.capacity.min(PREALLOC_LIMIT)),
                state: PipeState::Open,
                interrupt_epoch: 0,
            }),
            space_available: Condvar::new(),
            item_available: Condvar::new(),
            drained: Condvar::new(),
            metrics: PipeMetrics::new(),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn grace_window(&self) -> Duration {
        self.grace_window
    }

    pub fn len(&self) -> usize {
        self.shared.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.lock().items.is_empty()
    }

    pub fn state(&self) -> PipeState {
        self.shared.lock().state
    }

    /// True once either close path has started.
    pub fn is_closed(&self) -> bool {
        !self.shared.lock().state.is_open()
    }

    /// How the pipe was closed, once it has fully closed.
    pub fn close_outcome(&self) -> Option<CloseOutcome> {
        self.shared.lock().state.close_outcome()
    }

    pub fn metrics(&self) -> PipeMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Appends `item`, blocking up to `timeout` while the buffer is full.
    ///
    /// Fails with [`PipeError::Closed`] without waiting once a close has begun.
    /// On any failure the buffer is untouched and the item is handed back.
    pub fn produce(&self, item: T, timeout: Duration) -> Result<(), ProduceError<T>> {
        let deadline = Deadline::after(timeout);
        let mut shared = self.shared.lock();
        if let Err(err) = self.wait_for_space(&mut shared, deadline) {
            drop(shared);
            self.metrics.record_failure(&err);
            return Err(ProduceError::new(err, item));
        }
        shared.items.push_back(item);
        debug_assert!(shared.items.len() <= self.capacity);
        self.item_available.notify_one();
        drop(shared);
        self.metrics.record_produced();
        Ok(())
    }

    pub fn try_produce(&self, item: T) -> Result<(), ProduceError<T>> {
        self.produce(item, Duration::ZERO)
    }

    /// Removes the head item, blocking up to `timeout` while the buffer is empty.
    ///
    /// Fails with [`PipeError::ClosedEmpty`] without waiting once the pipe is
    /// closed, or once it is closing and nothing is left to drain.
    pub fn consume(&self, timeout: Duration) -> PipeResult<T> {
        let deadline = Deadline::after(timeout);
        let mut shared = self.shared.lock();
        let result = self.take_item(&mut shared, deadline);
        drop(shared);
        match &result {
            Ok(_) => self.metrics.record_consumed(),
            Err(err) => self.metrics.record_failure(err),
        }
        result
    }

    pub fn try_consume(&self) -> PipeResult<T> {
        self.consume(Duration::ZERO)
    }

    /// Iterator that consumes items until the pipe reports it is closed and empty.
    pub fn stream(&self, timeout: Duration) -> ConsumeStream<&Self, T> {
        ConsumeStream::new(self, timeout)
    }

    /// Closes the pipe at once, dropping anything still buffered.
    ///
    /// Never blocks beyond acquiring the lock. Calling it on a closed pipe is a
    /// no-op that returns the outcome recorded by the first close.
    pub fn immediate_close(&self) -> CloseOutcome {
        let mut shared = self.shared.lock();
        if let Some(outcome) = shared.state.close_outcome() {
            return outcome;
        }
        let discarded = mem::take(&mut shared.items);
        let outcome = CloseOutcome::Immediate {
            discarded: discarded.len(),
        };
        self.finish_close(&mut shared, outcome);
        drop(shared);
        debug!(discarded = discarded.len(), "pipe closed immediately");
        outcome
    }

    /// Stops accepting items and waits up to `grace_window` for consumers to
    /// drain the buffer, then closes.
    ///
    /// Items still buffered when the window elapses are dropped and reported
    /// through [`CloseOutcome::Forced`]. If another close finishes first, its
    /// outcome is returned.
    pub fn graceful_close(&self, grace_window: Duration) -> CloseOutcome {
        let deadline = Deadline::after(grace_window);
        let mut shared = self.shared.lock();
        let state = shared.state;
        match state {
            PipeState::Closed(outcome) => return outcome,
            PipeState::Open => {
                shared.state = PipeState::Closing;
                debug!(pending = shared.items.len(), "pipe closing");
                // Blocked producers must see Closed; consumers parked on an
                // empty buffer will never get an item now.
                self.space_available.notify_all();
                self.item_available.notify_all();
            }
            PipeState::Closing => {}
        }

        let mut timed_out = false;
        loop {
            if let Some(outcome) = shared.state.close_outcome() {
                return outcome;
            }
            if shared.items.is_empty() {
                self.finish_close(&mut shared, CloseOutcome::Drained);
                debug!("pipe drained and closed");
                return CloseOutcome::Drained;
            }
            if timed_out {
                let remaining = mem::take(&mut shared.items);
                let outcome = CloseOutcome::Forced {
                    discarded: remaining.len(),
                };
                self.finish_close(&mut shared, outcome);
                drop(shared);
                warn!(
                    discarded = remaining.len(),
                    ?grace_window,
                    "grace window elapsed, discarding undrained items"
                );
                return outcome;
            }
            timed_out = deadline.wait(&self.drained, &mut shared).timed_out();
        }
    }

    /// Graceful close using the configured grace window.
    pub fn shutdown(&self) -> CloseOutcome {
        self.graceful_close(self.grace_window)
    }

    /// Wakes every producer and consumer currently blocked on this pipe; each
    /// returns [`PipeError::Interrupted`] unless its predicate already holds.
    ///
    /// Calls that start after the interrupt are unaffected.
    pub fn interrupt(&self) {
        let mut shared = self.shared.lock();
        shared.interrupt_epoch = shared.interrupt_epoch.wrapping_add(1);
        self.space_available.notify_all();
        self.item_available.notify_all();
        trace!(epoch = shared.interrupt_epoch, "interrupted blocked waiters");
    }

    fn wait_for_space(
        &self,
        shared: &mut MutexGuard<'_, Shared<T>>,
        deadline: Deadline,
    ) -> PipeResult<()> {
        let epoch = shared.interrupt_epoch;
        let mut timed_out = false;
        loop {
            if !shared.state.is_open() {
                return Err(PipeError::Closed);
            }
            if shared.items.len() < self.capacity {
                return Ok(());
            }
            if shared.interrupt_epoch != epoch {
                return Err(PipeError::Interrupted);
            }
            if timed_out {
                return Err(PipeError::Timeout);
            }
            timed_out = deadline.wait(&self.space_available, shared).timed_out();
        }
    }

    fn take_item(
        &self,
        shared: &mut MutexGuard<'_, Shared<T>>,
        deadline: Deadline,
    ) -> PipeResult<T> {
        let epoch = shared.interrupt_epoch;
        let mut timed_out = false;
        loop {
            if let PipeState::Closed(_) = shared.state {
                return Err(PipeError::ClosedEmpty);
            }
            if let Some(item) = shared.items.pop_front() {
                self.space_available.notify_one();
                if shared.items.is_empty() && shared.state.is_closing() {
                    self.drained.notify_all();
                }
                return Ok(item);
            }
            if shared.state.is_closing() {
                return Err(PipeError::ClosedEmpty);
            }
            if shared.interrupt_epoch != epoch {
                return Err(PipeError::Interrupted);
            }
            if timed_out {
                return Err(PipeError::Timeout);
            }
            timed_out = deadline.wait(&self.item_available, shared).timed_out();
        }
    }

    fn finish_close(&self, shared: &mut Shared<T>, outcome: CloseOutcome) {
        debug_assert!(shared.items.is_empty());
        shared.state = PipeState::Closed(outcome);
        self.metrics.record_discarded(outcome.discarded());
        self.space_available.notify_all();
        self.item_available.notify_all();
        self.drained.notify_all();
    }
}

impl<T> AsRef<BoundedPipe<T>> for BoundedPipe<T> {
    fn as_ref(&self) -> &BoundedPipe<T> {
        self
    }
}

impl<T> fmt::Debug for BoundedPipe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("BoundedPipe")
            .field("capacity", &self.capacity)
            .field("len", &shared.items.len())
            .field("state", &shared.state)
            .finish()
    }
}
