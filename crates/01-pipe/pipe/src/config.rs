use std::time::Duration;

use crate::error::{PipeError, PipeResult};

/// Grace window used by [`crate::BoundedPipe::shutdown`] unless configured otherwise.
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_secs(30);

pub const DEFAULT_CAPACITY: usize = 16;

/// Construction parameters for a [`crate::BoundedPipe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipeConfig {
    /// Maximum number of items buffered at once. Must be at least 1.
    pub capacity: usize,
    /// How long a graceful shutdown waits for consumers to drain the buffer.
    pub grace_window: Duration,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            grace_window: DEFAULT_GRACE_WINDOW,
        }
    }
}

impl PipeConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn grace_window(mut self, grace_window: Duration) -> Self {
        self.grace_window = grace_window;
        self
    }

    pub fn validate(&self) -> PipeResult<()> {
        if self.capacity == 0 {
            return Err(PipeError::InvalidCapacity {
                requested: self.capacity,
            });
        }
        Ok(())
    }
}

/// Converts fractional seconds into a wait bound.
///
/// Sub-second precision is kept; negative, NaN and overflowing values are rejected.
pub fn timeout_from_secs(secs: f64) -> PipeResult<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|err| PipeError::invalid_timeout(format!("{secs} seconds: {err}")))
}
