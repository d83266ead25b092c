use std::fmt;

use thiserror::Error;

pub type PipeResult<T> = Result<T, PipeError>;

/// Failures surfaced by pipe operations.
///
/// None of these poison the pipe: a failed `produce`/`consume` leaves it usable
/// for later calls. Retrying is up to the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipeError {
    #[error("operation timed out")]
    Timeout,

    #[error("data cannot be produced to a closed pipe")]
    Closed,

    #[error("no data is available in the closed pipe")]
    ClosedEmpty,

    #[error("blocking wait was interrupted")]
    Interrupted,

    #[error("pipe capacity must be at least 1 (requested {requested})")]
    InvalidCapacity { requested: usize },

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}

impl PipeError {
    pub fn invalid_timeout(msg: impl Into<String>) -> Self {
        PipeError::InvalidTimeout(msg.into())
    }

    /// True for the outcomes that mean the pipe will never serve the call again.
    pub fn is_closed(&self) -> bool {
        matches!(self, PipeError::Closed | PipeError::ClosedEmpty)
    }
}

/// A rejected `produce`, carrying the item back to the caller.
pub struct ProduceError<T> {
    kind: PipeError,
    item: T,
}

impl<T> ProduceError<T> {
    pub(crate) fn new(kind: PipeError, item: T) -> Self {
        Self { kind, item }
    }

    pub fn kind(&self) -> &PipeError {
        &self.kind
    }

    /// Returns the item that was not enqueued.
    pub fn into_item(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for ProduceError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProduceError")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for ProduceError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl<T> std::error::Error for ProduceError<T> {}

impl<T> From<ProduceError<T>> for PipeError {
    fn from(err: ProduceError<T>) -> Self {
        err.kind
    }
}
