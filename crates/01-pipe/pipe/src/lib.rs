//! Bounded, thread-safe hand-off pipe.
//!
//! * [`BoundedPipe`] – fixed-capacity FIFO buffer with timeout-bounded
//!   `produce`/`consume` and two shutdown paths (immediate and graceful).
//! * [`ConsumeStream`] – iterator view that consumes until the pipe is closed and empty.
//! * [`Deadline`] – converts caller timeouts into bounded condition waits.
//! * [`PipeError`] / [`ProduceError`] – value-level failure surface.

mod config;
mod error;
mod metrics;
mod pipe;
mod state;
mod stream;
pub mod wait;

pub use config::{timeout_from_secs, PipeConfig, DEFAULT_CAPACITY, DEFAULT_GRACE_WINDOW};
pub use error::{PipeError, PipeResult, ProduceError};
pub use metrics::PipeMetricsSnapshot;
pub use pipe::BoundedPipe;
pub use state::{CloseOutcome, PipeState};
pub use stream::ConsumeStream;
pub use wait::{Deadline, WaitResult};
