//! Producer/consumer workloads that exercise a [`pipe::BoundedPipe`] end to end.
//!
//! A [`ScenarioConfig`] picks the workload, [`ScenarioRunner`] drives the
//! threads and records [`ScenarioStats`], and the `verify_*` helpers check the
//! drained output against what the workload promises.

mod checks;
mod config;
mod engine;
mod error;
mod stats;

pub use checks::{
    verify_backpressure, verify_burst, verify_flood, verify_immediate_close, verify_run,
    CheckResult, DrainReport,
};
pub use config::{ScenarioConfig, ScenarioKind};
pub use engine::{ScenarioRun, ScenarioRunner};
pub use error::{ScenarioError, ScenarioResult};
pub use stats::{ArcStatsSink, ScenarioStats, StatsSink};

/// Payload pushed through the pipe: which producer sent it and its position
/// in that producer's sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Item {
    pub producer: u32,
    pub seq: u32,
}

/// Utility to update stats counters with wrapping arithmetic.
#[inline]
fn wrapping_add(base: u32, delta: u32) -> u32 {
    base.wrapping_add(delta)
}
