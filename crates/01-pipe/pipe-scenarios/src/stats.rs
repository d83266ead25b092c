use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct ScenarioStats {
    pub produced: u32,
    pub consumed: u32,
    /// Produces that found the pipe full and had to block.
    pub full_waits: u32,
    pub produce_timeouts: u32,
    pub consume_timeouts: u32,
    /// Produces refused because the pipe was closing or closed.
    pub rejected: u32,
    /// Deepest buffer observed right after a produce.
    pub max_depth: usize,
}

pub trait StatsSink: Clone + Send + Sync + 'static {
    fn with_stats<R>(&self, f: impl FnOnce(&mut ScenarioStats) -> R) -> R;

    fn snapshot(&self) -> ScenarioStats {
        self.with_stats(|stats| *stats)
    }
}

#[derive(Clone, Default)]
pub struct ArcStatsSink(pub Arc<Mutex<ScenarioStats>>);

impl ArcStatsSink {
    pub fn new(stats: Arc<Mutex<ScenarioStats>>) -> Self {
        Self(stats)
    }
}

impl StatsSink for ArcStatsSink {
    fn with_stats<R>(&self, f: impl FnOnce(&mut ScenarioStats) -> R) -> R {
        let mut guard = self.0.lock();
        f(&mut *guard)
    }
}

impl StatsSink for Arc<Mutex<ScenarioStats>> {
    fn with_stats<R>(&self, f: impl FnOnce(&mut ScenarioStats) -> R) -> R {
        let mut guard = self.lock();
        f(&mut *guard)
    }
}
