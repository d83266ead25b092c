use std::time::Duration;

use pipe::{PipeConfig, DEFAULT_GRACE_WINDOW};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Producers push as fast as they can; one consumer drains; graceful close at the end.
    Flood { items: u32 },
    /// Producers push `burst_size` items, pause, and repeat `bursts` times.
    Burst { bursts: u32, burst_size: u32 },
    /// A slow consumer forces producers to block on a full pipe.
    Backpressure { items: u32, consumer_delay: Duration },
    /// Graceful close starts while a slow consumer still has items to drain.
    GracefulDrain { items: u32, consumer_delay: Duration },
    /// Pipe is filled with no consumer, then closed immediately.
    ImmediateClose { items: u32 },
}

impl ScenarioKind {
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::Flood { .. } => "flood",
            ScenarioKind::Burst { .. } => "burst",
            ScenarioKind::Backpressure { .. } => "backpressure",
            ScenarioKind::GracefulDrain { .. } => "graceful-drain",
            ScenarioKind::ImmediateClose { .. } => "immediate-close",
        }
    }

    /// Items each producer attempts to push.
    pub fn items_per_producer(&self) -> u32 {
        match *self {
            ScenarioKind::Flood { items }
            | ScenarioKind::Backpressure { items, .. }
            | ScenarioKind::GracefulDrain { items, .. }
            | ScenarioKind::ImmediateClose { items } => items,
            ScenarioKind::Burst { bursts, burst_size } => bursts.saturating_mul(burst_size),
        }
    }
}

/// Parameters for one scenario run.
#[derive(Clone, Copy, Debug)]
pub struct ScenarioConfig {
    pub kind: ScenarioKind,
    pub capacity: usize,
    pub producers: u32,
    /// Bound applied to every blocking produce/consume call.
    pub timeout: Duration,
    pub grace_window: Duration,
}

impl ScenarioConfig {
    pub fn new(kind: ScenarioKind) -> Self {
        Self {
            kind,
            capacity: 16,
            producers: 1,
            timeout: Duration::from_secs(1),
            grace_window: DEFAULT_GRACE_WINDOW,
        }
    }

    pub fn flood(items: u32) -> Self {
        Self::new(ScenarioKind::Flood { items })
    }

    pub fn burst(bursts: u32, burst_size: u32) -> Self {
        Self::new(ScenarioKind::Burst { bursts, burst_size })
    }

    pub fn backpressure(items: u32) -> Self {
        Self::new(ScenarioKind::Backpressure {
            items,
            consumer_delay: Duration::from_millis(1),
        })
    }

    pub fn graceful_drain(items: u32) -> Self {
        Self::new(ScenarioKind::GracefulDrain {
            items,
            consumer_delay: Duration::from_millis(2),
        })
    }

    pub fn immediate_close(items: u32) -> Self {
        Self::new(ScenarioKind::ImmediateClose { items })
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn producers(mut self, producers: u32) -> Self {
        self.producers = producers;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn grace_window(mut self, grace_window: Duration) -> Self {
        self.grace_window = grace_window;
        self
    }

    pub fn pipe_config(&self) -> PipeConfig {
        PipeConfig::with_capacity(self.capacity).grace_window(self.grace_window)
    }

    /// Total items producers will push, accounting for the immediate-close fill limit.
    pub fn expected_items(&self) -> u32 {
        let per_producer = self.kind.items_per_producer();
        match self.kind {
            ScenarioKind::ImmediateClose { .. } => {
                let total = per_producer.saturating_mul(self.producers);
                total.min(u32::try_from(self.capacity).unwrap_or(u32::MAX))
            }
            _ => per_producer.saturating_mul(self.producers),
        }
    }
}
