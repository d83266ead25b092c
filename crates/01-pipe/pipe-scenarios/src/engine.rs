use std::thread;
use std::time::{Duration, Instant};

use pipe::{BoundedPipe, CloseOutcome, PipeError, PipeMetricsSnapshot};
use tracing::{debug, info};

use crate::config::{ScenarioConfig, ScenarioKind};
use crate::error::{ScenarioError, ScenarioResult};
use crate::stats::StatsSink;
use crate::{wrapping_add, Item};

const BURST_PAUSE: Duration = Duration::from_millis(2);

/// Blocking retries a producer makes before giving up on a stalled consumer.
const MAX_PRODUCE_RETRIES: u32 = 30;

/// Everything observed while running a scenario.
#[derive(Clone, Debug)]
pub struct ScenarioRun {
    pub drained: Vec<Item>,
    pub close_outcome: CloseOutcome,
    pub elapsed: Duration,
    pub pipe_metrics: PipeMetricsSnapshot,
}

/// Drives producer and consumer threads against a fresh pipe.
pub struct ScenarioRunner<S> {
    config: ScenarioConfig,
    stats: S,
}

impl<S> ScenarioRunner<S>
where
    S: StatsSink,
{
    pub fn new(config: ScenarioConfig, stats: S) -> Self {
        Self { config, stats }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn run(&self) -> ScenarioResult<ScenarioRun> {
        if self.config.producers == 0 {
            return Err(ScenarioError::InvalidConfig(
                "at least one producer is required",
            ));
        }
        let pipe = BoundedPipe::with_config(self.config.pipe_config())?;
        info!(
            scenario = self.config.kind.name(),
            capacity = self.config.capacity,
            producers = self.config.producers,
            "scenario started"
        );

        let start = Instant::now();
        let (drained, close_outcome) = match self.config.kind {
            ScenarioKind::ImmediateClose { .. } => self.run_immediate_close(&pipe)?,
            _ => self.run_streaming(&pipe)?,
        };
        let elapsed = start.elapsed();
        debug!(
            scenario = self.config.kind.name(),
            drained = drained.len(),
            ?close_outcome,
            ?elapsed,
            "scenario finished"
        );

        Ok(ScenarioRun {
            drained,
            close_outcome,
            elapsed,
            pipe_metrics: pipe.metrics(),
        })
    }

    fn run_streaming(
        &self,
        pipe: &BoundedPipe<Item>,
    ) -> ScenarioResult<(Vec<Item>, CloseOutcome)> {
        let consumer_delay = match self.config.kind {
            ScenarioKind::Backpressure { consumer_delay, .. }
            | ScenarioKind::GracefulDrain { consumer_delay, .. } => Some(consumer_delay),
            _ => None,
        };

        thread::scope(|scope| {
            let consumer = scope.spawn(move || self.consume_all(pipe, consumer_delay));
            let producers: Vec<_> = (0..self.config.producers)
                .map(|producer| scope.spawn(move || self.produce_all(pipe, producer)))
                .collect();

            let mut produce_error = None;
            for handle in producers {
                let result = handle
                    .join()
                    .unwrap_or(Err(ScenarioError::ThreadPanicked("producer")));
                if let Err(err) = result {
                    produce_error.get_or_insert(err);
                }
            }

            // A failed producer means the run is already lost; don't wait out the grace window.
            let outcome = if produce_error.is_some() {
                pipe.immediate_close()
            } else {
                pipe.graceful_close(self.config.grace_window)
            };
            let drained = consumer
                .join()
                .map_err(|_| ScenarioError::ThreadPanicked("consumer"))?;

            match produce_error {
                Some(err) => Err(err),
                None => Ok((drained, outcome)),
            }
        })
    }

    fn run_immediate_close(
        &self,
        pipe: &BoundedPipe<Item>,
    ) -> ScenarioResult<(Vec<Item>, CloseOutcome)> {
        let producers = self.config.producers;
        for index in 0..self.config.expected_items() {
            let item = Item {
                producer: index % producers,
                seq: index / producers,
            };
            self.produce_item(pipe, item)?;
        }

        let outcome = pipe.immediate_close();

        let late = Item {
            producer: 0,
            seq: u32::MAX,
        };
        match self.produce_item(pipe, late) {
            Err(ScenarioError::Pipe(PipeError::Closed)) => {}
            Ok(()) => return Err(ScenarioError::ClosedPipeAccepted),
            Err(err) => return Err(err),
        }

        let drained = self.consume_all(pipe, None);
        Ok((drained, outcome))
    }

    fn produce_all(&self, pipe: &BoundedPipe<Item>, producer: u32) -> ScenarioResult<()> {
        match self.config.kind {
            ScenarioKind::Burst { bursts, burst_size } => {
                for burst in 0..bursts {
                    for offset in 0..burst_size {
                        let seq = burst * burst_size + offset;
                        self.produce_item(pipe, Item { producer, seq })?;
                    }
                    thread::sleep(BURST_PAUSE);
                }
                Ok(())
            }
            kind => {
                for seq in 0..kind.items_per_producer() {
                    self.produce_item(pipe, Item { producer, seq })?;
                }
                Ok(())
            }
        }
    }

    fn produce_item(&self, pipe: &BoundedPipe<Item>, item: Item) -> ScenarioResult<()> {
        let mut full_waits = 0u32;
        let mut timeouts = 0u32;
        let result = match pipe.try_produce(item) {
            Ok(()) => Ok(()),
            Err(err) if *err.kind() == PipeError::Timeout => {
                full_waits += 1;
                let mut item = err.into_item();
                loop {
                    match pipe.produce(item, self.config.timeout) {
                        Ok(()) => break Ok(()),
                        Err(err) if *err.kind() == PipeError::Timeout => {
                            timeouts += 1;
                            if timeouts >= MAX_PRODUCE_RETRIES {
                                break Err(PipeError::Timeout);
                            }
                            item = err.into_item();
                        }
                        Err(err) => break Err(PipeError::from(err)),
                    }
                }
            }
            Err(err) => Err(PipeError::from(err)),
        };

        let depth = pipe.len();
        self.stats.with_stats(|stats| {
            stats.full_waits = wrapping_add(stats.full_waits, full_waits);
            stats.produce_timeouts = wrapping_add(stats.produce_timeouts, timeouts);
            match &result {
                Ok(()) => {
                    stats.produced = wrapping_add(stats.produced, 1);
                    stats.max_depth = stats.max_depth.max(depth);
                }
                Err(_) => stats.rejected = wrapping_add(stats.rejected, 1),
            }
        });
        result.map_err(ScenarioError::from)
    }

    fn consume_all(&self, pipe: &BoundedPipe<Item>, delay: Option<Duration>) -> Vec<Item> {
        let mut drained = Vec::with_capacity(self.config.expected_items() as usize);
        for result in pipe.stream(self.config.timeout) {
            match result {
                Ok(item) => {
                    drained.push(item);
                    self.stats
                        .with_stats(|stats| stats.consumed = wrapping_add(stats.consumed, 1));
                    if let Some(delay) = delay {
                        thread::sleep(delay);
                    }
                }
                Err(PipeError::Timeout) => {
                    self.stats.with_stats(|stats| {
                        stats.consume_timeouts = wrapping_add(stats.consume_timeouts, 1)
                    });
                }
                Err(err) => {
                    debug!(%err, "consumer stopped");
                    break;
                }
            }
        }
        drained
    }
}
