use parking_lot::Mutex;
use pipe_scenarios::{
    verify_backpressure, verify_burst, verify_flood, verify_immediate_close, verify_run,
    ArcStatsSink, ScenarioConfig, ScenarioError, ScenarioKind, ScenarioRun, ScenarioRunner,
    ScenarioStats, StatsSink,
};
use std::sync::Arc;
use std::time::Duration;

fn run(config: ScenarioConfig) -> (ScenarioRun, ScenarioStats) {
    let sink = ArcStatsSink::new(Arc::new(Mutex::new(ScenarioStats::default())));
    let runner = ScenarioRunner::new(config, sink.clone());
    let outcome = runner.run().expect("scenario run");
    (outcome, sink.snapshot())
}

#[test]
fn native_pipe_flood_items() {
    const ITEM_TARGET: u32 = 10_000;
    let config = ScenarioConfig::flood(ITEM_TARGET).capacity(8);
    let (outcome, stats) = run(config);
    verify_flood(&outcome.report(1), &stats, ITEM_TARGET).expect("flood verification");
    assert_eq!(outcome.pipe_metrics.produced, u64::from(ITEM_TARGET));
    assert_eq!(outcome.pipe_metrics.discarded, 0);
}

#[test]
fn native_pipe_flood_many_producers() {
    const PER_PRODUCER: u32 = 2_000;
    let config = ScenarioConfig::flood(PER_PRODUCER).capacity(4).producers(4);
    let (outcome, stats) = run(config);
    verify_flood(&outcome.report(4), &stats, PER_PRODUCER).expect("flood verification");
}

#[test]
fn native_pipe_burst_respects_capacity() {
    const BURSTS: u32 = 20;
    const BURST_SIZE: u32 = 50;
    const CAPACITY: usize = 16;
    let config = ScenarioConfig::burst(BURSTS, BURST_SIZE)
        .capacity(CAPACITY)
        .producers(2);
    let (outcome, stats) = run(config);
    verify_burst(&outcome.report(2), &stats, BURSTS * BURST_SIZE, CAPACITY)
        .expect("burst verification");
    assert!(stats.max_depth <= CAPACITY);
}

#[test]
fn native_pipe_backpressure_blocks_producers() {
    const ITEM_TARGET: u32 = 200;
    let config = ScenarioConfig::backpressure(ITEM_TARGET).capacity(2);
    let (outcome, stats) = run(config);
    verify_backpressure(&outcome.report(1), &stats, ITEM_TARGET)
        .expect("backpressure verification");
    assert!(stats.full_waits > 0);
}

#[test]
fn native_pipe_graceful_drain_delivers_backlog() {
    let config = ScenarioConfig::graceful_drain(100).capacity(32);
    let (outcome, stats) = run(config);
    verify_run(&config, &outcome, &stats).expect("graceful drain verification");
    assert!(outcome.close_outcome.is_clean());
}

#[test]
fn native_pipe_immediate_close_discards() {
    let config = ScenarioConfig::immediate_close(10).capacity(5).producers(2);
    let (outcome, stats) = run(config);
    verify_immediate_close(&outcome.report(2), &stats, 5).expect("immediate close verification");
    assert_eq!(outcome.pipe_metrics.discarded, 5);
    assert_eq!(outcome.pipe_metrics.rejected, 1);
    // The drain after the close ends on one closed-and-empty consume.
    assert_eq!(outcome.pipe_metrics.closed_empty, 1);
}

#[test]
fn native_pipe_short_grace_window_is_reported() {
    // A consumer far slower than the grace window leaves items behind.
    let config = ScenarioConfig::new(ScenarioKind::GracefulDrain {
        items: 50,
        consumer_delay: Duration::from_millis(20),
    })
    .capacity(64)
    .grace_window(Duration::from_millis(20));
    let (outcome, stats) = run(config);
    let err = verify_run(&config, &outcome, &stats).unwrap_err();
    assert!(err.contains("drained") || err.contains("Forced"), "{err}");
    assert!(outcome.close_outcome.discarded() > 0);
}

#[test]
fn zero_producers_is_rejected() {
    let config = ScenarioConfig::flood(1).producers(0);
    let runner = ScenarioRunner::new(config, Arc::new(Mutex::new(ScenarioStats::default())));
    assert!(matches!(runner.run(), Err(ScenarioError::InvalidConfig(_))));
}

#[test]
fn zero_capacity_is_rejected() {
    let config = ScenarioConfig::flood(1).capacity(0);
    let runner = ScenarioRunner::new(config, Arc::new(Mutex::new(ScenarioStats::default())));
    assert!(matches!(
        runner.run(),
        Err(ScenarioError::Pipe(pipe::PipeError::InvalidCapacity { requested: 0 }))
    ));
}
