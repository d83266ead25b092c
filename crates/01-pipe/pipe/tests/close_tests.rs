//! Immediate and graceful close semantics, including wakeups of blocked callers.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pipe::{BoundedPipe, CloseOutcome, PipeConfig, PipeError, PipeState, DEFAULT_GRACE_WINDOW};

const WAIT: Duration = Duration::from_secs(5);
/// Upper bound for "returned promptly" checks; far below any timeout in use.
const PROMPT: Duration = Duration::from_secs(2);

fn pipe_with_two_items() -> Arc<BoundedPipe<&'static str>> {
    let pipe = Arc::new(BoundedPipe::new(5).unwrap());
    pipe.produce("first", WAIT).unwrap();
    pipe.produce("second", WAIT).unwrap();
    pipe
}

#[test]
fn immediate_close_discards_and_rejects() {
    let pipe = pipe_with_two_items();
    assert_eq!(
        pipe.immediate_close(),
        CloseOutcome::Immediate { discarded: 2 }
    );
    assert!(pipe.is_closed());
    assert!(pipe.is_empty());

    let start = Instant::now();
    assert_eq!(pipe.consume(WAIT), Err(PipeError::ClosedEmpty));
    let err = pipe.produce("late", WAIT).unwrap_err();
    assert_eq!(err.kind(), &PipeError::Closed);
    assert!(start.elapsed() < PROMPT, "closed pipe must fail without waiting");
    assert!(pipe.is_empty());
}

#[test]
fn graceful_close_forces_after_grace_window() {
    let pipe = pipe_with_two_items();
    let grace = Duration::from_millis(300);

    let start = Instant::now();
    let outcome = pipe.graceful_close(grace);
    assert!(start.elapsed() >= grace);
    assert_eq!(outcome, CloseOutcome::Forced { discarded: 2 });
    assert!(pipe.is_closed());
    assert!(pipe.is_empty());
    assert_eq!(pipe.close_outcome(), Some(outcome));
    assert_eq!(pipe.metrics().discarded, 2);
}

#[test]
#[ignore]
fn slow_graceful_close_uses_default_grace_window() {
    let pipe = pipe_with_two_items();
    let start = Instant::now();
    let outcome = pipe.shutdown();
    assert!(start.elapsed() >= DEFAULT_GRACE_WINDOW);
    assert_eq!(outcome, CloseOutcome::Forced { discarded: 2 });
}

#[test]
fn graceful_close_returns_when_consumer_drains() {
    let pipe = pipe_with_two_items();
    let consumer = {
        let pipe = Arc::clone(&pipe);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            let first = pipe.consume(WAIT);
            let second = pipe.consume(WAIT);
            (first, second)
        })
    };

    let start = Instant::now();
    let outcome = pipe.graceful_close(DEFAULT_GRACE_WINDOW);
    assert!(start.elapsed() < DEFAULT_GRACE_WINDOW / 2);
    assert_eq!(outcome, CloseOutcome::Drained);
    assert_eq!(consumer.join().unwrap(), (Ok("first"), Ok("second")));
    assert_eq!(pipe.consume(WAIT), Err(PipeError::ClosedEmpty));
}

#[test]
fn closing_pipe_rejects_produce_but_serves_consume() {
    let pipe = pipe_with_two_items();
    let closer = {
        let pipe = Arc::clone(&pipe);
        thread::spawn(move || pipe.graceful_close(WAIT))
    };
    while pipe.state() == PipeState::Open {
        thread::yield_now();
    }
    assert!(pipe.is_closed());
    assert_eq!(
        pipe.produce("late", WAIT).unwrap_err().kind(),
        &PipeError::Closed
    );
    assert_eq!(pipe.consume(WAIT), Ok("first"));
    assert_eq!(pipe.consume(WAIT), Ok("second"));
    assert_eq!(closer.join().unwrap(), CloseOutcome::Drained);
}

#[test]
fn immediate_close_wakes_blocked_producer() {
    let pipe = Arc::new(BoundedPipe::new(1).unwrap());
    pipe.produce(0u32, WAIT).unwrap();
    let producer = {
        let pipe = Arc::clone(&pipe);
        thread::spawn(move || {
            let start = Instant::now();
            (pipe.produce(1, Duration::from_secs(60)), start.elapsed())
        })
    };
    thread::sleep(Duration::from_millis(50));
    pipe.immediate_close();

    let (result, elapsed) = producer.join().unwrap();
    let err = result.unwrap_err();
    assert_eq!(err.kind(), &PipeError::Closed);
    assert_eq!(err.into_item(), 1);
    assert!(elapsed < PROMPT + Duration::from_millis(50));
}

#[test]
fn graceful_close_wakes_blocked_producer() {
    let pipe = Arc::new(BoundedPipe::new(1).unwrap());
    pipe.produce(0u32, WAIT).unwrap();
    let producer = {
        let pipe = Arc::clone(&pipe);
        thread::spawn(move || {
            let start = Instant::now();
            (pipe.produce(1, Duration::from_secs(60)), start.elapsed())
        })
    };
    thread::sleep(Duration::from_millis(50));
    let outcome = pipe.graceful_close(Duration::from_millis(300));
    assert_eq!(outcome, CloseOutcome::Forced { discarded: 1 });

    let (result, elapsed) = producer.join().unwrap();
    let err = result.unwrap_err();
    assert_eq!(err.kind(), &PipeError::Closed);
    assert_eq!(err.into_item(), 1);
    assert!(elapsed < PROMPT + Duration::from_millis(50));
    assert_eq!(pipe.metrics().rejected, 1);
}

#[test]
fn close_wakes_blocked_consumers() {
    for graceful in [false, true] {
        let pipe = Arc::new(BoundedPipe::<u32>::new(1).unwrap());
        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let pipe = Arc::clone(&pipe);
                thread::spawn(move || {
                    let start = Instant::now();
                    (pipe.consume(Duration::from_secs(60)), start.elapsed())
                })
            })
            .collect();
        thread::sleep(Duration::from_millis(50));
        if graceful {
            assert_eq!(pipe.graceful_close(WAIT), CloseOutcome::Drained);
        } else {
            assert_eq!(
                pipe.immediate_close(),
                CloseOutcome::Immediate { discarded: 0 }
            );
        }
        for consumer in consumers {
            let (result, elapsed) = consumer.join().unwrap();
            assert_eq!(result, Err(PipeError::ClosedEmpty));
            assert!(elapsed < PROMPT + Duration::from_millis(50));
        }
    }
}

#[test]
fn immediate_close_preempts_graceful_close() {
    let pipe = pipe_with_two_items();
    let closer = {
        let pipe = Arc::clone(&pipe);
        thread::spawn(move || pipe.graceful_close(Duration::from_secs(60)))
    };
    while !pipe.state().is_closing() {
        thread::yield_now();
    }
    let outcome = pipe.immediate_close();
    assert_eq!(outcome, CloseOutcome::Immediate { discarded: 2 });
    assert_eq!(closer.join().unwrap(), outcome);
}

#[test]
fn concurrent_graceful_closes_agree_on_outcome() {
    let pipe = pipe_with_two_items();
    let closers: Vec<_> = (0..2)
        .map(|_| {
            let pipe = Arc::clone(&pipe);
            thread::spawn(move || pipe.graceful_close(Duration::from_millis(200)))
        })
        .collect();
    let outcomes: Vec<_> = closers.into_iter().map(|c| c.join().unwrap()).collect();
    assert_eq!(outcomes[0], outcomes[1]);
    assert_eq!(outcomes[0], CloseOutcome::Forced { discarded: 2 });
}

#[test]
fn configured_grace_window_drives_shutdown() {
    let config = PipeConfig::with_capacity(2).grace_window(Duration::from_millis(100));
    let pipe = BoundedPipe::with_config(config).unwrap();
    pipe.produce(1u8, WAIT).unwrap();
    assert_eq!(pipe.grace_window(), Duration::from_millis(100));
    assert_eq!(pipe.shutdown(), CloseOutcome::Forced { discarded: 1 });
}
