//! The pipe consumed as a sequence through an owned handle, the way an
//! embedding layer would drive it.

use crossbeam_channel::bounded;
use pipe::{BoundedPipe, CloseOutcome, ConsumeStream, PipeError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn stream_yields_items_until_closed_empty() {
    let pipe = Arc::new(BoundedPipe::new(3).unwrap());
    let stream = ConsumeStream::new(Arc::clone(&pipe), WAIT);
    let consumer = thread::spawn(move || stream.collect::<Vec<_>>());

    for word in ["alpha", "beta", "gamma", "delta"] {
        pipe.produce(word.to_string(), WAIT).unwrap();
    }
    assert_eq!(pipe.shutdown(), CloseOutcome::Drained);

    let results = consumer.join().unwrap();
    let words: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    assert_eq!(words, ["alpha", "beta", "gamma", "delta"]);
}

#[test]
fn stream_hands_back_its_handle() {
    let pipe = Arc::new(BoundedPipe::new(2).unwrap());
    pipe.produce(1u32, WAIT).unwrap();
    let mut stream = ConsumeStream::new(Arc::clone(&pipe), WAIT);
    assert_eq!(stream.next(), Some(Ok(1)));

    let handle = stream.into_inner();
    assert!(Arc::ptr_eq(&handle, &pipe));
    assert_eq!(handle.immediate_close(), CloseOutcome::Immediate { discarded: 0 });
    assert!(pipe.is_closed());
}

#[test]
fn stream_reports_interrupt_then_continues() {
    let pipe = Arc::new(BoundedPipe::<u32>::new(1).unwrap());
    let (ready_tx, ready_rx) = bounded(0);
    let (resume_tx, resume_rx) = bounded::<()>(0);

    let consumer = {
        let pipe = Arc::clone(&pipe);
        thread::spawn(move || {
            let mut stream = ConsumeStream::new(pipe, Duration::from_secs(30));
            ready_tx.send(()).unwrap();
            let first = stream.next();
            resume_rx.recv().unwrap();
            let second = stream.next();
            let third = stream.next();
            (first, second, third)
        })
    };

    ready_rx.recv().unwrap();
    // The consumer may not have parked yet; interrupt until it reports back.
    loop {
        pipe.interrupt();
        match resume_tx.send_timeout((), Duration::from_millis(10)) {
            Ok(()) => break,
            Err(_) => continue,
        }
    }
    pipe.produce(7, WAIT).unwrap();
    pipe.immediate_close();

    let (first, second, third) = consumer.join().unwrap();
    assert_eq!(first, Some(Err(PipeError::Interrupted)));
    // Either the item is observed before the close or discarded by it.
    match second {
        Some(Ok(7)) => assert_eq!(third, None),
        None => assert_eq!(third, None),
        other => panic!("unexpected stream item {other:?}"),
    }
}
