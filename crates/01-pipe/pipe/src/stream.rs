//! Sequence view over a pipe's consumer side.

use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::time::Duration;

use crate::error::{PipeError, PipeResult};
use crate::pipe::BoundedPipe;

/// Iterator that repeatedly consumes from a pipe.
///
/// Each successful consume yields `Ok(item)`. `Timeout` and `Interrupted`
/// are yielded as per-call errors and iteration may continue afterwards. The
/// sequence ends when the pipe reports [`PipeError::ClosedEmpty`].
///
/// `P` is any handle to the pipe: a borrow (`&BoundedPipe<T>`) or an owned
/// `Arc<BoundedPipe<T>>` that can move to another thread.
pub struct ConsumeStream<P, T> {
    pipe: P,
    timeout: Duration,
    finished: bool,
    _item: PhantomData<fn() -> T>,
}

impl<P, T> ConsumeStream<P, T>
where
    P: AsRef<BoundedPipe<T>>,
{
    pub fn new(pipe: P, timeout: Duration) -> Self {
        Self {
            pipe,
            timeout,
            finished: false,
            _item: PhantomData,
        }
    }

    /// Gives back the pipe handle, e.g. to close the pipe after iteration.
    pub fn into_inner(self) -> P {
        self.pipe
    }
}

impl<P, T> Iterator for ConsumeStream<P, T>
where
    P: AsRef<BoundedPipe<T>>,
{
    type Item = PipeResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.pipe.as_ref().consume(self.timeout) {
            Err(PipeError::ClosedEmpty) => {
                self.finished = true;
                None
            }
            other => Some(other),
        }
    }
}

impl<P, T> FusedIterator for ConsumeStream<P, T> where P: AsRef<BoundedPipe<T>> {}
