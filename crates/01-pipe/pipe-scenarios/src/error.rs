use thiserror::Error;

use pipe::PipeError;

pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("pipe error: {0}")]
    Pipe(#[from] PipeError),

    #[error("invalid scenario configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("{0} thread panicked")]
    ThreadPanicked(&'static str),

    #[error("closed pipe accepted an item")]
    ClosedPipeAccepted,
}
