/// Lifecycle of a pipe. Transitions only move forward:
/// `Open -> Closing -> Closed` or `Open/Closing -> Closed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipeState {
    /// Accepting produces and consumes.
    Open,
    /// A graceful close is waiting for consumers to drain the buffer.
    Closing,
    /// Terminal. The buffer is empty and stays empty.
    Closed(CloseOutcome),
}

impl PipeState {
    pub fn is_open(&self) -> bool {
        matches!(self, PipeState::Open)
    }

    pub fn is_closing(&self) -> bool {
        matches!(self, PipeState::Closing)
    }

    pub fn close_outcome(&self) -> Option<CloseOutcome> {
        match self {
            PipeState::Closed(outcome) => Some(*outcome),
            PipeState::Open | PipeState::Closing => None,
        }
    }
}

/// How a pipe reached [`PipeState::Closed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Graceful close observed an empty buffer within the grace window.
    Drained,
    /// Grace window elapsed; the remaining items were dropped.
    Forced { discarded: usize },
    /// Immediate close dropped whatever was buffered.
    Immediate { discarded: usize },
}

impl CloseOutcome {
    /// Number of buffered items dropped by the close.
    pub fn discarded(&self) -> usize {
        match self {
            CloseOutcome::Drained => 0,
            CloseOutcome::Forced { discarded } | CloseOutcome::Immediate { discarded } => {
                *discarded
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.discarded() == 0
    }
}
