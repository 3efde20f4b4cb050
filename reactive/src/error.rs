use thiserror::Error;

use crate::id::ComputationId;

/// Violations of the tracking stack discipline.
///
/// These are programming errors: once the stack is out of balance every later
/// read would be attributed to the wrong computation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    #[error("tracking stack imbalance: ending {expected} but {found} is on top")]
    StackImbalance { expected: FrameKind, found: FrameKind },
    #[error("tracking stack imbalance: ending {expected} but the stack is empty")]
    EmptyStack { expected: FrameKind },
}

/// The kind of a frame on the tracking stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Tracked(ComputationId),
    Untracked,
    Render,
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::Tracked(id) => write!(f, "computation {id}"),
            FrameKind::Untracked => f.write_str("an untracked frame"),
            FrameKind::Render => f.write_str("an unconnected render frame"),
        }
    }
}
