//! The stack of computations that reads are attributed to.

use crate::{
    dependency::{Dependency, DependencySet},
    error::{FrameKind, TrackingError},
    id::ComputationId,
};

#[derive(Debug)]
enum Frame {
    Tracked {
        id: ComputationId,
        deps: DependencySet,
    },
    /// Explicit opt-out, see [`Runtime::untrack`](crate::Runtime::untrack).
    Untracked,
    /// A render that is not connected to the runtime.
    Render,
}

impl Frame {
    fn kind(&self) -> FrameKind {
        match self {
            Frame::Tracked { id, .. } => FrameKind::Tracked(*id),
            Frame::Untracked => FrameKind::Untracked,
            Frame::Render => FrameKind::Render,
        }
    }
}

/// Where a read ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Added to the dependency set of the innermost computation.
    Recorded(ComputationId),
    /// Inside [`Runtime::untrack`](crate::Runtime::untrack); neither tracked nor reported.
    Ignored,
    /// No computation is active.
    Untracked { in_render: bool },
}

/// Strict LIFO stack of tracking frames.
///
/// Only the innermost frame receives reads, so a computation started while
/// another one runs does not leak its reads into the outer one.
#[derive(Debug, Default)]
pub struct TrackingStack {
    frames: Vec<Frame>,
}

impl TrackingStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `id` the active computation.
    pub fn begin(&mut self, id: ComputationId) {
        self.frames.push(Frame::Tracked {
            id,
            deps: DependencySet::new(),
        });
    }

    /// Pop the frame pushed by the matching [`begin`](Self::begin) and return
    /// everything it read.
    ///
    /// The stack is left untouched when the top frame does not belong to `id`.
    pub fn end(&mut self, id: ComputationId) -> Result<DependencySet, TrackingError> {
        let expected = FrameKind::Tracked(id);
        match self.frames.last() {
            Some(Frame::Tracked { id: top, .. }) if *top == id => {}
            Some(frame) => {
                return Err(TrackingError::StackImbalance {
                    expected,
                    found: frame.kind(),
                })
            }
            None => return Err(TrackingError::EmptyStack { expected }),
        }
        match self.frames.pop() {
            Some(Frame::Tracked { deps, .. }) => Ok(deps),
            _ => Err(TrackingError::EmptyStack { expected }),
        }
    }

    pub(crate) fn enter(&mut self, kind: FrameKind) {
        let frame = match kind {
            FrameKind::Tracked(id) => Frame::Tracked {
                id,
                deps: DependencySet::new(),
            },
            FrameKind::Untracked => Frame::Untracked,
            FrameKind::Render => Frame::Render,
        };
        self.frames.push(frame);
    }

    pub(crate) fn leave(&mut self, kind: FrameKind) -> Result<(), TrackingError> {
        match self.frames.last() {
            Some(frame) if frame.kind() == kind => {
                self.frames.pop();
                Ok(())
            }
            Some(frame) => Err(TrackingError::StackImbalance {
                expected: kind,
                found: frame.kind(),
            }),
            None => Err(TrackingError::EmptyStack { expected: kind }),
        }
    }

    /// Drop the top frame without checking it. Used while unwinding.
    pub(crate) fn discard_top(&mut self) {
        self.frames.pop();
    }

    /// The computation reads are currently attributed to, if any.
    pub fn current(&self) -> Option<ComputationId> {
        match self.frames.last() {
            Some(Frame::Tracked { id, .. }) => Some(*id),
            _ => None,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Attribute a read to the innermost frame.
    pub fn record(&mut self, dependency: Dependency) -> ReadOutcome {
        match self.frames.last_mut() {
            Some(Frame::Tracked { id, deps }) => {
                deps.insert(dependency);
                ReadOutcome::Recorded(*id)
            }
            Some(Frame::Untracked) => ReadOutcome::Ignored,
            Some(Frame::Render) => ReadOutcome::Untracked { in_render: true },
            None => ReadOutcome::Untracked { in_render: false },
        }
    }
}
