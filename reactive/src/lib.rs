//! # remx_reactive
//!
//! The tracking core of remx: a registry of interned state paths, a stack of
//! active computations that reads are attributed to, and a dispatcher that
//! maps writes back to the computations that read the written paths.
//!
//! All of it lives behind a [`Runtime`] handle. A runtime is single-threaded
//! and every store is bound to the runtime it was created with.

mod computation;
mod config;
mod dependency;
mod dispatcher;
mod error;
mod id;
mod path;
mod reporter;
mod runtime;
mod tracking;

pub use computation::{track_and_subscribe, Computation, Subscription};
pub use config::{ReportUntracked, RuntimeConfig};
pub use dependency::{Change, Dependency, DependencySet};
pub use dispatcher::{Callback, Dispatcher};
pub use error::{FrameKind, TrackingError};
pub use id::ComputationId;
pub use path::{Key, Path, PathId, PathRegistry};
pub use reporter::{
    untracked_access_message, RecordingReporter, TracingReporter, UntrackedAccessReporter,
};
pub use runtime::{Runtime, TrackingGuard};
pub use tracking::{ReadOutcome, TrackingStack};
