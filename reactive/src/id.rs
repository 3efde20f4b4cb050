use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A stable identifier for a computation.
pub struct ComputationId(u64);

impl ComputationId {
    pub fn next() -> ComputationId {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        ComputationId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ComputationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
