//! Diagnostics for state reads that happen outside of any computation.

use std::{cell::RefCell, rc::Rc};

/// Build the diagnostic for an untracked read of `property`.
///
/// The wording (including the spelling) is relied upon by existing consumers.
pub fn untracked_access_message(property: &str) -> String {
    format!("[REMX] attemted to access prop '{property}' in react component untracked by remx")
}

/// Receives one call per untracked property read.
///
/// Reporting is advisory: it must not fail and it must not touch the store.
pub trait UntrackedAccessReporter {
    fn report(&self, property: &str);
}

/// Emits every report as a `tracing` warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl UntrackedAccessReporter for TracingReporter {
    fn report(&self, property: &str) {
        tracing::warn!(target: "remx", "{}", untracked_access_message(property));
    }
}

/// Keeps every message in memory, in the order it was reported.
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    messages: Rc<RefCell<Vec<String>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// Return the recorded messages and forget them.
    pub fn take(&self) -> Vec<String> {
        self.messages.take()
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }
}

impl UntrackedAccessReporter for RecordingReporter {
    fn report(&self, property: &str) {
        self.messages
            .borrow_mut()
            .push(untracked_access_message(property));
    }
}
