use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use indexmap::IndexSet;

use crate::{
    config::RuntimeConfig,
    dependency::{Change, Dependency, DependencySet},
    dispatcher::{Callback, Dispatcher},
    error::{FrameKind, TrackingError},
    id::ComputationId,
    path::{Key, Path, PathId, PathRegistry},
    reporter::{TracingReporter, UntrackedAccessReporter},
    tracking::{ReadOutcome, TrackingStack},
};

struct RuntimeInner {
    config: RuntimeConfig,
    registry: RefCell<PathRegistry>,
    stack: RefCell<TrackingStack>,
    dispatcher: RefCell<Dispatcher>,
    reporter: Box<dyn UntrackedAccessReporter>,
    batch_depth: Cell<usize>,
    pending_changes: RefCell<IndexSet<Change>>,
}

/// The reactive runtime: path registry, tracking stack and dispatcher of one
/// thread of control.
///
/// A `Runtime` is a cheap `Rc` handle and is neither `Send` nor `Sync`. Every
/// thread or event loop that hosts state creates its own, and every store is
/// bound to the runtime it was created with.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("depth", &self.inner.stack.borrow().depth())
            .field("dispatcher", &*self.inner.dispatcher.borrow())
            .finish()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_reporter(config, TracingReporter)
    }

    pub fn with_reporter(
        config: RuntimeConfig,
        reporter: impl UntrackedAccessReporter + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                config,
                registry: RefCell::new(PathRegistry::new()),
                stack: RefCell::new(TrackingStack::new()),
                dispatcher: RefCell::new(Dispatcher::new()),
                reporter: Box::new(reporter),
                batch_depth: Cell::new(0),
                pending_changes: RefCell::new(IndexSet::new()),
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    // ---- paths ----

    pub fn new_root_path(&self) -> PathId {
        self.inner.registry.borrow_mut().new_root()
    }

    pub fn child_path(&self, parent: PathId, key: &Key) -> PathId {
        self.inner.registry.borrow_mut().child(parent, key)
    }

    pub fn path(&self, id: PathId) -> Path {
        self.inner.registry.borrow().path(id)
    }

    // ---- tracking ----

    /// Push `id` as the active computation. Must be matched by exactly one
    /// [`end_tracking`](Self::end_tracking); prefer [`tracking`](Self::tracking),
    /// which also pops on unwinding.
    pub fn begin_tracking(&self, id: ComputationId) {
        self.inner.stack.borrow_mut().begin(id);
    }

    /// Pop the frame of `id` and return what it read.
    pub fn end_tracking(&self, id: ComputationId) -> Result<DependencySet, TrackingError> {
        self.inner.stack.borrow_mut().end(id)
    }

    /// Push `id` and return a guard that pops it again.
    pub fn tracking(&self, id: ComputationId) -> TrackingGuard {
        self.begin_tracking(id);
        TrackingGuard {
            runtime: self.clone(),
            id,
            finished: false,
        }
    }

    pub fn current_computation(&self) -> Option<ComputationId> {
        self.inner.stack.borrow().current()
    }

    pub fn tracking_depth(&self) -> usize {
        self.inner.stack.borrow().depth()
    }

    /// Run `f` as a one-shot computation and return everything it read.
    /// Nothing is subscribed.
    pub fn track<R>(&self, f: impl FnOnce() -> R) -> (R, DependencySet) {
        self.run_tracked(ComputationId::next(), f)
    }

    pub(crate) fn run_tracked<R>(
        &self,
        id: ComputationId,
        f: impl FnOnce() -> R,
    ) -> (R, DependencySet) {
        let guard = self.tracking(id);
        let result = f();
        (result, guard.finish())
    }

    /// Run `f` without tracking or reporting any read.
    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = ScopeGuard::enter(self, FrameKind::Untracked);
        f()
    }

    /// Run `f` as the render of a component that is not connected: nothing is
    /// tracked and every read is reported.
    pub fn render_untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = ScopeGuard::enter(self, FrameKind::Render);
        f()
    }

    /// Record a read of `dependency`, reporting `key` when no computation is
    /// active.
    pub fn record_read(&self, dependency: Dependency, key: &Key) {
        let outcome = self.inner.stack.borrow_mut().record(dependency);
        if let ReadOutcome::Untracked { in_render } = outcome {
            if self.inner.config.report_untracked.should_report(in_render) {
                self.inner.reporter.report(&key.to_string());
            }
        }
    }

    /// Record a read that has no property name, e.g. listing a node's keys.
    pub fn record_keys(&self, dependency: Dependency) {
        self.inner.stack.borrow_mut().record(dependency);
    }

    // ---- subscriptions ----

    pub fn subscribe(&self, id: ComputationId, deps: DependencySet, callback: Callback) {
        tracing::trace!(target: "remx", computation = %id, deps = deps.len(), "run complete");
        self.inner
            .dispatcher
            .borrow_mut()
            .on_run_complete(id, deps, callback);
    }

    pub fn unsubscribe(&self, id: ComputationId) -> bool {
        let removed = self.inner.dispatcher.borrow_mut().unsubscribe(id);
        if removed {
            tracing::trace!(target: "remx", computation = %id, "unsubscribed");
        }
        removed
    }

    pub fn is_subscribed(&self, id: ComputationId) -> bool {
        self.inner.dispatcher.borrow().is_subscribed(id)
    }

    pub fn dependencies(&self, id: ComputationId) -> Option<DependencySet> {
        self.inner.dispatcher.borrow().dependencies(id).cloned()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.dispatcher.borrow().len()
    }

    // ---- notification ----

    /// Invalidate every computation affected by `changes`.
    ///
    /// Inside [`batch`](Self::batch) the changes are queued until the outermost
    /// batch ends.
    pub fn notify(&self, changes: impl IntoIterator<Item = Change>) {
        if self.inner.batch_depth.get() > 0 {
            self.inner.pending_changes.borrow_mut().extend(changes);
            return;
        }
        let changes: Vec<_> = changes.into_iter().collect();
        self.dispatch(&changes);
    }

    fn dispatch(&self, changes: &[Change]) {
        if changes.is_empty() {
            return;
        }
        // Collect first and release every borrow: callbacks re-run
        // computations, which read the store and subscribe again.
        let affected = {
            let registry = self.inner.registry.borrow();
            self.inner.dispatcher.borrow().on_write(changes, &registry)
        };
        for (id, callback) in affected {
            // an earlier callback may have unsubscribed this one
            if !self.is_subscribed(id) {
                continue;
            }
            tracing::trace!(target: "remx", computation = %id, "invalidated");
            callback();
        }
    }

    /// Run `f` and dispatch the changes it makes once, at the end of the
    /// outermost batch. A computation affected by several of them is
    /// invalidated once.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        let depth = self.inner.batch_depth.get();
        self.inner.batch_depth.set(depth + 1);
        let guard = BatchGuard { runtime: self };
        let result = f();
        drop(guard);

        if depth == 0 {
            let pending: Vec<_> = self.inner.pending_changes.take().into_iter().collect();
            self.dispatch(&pending);
        }
        result
    }

    pub fn is_batching(&self) -> bool {
        self.inner.batch_depth.get() > 0
    }
}

struct BatchGuard<'a> {
    runtime: &'a Runtime,
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        let depth = &self.runtime.inner.batch_depth;
        depth.set(depth.get().saturating_sub(1));
        if std::thread::panicking() && depth.get() == 0 {
            self.runtime.inner.pending_changes.borrow_mut().clear();
        }
    }
}

/// Scoped tracking frame of one computation, created by [`Runtime::tracking`].
///
/// Dropping the guard pops the frame, also while unwinding out of the
/// computation.
#[must_use = "dropping the guard ends tracking immediately"]
pub struct TrackingGuard {
    runtime: Runtime,
    id: ComputationId,
    finished: bool,
}

impl TrackingGuard {
    pub fn id(&self) -> ComputationId {
        self.id
    }

    /// Pop the frame and return the dependencies recorded in it.
    ///
    /// # Panics
    ///
    /// Panics if another frame is on top of the stack, which means some
    /// nested frame was never ended.
    pub fn finish(mut self) -> DependencySet {
        self.finished = true;
        match self.runtime.end_tracking(self.id) {
            Ok(deps) => deps,
            Err(err) => panic!("{err}"),
        }
    }
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if std::thread::panicking() {
            // inner guards have already popped their frames
            if let Err(err) = self.runtime.end_tracking(self.id) {
                tracing::error!(target: "remx", %err, "while unwinding");
                self.runtime.inner.stack.borrow_mut().discard_top();
            }
            return;
        }
        if let Err(err) = self.runtime.end_tracking(self.id) {
            panic!("{err}");
        }
    }
}

struct ScopeGuard<'a> {
    runtime: &'a Runtime,
    kind: FrameKind,
}

impl<'a> ScopeGuard<'a> {
    fn enter(runtime: &'a Runtime, kind: FrameKind) -> Self {
        runtime.inner.stack.borrow_mut().enter(kind);
        Self { runtime, kind }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        let result = self.runtime.inner.stack.borrow_mut().leave(self.kind);
        if let Err(err) = result {
            if std::thread::panicking() {
                tracing::error!(target: "remx", %err, "while unwinding");
                self.runtime.inner.stack.borrow_mut().discard_top();
            } else {
                panic!("{err}");
            }
        }
    }
}
