use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use crate::{
    dependency::DependencySet,
    dispatcher::Callback,
    id::ComputationId,
    runtime::Runtime,
};

/// Handle to the registration of a computation with the dispatcher.
///
/// Dropping the handle does not unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe) when the owner goes away.
#[must_use = "the computation stays subscribed until `unsubscribe` is called"]
#[derive(Clone)]
pub struct Subscription {
    runtime: Runtime,
    id: ComputationId,
    active: Rc<Cell<bool>>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}

impl Subscription {
    pub fn id(&self) -> ComputationId {
        self.id
    }

    /// Remove the computation from the dispatcher. Takes effect immediately,
    /// also for a dispatch that is already in progress.
    pub fn unsubscribe(&self) {
        self.active.set(false);
        self.runtime.unsubscribe(self.id);
    }

    pub fn is_active(&self) -> bool {
        self.active.get() && self.runtime.is_subscribed(self.id)
    }
}

/// A unit of derived work whose reads are tracked on every run.
///
/// Each [`run`](Self::run) pushes the computation on the tracking stack,
/// evaluates it and hands the dependencies it read to the dispatcher,
/// replacing those of the previous run. When one of them changes,
/// `on_invalidate` is called. The callback usually schedules another run.
pub struct Computation<R> {
    runtime: Runtime,
    id: ComputationId,
    compute: Box<dyn Fn() -> R>,
    on_invalidate: Option<Callback>,
    active: Rc<Cell<bool>>,
    last_deps: RefCell<DependencySet>,
}

impl<R> fmt::Debug for Computation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("id", &self.id)
            .field("subscribed", &self.is_subscribed())
            .finish()
    }
}

impl<R> Computation<R> {
    /// Create a computation. Nothing is evaluated until the first `run`.
    pub fn new(
        runtime: &Runtime,
        compute: impl Fn() -> R + 'static,
        on_invalidate: impl Fn() + 'static,
    ) -> Self {
        Self {
            runtime: runtime.clone(),
            id: ComputationId::next(),
            compute: Box::new(compute),
            on_invalidate: Some(Rc::new(on_invalidate)),
            active: Rc::new(Cell::new(true)),
            last_deps: RefCell::new(DependencySet::new()),
        }
    }

    /// A computation that records its reads but never subscribes.
    pub fn one_shot(runtime: &Runtime, compute: impl Fn() -> R + 'static) -> Self {
        Self {
            runtime: runtime.clone(),
            id: ComputationId::next(),
            compute: Box::new(compute),
            on_invalidate: None,
            active: Rc::new(Cell::new(false)),
            last_deps: RefCell::new(DependencySet::new()),
        }
    }

    pub fn id(&self) -> ComputationId {
        self.id
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Evaluate, re-tracking from scratch.
    pub fn run(&self) -> R {
        let (result, deps) = self.runtime.run_tracked(self.id, &self.compute);
        if let Some(callback) = &self.on_invalidate {
            if self.active.get() {
                self.runtime.subscribe(self.id, deps.clone(), callback.clone());
            }
        }
        *self.last_deps.borrow_mut() = deps;
        result
    }

    /// Stop receiving invalidations. Later runs still evaluate but do not
    /// subscribe again.
    pub fn unsubscribe(&self) {
        self.active.set(false);
        self.runtime.unsubscribe(self.id);
    }

    pub fn is_subscribed(&self) -> bool {
        self.active.get() && self.runtime.is_subscribed(self.id)
    }

    /// What the last run read.
    pub fn dependencies(&self) -> DependencySet {
        self.last_deps.borrow().clone()
    }

    pub fn subscription(&self) -> Subscription {
        Subscription {
            runtime: self.runtime.clone(),
            id: self.id,
            active: self.active.clone(),
        }
    }
}

/// Evaluate `compute` once while tracking, then subscribe `on_invalidate` to
/// everything it read.
///
/// `on_invalidate` is called at most once per dispatch. It is not re-tracked:
/// to keep observing, run the work again through a new call or use a
/// [`Computation`].
pub fn track_and_subscribe<R>(
    runtime: &Runtime,
    compute: impl FnOnce() -> R,
    on_invalidate: impl Fn() + 'static,
) -> (R, Subscription) {
    let id = ComputationId::next();
    let (result, deps) = runtime.run_tracked(id, compute);
    runtime.subscribe(id, deps, Rc::new(on_invalidate));
    let subscription = Subscription {
        runtime: runtime.clone(),
        id,
        active: Rc::new(Cell::new(true)),
    };
    (result, subscription)
}
