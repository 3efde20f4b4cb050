//! Binding renders to the reactive runtime.
//!
//! A render is any `Fn() -> R`. [`connect`] runs it as a tracked computation
//! and re-renders when something it read changes. [`render_unconnected`] runs
//! it the way a component that was never connected renders: nothing is
//! tracked and every read is reported.

use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

use remx_reactive::{Computation, ComputationId, Runtime};

/// What a connected render does when it is invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rerender {
    /// Render again from inside the dispatch.
    #[default]
    Immediate,
    /// Only mark the render dirty; the host calls [`Connected::flush`].
    Deferred,
}

struct ConnectedInner<R> {
    computation: Computation<R>,
    output: RefCell<R>,
    render_count: Cell<usize>,
    dirty: Cell<bool>,
    rendering: Cell<bool>,
    mounted: Cell<bool>,
    mode: Rerender,
}

/// Clears the `rendering` flag when the render returns or unwinds.
struct RenderingGuard<'a>(&'a Cell<bool>);

impl<'a> RenderingGuard<'a> {
    fn enter(rendering: &'a Cell<bool>) -> Self {
        rendering.set(true);
        Self(rendering)
    }
}

impl Drop for RenderingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Catch-up renders allowed after one invalidation. A render that keeps
/// invalidating itself stops here and is left dirty.
const MAX_CATCH_UP_RENDERS: usize = 32;

impl<R> ConnectedInner<R> {
    fn render(&self) {
        for _ in 0..=MAX_CATCH_UP_RENDERS {
            self.dirty.set(false);
            let output = {
                let _rendering = RenderingGuard::enter(&self.rendering);
                self.computation.run()
            };

            match self.output.try_borrow_mut() {
                Ok(mut slot) => {
                    *slot = output;
                    self.render_count.set(self.render_count.get() + 1);
                    tracing::trace!(
                        target: "remx",
                        computation = %self.computation.id(),
                        renders = self.render_count.get(),
                        "rendered"
                    );
                }
                // the host is looking at the previous output right now
                Err(_) => {
                    self.dirty.set(true);
                    return;
                }
            }

            // invalidated by a write made while it was rendering
            let stale = self.dirty.get() && self.mounted.get();
            if !stale || self.mode == Rerender::Deferred {
                return;
            }
        }
        tracing::warn!(
            target: "remx",
            computation = %self.computation.id(),
            "render keeps invalidating itself, leaving it dirty"
        );
    }

    fn invalidate(&self) {
        if !self.mounted.get() {
            return;
        }
        let busy = self.rendering.get() || self.output.try_borrow_mut().is_err();
        if busy || self.mode == Rerender::Deferred {
            self.dirty.set(true);
        } else {
            self.render();
        }
    }
}

impl<R> Drop for ConnectedInner<R> {
    fn drop(&mut self) {
        self.computation.unsubscribe();
    }
}

/// A render connected to a runtime, see [`connect`].
///
/// Dropping the last handle unmounts it.
pub struct Connected<R> {
    inner: Rc<ConnectedInner<R>>,
}

impl<R> Clone for Connected<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R> std::fmt::Debug for Connected<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connected")
            .field("id", &self.inner.computation.id())
            .field("renders", &self.inner.render_count.get())
            .field("dirty", &self.inner.dirty.get())
            .field("mounted", &self.inner.mounted.get())
            .finish()
    }
}

/// Run `render` now as a tracked computation and again every time something
/// it read changes.
///
/// Every render re-tracks, so only the reads of the latest render matter.
pub fn connect<R: 'static>(runtime: &Runtime, render: impl Fn() -> R + 'static) -> Connected<R> {
    connect_with(runtime, Rerender::Immediate, render)
}

/// [`connect`] with an explicit [`Rerender`] mode.
pub fn connect_with<R: 'static>(
    runtime: &Runtime,
    mode: Rerender,
    render: impl Fn() -> R + 'static,
) -> Connected<R> {
    let inner = Rc::new_cyclic(|weak: &Weak<ConnectedInner<R>>| {
        let weak = weak.clone();
        let computation = Computation::new(runtime, render, move || {
            if let Some(inner) = weak.upgrade() {
                inner.invalidate();
            }
        });
        let output = computation.run();
        ConnectedInner {
            computation,
            output: RefCell::new(output),
            render_count: Cell::new(1),
            dirty: Cell::new(false),
            rendering: Cell::new(false),
            mounted: Cell::new(true),
            mode,
        }
    });
    tracing::debug!(target: "remx", computation = %inner.computation.id(), "connected");
    Connected { inner }
}

impl<R> Connected<R> {
    pub fn id(&self) -> ComputationId {
        self.inner.computation.id()
    }

    /// A copy of the latest output.
    pub fn output(&self) -> R
    where
        R: Clone,
    {
        self.inner.output.borrow().clone()
    }

    pub fn with_output<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&self.inner.output.borrow())
    }

    /// How many times the render ran, including the first run.
    pub fn render_count(&self) -> usize {
        self.inner.render_count.get()
    }

    /// Whether an invalidation is waiting for [`flush`](Self::flush).
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// Render again if invalidated since the last render. Returns whether it
    /// rendered.
    pub fn flush(&self) -> bool {
        if !self.inner.dirty.get() || !self.inner.mounted.get() {
            return false;
        }
        self.inner.render();
        true
    }

    /// Stop reacting to changes. The last output stays available.
    pub fn unmount(&self) {
        if self.inner.mounted.replace(false) {
            self.inner.computation.unsubscribe();
            self.inner.dirty.set(false);
            tracing::debug!(target: "remx", computation = %self.id(), "unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.get()
    }
}

/// Render a component that is not connected. Reads are not tracked and each
/// one is reported as an untracked access.
pub fn render_unconnected<R>(runtime: &Runtime, render: impl FnOnce() -> R) -> R {
    runtime.render_untracked(render)
}
