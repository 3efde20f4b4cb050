//! Maps changed paths back to the computations that read them.

use std::{fmt, rc::Rc};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    dependency::{Change, Dependency, DependencySet},
    id::ComputationId,
    path::PathRegistry,
};

/// Invalidation callback of a subscribed computation.
pub type Callback = Rc<dyn Fn()>;

struct Subscriber {
    deps: DependencySet,
    callback: Callback,
}

/// Subscription bookkeeping: for every computation the dependencies of its last
/// run, and for every dependency the computations that recorded it.
///
/// Computations are kept in subscription order, which is also the order their
/// callbacks are returned in.
#[derive(Default)]
pub struct Dispatcher {
    subscribers: IndexMap<ComputationId, Subscriber>,
    by_dependency: FxHashMap<Dependency, IndexSet<ComputationId>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("subscribers", &self.subscribers.len())
            .field("dependencies", &self.by_dependency.len())
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the dependencies of the run that just finished, replacing the
    /// previous ones.
    pub fn on_run_complete(&mut self, id: ComputationId, deps: DependencySet, callback: Callback) {
        self.drop_index(id);
        for dependency in &deps {
            self.by_dependency
                .entry(*dependency)
                .or_default()
                .insert(id);
        }
        // `insert` keeps the position of an existing key
        self.subscribers.insert(id, Subscriber { deps, callback });
    }

    /// Forget everything about `id`. Later writes never reach it.
    pub fn unsubscribe(&mut self, id: ComputationId) -> bool {
        self.drop_index(id);
        self.subscribers.shift_remove(&id).is_some()
    }

    fn drop_index(&mut self, id: ComputationId) {
        let Some(subscriber) = self.subscribers.get(&id) else {
            return;
        };
        for dependency in &subscriber.deps {
            if let Some(ids) = self.by_dependency.get_mut(dependency) {
                ids.shift_remove(&id);
                if ids.is_empty() {
                    self.by_dependency.remove(dependency);
                }
            }
        }
    }

    /// The computations affected by `changes`, each once, in subscription order.
    pub fn on_write(
        &self,
        changes: &[Change],
        registry: &PathRegistry,
    ) -> Vec<(ComputationId, Callback)> {
        let mut affected = FxHashSet::default();
        for change in changes {
            match *change {
                Change::Value(path) => self.collect(&Dependency::Value(path), &mut affected),
                Change::Keys(path) => self.collect(&Dependency::Keys(path), &mut affected),
                Change::Subtree(path) => {
                    for path in registry.descendants_or_self(path) {
                        self.collect(&Dependency::Value(path), &mut affected);
                        self.collect(&Dependency::Keys(path), &mut affected);
                    }
                }
            }
        }

        let mut ordered: Vec<_> = affected
            .into_iter()
            .filter_map(|id| {
                self.subscribers
                    .get_full(&id)
                    .map(|(index, _, subscriber)| (index, id, subscriber.callback.clone()))
            })
            .collect();
        ordered.sort_by_key(|(index, _, _)| *index);
        ordered
            .into_iter()
            .map(|(_, id, callback)| (id, callback))
            .collect()
    }

    fn collect(&self, dependency: &Dependency, affected: &mut FxHashSet<ComputationId>) {
        if let Some(ids) = self.by_dependency.get(dependency) {
            affected.extend(ids.iter().copied());
        }
    }

    pub fn is_subscribed(&self, id: ComputationId) -> bool {
        self.subscribers.contains_key(&id)
    }

    pub fn dependencies(&self, id: ComputationId) -> Option<&DependencySet> {
        self.subscribers.get(&id).map(|subscriber| &subscriber.deps)
    }

    /// Number of subscribed computations.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}
