use indexmap::IndexSet;

use crate::path::{PathId, PathRegistry};

/// Something a computation read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dependency {
    /// The value stored at a location.
    Value(PathId),
    /// The key set of the object, map or list stored at a location.
    Keys(PathId),
}

impl Dependency {
    pub fn path(&self) -> PathId {
        match self {
            Dependency::Value(path) | Dependency::Keys(path) => *path,
        }
    }
}

/// Something a write changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Change {
    /// A scalar value was replaced at a location.
    Value(PathId),
    /// Keys were added to or removed from the node at a location.
    Keys(PathId),
    /// A nested node was replaced or removed at a location, so everything at
    /// or below it changed.
    Subtree(PathId),
}

impl Change {
    pub fn path(&self) -> PathId {
        match self {
            Change::Value(path) | Change::Keys(path) | Change::Subtree(path) => *path,
        }
    }

    /// Whether a computation that recorded `dependency` has to be invalidated.
    pub fn affects(&self, dependency: &Dependency, registry: &PathRegistry) -> bool {
        match (self, dependency) {
            (Change::Value(changed), Dependency::Value(read)) => changed == read,
            (Change::Keys(changed), Dependency::Keys(read)) => changed == read,
            (Change::Subtree(changed), dependency) => {
                registry.is_ancestor_or_self(*changed, dependency.path())
            }
            _ => false,
        }
    }
}

/// The dependencies recorded during one run of a computation, in read order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencySet {
    deps: IndexSet<Dependency>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the dependency was not recorded yet.
    pub fn insert(&mut self, dependency: Dependency) -> bool {
        self.deps.insert(dependency)
    }

    pub fn contains(&self, dependency: &Dependency) -> bool {
        self.deps.contains(dependency)
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Dependency> {
        self.deps.iter()
    }
}

impl FromIterator<Dependency> for DependencySet {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        Self {
            deps: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for DependencySet {
    type Item = Dependency;
    type IntoIter = indexmap::set::IntoIter<Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.deps.into_iter()
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a Dependency;
    type IntoIter = indexmap::set::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.deps.iter()
    }
}
