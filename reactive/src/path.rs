//! Path tracking for fine-grained reactivity.
//!
//! Every location in a state tree has a [`PathId`] that identifies it. A path is
//! interned once in the [`PathRegistry`] and keeps its id for the lifetime of the
//! registry, no matter which value currently lives there. Reads record the id of
//! the location they touched and writes announce the id of the location they
//! changed, so matching a write against recorded reads is an id comparison.

use std::{fmt, rc::Rc};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// One segment of a path: an object field / map key, or a list index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Field(Rc<str>),
    Index(usize),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(name) => f.write_str(name),
            Key::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Field(name.into())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Field(name.into())
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Field(name.as_str().into())
    }
}

impl From<Rc<str>> for Key {
    fn from(name: Rc<str>) -> Self {
        Key::Field(name)
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// The key sequence from a store root to a location.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(SmallVec<[Key; 4]>);

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<Key>) {
        self.0.push(key.into());
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The last segment, i.e. the property name a read of this path reports.
    pub fn leaf(&self) -> Option<&Key> {
        self.0.last()
    }
}

impl<K: Into<Key>> FromIterator<K> for Path {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Path(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Identifier for a path in a state tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathId(u32);

impl PathId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

struct PathEntry {
    parent: Option<PathId>,
    key: Option<Key>,
    children: SmallVec<[PathId; 4]>,
}

/// Interns paths into [`PathId`]s.
///
/// Each store owns a separate root so that two stores sharing a runtime never
/// produce the same id for the same key sequence.
#[derive(Default)]
pub struct PathRegistry {
    entries: Vec<PathEntry>,
    lookup: FxHashMap<(PathId, Key), PathId>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, parent: Option<PathId>, key: Option<Key>) -> PathId {
        let id = PathId(self.entries.len() as u32);
        self.entries.push(PathEntry {
            parent,
            key,
            children: SmallVec::new(),
        });
        id
    }

    /// Allocate a new root path.
    pub fn new_root(&mut self) -> PathId {
        self.push(None, None)
    }

    /// The id of `key` under `parent`, interning it on first use.
    pub fn child(&mut self, parent: PathId, key: &Key) -> PathId {
        if let Some(id) = self.lookup.get(&(parent, key.clone())) {
            return *id;
        }
        let id = self.push(Some(parent), Some(key.clone()));
        self.entries[parent.index()].children.push(id);
        self.lookup.insert((parent, key.clone()), id);
        id
    }

    /// Intern a full key sequence under `root`.
    pub fn intern(&mut self, root: PathId, path: &Path) -> PathId {
        path.keys()
            .iter()
            .fold(root, |parent, key| self.child(parent, key))
    }

    pub fn parent(&self, id: PathId) -> Option<PathId> {
        self.entries.get(id.index()).and_then(|entry| entry.parent)
    }

    pub fn key(&self, id: PathId) -> Option<&Key> {
        self.entries
            .get(id.index())
            .and_then(|entry| entry.key.as_ref())
    }

    pub fn root_of(&self, mut id: PathId) -> PathId {
        while let Some(parent) = self.parent(id) {
            id = parent;
        }
        id
    }

    /// Rebuild the key sequence of `id`, relative to its root.
    pub fn path(&self, id: PathId) -> Path {
        let mut keys = SmallVec::<[Key; 4]>::new();
        let mut current = Some(id);
        while let Some(id) = current {
            if let Some(key) = self.key(id) {
                keys.push(key.clone());
            }
            current = self.parent(id);
        }
        keys.reverse();
        Path(keys)
    }

    pub fn is_ancestor_or_self(&self, ancestor: PathId, id: PathId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// `id` followed by every interned path below it, depth first.
    pub fn descendants_or_self(&self, id: PathId) -> Vec<PathId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(entry) = self.entries.get(id.index()) {
                stack.extend(entry.children.iter().rev().copied());
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
