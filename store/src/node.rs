use std::{fmt, rc::Rc};

use remx_reactive::{Change, Dependency, Key, Path, PathId, Runtime};
use smallvec::SmallVec;

use crate::{
    error::StoreError,
    init::Init,
    store::{self, NodeData, NodeKey, Read, StoreInner},
    value::{Body, NodeKind, Scalar, Slot, Value},
};

type Changes = SmallVec<[Change; 2]>;

/// Handle to an object, map or list inside a [`Store`](crate::Store).
///
/// Handles are cheap to clone. Two handles are equal when they refer to the
/// same node, so reading the same location twice yields equal handles.
///
/// Once a node is replaced or removed from its parent it is detached, and
/// every operation on a handle to it fails with [`StoreError::StaleNode`].
#[derive(Clone)]
pub struct Node {
    pub(crate) store: Rc<StoreInner>,
    pub(crate) key: NodeKey,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store) && self.key == other.key
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes = self.store.nodes.borrow();
        match nodes.get(self.key) {
            Some(data) => f
                .debug_struct("Node")
                .field("kind", &data.body.kind())
                .field("path", &self.store.runtime.path(data.path).to_string())
                .finish(),
            None => f.debug_struct("Node").field("detached", &true).finish(),
        }
    }
}

/// Map an index used on an object or a name used on a list onto the key the
/// node is actually addressed by.
fn normalize_key(kind: NodeKind, key: Key) -> Result<Key, StoreError> {
    match (kind, key) {
        (NodeKind::Object | NodeKind::Map, Key::Index(index)) => {
            Ok(Key::from(index.to_string()))
        }
        (NodeKind::List, Key::Field(name)) => {
            name.parse::<usize>()
                .map(Key::Index)
                .map_err(|_| StoreError::WrongKind {
                    operation: "access a named field",
                    found: "list",
                })
        }
        (_, key) => Ok(key),
    }
}

fn lookup<'a>(body: &'a Body, key: &Key) -> Option<&'a Slot> {
    match (body, key) {
        (Body::Object(fields) | Body::Map(fields), Key::Field(name)) => fields.get(&**name),
        (Body::List(items), Key::Index(index)) => items.get(*index),
        _ => None,
    }
}

fn change_for(path: PathId, old: Option<&Slot>, new_is_node: bool) -> Change {
    if new_is_node || old.and_then(Slot::node).is_some() {
        Change::Subtree(path)
    } else {
        Change::Value(path)
    }
}

impl Node {
    fn runtime(&self) -> &Runtime {
        &self.store.runtime
    }

    fn with_data<R>(&self, f: impl FnOnce(&NodeData) -> R) -> Result<R, StoreError> {
        let nodes = self.store.nodes.borrow();
        let data = nodes.get(self.key).ok_or(StoreError::StaleNode)?;
        Ok(f(data))
    }

    fn handle(&self, key: NodeKey) -> Node {
        Node {
            store: self.store.clone(),
            key,
        }
    }

    fn value_of(&self, slot: &Slot) -> Value {
        match slot {
            Slot::Scalar(scalar) => scalar.to_value(),
            Slot::Node(key) => Value::Node(self.handle(*key)),
        }
    }

    fn require(&self, kind: NodeKind, operation: &'static str) -> Result<(), StoreError> {
        let found = self.kind()?;
        if found == kind {
            Ok(())
        } else {
            Err(StoreError::WrongKind {
                operation,
                found: found.name(),
            })
        }
    }

    /// Read the value at `key`.
    ///
    /// The read is recorded even when the key is missing, so a computation
    /// that saw `None` is notified once the key is added.
    pub fn get(&self, key: impl Into<Key>) -> Result<Option<Value>, StoreError> {
        let (path, key, value) = self.with_data(|data| {
            let key = normalize_key(data.body.kind(), key.into())?;
            let path = self.runtime().child_path(data.path, &key);
            let value = lookup(&data.body, &key).map(|slot| self.value_of(slot));
            Ok::<_, StoreError>((path, key, value))
        })??;
        self.runtime().record_read(Dependency::Value(path), &key);
        Ok(value)
    }

    /// Follow `keys` from this node, one [`get`](Self::get) per key.
    ///
    /// Returns `None` as soon as a key is missing.
    pub fn get_path<K: Into<Key>>(
        &self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Option<Value>, StoreError> {
        let mut current = Value::Node(self.clone());
        for key in keys {
            let node = match current {
                Value::Node(node) => node,
                Value::Null => {
                    return Err(StoreError::WrongKind {
                        operation: "read a key",
                        found: "null",
                    })
                }
                Value::Bool(_) => {
                    return Err(StoreError::WrongKind {
                        operation: "read a key",
                        found: "boolean",
                    })
                }
                Value::Number(_) => {
                    return Err(StoreError::WrongKind {
                        operation: "read a key",
                        found: "number",
                    })
                }
                Value::String(_) => {
                    return Err(StoreError::WrongKind {
                        operation: "read a key",
                        found: "string",
                    })
                }
            };
            match node.get(key)? {
                Some(value) => current = value,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Whether `key` is present. Tracked like [`get`](Self::get).
    pub fn has(&self, key: impl Into<Key>) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Write `value` at `key`.
    ///
    /// Objects only accept their existing fields, lists only existing indices;
    /// maps accept any key. Nested objects, maps and lists in `value` are
    /// wrapped before they become reachable. A node previously stored at
    /// `key` is detached.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Init>) -> Result<(), StoreError> {
        let init = store::resolve(value.into())?;
        let runtime = self.runtime();

        let changes = {
            let mut nodes = self.store.nodes.borrow_mut();
            let data = nodes.get(self.key).ok_or(StoreError::StaleNode)?;
            let kind = data.body.kind();
            let parent = data.path;
            let key = normalize_key(kind, key.into())?;

            let old = match (&data.body, &key) {
                (Body::Object(fields), Key::Field(name)) => match fields.get(&**name) {
                    Some(slot) => Some(slot.clone()),
                    None => return Err(StoreError::UnknownField(name.to_string())),
                },
                (Body::Map(fields), Key::Field(name)) => fields.get(&**name).cloned(),
                (Body::List(items), Key::Index(index)) => match items.get(*index) {
                    Some(slot) => Some(slot.clone()),
                    None => {
                        return Err(StoreError::IndexOutOfBounds {
                            index: *index,
                            len: items.len(),
                        })
                    }
                },
                _ => {
                    return Err(StoreError::WrongKind {
                        operation: "set",
                        found: kind.name(),
                    })
                }
            };

            if let (Some(Slot::Scalar(current)), Some(next)) = (&old, Scalar::from_init(&init)) {
                if runtime.config().skips_equal_writes() && *current == next {
                    return Ok(());
                }
            }

            let path = runtime.child_path(parent, &key);
            let new_is_node = !init.is_scalar();
            let slot = store::build_slot(runtime, &mut nodes, path, init);
            if let Some(data) = nodes.get_mut(self.key) {
                match (&mut data.body, &key) {
                    (Body::Object(fields) | Body::Map(fields), Key::Field(name)) => {
                        fields.insert(name.clone(), slot);
                    }
                    (Body::List(items), Key::Index(index)) => items[*index] = slot,
                    _ => {}
                }
            }
            if let Some(replaced) = old.as_ref().and_then(Slot::node) {
                store::detach(&mut nodes, replaced);
            }

            let mut changes = Changes::new();
            changes.push(change_for(path, old.as_ref(), new_is_node));
            if old.is_none() {
                changes.push(Change::Keys(parent));
            }
            changes
        };

        self.runtime().notify(changes);
        Ok(())
    }

    /// Remove `key` from a map. Returns whether it was present.
    pub fn remove(&self, key: impl Into<Key>) -> Result<bool, StoreError> {
        self.require(NodeKind::Map, "remove a key")?;
        let runtime = self.runtime();

        let changes = {
            let mut nodes = self.store.nodes.borrow_mut();
            let data = nodes.get_mut(self.key).ok_or(StoreError::StaleNode)?;
            let parent = data.path;
            let key = normalize_key(NodeKind::Map, key.into())?;
            let removed = match (&mut data.body, &key) {
                (Body::Map(fields), Key::Field(name)) => fields.shift_remove(&**name),
                _ => None,
            };
            let Some(removed) = removed else {
                return Ok(false);
            };
            if let Some(node) = removed.node() {
                store::detach(&mut nodes, node);
            }
            let path = runtime.child_path(parent, &key);
            [Change::Keys(parent), change_for(path, Some(&removed), false)]
        };

        runtime.notify(changes);
        Ok(true)
    }

    /// Remove every key of a map.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.require(NodeKind::Map, "clear")?;
        let runtime = self.runtime();

        let changes = {
            let mut nodes = self.store.nodes.borrow_mut();
            let data = nodes.get_mut(self.key).ok_or(StoreError::StaleNode)?;
            let parent = data.path;
            let removed = match &mut data.body {
                Body::Map(fields) => std::mem::take(fields),
                _ => return Ok(()),
            };
            if removed.is_empty() {
                return Ok(());
            }

            let mut changes = Vec::with_capacity(removed.len() + 1);
            changes.push(Change::Keys(parent));
            for (name, slot) in removed {
                if let Some(node) = slot.node() {
                    store::detach(&mut nodes, node);
                }
                let path = runtime.child_path(parent, &Key::from(name));
                changes.push(change_for(path, Some(&slot), false));
            }
            changes
        };

        runtime.notify(changes);
        Ok(())
    }

    /// Append `value` to a list.
    pub fn push(&self, value: impl Into<Init>) -> Result<(), StoreError> {
        self.require(NodeKind::List, "push")?;
        let init = store::resolve(value.into())?;
        let runtime = self.runtime();

        let changes = {
            let mut nodes = self.store.nodes.borrow_mut();
            let data = nodes.get(self.key).ok_or(StoreError::StaleNode)?;
            let parent = data.path;
            let index = data.body.len();
            let path = runtime.child_path(parent, &Key::Index(index));
            let new_is_node = !init.is_scalar();
            let slot = store::build_slot(runtime, &mut nodes, path, init);
            if let Some(NodeData {
                body: Body::List(items),
                ..
            }) = nodes.get_mut(self.key)
            {
                items.push(slot);
            }
            [Change::Keys(parent), change_for(path, None, new_is_node)]
        };

        runtime.notify(changes);
        Ok(())
    }

    /// Remove the last item of a list and return a copy of it.
    pub fn pop(&self) -> Result<Option<serde_json::Value>, StoreError> {
        self.require(NodeKind::List, "pop")?;
        let runtime = self.runtime();

        let (changes, popped) = {
            let mut nodes = self.store.nodes.borrow_mut();
            let data = nodes.get_mut(self.key).ok_or(StoreError::StaleNode)?;
            let parent = data.path;
            let popped = match &mut data.body {
                Body::List(items) => items.pop(),
                _ => None,
            };
            let Some(popped) = popped else {
                return Ok(None);
            };
            let index = data.body.len();

            let json = match &popped {
                Slot::Scalar(scalar) => scalar.to_json(),
                Slot::Node(node) => store::write_json(runtime, &nodes, *node, &mut None),
            };
            if let Some(node) = popped.node() {
                store::detach(&mut nodes, node);
            }
            let path = runtime.child_path(parent, &Key::Index(index));
            (
                [Change::Keys(parent), change_for(path, Some(&popped), false)],
                json,
            )
        };

        runtime.notify(changes);
        Ok(Some(popped))
    }

    /// The keys of this node in order: field names, map keys in insertion
    /// order, or list indices.
    ///
    /// Records a dependency on the key set, which changes when keys are added
    /// or removed but not when values are replaced.
    pub fn keys(&self) -> Result<Vec<Key>, StoreError> {
        let (path, keys) = self.with_data(|data| {
            let keys = data.body.entries().into_iter().map(|(key, _)| key).collect();
            (data.path, keys)
        })?;
        self.runtime().record_keys(Dependency::Keys(path));
        Ok(keys)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let (path, len) = self.with_data(|data| (data.path, data.body.len()))?;
        self.runtime().record_keys(Dependency::Keys(path));
        Ok(len)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Serialize the subtree, reading every key set and entry in it.
    pub fn to_json(&self) -> Result<serde_json::Value, StoreError> {
        let mut reads = Some(Vec::new());
        let json = {
            let nodes = self.store.nodes.borrow();
            if !nodes.contains_key(self.key) {
                return Err(StoreError::StaleNode);
            }
            store::write_json(self.runtime(), &nodes, self.key, &mut reads)
        };
        store::replay(self.runtime(), reads.unwrap_or_default());
        Ok(json)
    }

    /// Serialize the subtree without recording or reporting anything.
    pub fn snapshot(&self) -> Result<serde_json::Value, StoreError> {
        let nodes = self.store.nodes.borrow();
        if !nodes.contains_key(self.key) {
            return Err(StoreError::StaleNode);
        }
        Ok(store::write_json(self.runtime(), &nodes, self.key, &mut None))
    }

    /// Deep copy of the subtree as plain input, keeping maps distinct from
    /// objects. Not tracked.
    pub fn to_init(&self) -> Result<Init, StoreError> {
        let nodes = self.store.nodes.borrow();
        if !nodes.contains_key(self.key) {
            return Err(StoreError::StaleNode);
        }
        Ok(store::copy_tree(&nodes, self.key))
    }

    pub fn kind(&self) -> Result<NodeKind, StoreError> {
        self.with_data(|data| data.body.kind())
    }

    /// Location of this node, from the store root.
    pub fn path(&self) -> Result<Path, StoreError> {
        let id = self.path_id()?;
        Ok(self.runtime().path(id))
    }

    pub fn path_id(&self) -> Result<PathId, StoreError> {
        self.with_data(|data| data.path)
    }

    pub fn is_attached(&self) -> bool {
        self.store.nodes.borrow().contains_key(self.key)
    }
}
