//! The node arena behind a store.

use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;
use remx_reactive::{Dependency, Key, PathId, Runtime};
use slotmap::SlotMap;

use crate::{
    error::StoreError,
    init::Init,
    node::Node,
    value::{Body, NodeKind, Scalar, Slot},
};

slotmap::new_key_type! {
    /// Generational key of a node. A key whose node was detached never
    /// resolves again, even if the slot is reused.
    pub(crate) struct NodeKey;
}

pub(crate) struct NodeData {
    pub(crate) path: PathId,
    pub(crate) body: Body,
}

pub(crate) type Nodes = SlotMap<NodeKey, NodeData>;

/// State shared between a store and all of its node handles.
pub(crate) struct StoreInner {
    pub(crate) runtime: Runtime,
    pub(crate) nodes: RefCell<Nodes>,
    pub(crate) root: NodeKey,
}

/// An observable state tree.
///
/// Every object, map and list reachable from the root is a node of the store.
/// Reads through a [`Node`] are recorded against the active computation of
/// the store's [`Runtime`]; writes notify the computations that read the
/// written path.
///
/// # Example
///
/// ```rust
/// use remx_reactive::Runtime;
/// use remx_store::{object, Store};
///
/// let runtime = Runtime::new();
/// let store = Store::new(&runtime, object([("count", 0)])).unwrap();
/// let root = store.root();
///
/// let (count, deps) = runtime.track(|| root.get("count").unwrap());
/// assert_eq!(count.and_then(|v| v.as_i64()), Some(0));
/// assert_eq!(deps.len(), 1);
/// ```
#[derive(Clone)]
pub struct Store {
    pub(crate) inner: Rc<StoreInner>,
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("nodes", &self.inner.nodes.borrow().len())
            .finish()
    }
}

impl Store {
    /// Wrap `init` into a new store bound to `runtime`.
    ///
    /// The root must be an object or a map.
    pub fn new(runtime: &Runtime, init: impl Into<Init>) -> Result<Store, StoreError> {
        let init = resolve(init.into())?;
        if !matches!(init, Init::Object(_) | Init::Map(_)) {
            return Err(StoreError::InvalidRoot(init.kind_name()));
        }

        let mut nodes = Nodes::with_key();
        let root_path = runtime.new_root_path();
        let root = match build_slot(runtime, &mut nodes, root_path, init) {
            Slot::Node(key) => key,
            Slot::Scalar(scalar) => return Err(StoreError::InvalidRoot(scalar.kind_name())),
        };
        tracing::debug!(target: "remx", nodes = nodes.len(), "store created");

        Ok(Store {
            inner: Rc::new(StoreInner {
                runtime: runtime.clone(),
                nodes: RefCell::new(nodes),
                root,
            }),
        })
    }

    pub fn root(&self) -> Node {
        Node {
            store: self.inner.clone(),
            key: self.inner.root,
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    /// Run `f` with notifications deferred to its end, see [`Runtime::batch`].
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        self.inner.runtime.batch(f)
    }

    /// Number of nodes currently attached.
    pub fn node_count(&self) -> usize {
        self.inner.nodes.borrow().len()
    }
}

/// Replace every [`Node`] in `init` with a copy of its current contents.
pub(crate) fn resolve(init: Init) -> Result<Init, StoreError> {
    Ok(match init {
        Init::Node(node) => node.to_init()?,
        Init::Object(fields) => Init::Object(resolve_fields(fields)?),
        Init::Map(fields) => Init::Map(resolve_fields(fields)?),
        Init::List(items) => Init::List(
            items
                .into_iter()
                .map(resolve)
                .collect::<Result<_, _>>()?,
        ),
        scalar => scalar,
    })
}

fn resolve_fields(fields: Vec<(String, Init)>) -> Result<Vec<(String, Init)>, StoreError> {
    fields
        .into_iter()
        .map(|(key, value)| Ok((key, resolve(value)?)))
        .collect()
}

/// Wrap a resolved `init` found at `path`.
pub(crate) fn build_slot(runtime: &Runtime, nodes: &mut Nodes, path: PathId, init: Init) -> Slot {
    let body = match init {
        Init::Object(fields) => Body::Object(build_fields(runtime, nodes, path, fields)),
        Init::Map(fields) => Body::Map(build_fields(runtime, nodes, path, fields)),
        Init::List(items) => Body::List(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| {
                    let child = runtime.child_path(path, &Key::Index(index));
                    build_slot(runtime, nodes, child, item)
                })
                .collect(),
        ),
        Init::Node(_) => unreachable!("nodes are copied before they are wrapped"),
        scalar => {
            return Slot::Scalar(Scalar::from_init(&scalar).unwrap_or(Scalar::Null));
        }
    };
    Slot::Node(nodes.insert(NodeData { path, body }))
}

fn build_fields(
    runtime: &Runtime,
    nodes: &mut Nodes,
    path: PathId,
    fields: Vec<(String, Init)>,
) -> IndexMap<Rc<str>, Slot> {
    let mut built = IndexMap::with_capacity(fields.len());
    for (name, value) in fields {
        let name: Rc<str> = Rc::from(name);
        let child = runtime.child_path(path, &Key::from(name.clone()));
        built.insert(name, build_slot(runtime, nodes, child, value));
    }
    built
}

/// Drop `key` and everything below it from the arena.
pub(crate) fn detach(nodes: &mut Nodes, key: NodeKey) {
    let mut pending = vec![key];
    let mut count = 0;
    while let Some(key) = pending.pop() {
        if let Some(data) = nodes.remove(key) {
            count += 1;
            pending.extend(data.body.child_nodes());
        }
    }
    tracing::trace!(target: "remx", nodes = count, "detached subtree");
}

pub(crate) fn copy_tree(nodes: &Nodes, key: NodeKey) -> Init {
    let Some(data) = nodes.get(key) else {
        return Init::Null;
    };
    let copy_slot = |slot: &Slot| match slot {
        Slot::Scalar(scalar) => scalar.to_init(),
        Slot::Node(child) => copy_tree(nodes, *child),
    };
    let copy_fields = |fields: &IndexMap<Rc<str>, Slot>| -> Vec<(String, Init)> {
        fields
            .iter()
            .map(|(name, slot)| (name.to_string(), copy_slot(slot)))
            .collect()
    };
    match &data.body {
        Body::Object(fields) => Init::Object(copy_fields(fields)),
        Body::Map(fields) => Init::Map(copy_fields(fields)),
        Body::List(items) => Init::List(items.iter().map(copy_slot).collect()),
    }
}

/// A read made while serializing, replayed once the arena is released.
pub(crate) enum Read {
    Keys(PathId),
    Value(PathId, Key),
}

/// Serialize the subtree at `key`. When `reads` is given, every node's key
/// set and every entry are pushed to it.
pub(crate) fn write_json(
    runtime: &Runtime,
    nodes: &Nodes,
    key: NodeKey,
    reads: &mut Option<Vec<Read>>,
) -> serde_json::Value {
    let Some(data) = nodes.get(key) else {
        return serde_json::Value::Null;
    };
    if let Some(reads) = reads.as_mut() {
        reads.push(Read::Keys(data.path));
    }

    let mut entries = Vec::with_capacity(data.body.len());
    for (child_key, slot) in data.body.entries() {
        if let Some(reads) = reads.as_mut() {
            let child = runtime.child_path(data.path, &child_key);
            reads.push(Read::Value(child, child_key.clone()));
        }
        let value = match slot {
            Slot::Scalar(scalar) => scalar.to_json(),
            Slot::Node(node) => write_json(runtime, nodes, *node, reads),
        };
        entries.push((child_key, value));
    }

    match data.body.kind() {
        NodeKind::List => {
            serde_json::Value::Array(entries.into_iter().map(|(_, value)| value).collect())
        }
        NodeKind::Object | NodeKind::Map => serde_json::Value::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        ),
    }
}

pub(crate) fn replay(runtime: &Runtime, reads: Vec<Read>) {
    for read in reads {
        match read {
            Read::Keys(path) => runtime.record_keys(Dependency::Keys(path)),
            Read::Value(path, key) => runtime.record_read(Dependency::Value(path), &key),
        }
    }
}
