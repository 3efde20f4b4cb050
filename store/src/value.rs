use std::{fmt, rc::Rc};

use indexmap::IndexMap;
use serde_json::Number;

use crate::{init::Init, node::Node, store::NodeKey};

/// The shape of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Object,
    Map,
    List,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Object => "object",
            NodeKind::Map => "map",
            NodeKind::List => "list",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value read from a store.
///
/// Nested objects, maps and lists are returned as [`Node`] handles, so
/// reading through them keeps being tracked.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(Rc<str>),
    Node(Node),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn into_node(self) -> Option<Node> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(Rc<str>),
}

impl Scalar {
    pub(crate) fn from_init(init: &Init) -> Option<Scalar> {
        Some(match init {
            Init::Null => Scalar::Null,
            Init::Bool(b) => Scalar::Bool(*b),
            Init::Number(n) => Scalar::Number(n.clone()),
            Init::String(s) => Scalar::String(Rc::from(s.as_str())),
            _ => return None,
        })
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Number(_) => "number",
            Scalar::String(_) => "string",
        }
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Null => serde_json::Value::Null,
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Number(n) => serde_json::Value::Number(n.clone()),
            Scalar::String(s) => serde_json::Value::String(s.to_string()),
        }
    }

    pub(crate) fn to_init(&self) -> Init {
        match self {
            Scalar::Null => Init::Null,
            Scalar::Bool(b) => Init::Bool(*b),
            Scalar::Number(n) => Init::Number(n.clone()),
            Scalar::String(s) => Init::String(s.to_string()),
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Number(n) => Value::Number(n.clone()),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }
}

/// What a node stores at one key.
#[derive(Debug, Clone)]
pub(crate) enum Slot {
    Scalar(Scalar),
    Node(NodeKey),
}

impl Slot {
    pub(crate) fn node(&self) -> Option<NodeKey> {
        match self {
            Slot::Node(key) => Some(*key),
            Slot::Scalar(_) => None,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Body {
    Object(IndexMap<Rc<str>, Slot>),
    Map(IndexMap<Rc<str>, Slot>),
    List(Vec<Slot>),
}

impl Body {
    pub(crate) fn kind(&self) -> NodeKind {
        match self {
            Body::Object(_) => NodeKind::Object,
            Body::Map(_) => NodeKind::Map,
            Body::List(_) => NodeKind::List,
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Body::Object(fields) | Body::Map(fields) => fields.len(),
            Body::List(items) => items.len(),
        }
    }

    /// Keys and slots in order.
    pub(crate) fn entries(&self) -> Vec<(crate::Key, &Slot)> {
        match self {
            Body::Object(fields) | Body::Map(fields) => fields
                .iter()
                .map(|(key, slot)| (crate::Key::from(key.clone()), slot))
                .collect(),
            Body::List(items) => items
                .iter()
                .enumerate()
                .map(|(index, slot)| (crate::Key::Index(index), slot))
                .collect(),
        }
    }

    pub(crate) fn child_nodes(&self) -> impl Iterator<Item = NodeKey> + '_ {
        let slots: Box<dyn Iterator<Item = &Slot>> = match self {
            Body::Object(fields) | Body::Map(fields) => Box::new(fields.values()),
            Body::List(items) => Box::new(items.iter()),
        };
        slots.filter_map(Slot::node)
    }
}
