//! Plain input trees that are wrapped when they enter a store.

use serde_json::Number;

use crate::node::Node;

/// A value about to be written into a store.
///
/// Nothing in an `Init` is observable. It becomes observable, recursively,
/// when it is passed to [`Store::new`](crate::Store::new) or
/// [`Node::set`](crate::Node::set). A [`Node`] inside an `Init` is copied, so
/// the same node never appears at two locations.
#[derive(Debug, Clone, PartialEq)]
pub enum Init {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// Fixed set of fields.
    Object(Vec<(String, Init)>),
    /// Dynamic map: keys can be added and removed.
    Map(Vec<(String, Init)>),
    List(Vec<Init>),
    Node(Node),
}

impl Init {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Init::Null => "null",
            Init::Bool(_) => "boolean",
            Init::Number(_) => "number",
            Init::String(_) => "string",
            Init::Object(_) => "object",
            Init::Map(_) => "map",
            Init::List(_) => "list",
            Init::Node(_) => "node",
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Init::Null | Init::Bool(_) | Init::Number(_) | Init::String(_)
        )
    }
}

/// An empty dynamic map.
pub fn map() -> Init {
    Init::Map(Vec::new())
}

/// A dynamic map with initial entries, in order.
pub fn map_from<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Init
where
    K: Into<String>,
    V: Into<Init>,
{
    Init::Map(
        entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect(),
    )
}

/// An object with a fixed set of fields.
pub fn object<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Init
where
    K: Into<String>,
    V: Into<Init>,
{
    Init::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect(),
    )
}

pub fn list<V: Into<Init>>(items: impl IntoIterator<Item = V>) -> Init {
    Init::List(items.into_iter().map(Into::into).collect())
}

impl From<serde_json::Value> for Init {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Init::Null,
            serde_json::Value::Bool(b) => Init::Bool(b),
            serde_json::Value::Number(n) => Init::Number(n),
            serde_json::Value::String(s) => Init::String(s),
            serde_json::Value::Array(items) => {
                Init::List(items.into_iter().map(Init::from).collect())
            }
            serde_json::Value::Object(fields) => Init::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Init::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<()> for Init {
    fn from(_: ()) -> Self {
        Init::Null
    }
}

impl From<bool> for Init {
    fn from(value: bool) -> Self {
        Init::Bool(value)
    }
}

impl From<&str> for Init {
    fn from(value: &str) -> Self {
        Init::String(value.to_owned())
    }
}

impl From<String> for Init {
    fn from(value: String) -> Self {
        Init::String(value)
    }
}

impl From<f64> for Init {
    /// Non-finite numbers become `Null`, as in JSON.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Init::Null, Init::Number)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Init {
                fn from(value: $ty) -> Self {
                    Init::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl<T: Into<Init>> From<Option<T>> for Init {
    fn from(value: Option<T>) -> Self {
        value.map_or(Init::Null, Into::into)
    }
}

impl<T: Into<Init>> From<Vec<T>> for Init {
    fn from(items: Vec<T>) -> Self {
        list(items)
    }
}

impl From<Node> for Init {
    fn from(node: Node) -> Self {
        Init::Node(node)
    }
}

impl From<&Node> for Init {
    fn from(node: &Node) -> Self {
        Init::Node(node.clone())
    }
}
