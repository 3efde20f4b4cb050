//! # remx_store
//!
//! Observable state trees on top of [`remx_reactive`].
//!
//! A [`Store`] owns a tree of objects, maps and lists. Reading through a
//! [`Node`] records the read path with the active computation of the store's
//! runtime, and writing a path invalidates exactly the computations that read
//! it. Nested values are wrapped as they are written, so everything reachable
//! from the root is observable.

mod error;
mod init;
mod node;
mod store;
mod value;


pub use error::StoreError;
pub use init::{list, map, map_from, object, Init};
pub use node::Node;
pub use remx_reactive::{Key, Path, Runtime};
pub use store::Store;
pub use value::{NodeKind, Value};
