//! # remx
//!
//! remx is a fine-grained reactive state container. State lives in a
//! [`Store`]: a tree of objects, maps and lists. Renders and other
//! computations read it through [`Node`] handles, and remx records exactly
//! which paths each of them read. A write then invalidates only the
//! computations that read the written path.
//!
//! ## Example
//!
//! ```rust
//! use remx::prelude::*;
//!
//! let runtime = Runtime::new();
//! let store = Store::new(&runtime, object([("person", object([("name", "nothing")]))])).unwrap();
//!
//! let view = connect(&runtime, {
//!     let store = store.clone();
//!     move || {
//!         let name = store.root().get_path(["person", "name"]).unwrap();
//!         format!("Hello {}", name.as_ref().and_then(Value::as_str).unwrap_or("?"))
//!     }
//! });
//! assert_eq!(view.output(), "Hello nothing");
//!
//! let person = store.root().get("person").unwrap().and_then(Value::into_node).unwrap();
//! person.set("name", "Gandalf").unwrap();
//! assert_eq!(view.output(), "Hello Gandalf");
//! assert_eq!(view.render_count(), 2);
//! ```
//!
//! ## Tracking
//!
//! Each [`Runtime`] keeps a stack of active computations. A read is recorded
//! against the innermost one only. Reads with no active computation are not
//! tracked; they are reported through the runtime's
//! [`UntrackedAccessReporter`](reactive::UntrackedAccessReporter), which by
//! default logs a `tracing` warning.
//!
//! Writes made inside [`Runtime::batch`] are dispatched once the batch ends, and
//! every affected computation is invalidated once.

pub mod connect;

pub use connect::{connect, connect_with, render_unconnected, Connected, Rerender};
pub use remx_reactive as reactive;
pub use remx_reactive::{Runtime, RuntimeConfig};
pub use remx_store as store;
pub use remx_store::{Init, Node, Store, StoreError, Value};

pub mod prelude {
    pub use crate::connect::{connect, connect_with, render_unconnected, Connected, Rerender};
    pub use remx_reactive::{
        track_and_subscribe, Computation, ReportUntracked, Runtime, RuntimeConfig, Subscription,
    };
    pub use remx_store::{list, map, map_from, object, Init, Key, Node, Store, StoreError, Value};
}
