//! Fixtures for remx end-to-end tests.
//!
//! [`TestStore`] is a small application store with getters and setters the
//! way application code wraps a [`Store`]. [`smart_component`] is a render
//! that reads it, and [`RenderSpy`] counts how often a render ran.
//!
//! # Example
//!
//! ```rust
//! use remx::connect;
//! use remx_test::prelude::*;
//!
//! let store = TestStore::new();
//! let spy = RenderSpy::new();
//! let view = connect(store.runtime(), smart_component(&store, &spy, ComponentProps::default()));
//!
//! store.set_name("Gandalf").unwrap();
//! assert_eq!(view.output(), "Gandalf");
//! assert_eq!(spy.count(), 2);
//! ```

use std::{cell::Cell, rc::Rc};

use remx::{
    reactive::{RecordingReporter, ReportUntracked},
    store::{map, object, Init},
    Node, Runtime, RuntimeConfig, Store, StoreError,
};

pub mod prelude {
    pub use super::{smart_component, ComponentProps, RenderSpy, TestStore};
}

/// The application store used across the scenarios:
///
/// ```json
/// { "person": { "name": "nothing" }, "products": {}, "dynamicObject": {} }
/// ```
///
/// `products` and `dynamicObject` are dynamic maps.
#[derive(Clone)]
pub struct TestStore {
    runtime: Runtime,
    store: Store,
    reporter: RecordingReporter,
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TestStore {
    /// A store whose runtime only reports reads made while rendering an
    /// unconnected component.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default().report_untracked(ReportUntracked::InRender))
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let reporter = RecordingReporter::new();
        let runtime = Runtime::with_reporter(config, reporter.clone());
        let store = Store::new(
            &runtime,
            object([
                ("person", object([("name", "nothing")])),
                ("products", map()),
                ("dynamicObject", map()),
            ]),
        )
        .expect("fixture root is an object");
        Self {
            runtime,
            store,
            reporter,
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Every untracked-access message reported so far.
    pub fn reporter(&self) -> &RecordingReporter {
        &self.reporter
    }

    fn node(&self, key: &str) -> Option<Node> {
        self.store
            .root()
            .get(key)
            .ok()
            .flatten()
            .and_then(|value| value.into_node())
    }

    // getters

    pub fn name(&self) -> String {
        self.store
            .root()
            .get_path(["person", "name"])
            .ok()
            .flatten()
            .and_then(|value| value.as_str().map(str::to_owned))
            .unwrap_or_default()
    }

    pub fn product(&self, id: &str) -> Option<Node> {
        self.node("products")?
            .get(id)
            .ok()
            .flatten()
            .and_then(|value| value.into_node())
    }

    pub fn product_title(&self, id: &str) -> Option<String> {
        let title = self.product(id)?.get("title").ok().flatten()?;
        title.as_str().map(str::to_owned)
    }

    /// `dynamicObject` serialized as compact JSON.
    pub fn dynamic_object_json(&self) -> String {
        self.node("dynamicObject")
            .and_then(|node| node.to_json().ok())
            .map(|json| json.to_string())
            .unwrap_or_default()
    }

    // setters

    pub fn set_name(&self, name: &str) -> Result<(), StoreError> {
        self.store.batch(|| {
            let person = self.node("person").ok_or(StoreError::StaleNode)?;
            person.set("name", name)
        })
    }

    pub fn add_product(&self, id: &str, product: impl Into<Init>) -> Result<(), StoreError> {
        let product = product.into();
        self.store.batch(|| {
            let products = self.node("products").ok_or(StoreError::StaleNode)?;
            products.set(id, product)
        })
    }

    pub fn set_dynamic_object(&self, key: &str, value: impl Into<Init>) -> Result<(), StoreError> {
        let value = value.into();
        self.store.batch(|| {
            let dynamic = self.node("dynamicObject").ok_or(StoreError::StaleNode)?;
            dynamic.set(key, value)
        })
    }

    /// Set `dynamicObject.newKey.nestedKey`.
    pub fn set_dynamic_object_nested_value(&self, value: &str) -> Result<(), StoreError> {
        self.store.batch(|| {
            let nested = self
                .store
                .root()
                .get_path(["dynamicObject", "newKey"])?
                .and_then(|value| value.into_node())
                .ok_or(StoreError::StaleNode)?;
            nested.set("nestedKey", value)
        })
    }
}

/// Counts renders.
#[derive(Debug, Clone, Default)]
pub struct RenderSpy {
    count: Rc<Cell<usize>>,
}

impl RenderSpy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call(&self) {
        self.count.set(self.count.get() + 1);
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentProps {
    /// Render `dynamicObject` as JSON instead of the product or name.
    pub test_dynamic_object: bool,
}

/// A render that shows the title of product `123` if there is one and the
/// person's name otherwise.
pub fn smart_component(
    store: &TestStore,
    spy: &RenderSpy,
    props: ComponentProps,
) -> impl Fn() -> String + use<> {
    let store = store.clone();
    let spy = spy.clone();
    move || {
        spy.call();
        if props.test_dynamic_object {
            return store.dynamic_object_json();
        }
        store.product_title("123").unwrap_or_else(|| store.name())
    }
}
