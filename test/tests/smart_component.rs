//! End-to-end scenarios of a render connected to an application store.

use remx::{connect, render_unconnected, store::object};
use remx_test::prelude::*;
use serde_json::json;

fn warning(prop: &str) -> String {
    format!("[REMX] attemted to access prop '{prop}' in react component untracked by remx")
}

#[test]
fn test_renders_normally() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    let render = smart_component(&store, &spy, ComponentProps::default());

    assert_eq!(render_unconnected(store.runtime(), render), "nothing");
    assert_eq!(spy.count(), 1);
}

#[test]
fn test_connected_component_renders_normally() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    let view = connect(
        store.runtime(),
        smart_component(&store, &spy, ComponentProps::default()),
    );

    assert_eq!(view.output(), "nothing");
    assert_eq!(spy.count(), 1);
    assert_eq!(view.render_count(), 1);
}

#[test]
fn test_regular_component_does_not_listen_to_changes() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    let output = render_unconnected(
        store.runtime(),
        smart_component(&store, &spy, ComponentProps::default()),
    );
    assert_eq!(output, "nothing");

    store.set_name("Gandalf").unwrap();
    assert_eq!(store.name(), "Gandalf");
    assert_eq!(spy.count(), 1);
    assert_eq!(store.runtime().subscriber_count(), 0);
}

#[test]
fn test_connected_component_rerenders_when_read_state_changes() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    let view = connect(
        store.runtime(),
        smart_component(&store, &spy, ComponentProps::default()),
    );
    assert_eq!(store.name(), "nothing");
    assert_eq!(spy.count(), 1);

    store.set_name("Gandalf").unwrap();
    assert_eq!(store.name(), "Gandalf");
    assert_eq!(view.output(), "Gandalf");
    assert_eq!(spy.count(), 2);
}

#[test]
fn test_detects_changes_on_added_map_keys() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    let view = connect(
        store.runtime(),
        smart_component(&store, &spy, ComponentProps::default()),
    );
    assert_eq!(view.output(), "nothing");

    store
        .add_product("123", object([("title", "my product")]))
        .unwrap();
    assert_eq!(view.output(), "my product");
    assert_eq!(spy.count(), 2);
}

#[test]
fn test_tracks_dynamically_added_keys() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    let view = connect(
        store.runtime(),
        smart_component(
            &store,
            &spy,
            ComponentProps {
                test_dynamic_object: true,
            },
        ),
    );
    assert_eq!(view.output(), "{}");

    store.set_dynamic_object("newKey", "newValue").unwrap();
    assert_eq!(view.output(), json!({ "newKey": "newValue" }).to_string());
}

#[test]
fn test_tracks_nested_dynamically_added_keys() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    let view = connect(
        store.runtime(),
        smart_component(
            &store,
            &spy,
            ComponentProps {
                test_dynamic_object: true,
            },
        ),
    );

    store
        .set_dynamic_object("newKey", json!({ "nestedKey": "nestedValue" }))
        .unwrap();
    assert_eq!(view.output(), r#"{"newKey":{"nestedKey":"nestedValue"}}"#);

    store.set_dynamic_object_nested_value("someNewValue").unwrap();
    assert_eq!(view.output(), r#"{"newKey":{"nestedKey":"someNewValue"}}"#);
    assert_eq!(spy.count(), 3);
}

#[test]
fn test_unrelated_write_does_not_rerender() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    let _view = connect(
        store.runtime(),
        smart_component(&store, &spy, ComponentProps::default()),
    );

    store.add_product("456", object([("title", "other")])).unwrap();
    store.set_dynamic_object("newKey", 1).unwrap();
    assert_eq!(spy.count(), 1);
}

#[test]
fn test_unmounted_component_stops_rendering() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    let view = connect(
        store.runtime(),
        smart_component(&store, &spy, ComponentProps::default()),
    );

    view.unmount();
    store.set_name("Gandalf").unwrap();
    assert_eq!(spy.count(), 1);
    assert_eq!(view.output(), "nothing");
}

// ===== Untracked access warnings =====

#[test]
fn test_no_warning_outside_of_a_component() {
    let store = TestStore::new();
    assert!(store.product("0").is_none());
    assert!(store.reporter().is_empty());
}

#[test]
fn test_unconnected_component_warns_for_every_read() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    render_unconnected(
        store.runtime(),
        smart_component(&store, &spy, ComponentProps::default()),
    );

    assert_eq!(
        store.reporter().take(),
        vec![
            warning("products"),
            warning("123"),
            warning("person"),
            warning("name"),
        ]
    );
}

#[test]
fn test_connected_component_does_not_warn() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    let _view = connect(
        store.runtime(),
        smart_component(&store, &spy, ComponentProps::default()),
    );
    assert!(store.reporter().is_empty());
}

#[test]
fn test_unconnected_closure_component_warns() {
    let store = TestStore::new();
    let component = {
        let store = store.clone();
        move || store.product("0").is_some()
    };

    assert!(!render_unconnected(store.runtime(), &component));
    assert_eq!(
        store.reporter().take(),
        vec![warning("products"), warning("0")]
    );

    let view = connect(store.runtime(), component);
    assert!(!view.output());
    assert!(store.reporter().is_empty());
}
