//! Subscription lifecycle, nesting and batching across the whole stack.

use std::{cell::Cell, panic::AssertUnwindSafe, rc::Rc};

use remx::{
    prelude::*,
    reactive::{Change, ComputationId, Dependency},
};
use remx_test::prelude::*;

fn counter() -> (Rc<Cell<usize>>, impl Fn() + 'static) {
    let hits = Rc::new(Cell::new(0));
    let callback = {
        let hits = hits.clone();
        move || hits.set(hits.get() + 1)
    };
    (hits, callback)
}

#[test]
fn test_unsubscribe_is_immediate() {
    let store = TestStore::new();
    let (hits, callback) = counter();
    let ((), subscription) = track_and_subscribe(
        store.runtime(),
        || {
            store.name();
        },
        callback,
    );

    store.set_name("Gandalf").unwrap();
    assert_eq!(hits.get(), 1);

    subscription.unsubscribe();
    store.set_name("Saruman").unwrap();
    assert_eq!(hits.get(), 1);
    assert!(!subscription.is_active());
}

#[test]
fn test_unsubscribe_during_dispatch_skips_the_pending_callback() {
    let store = TestStore::new();
    let runtime = store.runtime().clone();
    let ((), deps) = runtime.track(|| {
        store.name();
    });
    let (second_hits, second_callback) = counter();
    let first = ComputationId::next();
    let second = ComputationId::next();

    runtime.subscribe(first, deps.clone(), {
        let runtime = runtime.clone();
        Rc::new(move || {
            runtime.unsubscribe(second);
        })
    });
    runtime.subscribe(second, deps, Rc::new(second_callback));

    store.set_name("Gandalf").unwrap();
    assert_eq!(second_hits.get(), 0);
    assert!(runtime.is_subscribed(first));
    assert!(!runtime.is_subscribed(second));
}

#[test]
fn test_nested_computations_keep_their_reads_apart() {
    let store = TestStore::new();
    let runtime = store.runtime().clone();
    let (outer_hits, outer_callback) = counter();
    let (inner_hits, inner_callback) = counter();

    let inner_subscription = Rc::new(Cell::new(None));
    let ((), _outer) = track_and_subscribe(
        &runtime,
        || {
            let ((), inner) = track_and_subscribe(
                &runtime,
                || {
                    store.product("123");
                },
                inner_callback,
            );
            inner_subscription.set(Some(inner));
            store.name();
        },
        outer_callback,
    );

    store
        .add_product("123", object([("title", "lamp")]))
        .unwrap();
    assert_eq!(inner_hits.get(), 1);
    assert_eq!(outer_hits.get(), 0);

    store.set_name("Gandalf").unwrap();
    assert_eq!(inner_hits.get(), 1);
    assert_eq!(outer_hits.get(), 1);
}

#[test]
fn test_batch_invalidates_each_computation_once() {
    let store = TestStore::new();
    let spy = RenderSpy::new();
    let view = connect(
        store.runtime(),
        smart_component(&store, &spy, ComponentProps::default()),
    );

    store.store().batch(|| {
        store.set_name("Gandalf").unwrap();
        store.add_product("123", object([("title", "staff")])).unwrap();
        assert_eq!(spy.count(), 1);
    });
    assert_eq!(spy.count(), 2);
    assert_eq!(view.output(), "staff");
}

#[test]
fn test_panicking_render_leaves_the_stack_balanced() {
    let store = TestStore::new();
    let runtime = store.runtime().clone();

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
        connect(&runtime, {
            let store = store.clone();
            move || -> String {
                store.name();
                panic!("render failed")
            }
        })
    }));
    assert!(result.is_err());
    assert_eq!(runtime.tracking_depth(), 0);
    assert_eq!(runtime.current_computation(), None);
    assert_eq!(runtime.subscriber_count(), 0);
}

#[test]
fn test_subtree_replacement_reaches_deep_readers() {
    let store = TestStore::new();
    store
        .add_product("123", object([("title", "lamp")]))
        .unwrap();
    let (hits, callback) = counter();
    let ((), subscription) = track_and_subscribe(
        store.runtime(),
        || {
            store.product_title("123");
        },
        callback,
    );

    let products = store
        .store()
        .root()
        .get("products")
        .unwrap()
        .and_then(Value::into_node)
        .unwrap();
    let old = products.get("123").unwrap().and_then(Value::into_node).unwrap();
    let title_path = store
        .runtime()
        .child_path(old.path_id().unwrap(), &Key::from("title"));

    store.runtime().notify([Change::Subtree(products.path_id().unwrap())]);
    assert_eq!(hits.get(), 1);

    store
        .add_product("123", object([("title", "desk")]))
        .unwrap();
    assert_eq!(hits.get(), 2);
    assert!(!old.is_attached());
    assert!(store
        .runtime()
        .dependencies(subscription.id())
        .unwrap()
        .contains(&Dependency::Value(title_path)));
}

#[test]
fn test_connected_view_recovers_after_a_failed_render() {
    let store = TestStore::new();
    let view = connect(store.runtime(), {
        let store = store.clone();
        move || {
            let name = store.name();
            if name == "boom" {
                panic!("cannot render {name}");
            }
            name
        }
    });

    let result = std::panic::catch_unwind(AssertUnwindSafe(|| store.set_name("boom")));
    assert!(result.is_err());

    store.set_name("Gandalf").unwrap();
    assert_eq!(view.output(), "Gandalf");
    assert_eq!(view.render_count(), 2);
    assert!(!view.is_dirty());
}
