//! Stream fan-out semantics.

use super::open_test_store;
use getit_protocol::{Request, Status, Value, Verb};
use std::collections::HashSet;

fn store_req(key: &str, value: Value) -> Request {
    Request::with_key_value(Verb::Store, key, value)
}

/// Collect every Ok payload from a stream channel until it closes.
async fn collect_ok(store: &crate::Store, verb: Verb) -> Vec<Value> {
    let request = Request::new(verb);
    let mut rx = store.dispatch_stream(&request).await;
    let mut values = Vec::new();
    while let Some(response) = rx.recv().await {
        match response.status {
            Status::Ok => values.push(response.value.expect("ok frame carries data")),
            Status::NotFound => {} // unset slot marker, filtered by the server
            other => panic!("unexpected stream status {other}"),
        }
    }
    values
}

#[tokio::test]
async fn test_keys_stream_completeness() {
    let (store, _rx, _paths, _dir) = open_test_store();

    let mut expected = HashSet::new();
    for i in 0..12 {
        let key = format!("k{i}");
        store.dispatch(&store_req(&key, Value::Int(i))).await;
        expected.insert(key);
    }

    let keys: HashSet<String> = collect_ok(&store, Verb::Keys)
        .await
        .into_iter()
        .map(|v| match v {
            Value::Str(s) => s,
            other => panic!("keys stream yielded {other:?}"),
        })
        .collect();

    assert_eq!(keys, expected);
}

#[tokio::test]
async fn test_values_stream_payloads() {
    let (store, _rx, _paths, _dir) = open_test_store();

    store.dispatch(&store_req("a", Value::Int(1))).await;
    store
        .dispatch(&store_req("b", Value::Str("two".to_string())))
        .await;

    let values = collect_ok(&store, Verb::Values).await;
    assert_eq!(values.len(), 2);
    assert!(values.contains(&Value::Int(1)));
    assert!(values.contains(&Value::Str("two".to_string())));
}

#[tokio::test]
async fn test_items_stream_projection() {
    let (store, _rx, _paths, _dir) = open_test_store();

    store.dispatch(&store_req("a", Value::Int(1))).await;
    store
        .dispatch(&store_req("b", Value::Str("two".to_string())))
        .await;

    let items: HashSet<String> = collect_ok(&store, Verb::Items)
        .await
        .into_iter()
        .map(|v| v.to_string())
        .collect();

    assert_eq!(
        items,
        HashSet::from(["a 1".to_string(), "b two".to_string()])
    );
}

#[tokio::test]
async fn test_empty_store_stream() {
    let (store, _rx, _paths, _dir) = open_test_store();

    let values = collect_ok(&store, Verb::Keys).await;
    assert!(values.is_empty());
}

#[tokio::test]
async fn test_stream_excludes_previously_cleared_keys() {
    let (store, _rx, _paths, _dir) = open_test_store();

    for i in 0..8 {
        store
            .dispatch(&store_req(&format!("k{i}"), Value::Int(i)))
            .await;
    }
    store
        .dispatch(&Request::with_key(Verb::Clear, "k3"))
        .await;

    let keys: HashSet<String> = collect_ok(&store, Verb::Keys)
        .await
        .into_iter()
        .map(|v| v.to_string())
        .collect();

    assert!(!keys.contains("k3"));
    assert_eq!(keys.len(), 7);
}

#[tokio::test]
async fn test_concurrent_streams() {
    let (store, _rx, _paths, _dir) = open_test_store();

    for i in 0..10 {
        store
            .dispatch(&store_req(&format!("k{i}"), Value::Int(i)))
            .await;
    }

    let mut handles = Vec::new();
    for _ in 0..4 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            collect_ok(&store, Verb::Keys).await.len()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 10);
    }
}

#[tokio::test]
async fn test_stream_does_not_block_later_writes() {
    let (store, _rx, _paths, _dir) = open_test_store();

    for i in 0..5 {
        store
            .dispatch(&store_req(&format!("k{i}"), Value::Int(i)))
            .await;
    }

    // fully drain a stream, then write again
    let keys = collect_ok(&store, Verb::Keys).await;
    assert_eq!(keys.len(), 5);

    let response = store.dispatch(&store_req("late", Value::Int(99))).await;
    assert_eq!(response.status, Status::Ok);
}
