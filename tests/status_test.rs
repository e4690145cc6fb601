//! Integration tests for the root status document.

mod common;

use common::{payload, TestHarness, POOL_SIZE};

#[tokio::test]
async fn status_document_reports_pool_and_version() {
    let (_h, addr) = TestHarness::with_server().await;

    let resp = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["server_status"], "running");
    assert_eq!(body["connected_bots"], POOL_SIZE);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptime"].as_str().unwrap().ends_with('s'));

    let loads = body["loads"].as_object().unwrap();
    assert_eq!(loads.len(), POOL_SIZE);
    for position in 1..=POOL_SIZE {
        assert_eq!(loads[&format!("bot{position}")], 0);
    }
}

#[tokio::test]
async fn status_loads_are_sorted_descending() {
    use std::sync::Arc;
    use std::time::Duration;
    use streamgate::store::MemoryStore;

    // Slow fetches on a large object keep a stream in flight (well past
    // what socket buffers can absorb) while we look at the loads.
    let store = Arc::new(MemoryStore::with_fetch_delay(Duration::from_millis(20)));
    let (h, addr) = TestHarness::with_server_store(store).await;
    let (scope, object) = h.add_object(payload(4 * 1024 * 1024), None, None);

    let path = h.signed_path(scope, object, 3600);
    let client = reqwest::Client::new();
    let in_flight = client
        .get(format!("http://{addr}/{path}"))
        .send()
        .await
        .unwrap();

    let resp = reqwest::get(format!("http://{addr}/")).await.unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    let loads = body["loads"].as_object().unwrap();

    // Positional labels: bot1 carries the in-flight request, the values
    // never increase as the labels go up.
    let values: Vec<u64> = loads.values().map(|v| v.as_u64().unwrap()).collect();
    assert_eq!(values.len(), POOL_SIZE);
    assert_eq!(values[0], 1);
    for pair in values.windows(2) {
        assert!(pair[0] >= pair[1]);
    }

    drop(in_flight);
}
