//! End-to-end flow through the gateway: success, rate limiting, status routes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_success_passes_payload_through() {
    let backend = common::start_programmable_backend(|| async {
        (200, r#"{"id":7,"value":"fresh"}"#.to_string())
    })
    .await;
    let (gateway, _shutdown) = common::start_gateway(common::test_config(backend)).await;

    let res = common::client()
        .get(format!("http://{}/api/data", gateway))
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "id": 7, "value": "fresh" }));
}

#[tokio::test]
async fn test_rate_limit_rejects_without_calling_downstream() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let backend = common::start_programmable_backend(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (200, r#"{"ok":true}"#.to_string())
        }
    })
    .await;

    let mut config = common::test_config(backend);
    config.rate_limit.max_requests = 2;
    config.rate_limit.window_secs = 60;
    let (gateway, _shutdown) = common::start_gateway(config).await;
    let client = common::client();
    let url = format!("http://{}/api/data", gateway);

    for _ in 0..2 {
        assert_eq!(client.get(&url).send().await.unwrap().status(), 200);
    }

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 429);
    let retry_after: u64 = res
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("Retry-After header");
    assert!((1..=60).contains(&retry_after));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Too Many Requests");
    assert_eq!(body["retry_after"], retry_after);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    let usage: Value = client
        .get(format!("http://{}/api/rate-limit", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(usage["limit"], 2);
    assert_eq!(usage["used"], 2);
    assert_eq!(usage["remaining"], 0);

    // Rejections never reach the breaker.
    let stats: Value = client
        .get(format!("http://{}/api/circuit", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["fires"], 2);
    assert_eq!(stats["state"], "CLOSED");
}

#[tokio::test]
async fn test_concurrent_burst_admits_exactly_the_limit() {
    let backend = common::start_programmable_backend(|| async {
        (200, r#"{"ok":true}"#.to_string())
    })
    .await;

    let mut config = common::test_config(backend);
    config.rate_limit.max_requests = 5;
    let (gateway, _shutdown) = common::start_gateway(config).await;
    let client = common::client();
    let url = format!("http://{}/api/data", gateway);

    let requests = (0..12).map(|_| {
        let client = client.clone();
        let url = url.clone();
        async move { client.get(&url).send().await.unwrap().status().as_u16() }
    });
    let statuses = join_all(requests).await;

    assert_eq!(statuses.iter().filter(|s| **s == 200).count(), 5);
    assert_eq!(statuses.iter().filter(|s| **s == 429).count(), 7);
}

#[tokio::test]
async fn test_health_and_circuit_routes_on_fresh_gateway() {
    let backend = common::start_programmable_backend(|| async {
        (200, r#"{"ok":true}"#.to_string())
    })
    .await;
    let (gateway, shutdown) = common::start_gateway(common::test_config(backend)).await;
    let client = common::client();

    let health: Value = client
        .get(format!("http://{}/health", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["circuit"]["state"], "CLOSED");

    let stats: Value = client
        .get(format!("http://{}/api/circuit", gateway))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["fires"], 0);
    assert_eq!(stats["consecutiveFailures"], 0);
    assert!(stats["nextAttempt"].is_null());

    shutdown.trigger();
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert!(client
        .get(format!("http://{}/health", gateway))
        .send()
        .await
        .is_err());
}
