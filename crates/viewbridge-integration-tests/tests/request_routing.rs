//! Request routing over a real duplex channel.

mod common;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{Value, json};
use viewbridge_host::{BridgeResult, SurfaceFactory, UiSurface, WebviewView};
use viewbridge_ipc::{Endpoint, IpcError};
use viewbridge_test::{BridgeHarness, TEST_EMAIL, TEST_PASSWORD};

/// Hands the raw webview endpoint to the test so every message is visible.
#[derive(Default)]
struct RawSurfaceFactory {
    endpoint: Mutex<Option<Endpoint>>,
}

struct RawSurface;

impl UiSurface for RawSurface {
    fn release(&mut self) {}
}

impl SurfaceFactory for RawSurfaceFactory {
    fn create(&self, endpoint: Endpoint) -> BridgeResult<Box<dyn UiSurface>> {
        *self.endpoint.lock().unwrap() = Some(endpoint);
        Ok(Box::new(RawSurface))
    }
}

fn raw_view(harness: &BridgeHarness) -> (WebviewView, Endpoint) {
    let factory = RawSurfaceFactory::default();
    let view = WebviewView::new(harness.ctx.clone(), &factory, None).unwrap();
    let endpoint = factory.endpoint.lock().unwrap().take().unwrap();
    (view, endpoint)
}

async fn recv(endpoint: &mut Endpoint) -> Value {
    tokio::time::timeout(Duration::from_secs(1), endpoint.recv())
        .await
        .expect("timed out waiting for host")
        .expect("host endpoint closed")
}

#[tokio::test]
async fn test_every_routed_request_gets_exactly_one_response() {
    let harness = BridgeHarness::new();
    harness
        .ctx
        .session()
        .login(TEST_EMAIL, TEST_PASSWORD)
        .await;
    let (_view, mut webview) = raw_view(&harness);

    let methods = [
        "bootstrap",
        "codeStream/posts",
        "update-configuration",
        "codeStream/users",
        "login",
    ];
    for (i, method) in methods.iter().enumerate() {
        let params = match *method {
            "update-configuration" => json!({"name": "muteAll", "value": true}),
            "login" => json!({"email": TEST_EMAIL, "password": TEST_PASSWORD}),
            _ => json!({"n": i}),
        };
        webview.post(json!({"id": format!("r{i}"), "method": method, "params": params}));
    }

    let mut answered: HashMap<String, usize> = HashMap::new();
    while answered.values().sum::<usize>() < methods.len() {
        let message = recv(&mut webview).await;
        if let Some(id) = message.get("id").and_then(Value::as_str) {
            *answered.entry(id.to_owned()).or_default() += 1;
        }
    }
    for i in 0..methods.len() {
        assert_eq!(answered.get(&format!("r{i}")), Some(&1), "request r{i}");
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    while let Ok(Some(extra)) =
        tokio::time::timeout(Duration::from_millis(10), webview.recv()).await
    {
        assert!(extra.get("id").is_none(), "duplicate response {extra}");
    }
}

#[tokio::test]
async fn test_slow_requests_do_not_block_later_ones() {
    let harness = BridgeHarness::new();
    harness
        .ctx
        .session()
        .login(TEST_EMAIL, TEST_PASSWORD)
        .await;
    let (_view, mut webview) = raw_view(&harness);

    harness.backend.hold();
    webview.post(json!({"id": "slow", "method": "codeStream/slow"}));
    webview.post(json!({"id": "fast", "method": "bootstrap"}));

    let first = recv(&mut webview).await;
    assert_eq!(first["id"], json!("fast"));

    harness.backend.release();
    let second = recv(&mut webview).await;
    assert_eq!(second["id"], json!("slow"));
}

#[tokio::test]
async fn test_proxied_requests_pass_through_unchanged() {
    let harness = BridgeHarness::new();
    let (_view, client) = harness.open_view();
    client
        .request("login", Some(harness.valid_login()))
        .await
        .unwrap();

    let params = json!({"streamId": "s1", "limit": 20, "nested": {"a": [1, 2]}});
    let result = client
        .request("codeStream/posts/fetch", Some(params.clone()))
        .await
        .unwrap();

    assert_eq!(
        result,
        json!({"method": "codeStream/posts/fetch", "params": params})
    );
    let calls = harness.backend.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "codeStream/posts/fetch");
    assert_eq!(calls[0].params, Some(params));
}

#[tokio::test]
async fn test_backend_failures_are_reflected_verbatim() {
    let harness = BridgeHarness::new();
    harness
        .backend
        .set_error("codeStream/streams/fetch", "Stream not found");
    let (_view, client) = harness.open_view();
    client
        .request("login", Some(harness.valid_login()))
        .await
        .unwrap();

    let err = client
        .request("codeStream/streams/fetch", Some(json!({"id": "missing"})))
        .await
        .unwrap_err();
    assert!(matches!(err, IpcError::Remote(ref m) if m == "Stream not found"));
}

#[tokio::test]
async fn test_proxy_while_signed_out_is_an_error() {
    let harness = BridgeHarness::new();
    let (_view, client) = harness.open_view();
    let err = client.request("codeStream/posts", None).await.unwrap_err();
    assert_eq!(err.to_string(), "Not signed in");
    assert_eq!(harness.backend.call_count(), 0);
}

#[tokio::test]
async fn test_unknown_local_methods_get_no_response() {
    let harness = BridgeHarness::new();
    let (_view, mut webview) = raw_view(&harness);

    webview.post(json!({"id": "x", "method": "reload-webview"}));
    webview.post(json!({"id": "y", "method": "bootstrap"}));

    let only = recv(&mut webview).await;
    assert_eq!(only["id"], json!("y"));
    assert!(
        tokio::time::timeout(Duration::from_millis(50), webview.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_malformed_messages_are_dropped() {
    let harness = BridgeHarness::new();
    let (_view, mut webview) = raw_view(&harness);

    webview.post(json!("not an object"));
    webview.post(json!({"id": 7, "method": "bootstrap"}));
    webview.post(json!({"id": "r", "params": {}, "error": "both"}));
    webview.post(json!({"id": "ok", "method": "bootstrap"}));

    let answer = recv(&mut webview).await;
    assert_eq!(answer["id"], json!("ok"));
}
