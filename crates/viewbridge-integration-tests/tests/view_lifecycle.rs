//! Readiness, show-stream, teardown and serialization of views.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use common::{assert_quiet, next_notification};
use serde_json::json;
use viewbridge_events::{EventMetadata, HostEvent, LogoutReason};
use viewbridge_ipc::IpcError;
use viewbridge_test::{BridgeHarness, MockEditorSource};

#[tokio::test]
async fn test_show_before_ready_is_delivered_once_after_ready() {
    let harness = BridgeHarness::new();
    let (view, client) = harness.open_view();

    view.show(Some("stream-1".to_owned()), None);
    assert_quiet(&client).await;

    client.notify("webview/didInitialize", None);
    let n = next_notification(&client).await;
    assert_eq!(n.method, "host/showStream");
    assert_eq!(n.params, Some(json!({"streamId": "stream-1", "threadId": null})));

    client.notify("webview/didInitialize", None);
    assert_quiet(&client).await;
}

#[tokio::test]
async fn test_show_after_ready_is_immediate() {
    let harness = BridgeHarness::new();
    let (view, client) = harness.open_view();
    client.notify("webview/didInitialize", None);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(view.is_ready());

    view.show(Some("s".to_owned()), Some("t".to_owned()));
    let n = next_notification(&client).await;
    assert_eq!(n.params, Some(json!({"streamId": "s", "threadId": "t"})));
}

#[tokio::test]
async fn test_destroy_with_request_pending_abandons_it() {
    let harness = BridgeHarness::new();
    let (view, client) = harness.open_view();
    client
        .request("login", Some(harness.valid_login()))
        .await
        .unwrap();

    harness.backend.hold();
    let pending = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.request("codeStream/slow", None).await }
    });
    while harness.backend.call_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    view.destroy();
    assert!(!view.is_alive());
    assert_eq!(harness.surfaces.released(), 1);
    drop(view);
    harness.backend.release();

    harness.ctx.bus().publish(HostEvent::BackendDataChanged {
        metadata: EventMetadata::new("agent"),
        payload: json!({"type": "posts"}),
    });
    assert!(harness.ctx.session().logout(LogoutReason::User).await);

    let outcome = pending.await.unwrap();
    assert!(matches!(
        outcome,
        Err(IpcError::ChannelClosed | IpcError::Timeout { .. })
    ));
    assert_quiet(&client).await;
}

#[tokio::test]
async fn test_destroyed_view_leaves_other_views_working() {
    let harness = BridgeHarness::new();
    let (first, first_client) = harness.open_view();
    let (_second, second_client) = harness.open_view();

    first.destroy();
    first.destroy();

    harness.ctx.bus().publish(HostEvent::BackendDataChanged {
        metadata: EventMetadata::new("agent"),
        payload: json!({"type": "streams"}),
    });

    let n = next_notification(&second_client).await;
    assert_eq!(n.method, "codestream/didChangeData");
    assert_eq!(n.params, Some(json!({"type": "streams"})));
    assert_quiet(&first_client).await;
    assert_eq!(harness.surfaces.released(), 1);
}

#[tokio::test]
async fn test_will_destroy_receives_current_context() {
    let harness = BridgeHarness::new();
    let (view, client) = harness.open_view();
    let calls = Arc::new(AtomicUsize::new(0));
    let captured = Arc::new(std::sync::Mutex::new(None));
    view.on_will_destroy({
        let calls = Arc::clone(&calls);
        let captured = Arc::clone(&captured);
        move |context| {
            calls.fetch_add(1, Ordering::SeqCst);
            *captured.lock().unwrap() = Some(context.clone());
        }
    });

    client.notify(
        "webview/didChangeContext",
        Some(json!({"context": {"currentStreamId": "s3"}})),
    );
    tokio::time::sleep(Duration::from_millis(20)).await;

    drop(view);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let context = captured.lock().unwrap().clone().unwrap();
    assert_eq!(context.get("currentStreamId"), Some(&json!("s3")));
}

#[tokio::test]
async fn test_serialize_names_the_deserializer() {
    let harness = BridgeHarness::new();
    let (view, _client) = harness.open_view();
    assert_eq!(view.serialize().deserializer, "viewbridge/WebviewView");
}

#[tokio::test]
async fn test_active_editor_changes_flow_after_ready() {
    let editor = Arc::new(MockEditorSource::new());
    let harness = BridgeHarness::new().with_editor_source(editor.clone());
    let (_view, client) = harness.open_view();

    editor.emit(json!({"editor": {"fileName": "early.rs"}}));
    assert_quiet(&client).await;
    assert_eq!(editor.subscriptions(), 0);

    client.notify("webview/didInitialize", None);
    while editor.subscriptions() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    editor.emit(json!({"editor": {"fileName": "main.rs"}}));

    let n = next_notification(&client).await;
    assert_eq!(n.method, "host/didChangeActiveEditor");
    assert_eq!(n.params, Some(json!({"editor": {"fileName": "main.rs"}})));

    client.notify("webview/didInitialize", None);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(editor.subscriptions(), 1);
}
