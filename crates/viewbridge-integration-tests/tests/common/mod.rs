//! Shared helpers for integration tests.

use std::time::Duration;

use viewbridge_ipc::{Notification, WebviewClient};

/// Wait for the next notification, failing the test after a second.
#[allow(dead_code)]
pub async fn next_notification(client: &WebviewClient) -> Notification {
    tokio::time::timeout(Duration::from_secs(1), client.next_notification())
        .await
        .expect("timed out waiting for notification")
        .expect("host endpoint closed")
}

/// Give spawned tasks a moment, then assert nothing was delivered.
#[allow(dead_code)]
pub async fn assert_quiet(client: &WebviewClient) {
    tokio::time::sleep(Duration::from_millis(50)).await;
    if let Some(n) = client.try_next_notification() {
        panic!("unexpected notification {}", n.method);
    }
}
