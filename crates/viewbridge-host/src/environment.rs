//! Host environment collaborators injected into views.

use std::process::Stdio;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

/// Opens URLs in an external application.
#[async_trait]
pub trait UrlOpener: Send + Sync {
    /// Open `url`. Returns `false` if no application accepted it.
    async fn open(&self, url: &Url) -> bool;
}

/// Source of active-editor changes, forwarded to a view once it is ready.
pub trait EditorContextSource: Send + Sync {
    /// Stream of active-editor payloads. Each item is sent as
    /// `host/didChangeActiveEditor` params.
    fn active_editor_changes(&self) -> BoxStream<'static, Value>;
}

/// [`UrlOpener`] that hands URLs to the platform's default handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUrlOpener;

impl SystemUrlOpener {
    fn command(url: &Url) -> Command {
        let target = url.as_str();
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(target);
            cmd
        } else if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", target]);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(target);
            cmd
        }
    }
}

#[async_trait]
impl UrlOpener for SystemUrlOpener {
    async fn open(&self, url: &Url) -> bool {
        if !matches!(url.scheme(), "http" | "https") {
            warn!(scheme = url.scheme(), "refusing to open non-web url");
            return false;
        }
        let status = Self::command(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;
        match status {
            Ok(status) if status.success() => true,
            Ok(status) => {
                debug!(code = status.code(), "url handler exited with failure");
                false
            },
            Err(e) => {
                debug!(error = %e, "no url handler available");
                false
            },
        }
    }
}
