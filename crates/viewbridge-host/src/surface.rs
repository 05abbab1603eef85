//! The UI surface a view hosts.

use viewbridge_ipc::Endpoint;

use crate::error::BridgeResult;

/// An isolated UI surface bound to the webview end of a channel.
pub trait UiSurface: Send {
    /// Tear the surface down. Called once, from
    /// [`WebviewView::destroy`](crate::WebviewView::destroy).
    fn release(&mut self);
}

/// Creates UI surfaces for new views.
pub trait SurfaceFactory: Send + Sync {
    /// Create a surface that talks to the host through `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Surface`](crate::BridgeError::Surface) if the
    /// surface cannot be created.
    fn create(&self, endpoint: Endpoint) -> BridgeResult<Box<dyn UiSurface>>;
}
