//! Common imports for hosting webviews.
//!
//! ```rust
//! use viewbridge_host::prelude::*;
//! ```

pub use crate::{
    BridgeContext, BridgeError, BridgeResult, BridgeSettings, EditorContextSource, SurfaceFactory,
    SystemUrlOpener, UiSurface, UrlOpener, WebviewView,
};
