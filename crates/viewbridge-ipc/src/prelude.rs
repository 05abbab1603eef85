//! Common imports for working with the webview channel.
//!
//! ```rust
//! use viewbridge_ipc::prelude::*;
//! ```

pub use crate::{
    DuplexChannel, Endpoint, EndpointReceiver, EndpointSender, Envelope, IpcError, IpcResult,
    Notification, Request, Response, ResponseBody, WebviewClient, classify,
};
