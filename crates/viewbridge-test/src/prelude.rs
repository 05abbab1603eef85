//! Common imports for viewbridge tests.
//!
//! ```rust
//! use viewbridge_test::prelude::*;
//! ```

pub use crate::{
    BridgeHarness, CapturingSurfaceFactory, MockBackend, MockConnector, MockEditorSource,
    MockUrlOpener, TEST_EMAIL, TEST_PASSWORD, TEST_SIGNUP_TOKEN, setup_test_logging, test_config,
};
