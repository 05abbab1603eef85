//! Common imports for working with bridge configuration.
//!
//! ```rust
//! use viewbridge_config::prelude::*;
//! ```

pub use crate::{
    BridgeConfig, ConfigError, ConfigResult, ConfigStore, OptionEffect, OptionSpec,
    ResolvedConfig,
};
