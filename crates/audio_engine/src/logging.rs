//! Logging utilities
//!
//! Thin wrapper over `env_logger` so applications and tests initialize
//! logging the same way.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system from the `RUST_LOG` environment variable.
pub fn init() {
    env_logger::init();
}

/// Initialize logging, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_with_default_filter() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
