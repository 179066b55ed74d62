//! Shared utilities for prand binaries.

pub mod logging;

pub use logging::{init_tracing, LogFormat, LoggingError};
