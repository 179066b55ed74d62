//! Top-level error type shared across crates.

use thiserror::Error;

/// Common error type for values that fail basic validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrandError {
    #[error("invalid threshold parameters: {0}")]
    InvalidThreshold(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("roster index {index} out of range (roster has {len} servers)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("roster contains duplicate key at position {0}")]
    DuplicateKey(usize),
}
