//! Nullable infrastructure for deterministic testing.
//!
//! Sessions depend on two outside collaborators: a [`Transport`] to their
//! peer and a [`SeedSource`]. This crate provides test-friendly versions
//! that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.
//!
//! [`Transport`]: prand_protocol::Transport
//! [`SeedSource`]: prand_crypto::SeedSource

pub mod network;
pub mod random;

pub use network::{channel_pair, ChannelTransport, NullTransport};
pub use random::NullSeeds;
