//! Fundamental types for the prand randomness protocol.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! long-term keys, seeds and their commitments, threshold parameters, and the
//! server roster.

pub mod error;
pub mod keys;
pub mod params;
pub mod roster;
pub mod seed;

pub use error::PrandError;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use params::ThresholdParams;
pub use roster::Roster;
pub use seed::{Digest, Seed, SEED_LEN};
