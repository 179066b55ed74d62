//! Verifiable secret sharing for the prand protocol.
//!
//! A dealer splits a one-time secret with a random polynomial of degree
//! `t - 1`, publishes Feldman commitments to the coefficients, and encrypts
//! each evaluation to one insurer. An insurer decrypts its share, checks it
//! against the commitments, and signs a [`Response`] attesting that it holds a
//! well-formed share. Later, any `t` revealed [`Share`]s recover the secret.

pub mod deal;
pub mod error;
mod poly;
pub mod response;

pub use deal::{Deal, SecretPair};
pub use error::VssError;
pub use poly::recover_secret;
pub use response::{Response, Share};

pub use curve25519_dalek::scalar::Scalar;
