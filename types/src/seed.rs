//! Seeds and their commitments.
//!
//! A party draws one [`Seed`] per session, publishes only its [`Digest`]
//! first, and reveals the raw seed in a later round.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seed length in bytes; equal to the key size of the seed stream cipher.
pub const SEED_LEN: usize = 32;

/// A uniformly random per-session seed (`Rs` or `Rc`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed(pub [u8; SEED_LEN]);

/// A 32-byte Blake2b-256 digest, used as a commitment to a [`Seed`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(pub [u8; 32]);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({})", hex::encode(&self.0[..4]))
    }
}

impl Digest {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}
