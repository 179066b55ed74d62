//! Cryptographic suite for the prand protocol.
//!
//! - **Ed25519** for long-term identities and message signatures
//! - **Blake2b-256** for seed commitments and transcript hashing
//! - **X25519 + ChaCha20-Poly1305** for encrypting VSS shares to insurers
//! - **ChaCha20** keystream as the per-session seed source

pub mod encryption;
pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;
pub mod stream;

pub use encryption::{decrypt_share, encrypt_share};
pub use error::CryptoError;
pub use hash::{blake2b_256, blake2b_256_multi, commit};
pub use keys::{
    ed25519_private_to_x25519, ed25519_public_to_x25519, generate_keypair, keypair_from_private,
    keypair_from_seed, public_from_private,
};
pub use sign::{sign_message, verify_signature};
pub use stream::{SeedSource, StreamSeedSource};
