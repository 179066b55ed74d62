//! Ed25519 key generation and conversion to X25519 for share encryption.

use ed25519_dalek::SigningKey;
use prand_types::{KeyPair, PrivateKey, PublicKey};
use rand::rngs::OsRng;

/// Generate a new Ed25519 key pair from a secure random source.
pub fn generate_keypair() -> KeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    let verifying_key = signing_key.verifying_key();
    KeyPair {
        public: PublicKey(verifying_key.to_bytes()),
        private: PrivateKey(signing_key.to_bytes()),
    }
}

/// Derive the public key from a private key.
pub fn public_from_private(private: &PrivateKey) -> PublicKey {
    let signing_key = SigningKey::from_bytes(&private.0);
    PublicKey(signing_key.verifying_key().to_bytes())
}

/// Reconstruct a full key pair from a private key.
pub fn keypair_from_private(private: PrivateKey) -> KeyPair {
    let public = public_from_private(&private);
    KeyPair { public, private }
}

/// Derive a key pair from a 32-byte seed (deterministic). Used by tests and
/// fixtures that need stable identities.
pub fn keypair_from_seed(seed: &[u8; 32]) -> KeyPair {
    keypair_from_private(PrivateKey(*seed))
}

/// Convert an Ed25519 private key (seed) to X25519 scalar bytes.
///
/// The corresponding X25519 public key is `ed25519_public_to_x25519(&public_key)`.
pub fn ed25519_private_to_x25519(ed25519_private: &PrivateKey) -> [u8; 32] {
    SigningKey::from_bytes(&ed25519_private.0).to_scalar_bytes()
}

/// Convert an Ed25519 public key to its X25519 (Montgomery) equivalent.
///
/// Returns `None` if the public key bytes are not a valid point.
pub fn ed25519_public_to_x25519(ed25519_public: &PublicKey) -> Option<[u8; 32]> {
    let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&ed25519_public.0).ok()?;
    Some(verifying_key.to_montgomery().to_bytes())
}
