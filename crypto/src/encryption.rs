//! Share encryption between a dealer and an insurer.
//!
//! Uses X25519 Diffie-Hellman between the two long-term identities (converted
//! from Ed25519), then ChaCha20-Poly1305 AEAD. The symmetric key is bound to a
//! caller-supplied context (deal id and share index), so a key is never used
//! for more than one plaintext and a fixed nonce is sound.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use prand_types::{PrivateKey, PublicKey};
use x25519_dalek::{PublicKey as X25519Public, StaticSecret};

use crate::keys::{ed25519_private_to_x25519, ed25519_public_to_x25519};
use crate::CryptoError;

const SHARE_DOMAIN: &[u8] = b"prand-share";

fn share_cipher(
    own_private: &PrivateKey,
    peer_public: &PublicKey,
    context: &[u8],
) -> Result<ChaCha20Poly1305, CryptoError> {
    let secret = StaticSecret::from(ed25519_private_to_x25519(own_private));
    let peer =
        X25519Public::from(ed25519_public_to_x25519(peer_public).ok_or(CryptoError::InvalidPublicKey)?);
    let shared = secret.diffie_hellman(&peer);
    if !shared.was_contributory() {
        return Err(CryptoError::InvalidPublicKey);
    }

    let sym_key = crate::hash::blake2b_256_multi(&[shared.as_bytes(), SHARE_DOMAIN, context]);
    ChaCha20Poly1305::new_from_slice(&sym_key).map_err(|_| CryptoError::Encryption)
}

/// Encrypt a 32-byte share for `recipient`.
///
/// Returns the 48-byte ciphertext (32 bytes plaintext + 16 bytes auth tag).
pub fn encrypt_share(
    share: &[u8; 32],
    recipient: &PublicKey,
    sender_private: &PrivateKey,
    context: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = share_cipher(sender_private, recipient, context)?;
    cipher
        .encrypt(&Nonce::default(), share.as_ref())
        .map_err(|_| CryptoError::Encryption)
}

/// Decrypt a share sent by `sender` under the same context.
pub fn decrypt_share(
    encrypted: &[u8],
    sender: &PublicKey,
    recipient_private: &PrivateKey,
    context: &[u8],
) -> Result<[u8; 32], CryptoError> {
    let cipher = share_cipher(recipient_private, sender, context)?;
    let decrypted = cipher
        .decrypt(&Nonce::default(), encrypted)
        .map_err(|_| CryptoError::Decryption)?;

    decrypted
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidLength(decrypted.len()))
}
