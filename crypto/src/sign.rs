//! Ed25519 signing with a domain-separation context.
//!
//! Every signature in the protocol covers `len(context) || context || message`
//! so that a signature produced for one purpose (an envelope, a deal
//! response) can never be replayed as another.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use prand_types::{PrivateKey, PublicKey, Signature};

fn framed(context: &[u8], message: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + context.len() + message.len());
    buf.push(context.len() as u8);
    buf.extend_from_slice(context);
    buf.extend_from_slice(message);
    buf
}

/// Sign a message under a context with a private key.
pub fn sign_message(context: &[u8], message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    let sig = signing_key.sign(&framed(context, message));
    Signature(sig.to_bytes())
}

/// Verify a signature against a context, message and public key.
///
/// Returns `true` if the signature is valid, `false` otherwise.
/// Uses strict verification, rejecting small-order keys and non-canonical
/// signatures.
pub fn verify_signature(
    context: &[u8],
    message: &[u8],
    signature: &Signature,
    public_key: &PublicKey,
) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key
        .verify_strict(&framed(context, message), &dalek_sig)
        .is_ok()
}
