//! Message authentication: signed envelopes around protocol messages.
//!
//! An envelope is `bincode(SignedEnvelope { payload, signature })` where
//! `payload = bincode(Message)` and the signature is the sender's Ed25519
//! signature over the payload under the envelope context. Receivers open an
//! envelope only with the public key of the party they expect it from.

use prand_messages::Message;
use prand_types::{KeyPair, PublicKey, Signature};
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// Maximum accepted envelope size in bytes.
pub const MAX_ENVELOPE_SIZE: usize = 16 * 1024 * 1024; // 16 MiB

const ENVELOPE_DOMAIN: &[u8] = b"prand-envelope-v1";

#[derive(Serialize, Deserialize)]
struct SignedEnvelope {
    payload: Vec<u8>,
    signature: Signature,
}

/// Serialize and sign `message` with the sender's long-term key.
pub fn encode(sender: &KeyPair, message: &Message) -> Result<Vec<u8>, AuthError> {
    let payload = bincode::serialize(message).map_err(|e| AuthError::Encode(e.to_string()))?;
    let signature = prand_crypto::sign_message(ENVELOPE_DOMAIN, &payload, &sender.private);
    let bytes = bincode::serialize(&SignedEnvelope { payload, signature })
        .map_err(|e| AuthError::Encode(e.to_string()))?;
    if bytes.len() > MAX_ENVELOPE_SIZE {
        return Err(AuthError::TooLarge {
            size: bytes.len(),
            max: MAX_ENVELOPE_SIZE,
        });
    }
    Ok(bytes)
}

/// Verify an envelope against `sender` and decode the message inside.
pub fn decode(sender: &PublicKey, bytes: &[u8]) -> Result<Message, AuthError> {
    if bytes.len() > MAX_ENVELOPE_SIZE {
        return Err(AuthError::TooLarge {
            size: bytes.len(),
            max: MAX_ENVELOPE_SIZE,
        });
    }
    let envelope: SignedEnvelope =
        bincode::deserialize(bytes).map_err(|e| AuthError::Malformed(e.to_string()))?;
    if !prand_crypto::verify_signature(
        ENVELOPE_DOMAIN,
        &envelope.payload,
        &envelope.signature,
        sender,
    ) {
        return Err(AuthError::BadSignature);
    }
    bincode::deserialize(&envelope.payload).map_err(|e| AuthError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use prand_crypto::keypair_from_seed;
    use prand_messages::{I1, R2};
    use prand_types::{Digest, Seed};

    #[test]
    fn encode_decode_roundtrip() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let msg = Message::R2(R2 {
            rs: Seed([3; 32]),
            deal: vec![1, 2, 3],
        });
        let bytes = encode(&kp, &msg).unwrap();
        assert_eq!(decode(&kp.public, &bytes).unwrap(), msg);
    }

    #[test]
    fn wrong_sender_is_rejected() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let other = keypair_from_seed(&[6u8; 32]);
        let bytes = encode(&kp, &Message::I1(I1 { hrc: Digest::ZERO })).unwrap();
        assert_eq!(decode(&other.public, &bytes), Err(AuthError::BadSignature));
    }

    #[test]
    fn flipped_payload_bit_is_rejected() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let mut bytes = encode(&kp, &Message::I1(I1 { hrc: Digest([9; 32]) })).unwrap();
        // payload starts after the 8-byte length prefix
        bytes[12] ^= 0x01;
        assert!(decode(&kp.public, &bytes).is_err());
    }

    #[test]
    fn garbage_is_malformed() {
        let kp = keypair_from_seed(&[5u8; 32]);
        assert!(matches!(
            decode(&kp.public, b"xx"),
            Err(AuthError::Malformed(_))
        ));
    }

    #[test]
    fn encoding_is_deterministic() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let msg = Message::I1(I1 { hrc: Digest([1; 32]) });
        assert_eq!(encode(&kp, &msg).unwrap(), encode(&kp, &msg).unwrap());
    }
}
