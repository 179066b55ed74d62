//! Blake2b hashing for commitments and transcripts.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest as _};
use prand_types::{Digest, Seed};

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[data])
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Commitment to a seed: `Hash(seed)`.
pub fn commit(seed: &Seed) -> Digest {
    Digest(blake2b_256(seed.as_bytes()))
}
