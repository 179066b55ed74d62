//! Seed source: a keyed pseudorandom stream from which sessions draw seeds.

use prand_types::{Seed, SEED_LEN};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Source of per-session seeds.
///
/// Sessions own their source exclusively; a source must never hand out the
/// same seed twice.
pub trait SeedSource: Send {
    fn next_seed(&mut self) -> Seed;
}

/// ChaCha20 keystream keyed from OS entropy.
pub struct StreamSeedSource {
    rng: ChaCha20Rng,
}

impl StreamSeedSource {
    /// Key the stream with fresh OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha20Rng::from_entropy(),
        }
    }

    /// Key the stream explicitly. The key must itself be secret and unique.
    pub fn from_key(key: [u8; SEED_LEN]) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(key),
        }
    }
}

impl SeedSource for StreamSeedSource {
    fn next_seed(&mut self) -> Seed {
        let mut seed = [0u8; SEED_LEN];
        self.rng.fill_bytes(&mut seed);
        Seed(seed)
    }
}
