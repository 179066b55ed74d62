//! Nullable seed source: deterministic seeds.

use prand_crypto::SeedSource;
use prand_types::{Seed, SEED_LEN};

/// A seed source for testing.
///
/// Returns pre-configured seeds in order, cycling when it runs out.
pub struct NullSeeds {
    seeds: Vec<[u8; SEED_LEN]>,
    index: usize,
}

impl NullSeeds {
    /// Create with a sequence of deterministic seeds. Panics on an empty list.
    pub fn new(seeds: Vec<[u8; SEED_LEN]>) -> Self {
        assert!(!seeds.is_empty(), "NullSeeds needs at least one seed");
        Self { seeds, index: 0 }
    }

    /// Create with a single seed returned for every call.
    pub fn constant(seed: [u8; SEED_LEN]) -> Self {
        Self::new(vec![seed])
    }
}

impl SeedSource for NullSeeds {
    fn next_seed(&mut self) -> Seed {
        let seed = self.seeds[self.index % self.seeds.len()];
        self.index += 1;
        Seed(seed)
    }
}
