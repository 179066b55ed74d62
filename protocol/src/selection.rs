//! Insurer selection.
//!
//! Maps `(roster, client seed, dealer seed)` to an ordered list of `n`
//! distinct roster positions. The dealer uses it to decide whom to deal to,
//! and every insurer uses it to find out whether (and at which share index)
//! it was picked. It is a pure function of its inputs; the caller's identity
//! plays no part.
//!
//! Algorithm (`prand-insurers-v1`):
//!
//! 1. `mix = Blake2b-256("prand-insurers-v1" || Rc || Rs)`
//! 2. `score_i = Blake2b-256(mix || u32_le(i) || roster[i])` for every position `i`
//! 3. sort positions ascending by `(score_i, i)` and keep the first `n`
//!
//! Position `k` in the output is the share index of that insurer. Since
//! neither seed is known to the other side before both are committed, no
//! single party can steer the outcome.

use prand_types::{PrandError, PublicKey, Roster, Seed};

const SELECTION_DOMAIN: &[u8] = b"prand-insurers-v1";

/// Select `n` insurers for a deal seeded by `client_seed` and `dealer_seed`.
pub fn select_insurers(
    roster: &Roster,
    client_seed: &Seed,
    dealer_seed: &Seed,
    n: usize,
) -> Result<Vec<usize>, PrandError> {
    if n > roster.len() {
        return Err(PrandError::InvalidThreshold(format!(
            "cannot select {n} insurers from a roster of {}",
            roster.len()
        )));
    }

    let mix = prand_crypto::blake2b_256_multi(&[
        SELECTION_DOMAIN,
        client_seed.as_bytes(),
        dealer_seed.as_bytes(),
    ]);

    let mut scored: Vec<([u8; 32], usize)> = roster
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let position = (i as u32).to_le_bytes();
            let score = prand_crypto::blake2b_256_multi(&[&mix, &position, key.as_bytes()]);
            (score, i)
        })
        .collect();

    scored.sort_unstable();
    scored.truncate(n);
    Ok(scored.into_iter().map(|(_, i)| i).collect())
}

/// Public keys of the selected insurers, in share-index order.
pub fn insurer_keys(roster: &Roster, selection: &[usize]) -> Result<Vec<PublicKey>, PrandError> {
    selection
        .iter()
        .map(|&i| roster.get(i).cloned())
        .collect()
}

/// Share indices at which `server` appears in `selection`.
pub fn share_indices(selection: &[usize], server: usize) -> impl Iterator<Item = u32> + '_ {
    selection
        .iter()
        .enumerate()
        .filter(move |&(_, &i)| i == server)
        .map(|(k, _)| k as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(n: u8) -> Roster {
        Roster::new((0..n).map(|i| PublicKey([i + 1; 32])).collect()).unwrap()
    }

    #[test]
    fn selection_is_deterministic() {
        let r = roster(10);
        let a = select_insurers(&r, &Seed([1; 32]), &Seed([2; 32]), 4).unwrap();
        let b = select_insurers(&r, &Seed([1; 32]), &Seed([2; 32]), 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn selection_is_distinct_and_sized() {
        let r = roster(10);
        let sel = select_insurers(&r, &Seed([7; 32]), &Seed([8; 32]), 6).unwrap();
        assert_eq!(sel.len(), 6);
        let mut sorted = sel.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 6);
        assert!(sel.iter().all(|&i| i < 10));
    }

    #[test]
    fn full_selection_is_a_permutation() {
        let r = roster(5);
        let mut sel = select_insurers(&r, &Seed([1; 32]), &Seed([1; 32]), 5).unwrap();
        sel.sort();
        assert_eq!(sel, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn oversized_selection_rejected() {
        let r = roster(3);
        assert!(select_insurers(&r, &Seed([1; 32]), &Seed([2; 32]), 4).is_err());
    }

    #[test]
    fn zero_selection_is_empty() {
        let r = roster(3);
        assert!(select_insurers(&r, &Seed([1; 32]), &Seed([2; 32]), 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn seeds_are_not_interchangeable() {
        let r = roster(16);
        let a = select_insurers(&r, &Seed([1; 32]), &Seed([2; 32]), 8).unwrap();
        let b = select_insurers(&r, &Seed([2; 32]), &Seed([1; 32]), 8).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn share_indices_finds_position() {
        let sel = vec![4, 0, 2];
        assert_eq!(share_indices(&sel, 0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(share_indices(&sel, 3).count(), 0);
    }

    #[test]
    fn insurer_keys_follow_selection_order() {
        let r = roster(4);
        let keys = insurer_keys(&r, &[3, 1]).unwrap();
        assert_eq!(keys, vec![PublicKey([4; 32]), PublicKey([2; 32])]);
    }
}
