//! Checks on server replies shared by the live client and by transcript
//! verification, so both reach the same verdict from the same bytes.

use std::collections::BTreeSet;

use prand_messages::Message;
use prand_types::{Digest, PublicKey, Roster, Seed, ThresholdParams};
use prand_vss::{recover_secret, Deal, Response, Scalar, Share, VssError};

use crate::envelope;
use crate::selection::{insurer_keys, select_insurers};

const OUTPUT_DOMAIN: &[u8] = b"prand-output";

/// Open `bytes` as a reply signed by `server`.
fn open(roster: &Roster, server: usize, bytes: &[u8]) -> Result<Message, String> {
    let key = roster.get(server).map_err(|e| e.to_string())?;
    envelope::decode(key, bytes).map_err(|e| e.to_string())
}

/// The seed commitment in server `server`'s R1.
pub(crate) fn read_r1(roster: &Roster, server: usize, bytes: &[u8]) -> Result<Digest, String> {
    match open(roster, server, bytes)? {
        Message::R1(r1) => Ok(r1.hrs),
        other => Err(format!("expected R1, got {}", other.kind())),
    }
}

/// Check dealer `dealer`'s R2 against its R1 commitment and the client seed,
/// returning the decoded deal.
pub(crate) fn read_r2(
    roster: &Roster,
    params: ThresholdParams,
    rc: &Seed,
    hrs: &Digest,
    dealer: usize,
    bytes: &[u8],
) -> Result<Deal, String> {
    let r2 = match open(roster, dealer, bytes)? {
        Message::R2(r2) => r2,
        other => return Err(format!("expected R2, got {}", other.kind())),
    };
    if prand_crypto::commit(&r2.rs) != *hrs {
        return Err("server seed does not match its commitment".into());
    }

    let deal = Deal::from_bytes(&r2.deal, params).map_err(|e| e.to_string())?;
    if roster.get(dealer).ok() != Some(deal.dealer()) {
        return Err("deal names a different dealer".into());
    }
    let selection =
        select_insurers(roster, rc, &r2.rs, params.n as usize).map_err(|e| e.to_string())?;
    let expected = insurer_keys(roster, &selection).map_err(|e| e.to_string())?;
    if deal.insurers() != expected.as_slice() {
        return Err("insurer set does not match the seeded selection".into());
    }
    Ok(deal)
}

/// Is `sender` the insurer holding share `index` of `deal`?
fn holds(deal: &Deal, index: u32, sender: &PublicKey) -> bool {
    deal.insurers().get(index as usize) == Some(sender)
}

/// Distinct valid response indices per dealer.
///
/// A response counts only if it arrives in an R3 signed by the insurer it
/// speaks for and its signature checks out against the deal.
pub(crate) fn tally_responses(
    roster: &Roster,
    deals: &[Option<Deal>],
    r3s: &[Vec<u8>],
) -> Vec<BTreeSet<u32>> {
    let mut valid = vec![BTreeSet::new(); deals.len()];
    for (server, bytes) in r3s.iter().enumerate() {
        if bytes.is_empty() {
            continue;
        }
        let r3 = match open(roster, server, bytes) {
            Ok(Message::R3(r3)) => r3,
            Ok(other) => {
                tracing::warn!(server, got = %other.kind(), security = true, "ignoring reply, expected R3");
                continue;
            }
            Err(error) => {
                tracing::warn!(server, %error, security = true, "ignoring R3");
                continue;
            }
        };
        let Ok(sender) = roster.get(server) else {
            continue;
        };

        for entry in r3.responses {
            let Some(Some(deal)) = deals.get(entry.dealer as usize) else {
                continue;
            };
            if !holds(deal, entry.index, sender) {
                continue;
            }
            let accepted = Response::from_bytes(&entry.response)
                .and_then(|response| {
                    if response.index != entry.index {
                        return Err(VssError::InvalidResponse(entry.index));
                    }
                    deal.verify_response(&response)
                })
                .is_ok();
            if accepted {
                valid[entry.dealer as usize].insert(entry.index);
            } else {
                tracing::debug!(server, dealer = entry.dealer, index = entry.index, "invalid response");
            }
        }
    }
    valid
}

/// Dealers with at least `r` valid responses.
pub(crate) fn accepted_dealers(tally: &[BTreeSet<u32>], r: u32) -> Vec<usize> {
    tally
        .iter()
        .enumerate()
        .filter(|(_, indices)| indices.len() >= r as usize)
        .map(|(dealer, _)| dealer)
        .collect()
}

/// Revealed shares per dealer, keeping only those sent by the insurer that
/// holds them. Share values are checked later, during recovery.
pub(crate) fn gather_shares(roster: &Roster, deals: &[Option<Deal>], r4s: &[Vec<u8>]) -> Vec<Vec<Share>> {
    let mut shares = vec![Vec::new(); deals.len()];
    for (server, bytes) in r4s.iter().enumerate() {
        if bytes.is_empty() {
            continue;
        }
        let r4 = match open(roster, server, bytes) {
            Ok(Message::R4(r4)) => r4,
            Ok(other) => {
                tracing::warn!(server, got = %other.kind(), security = true, "ignoring reply, expected R4");
                continue;
            }
            Err(error) => {
                tracing::warn!(server, %error, security = true, "ignoring R4");
                continue;
            }
        };
        let Ok(sender) = roster.get(server) else {
            continue;
        };

        for entry in r4.shares {
            let Some(Some(deal)) = deals.get(entry.dealer as usize) else {
                continue;
            };
            if !holds(deal, entry.index, sender) {
                continue;
            }
            match Share::from_bytes(&entry.share) {
                Ok(share) if share.index == entry.index => shares[entry.dealer as usize].push(share),
                _ => tracing::debug!(server, dealer = entry.dealer, index = entry.index, "malformed share"),
            }
        }
    }
    shares
}

/// Recover every present deal's secret and hash their sum into the output.
pub(crate) fn combine(deals: &[Option<Deal>], shares: &[Vec<Share>]) -> Result<[u8; 32], (usize, VssError)> {
    let mut sum = Scalar::ZERO;
    for (dealer, deal) in deals.iter().enumerate() {
        let Some(deal) = deal else {
            continue;
        };
        let held = shares.get(dealer).map(Vec::as_slice).unwrap_or_default();
        sum += recover_secret(deal, held).map_err(|e| (dealer, e))?;
    }
    Ok(prand_crypto::blake2b_256_multi(&[OUTPUT_DOMAIN, sum.as_bytes()]))
}
