//! Public verification of a completed run.
//!
//! A [`Transcript`] holds every signed envelope the client exchanged. Anyone
//! who knows the roster, the client key and the threshold parameters can
//! replay the client's checks with [`verify_transcript`] and recompute the
//! output without trusting the client.

use std::collections::BTreeSet;

use prand_messages::Message;
use prand_types::{PublicKey, Roster, ThresholdParams};
use serde::{Deserialize, Serialize};

use crate::audit::{accepted_dealers, combine, gather_shares, read_r1, read_r2, tally_responses};
use crate::client::RandomOutput;
use crate::{envelope, ClientError};

/// Signed envelopes of one run. Server replies are indexed by roster
/// position; an empty entry is a missing reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub i1: Vec<u8>,
    pub i2: Vec<u8>,
    pub i3: Vec<u8>,
    pub i4: Vec<u8>,
    pub r1s: Vec<Vec<u8>>,
    pub r3s: Vec<Vec<u8>>,
    pub r4s: Vec<Vec<u8>>,
}

impl Transcript {
    pub fn to_bytes(&self) -> Result<Vec<u8>, ClientError> {
        bincode::serialize(self).map_err(|e| ClientError::Transcript(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ClientError> {
        bincode::deserialize(bytes).map_err(|e| ClientError::Transcript(e.to_string()))
    }
}

fn invalid(msg: impl Into<String>) -> ClientError {
    ClientError::Transcript(msg.into())
}

/// Re-check every signature, commitment and acceptance decision recorded in
/// `transcript`, returning the output the run must have produced.
pub fn verify_transcript(
    params: ThresholdParams,
    roster: &Roster,
    client_key: &PublicKey,
    transcript: &Transcript,
) -> Result<RandomOutput, ClientError> {
    params.validate(roster.len())?;
    for (name, replies) in [
        ("R1", &transcript.r1s),
        ("R3", &transcript.r3s),
        ("R4", &transcript.r4s),
    ] {
        if replies.len() != roster.len() {
            return Err(invalid(format!(
                "{} {name} slots for a roster of {}",
                replies.len(),
                roster.len()
            )));
        }
    }

    let Message::I1(i1) = envelope::decode(client_key, &transcript.i1)? else {
        return Err(invalid("first client message is not I1"));
    };
    let Message::I2(i2) = envelope::decode(client_key, &transcript.i2)? else {
        return Err(invalid("second client message is not I2"));
    };
    let Message::I3(i3) = envelope::decode(client_key, &transcript.i3)? else {
        return Err(invalid("third client message is not I3"));
    };
    let Message::I4(i4) = envelope::decode(client_key, &transcript.i4)? else {
        return Err(invalid("fourth client message is not I4"));
    };

    if prand_crypto::commit(&i2.rc) != i1.hrc {
        return Err(ClientError::Commitment(
            "client seed does not match its commitment".into(),
        ));
    }
    if i3.r2s.len() != roster.len() || i4.r2s.len() != roster.len() {
        return Err(invalid("relayed R2 sets do not match the roster"));
    }

    let mut deals = Vec::with_capacity(roster.len());
    for (dealer, bytes) in i3.r2s.iter().enumerate() {
        if bytes.is_empty() {
            deals.push(None);
            continue;
        }
        let hrs = read_r1(roster, dealer, &transcript.r1s[dealer])
            .map_err(|e| invalid(format!("R1 of relayed dealer {dealer}: {e}")))?;
        let deal = read_r2(roster, params, &i2.rc, &hrs, dealer, bytes)
            .map_err(|e| invalid(format!("I3 relays an invalid R2 from dealer {dealer}: {e}")))?;
        deals.push(Some(deal));
    }

    for (slot, (accepted, relayed)) in i4.r2s.iter().zip(&i3.r2s).enumerate() {
        if !accepted.is_empty() && accepted != relayed {
            return Err(invalid(format!("I4 slot {slot} differs from I3")));
        }
    }

    let tally = tally_responses(roster, &deals, &transcript.r3s);
    let expected: BTreeSet<usize> = accepted_dealers(&tally, params.r).into_iter().collect();
    let claimed: BTreeSet<usize> = i4
        .r2s
        .iter()
        .enumerate()
        .filter(|(_, r2)| !r2.is_empty())
        .map(|(dealer, _)| dealer)
        .collect();
    if expected != claimed {
        return Err(invalid(format!(
            "I4 accepts dealers {claimed:?}, responses support {expected:?}"
        )));
    }
    if claimed.is_empty() {
        return Err(ClientError::NoDealers(params.r));
    }

    for (dealer, deal) in deals.iter_mut().enumerate() {
        if !claimed.contains(&dealer) {
            *deal = None;
        }
    }
    let shares = gather_shares(roster, &deals, &transcript.r4s);
    let value = combine(&deals, &shares)
        .map_err(|(dealer, source)| ClientError::Unrecoverable { dealer, source })?;

    Ok(RandomOutput {
        value,
        dealers: claimed.into_iter().map(|d| d as u32).collect(),
    })
}
