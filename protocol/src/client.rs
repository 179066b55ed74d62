//! Client side of the protocol.
//!
//! [`ClientSession`] is a round-by-round driver: each method takes the raw
//! replies of one round, indexed by roster position (`None` for a server
//! that did not answer), and returns the next signed client message. It does
//! no I/O itself; [`ClientSession::run`] drives it over blocking transports
//! and `prand-network` over TCP.

use std::collections::BTreeSet;

use prand_crypto::SeedSource;
use prand_messages::{Message, I1, I2, I3, I4};
use prand_types::{Digest, KeyPair, Roster, Seed, ThresholdParams};
use prand_vss::Deal;
use serde::{Deserialize, Serialize};

use crate::audit::{accepted_dealers, combine, gather_shares, read_r1, read_r2, tally_responses};
use crate::transcript::Transcript;
use crate::{envelope, ClientError, Transport};

/// The joint random value of one run and the dealers that contributed to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomOutput {
    pub value: [u8; 32],
    pub dealers: Vec<u32>,
}

enum ClientState {
    Start,
    AwaitR1,
    AwaitR2 { hrs: Vec<Option<Digest>> },
    AwaitR3 { deals: Vec<Option<Deal>>, relayed: Vec<Vec<u8>> },
    AwaitR4 { deals: Vec<Option<Deal>> },
    Done,
    Failed,
}

pub struct ClientSession {
    keypair: KeyPair,
    roster: Roster,
    params: ThresholdParams,
    rc: Seed,
    state: ClientState,
    transcript: Transcript,
}

impl ClientSession {
    /// Prepare a run against `roster`, drawing the client seed from `seeds`.
    pub fn new(
        keypair: KeyPair,
        roster: Roster,
        params: ThresholdParams,
        seeds: &mut dyn SeedSource,
    ) -> Result<Self, ClientError> {
        params.validate(roster.len())?;
        Ok(Self {
            keypair,
            roster,
            params,
            rc: seeds.next_seed(),
            state: ClientState::Start,
            transcript: Transcript::default(),
        })
    }

    pub fn params(&self) -> ThresholdParams {
        self.params
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Signed envelopes exchanged so far.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    fn seal(&self, message: Message) -> Result<Vec<u8>, ClientError> {
        Ok(envelope::encode(&self.keypair, &message)?)
    }

    /// Normalize one round of replies to the transcript form, where an empty
    /// entry stands for a missing reply.
    fn collect(&self, replies: &[Option<Vec<u8>>]) -> Result<Vec<Vec<u8>>, ClientError> {
        if replies.len() != self.roster.len() {
            return Err(ClientError::Shape {
                expected: self.roster.len(),
                got: replies.len(),
            });
        }
        Ok(replies.iter().map(|r| r.clone().unwrap_or_default()).collect())
    }

    /// Round 1: commit to the client seed.
    pub fn start(&mut self) -> Result<Vec<u8>, ClientError> {
        if !matches!(self.state, ClientState::Start) {
            return Err(ClientError::OutOfOrder("start"));
        }
        let i1 = self.seal(Message::I1(I1 {
            hrc: prand_crypto::commit(&self.rc),
        }))?;
        self.transcript.i1 = i1.clone();
        self.state = ClientState::AwaitR1;
        Ok(i1)
    }

    /// Round 2: record server commitments and reveal the client seed.
    pub fn on_r1s(&mut self, replies: &[Option<Vec<u8>>]) -> Result<Vec<u8>, ClientError> {
        if !matches!(self.state, ClientState::AwaitR1) {
            return Err(ClientError::OutOfOrder("R1 replies"));
        }
        let r1s = self.collect(replies)?;

        let hrs = r1s
            .iter()
            .enumerate()
            .map(|(server, bytes)| {
                if bytes.is_empty() {
                    return None;
                }
                read_r1(&self.roster, server, bytes)
                    .map_err(|error| {
                        tracing::warn!(server, %error, security = true, "dropping server at R1");
                    })
                    .ok()
            })
            .collect();

        let i2 = self.seal(Message::I2(I2 { rc: self.rc.clone() }))?;
        self.transcript.r1s = r1s;
        self.transcript.i2 = i2.clone();
        self.state = ClientState::AwaitR2 { hrs };
        Ok(i2)
    }

    /// Round 3: validate every R2 and relay the valid ones to all servers.
    pub fn on_r2s(&mut self, replies: &[Option<Vec<u8>>]) -> Result<Vec<u8>, ClientError> {
        let hrs = match std::mem::replace(&mut self.state, ClientState::Failed) {
            ClientState::AwaitR2 { hrs } => hrs,
            other => {
                self.state = other;
                return Err(ClientError::OutOfOrder("R2 replies"));
            }
        };
        let r2s = self.collect(replies)?;

        let mut relayed = vec![Vec::new(); r2s.len()];
        let mut deals = Vec::with_capacity(r2s.len());
        for (dealer, bytes) in r2s.into_iter().enumerate() {
            let Some(commitment) = &hrs[dealer] else {
                deals.push(None);
                continue;
            };
            if bytes.is_empty() {
                tracing::debug!(dealer, "no R2");
                deals.push(None);
                continue;
            }
            match read_r2(&self.roster, self.params, &self.rc, commitment, dealer, &bytes) {
                Ok(deal) => {
                    relayed[dealer] = bytes;
                    deals.push(Some(deal));
                }
                Err(error) => {
                    tracing::warn!(dealer, %error, security = true, "dropping deal");
                    deals.push(None);
                }
            }
        }
        if deals.iter().all(Option::is_none) {
            return Err(ClientError::NoDealers(self.params.r));
        }

        let i3 = self.seal(Message::I3(I3 { r2s: relayed.clone() }))?;
        self.transcript.i3 = i3.clone();
        self.state = ClientState::AwaitR3 { deals, relayed };
        Ok(i3)
    }

    /// Round 4: accept deals with enough valid responses.
    pub fn on_r3s(&mut self, replies: &[Option<Vec<u8>>]) -> Result<Vec<u8>, ClientError> {
        let (mut deals, relayed) = match std::mem::replace(&mut self.state, ClientState::Failed) {
            ClientState::AwaitR3 { deals, relayed } => (deals, relayed),
            other => {
                self.state = other;
                return Err(ClientError::OutOfOrder("R3 replies"));
            }
        };
        let r3s = self.collect(replies)?;

        let tally = tally_responses(&self.roster, &deals, &r3s);
        let accepted: BTreeSet<usize> = accepted_dealers(&tally, self.params.r).into_iter().collect();
        if accepted.is_empty() {
            return Err(ClientError::NoDealers(self.params.r));
        }

        let r2s = relayed
            .into_iter()
            .enumerate()
            .map(|(dealer, bytes)| if accepted.contains(&dealer) { bytes } else { Vec::new() })
            .collect();
        for (dealer, deal) in deals.iter_mut().enumerate() {
            if !accepted.contains(&dealer) {
                *deal = None;
            }
        }
        tracing::debug!(dealers = ?accepted, "accepted deals");

        let i4 = self.seal(Message::I4(I4 { r2s }))?;
        self.transcript.r3s = r3s;
        self.transcript.i4 = i4.clone();
        self.state = ClientState::AwaitR4 { deals };
        Ok(i4)
    }

    /// Recover every accepted secret and derive the output.
    ///
    /// Fails if any accepted dealer's secret cannot be recovered: dropping a
    /// dealer after its deal was accepted would let the revealing servers
    /// choose between outputs.
    pub fn on_r4s(&mut self, replies: &[Option<Vec<u8>>]) -> Result<RandomOutput, ClientError> {
        let deals = match std::mem::replace(&mut self.state, ClientState::Failed) {
            ClientState::AwaitR4 { deals } => deals,
            other => {
                self.state = other;
                return Err(ClientError::OutOfOrder("R4 replies"));
            }
        };
        let r4s = self.collect(replies)?;

        let shares = gather_shares(&self.roster, &deals, &r4s);
        let value = combine(&deals, &shares)
            .map_err(|(dealer, source)| ClientError::Unrecoverable { dealer, source })?;
        let dealers = deals
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_some())
            .map(|(dealer, _)| dealer as u32)
            .collect();

        self.transcript.r4s = r4s;
        self.state = ClientState::Done;
        Ok(RandomOutput { value, dealers })
    }

    /// Run all four rounds over one blocking transport per roster slot.
    ///
    /// A slot whose transport fails is dropped for the rest of the run and
    /// counts as a missing reply.
    pub fn run<T: Transport>(
        mut self,
        transports: &mut [Option<T>],
    ) -> Result<(RandomOutput, Transcript), ClientError> {
        if transports.len() != self.roster.len() {
            return Err(ClientError::Shape {
                expected: self.roster.len(),
                got: transports.len(),
            });
        }

        let i1 = self.start()?;
        let r1s = exchange(transports, &i1);
        let i2 = self.on_r1s(&r1s)?;
        let r2s = exchange(transports, &i2);
        let i3 = self.on_r2s(&r2s)?;
        let r3s = exchange(transports, &i3);
        let i4 = self.on_r3s(&r3s)?;
        let r4s = exchange(transports, &i4);
        let output = self.on_r4s(&r4s)?;

        tracing::info!(dealers = ?output.dealers, "randomness generated");
        Ok((output, self.transcript))
    }
}

/// Send `message` on every live transport, then collect one reply from each.
fn exchange<T: Transport>(transports: &mut [Option<T>], message: &[u8]) -> Vec<Option<Vec<u8>>> {
    for (server, slot) in transports.iter_mut().enumerate() {
        let failed = match slot {
            Some(transport) => transport.send(message).err(),
            None => None,
        };
        if let Some(error) = failed {
            tracing::debug!(server, %error, "dropping server on send");
            *slot = None;
        }
    }

    transports
        .iter_mut()
        .enumerate()
        .map(|(server, slot)| {
            let received = slot.as_mut()?.recv();
            match received {
                Ok(bytes) => Some(bytes),
                Err(error) => {
                    tracing::debug!(server, %error, "dropping server on receive");
                    *slot = None;
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use prand_crypto::{keypair_from_seed, StreamSeedSource};

    fn client(servers: u8) -> ClientSession {
        let roster = Roster::new(
            (0..servers)
                .map(|i| keypair_from_seed(&[i + 1; 32]).public)
                .collect(),
        )
        .unwrap();
        let mut seeds = StreamSeedSource::from_key([7; 32]);
        ClientSession::new(
            keypair_from_seed(&[0xC1; 32]),
            roster,
            ThresholdParams::default(),
            &mut seeds,
        )
        .unwrap()
    }

    #[test]
    fn rounds_must_run_in_order() {
        let mut c = client(3);
        assert!(matches!(c.on_r1s(&[None, None, None]), Err(ClientError::OutOfOrder(_))));
        c.start().unwrap();
        assert!(matches!(c.start(), Err(ClientError::OutOfOrder(_))));
    }

    #[test]
    fn reply_count_must_match_roster() {
        let mut c = client(3);
        c.start().unwrap();
        assert!(matches!(
            c.on_r1s(&[None, None]),
            Err(ClientError::Shape { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn silent_servers_leave_no_dealers() {
        let mut c = client(3);
        c.start().unwrap();
        c.on_r1s(&[None, None, None]).unwrap();
        assert!(matches!(
            c.on_r2s(&[None, None, None]),
            Err(ClientError::NoDealers(2))
        ));
    }

    #[test]
    fn roster_too_small_is_rejected() {
        let roster = Roster::new(vec![keypair_from_seed(&[1; 32]).public]).unwrap();
        let mut seeds = StreamSeedSource::from_key([0; 32]);
        assert!(matches!(
            ClientSession::new(
                keypair_from_seed(&[2; 32]),
                roster,
                ThresholdParams::default(),
                &mut seeds
            ),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn garbage_r1_drops_server_but_continues() {
        let mut c = client(3);
        c.start().unwrap();
        c.on_r1s(&[Some(vec![1, 2, 3]), None, None]).unwrap();
        assert_eq!(c.transcript().r1s[0], vec![1, 2, 3]);
    }
}
