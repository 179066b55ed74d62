//! Server side of the protocol: the four-round session state machine.
//!
//! A [`ServerSession`] is created per client connection and owns everything
//! specific to that run: the seed source, the committed seed, and the shares
//! it holds as an insurer. The long-term identity is shared read-only between
//! sessions through an [`Arc<ServerIdentity>`].
//!
//! ```text
//! AwaitI1 --I1/R1--> AwaitI2 --I2/R2--> AwaitI3 --I3/R3--> AwaitI4 --I4/R4--> Done
//!    \__________________\___________________\___________________\______> Failed
//! ```
//!
//! Any authentication failure, protocol violation or transport error moves
//! the session to `Failed`; nothing is retried.

use std::sync::Arc;

use prand_crypto::{SeedSource, StreamSeedSource};
use prand_messages::{Message, MessageKind, R1, R2, R3, R3Response, R4, R4Share, I1, I2, I3, I4};
use prand_types::{Digest, KeyPair, PrandError, PublicKey, Roster, Seed};
use prand_vss::{Deal, Response, SecretPair, Share, VssError};

use crate::config::{MalformedDealPolicy, RevealPolicy, SessionConfig};
use crate::selection::{insurer_keys, select_insurers, share_indices};
use crate::{envelope, SessionError, Transport};

/// Long-term identity of one server, shared by all of its sessions.
pub struct ServerIdentity {
    index: usize,
    keypair: KeyPair,
    roster: Roster,
    client_key: PublicKey,
}

impl ServerIdentity {
    /// Fails if `keypair` is not the roster entry at `index`.
    pub fn new(
        index: usize,
        keypair: KeyPair,
        roster: Roster,
        client_key: PublicKey,
    ) -> Result<Self, PrandError> {
        if roster.get(index)? != &keypair.public {
            return Err(PrandError::InvalidKey(format!(
                "key pair does not match roster position {index}"
            )));
        }
        Ok(Self {
            index,
            keypair,
            roster,
            client_key,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.keypair.public
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn client_key(&self) -> &PublicKey {
        &self.client_key
    }
}

/// Observable session phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitI1,
    AwaitI2,
    AwaitI3,
    AwaitI4,
    Done,
    Failed,
}

impl Phase {
    /// The client message this phase waits for.
    pub fn expects(&self) -> Option<MessageKind> {
        match self {
            Self::AwaitI1 => Some(MessageKind::I1),
            Self::AwaitI2 => Some(MessageKind::I2),
            Self::AwaitI3 => Some(MessageKind::I3),
            Self::AwaitI4 => Some(MessageKind::I4),
            Self::Done | Self::Failed => None,
        }
    }
}

/// Summary of a completed session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionOutcome {
    pub server: usize,
    /// Responses sent in R3, one per share dealt to this server.
    pub responses: usize,
    /// Shares revealed in R4.
    pub shares_revealed: usize,
}

struct HeldShare {
    dealer: u32,
    share: Share,
}

enum State {
    AwaitI1,
    AwaitI2 { hrc: Digest, rs: Seed },
    AwaitI3 { rc: Seed, own_r2: Vec<u8> },
    AwaitI4 { i3_r2s: Vec<Vec<u8>>, held: Vec<HeldShare> },
    Done,
    Failed,
}

impl State {
    fn phase(&self) -> Phase {
        match self {
            Self::AwaitI1 => Phase::AwaitI1,
            Self::AwaitI2 { .. } => Phase::AwaitI2,
            Self::AwaitI3 { .. } => Phase::AwaitI3,
            Self::AwaitI4 { .. } => Phase::AwaitI4,
            Self::Done => Phase::Done,
            Self::Failed => Phase::Failed,
        }
    }
}

fn internal(e: impl std::fmt::Display) -> SessionError {
    SessionError::Internal(e.to_string())
}

/// One server's side of one protocol run.
pub struct ServerSession {
    identity: Arc<ServerIdentity>,
    config: SessionConfig,
    seeds: Box<dyn SeedSource>,
    state: State,
    outcome: SessionOutcome,
}

impl ServerSession {
    /// Start a session with a seed stream keyed from fresh OS entropy.
    pub fn new(identity: Arc<ServerIdentity>, config: SessionConfig) -> Result<Self, PrandError> {
        Self::with_seed_source(identity, config, Box::new(StreamSeedSource::from_entropy()))
    }

    pub fn with_seed_source(
        identity: Arc<ServerIdentity>,
        config: SessionConfig,
        seeds: Box<dyn SeedSource>,
    ) -> Result<Self, PrandError> {
        config.params.validate(identity.roster.len())?;
        let outcome = SessionOutcome {
            server: identity.index,
            ..Default::default()
        };
        Ok(Self {
            identity,
            config,
            seeds,
            state: State::AwaitI1,
            outcome,
        })
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// The session summary, once R4 has been produced.
    pub fn outcome(&self) -> Option<SessionOutcome> {
        matches!(self.state, State::Done).then_some(self.outcome)
    }

    /// Process one signed client message and return the signed reply.
    ///
    /// On error the session moves to [`Phase::Failed`] and every later call
    /// returns [`SessionError::Closed`].
    pub fn handle(&mut self, inbound: &[u8]) -> Result<Vec<u8>, SessionError> {
        let state = std::mem::replace(&mut self.state, State::Failed);
        if matches!(state, State::Done | State::Failed) {
            self.state = state;
            return Err(SessionError::Closed);
        }

        match self.advance(state, inbound) {
            Ok((next, reply)) => {
                tracing::debug!(server = self.identity.index, phase = ?next.phase(), "advanced");
                self.state = next;
                Ok(reply)
            }
            Err(err) => Err(self.abort(err)),
        }
    }

    /// Drive the session to completion over a blocking transport.
    pub fn serve<T: Transport>(&mut self, transport: &mut T) -> Result<SessionOutcome, SessionError> {
        let span = tracing::info_span!("session", server = self.identity.index);
        let _enter = span.enter();

        loop {
            if let Some(outcome) = self.outcome() {
                tracing::info!(
                    responses = outcome.responses,
                    shares = outcome.shares_revealed,
                    "session complete"
                );
                return Ok(outcome);
            }
            let inbound = transport.recv().map_err(|e| self.abort(e.into()))?;
            let reply = self.handle(&inbound)?;
            transport.send(&reply).map_err(|e| self.abort(e.into()))?;
        }
    }

    /// Tear the session down after `err`, logging it by severity.
    pub fn abort(&mut self, err: SessionError) -> SessionError {
        self.state = State::Failed;
        if err.is_adversarial() {
            tracing::warn!(
                server = self.identity.index,
                security = true,
                error = %err,
                "session aborted on protocol violation"
            );
        } else {
            tracing::debug!(server = self.identity.index, error = %err, "session aborted");
        }
        err
    }

    fn seal(&self, message: Message) -> Result<Vec<u8>, SessionError> {
        envelope::encode(&self.identity.keypair, &message).map_err(internal)
    }

    fn advance(&mut self, state: State, inbound: &[u8]) -> Result<(State, Vec<u8>), SessionError> {
        let message = envelope::decode(&self.identity.client_key, inbound)?;
        match (state, message) {
            (State::AwaitI1, Message::I1(i1)) => self.on_i1(i1),
            (State::AwaitI2 { hrc, rs }, Message::I2(i2)) => self.on_i2(hrc, rs, i2),
            (State::AwaitI3 { rc, own_r2 }, Message::I3(i3)) => self.on_i3(rc, own_r2, i3),
            (State::AwaitI4 { i3_r2s, held }, Message::I4(i4)) => self.on_i4(i3_r2s, held, i4),
            (state, message) => Err(match state.phase().expects() {
                Some(expected) => SessionError::UnexpectedMessage {
                    expected,
                    got: message.kind(),
                },
                None => SessionError::Closed,
            }),
        }
    }

    /// Round 1: commit to a fresh server seed.
    fn on_i1(&mut self, i1: I1) -> Result<(State, Vec<u8>), SessionError> {
        let rs = self.seeds.next_seed();
        let hrs = prand_crypto::commit(&rs);
        let reply = self.seal(Message::R1(R1 { hrs }))?;
        Ok((State::AwaitI2 { hrc: i1.hrc, rs }, reply))
    }

    /// Round 2: check the client's reveal, then deal a fresh secret.
    fn on_i2(&mut self, hrc: Digest, rs: Seed, i2: I2) -> Result<(State, Vec<u8>), SessionError> {
        if prand_crypto::commit(&i2.rc) != hrc {
            return Err(SessionError::CommitmentViolation(
                "revealed client seed does not match its commitment".into(),
            ));
        }

        let params = self.config.params;
        let roster = &self.identity.roster;
        let selection =
            select_insurers(roster, &i2.rc, &rs, params.n as usize).map_err(internal)?;
        let insurers = insurer_keys(roster, &selection).map_err(internal)?;
        let deal = Deal::construct(&SecretPair::generate(), &self.identity.keypair, params, insurers)
            .map_err(internal)?;
        let deal = deal.to_bytes().map_err(internal)?;
        tracing::debug!(server = self.identity.index, insurers = ?selection, "dealt secret");

        let reply = self.seal(Message::R2(R2 { rs, deal }))?;
        Ok((
            State::AwaitI3 {
                rc: i2.rc,
                own_r2: reply.clone(),
            },
            reply,
        ))
    }

    /// Round 3: validate every relayed deal and answer for the shares dealt to us.
    fn on_i3(&mut self, rc: Seed, own_r2: Vec<u8>, i3: I3) -> Result<(State, Vec<u8>), SessionError> {
        let roster_len = self.identity.roster.len();
        if i3.r2s.len() != roster_len {
            return Err(SessionError::Shape(format!(
                "I3 carries {} R2 slots, roster has {roster_len}",
                i3.r2s.len()
            )));
        }

        let mut responses = Vec::new();
        let mut held = Vec::new();
        for (dealer, r2_bytes) in i3.r2s.iter().enumerate() {
            if r2_bytes.is_empty() {
                tracing::debug!(server = self.identity.index, dealer, "R2 missing, skipping");
                continue;
            }
            if dealer == self.identity.index && *r2_bytes != own_r2 {
                return Err(SessionError::CommitmentViolation(
                    "I3 replaces this server's own R2".into(),
                ));
            }

            let dealer_key = self.identity.roster.get(dealer).map_err(internal)?;
            let r2 = match envelope::decode(dealer_key, r2_bytes)? {
                Message::R2(r2) => r2,
                other => {
                    return Err(SessionError::UnexpectedMessage {
                        expected: MessageKind::R2,
                        got: other.kind(),
                    })
                }
            };

            match self.insure(dealer, &rc, &r2) {
                Ok(dealt) => {
                    for (share, response) in dealt {
                        tracing::debug!(
                            server = self.identity.index,
                            dealer,
                            index = share.index,
                            "validated share"
                        );
                        responses.push(R3Response {
                            dealer: dealer as u32,
                            index: share.index,
                            response: response.to_bytes().map_err(internal)?,
                        });
                        held.push(HeldShare {
                            dealer: dealer as u32,
                            share,
                        });
                    }
                }
                Err(source) => match self.config.malformed_deal_policy {
                    MalformedDealPolicy::Abort => {
                        return Err(SessionError::MalformedDeal { dealer, source })
                    }
                    MalformedDealPolicy::SkipDealer => {
                        tracing::warn!(
                            server = self.identity.index,
                            dealer,
                            security = true,
                            error = %source,
                            "skipping malformed deal"
                        );
                    }
                },
            }
        }

        self.outcome.responses = responses.len();
        let reply = self.seal(Message::R3(R3 { responses }))?;
        Ok((
            State::AwaitI4 {
                i3_r2s: i3.r2s,
                held,
            },
            reply,
        ))
    }

    /// Decode dealer `dealer`'s deal, check it was dealt to the insurers its
    /// seeds select, and produce a response for every share dealt to us.
    fn insure(&self, dealer: usize, rc: &Seed, r2: &R2) -> Result<Vec<(Share, Response)>, VssError> {
        let params = self.config.params;
        let roster = &self.identity.roster;
        let deal = Deal::from_bytes(&r2.deal, params)?;

        if roster.get(dealer).ok() != Some(deal.dealer()) {
            return Err(VssError::Malformed(format!(
                "deal was not dealt by roster position {dealer}"
            )));
        }

        let selection = select_insurers(roster, rc, &r2.rs, params.n as usize)
            .map_err(|e| VssError::Malformed(e.to_string()))?;
        let expected = insurer_keys(roster, &selection).map_err(|e| VssError::Malformed(e.to_string()))?;
        if deal.insurers() != expected.as_slice() {
            return Err(VssError::Malformed(
                "insurer set does not match the seeded selection".into(),
            ));
        }

        share_indices(&selection, self.identity.index)
            .map(|k| deal.produce_response(k, &self.identity.keypair))
            .collect()
    }

    /// Round 4: check I4 against I3, then reveal the held shares.
    fn on_i4(
        &mut self,
        i3_r2s: Vec<Vec<u8>>,
        held: Vec<HeldShare>,
        i4: I4,
    ) -> Result<(State, Vec<u8>), SessionError> {
        if i4.r2s.len() != i3_r2s.len() {
            return Err(SessionError::Shape(format!(
                "I4 carries {} R2 slots, expected {}",
                i4.r2s.len(),
                i3_r2s.len()
            )));
        }
        for (slot, (accepted, disclosed)) in i4.r2s.iter().zip(&i3_r2s).enumerate() {
            if !accepted.is_empty() && accepted != disclosed {
                return Err(SessionError::CommitmentViolation(format!(
                    "R2 set in I4 is not a subset of I3 (slot {slot})"
                )));
            }
        }

        let reveal_all = self.config.reveal_policy == RevealPolicy::All;
        let shares = held
            .iter()
            .filter(|h| reveal_all || !i4.r2s[h.dealer as usize].is_empty())
            .map(|h| {
                Ok(R4Share {
                    dealer: h.dealer,
                    index: h.share.index,
                    share: h.share.to_bytes()?,
                })
            })
            .collect::<Result<Vec<_>, VssError>>()
            .map_err(internal)?;

        self.outcome.shares_revealed = shares.len();
        let reply = self.seal(Message::R4(R4 { shares }))?;
        Ok((State::Done, reply))
    }
}
