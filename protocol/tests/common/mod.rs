//! Shared fixtures: deterministic identities and a cluster of server
//! sessions driven message by message from the test body.

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;

use prand_crypto::keypair_from_seed;
use prand_messages::{Message, I1, I2, I3, I4};
use prand_nullables::{channel_pair, NullSeeds};
use prand_protocol::{
    envelope, ClientSession, RandomOutput, ServerIdentity, ServerSession, SessionConfig,
    SessionError, SessionOutcome, Transcript,
};
use prand_types::{KeyPair, Roster, Seed, ThresholdParams};

pub const CLIENT_SEED: [u8; 32] = [0xC1; 32];

pub fn server_key(i: usize) -> KeyPair {
    keypair_from_seed(&[i as u8 + 1; 32])
}

pub fn client_key() -> KeyPair {
    keypair_from_seed(&CLIENT_SEED)
}

pub fn roster(count: usize) -> Roster {
    Roster::new((0..count).map(|i| server_key(i).public).collect()).unwrap()
}

pub fn server_seed(i: usize) -> [u8; 32] {
    [0x50 + i as u8; 32]
}

pub fn server_session(i: usize, count: usize, config: SessionConfig) -> ServerSession {
    let identity = ServerIdentity::new(i, server_key(i), roster(count), client_key().public).unwrap();
    ServerSession::with_seed_source(
        Arc::new(identity),
        config,
        Box::new(NullSeeds::constant(server_seed(i))),
    )
    .unwrap()
}

/// Server sessions driven directly by the test, which plays the client.
pub struct Cluster {
    pub sessions: Vec<ServerSession>,
    pub roster: Roster,
    pub client: KeyPair,
}

impl Cluster {
    pub fn new(count: usize, config: SessionConfig) -> Self {
        Self {
            sessions: (0..count).map(|i| server_session(i, count, config)).collect(),
            roster: roster(count),
            client: client_key(),
        }
    }

    pub fn with_params(count: usize, params: ThresholdParams) -> Self {
        Self::new(count, SessionConfig::new(params))
    }

    pub fn sign(&self, message: &Message) -> Vec<u8> {
        envelope::encode(&self.client, message).unwrap()
    }

    pub fn send_to(&mut self, server: usize, message: &Message) -> Result<Vec<u8>, SessionError> {
        let bytes = self.sign(message);
        self.sessions[server].handle(&bytes)
    }

    pub fn send_all(&mut self, message: &Message) -> Vec<Result<Vec<u8>, SessionError>> {
        let bytes = self.sign(message);
        self.sessions.iter_mut().map(|s| s.handle(&bytes)).collect()
    }

    /// Send to every server and unwrap every reply.
    pub fn round(&mut self, message: &Message) -> Vec<Vec<u8>> {
        self.send_all(message)
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.unwrap_or_else(|e| panic!("server {i} failed: {e}")))
            .collect()
    }

    /// Open server `server`'s reply.
    pub fn open(&self, server: usize, bytes: &[u8]) -> Message {
        envelope::decode(self.roster.get(server).unwrap(), bytes).unwrap()
    }

    /// Run rounds 1 and 2 honestly with client seed `rc`, returning the R2
    /// envelopes.
    pub fn deal(&mut self, rc: &Seed) -> Vec<Vec<u8>> {
        self.round(&Message::I1(I1 {
            hrc: prand_crypto::commit(rc),
        }));
        self.round(&Message::I2(I2 { rc: rc.clone() }))
    }

    pub fn i3(r2s: &[Vec<u8>]) -> Message {
        Message::I3(I3 { r2s: r2s.to_vec() })
    }

    pub fn i4(r2s: &[Vec<u8>]) -> Message {
        Message::I4(I4 { r2s: r2s.to_vec() })
    }
}

/// Run a full session between a `ClientSession` and `count` servers, each
/// on its own thread, over in-memory channels.
pub fn run_threaded(
    count: usize,
    config: SessionConfig,
) -> (RandomOutput, Transcript, Vec<SessionOutcome>) {
    let mut client_ends = Vec::with_capacity(count);
    let mut servers = Vec::with_capacity(count);
    for i in 0..count {
        let (client_end, mut server_end) = channel_pair();
        let mut session = server_session(i, count, config);
        servers.push(thread::spawn(move || session.serve(&mut server_end)));
        client_ends.push(Some(client_end));
    }

    let mut seeds = NullSeeds::constant([0xAA; 32]);
    let client = ClientSession::new(client_key(), roster(count), config.params, &mut seeds).unwrap();
    let (output, transcript) = client.run(&mut client_ends).unwrap();

    let outcomes = servers
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    (output, transcript, outcomes)
}
