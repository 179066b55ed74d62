//! Wire messages for the four-round prand exchange.
//!
//! The client sends I-messages, each server answers with the matching
//! R-message. Servers never talk to each other; the client relays R2 payloads
//! inside I3 and I4. Every message travels inside a signed envelope (see
//! `prand-protocol`), so the structures here carry no signatures themselves.

use prand_types::{Digest, Seed};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round 1, client → server: commitment to the client seed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct I1 {
    pub hrc: Digest,
}

/// Round 1, server → client: commitment to the server seed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct R1 {
    pub hrs: Digest,
}

/// Round 2, client → server: the revealed client seed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct I2 {
    pub rc: Seed,
}

/// Round 2, server → client: the revealed server seed and its serialized deal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct R2 {
    pub rs: Seed,
    pub deal: Vec<u8>,
}

/// Round 3, client → server: every server's signed R2 envelope, indexed by
/// roster position. An empty entry means that server's R2 is missing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct I3 {
    pub r2s: Vec<Vec<u8>>,
}

/// One insurer response inside R3.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct R3Response {
    pub dealer: u32,
    pub index: u32,
    pub response: Vec<u8>,
}

/// Round 3, server → client: responses for every share dealt to this server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct R3 {
    pub responses: Vec<R3Response>,
}

/// Round 4, client → server: the accepted subset of the I3 envelopes. Each
/// populated entry must be byte-identical to the I3 entry at the same slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct I4 {
    pub r2s: Vec<Vec<u8>>,
}

/// One revealed share inside R4.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct R4Share {
    pub dealer: u32,
    pub index: u32,
    pub share: Vec<u8>,
}

/// Round 4, server → client: the revealed shares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct R4 {
    pub shares: Vec<R4Share>,
}

/// Any protocol message. The variant tag is part of the signed payload, so a
/// message can never be accepted in a round it was not sent for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    I1(I1),
    R1(R1),
    I2(I2),
    R2(R2),
    I3(I3),
    R3(R3),
    I4(I4),
    R4(R4),
}

/// The kind of a [`Message`], without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    I1,
    R1,
    I2,
    R2,
    I3,
    R3,
    I4,
    R4,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::I1(_) => MessageKind::I1,
            Self::R1(_) => MessageKind::R1,
            Self::I2(_) => MessageKind::I2,
            Self::R2(_) => MessageKind::R2,
            Self::I3(_) => MessageKind::I3,
            Self::R3(_) => MessageKind::R3,
            Self::I4(_) => MessageKind::I4,
            Self::R4(_) => MessageKind::R4,
        }
    }
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I1 => "I1",
            Self::R1 => "R1",
            Self::I2 => "I2",
            Self::R2 => "R2",
            Self::I3 => "I3",
            Self::R3 => "R3",
            Self::I4 => "I4",
            Self::R4 => "R4",
        }
    }

    /// Messages sent by the client; the rest are sent by servers.
    pub fn from_client(&self) -> bool {
        matches!(self, Self::I1 | Self::I2 | Self::I3 | Self::I4)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
