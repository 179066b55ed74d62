//! The ordered, fixed list of server public keys for a session.

use serde::{Deserialize, Serialize};

use crate::{PrandError, PublicKey};

/// Ordered list of server public keys. A server's position is its protocol
/// identity; the roster never changes during a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    servers: Vec<PublicKey>,
}

impl Roster {
    /// Build a roster, rejecting duplicate keys.
    pub fn new(servers: Vec<PublicKey>) -> Result<Self, PrandError> {
        for (i, key) in servers.iter().enumerate() {
            if servers[..i].contains(key) {
                return Err(PrandError::DuplicateKey(i));
            }
        }
        Ok(Self { servers })
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&PublicKey, PrandError> {
        self.servers.get(index).ok_or(PrandError::IndexOutOfRange {
            index,
            len: self.servers.len(),
        })
    }

    pub fn position_of(&self, key: &PublicKey) -> Option<usize> {
        self.servers.iter().position(|k| k == key)
    }

    pub fn keys(&self) -> &[PublicKey] {
        &self.servers
    }

    pub fn iter(&self) -> impl Iterator<Item = &PublicKey> {
        self.servers.iter()
    }
}
