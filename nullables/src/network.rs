//! Nullable transports: in-memory channels and scripted peers.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use prand_protocol::{Transport, TransportError};

const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(10);

/// One end of an in-memory, message-framed duplex channel.
///
/// Dropping one end closes the other: its pending `recv` fails with
/// [`TransportError::Closed`].
pub struct ChannelTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
    timeout: Duration,
}

/// Create two connected channel ends.
pub fn channel_pair() -> (ChannelTransport, ChannelTransport) {
    let (a_tx, b_rx) = mpsc::channel();
    let (b_tx, a_rx) = mpsc::channel();
    (
        ChannelTransport {
            tx: a_tx,
            rx: a_rx,
            timeout: DEFAULT_RECV_TIMEOUT,
        },
        ChannelTransport {
            tx: b_tx,
            rx: b_rx,
            timeout: DEFAULT_RECV_TIMEOUT,
        },
    )
}

impl ChannelTransport {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.tx.send(bytes.to_vec()).map_err(|_| TransportError::Closed)
    }

    fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        self.rx.recv_timeout(self.timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => TransportError::Timeout,
            RecvTimeoutError::Disconnected => TransportError::Closed,
        })
    }
}

/// A scripted peer that records messages instead of sending them.
///
/// `recv` hands out enqueued messages in order and reports the connection
/// closed once the inbox runs dry.
#[derive(Default)]
pub struct NullTransport {
    /// All messages "sent" to the peer.
    sent: Vec<Vec<u8>>,
    /// Messages to deliver on the next `recv` calls.
    inbox: VecDeque<Vec<u8>>,
}

impl NullTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `messages` already queued for delivery.
    pub fn scripted(messages: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            sent: Vec::new(),
            inbox: messages.into_iter().collect(),
        }
    }

    /// Enqueue a message for the next `recv`.
    pub fn enqueue(&mut self, message: Vec<u8>) {
        self.inbox.push_back(message);
    }

    /// Get all sent messages (for assertions).
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }
}

impl Transport for NullTransport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.sent.push(bytes.to_vec());
        Ok(())
    }

    fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        self.inbox.pop_front().ok_or(TransportError::Closed)
    }
}
