//! The byte-stream collaborator a session runs over.

use crate::TransportError;

/// A bidirectional, message-framed byte stream to one peer.
///
/// Framing, timeouts and reconnection are the implementation's concern; a
/// session only ever alternates `recv` and `send`.
pub trait Transport {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
    fn recv(&mut self) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).send(bytes)
    }

    fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).recv()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).send(bytes)
    }

    fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        (**self).recv()
    }
}
