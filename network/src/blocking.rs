//! Blocking framed transport over any `Read + Write` stream.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use prand_protocol::{Transport, TransportError};

use crate::framing::{io_error, MAX_FRAME_SIZE};

/// A [`Transport`] speaking the length-prefixed frame format over a
/// blocking stream.
pub struct FramedStream<S> {
    inner: S,
}

impl<S: Read + Write> FramedStream<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl FramedStream<TcpStream> {
    /// Connect to `addr`, applying `timeout` to the connect and to every read.
    pub fn connect(addr: impl ToSocketAddrs, timeout: Duration) -> Result<Self, TransportError> {
        let addr = addr
            .to_socket_addrs()
            .map_err(io_error)?
            .next()
            .ok_or_else(|| TransportError::Io("address did not resolve".into()))?;
        let stream = TcpStream::connect_timeout(&addr, timeout).map_err(io_error)?;
        stream.set_read_timeout(Some(timeout)).map_err(io_error)?;
        stream.set_nodelay(true).map_err(io_error)?;
        Ok(Self::new(stream))
    }
}

impl<S: Read + Write> Transport for FramedStream<S> {
    fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        if bytes.len() > MAX_FRAME_SIZE {
            return Err(TransportError::FrameTooLarge {
                size: bytes.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        self.inner
            .write_all(&(bytes.len() as u32).to_be_bytes())
            .map_err(io_error)?;
        self.inner.write_all(bytes).map_err(io_error)?;
        self.inner.flush().map_err(io_error)
    }

    fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut len_buf = [0u8; 4];
        self.inner.read_exact(&mut len_buf).map_err(io_error)?;
        let body_len = u32::from_be_bytes(len_buf) as usize;
        if body_len > MAX_FRAME_SIZE {
            return Err(TransportError::FrameTooLarge {
                size: body_len,
                max: MAX_FRAME_SIZE,
            });
        }
        let mut body = vec![0u8; body_len];
        self.inner.read_exact(&mut body).map_err(io_error)?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn written_frames_read_back() {
        let mut writer = FramedStream::new(Cursor::new(Vec::new()));
        writer.send(b"hello").unwrap();
        writer.send(b"world").unwrap();

        let mut bytes = writer.into_inner();
        bytes.set_position(0);
        let mut reader = FramedStream::new(bytes);
        assert_eq!(reader.recv().unwrap(), b"hello");
        assert_eq!(reader.recv().unwrap(), b"world");
        assert_eq!(reader.recv(), Err(TransportError::Closed));
    }

    #[test]
    fn oversized_frame_header_is_rejected() {
        let mut reader = FramedStream::new(Cursor::new(u32::MAX.to_be_bytes().to_vec()));
        assert!(matches!(reader.recv(), Err(TransportError::FrameTooLarge { .. })));
    }
}
