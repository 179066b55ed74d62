//! Length-prefixed frames over async byte streams.

use prand_protocol::{TransportError, MAX_ENVELOPE_SIZE};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame body accepted from a peer.
pub const MAX_FRAME_SIZE: usize = MAX_ENVELOPE_SIZE;

pub(crate) fn io_error(e: std::io::Error) -> TransportError {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof
        | std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::BrokenPipe => TransportError::Closed,
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => TransportError::Timeout,
        _ => TransportError::Io(e.to_string()),
    }
}

/// Read one frame. The length is checked before the body is allocated.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, TransportError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(io_error)?;
    let body_len = u32::from_be_bytes(len_buf) as usize;
    if body_len > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            size: body_len,
            max: MAX_FRAME_SIZE,
        });
    }
    let mut body = vec![0u8; body_len];
    reader.read_exact(&mut body).await.map_err(io_error)?;
    Ok(body)
}

/// Write one frame and flush it.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, bytes: &[u8]) -> Result<(), TransportError> {
    if bytes.len() > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            size: bytes.len(),
            max: MAX_FRAME_SIZE,
        });
    }
    let len_bytes = (bytes.len() as u32).to_be_bytes();
    writer.write_all(&len_bytes).await.map_err(io_error)?;
    writer.write_all(bytes).await.map_err(io_error)?;
    writer.flush().await.map_err(io_error)
}
