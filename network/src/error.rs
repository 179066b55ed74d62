use prand_protocol::{ClientError, SessionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("IO error: {0}")]
    Io(String),
}
