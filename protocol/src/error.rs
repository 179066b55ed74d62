//! Error types for envelopes, transports, server sessions and the client.

use prand_messages::MessageKind;
use prand_types::PrandError;
use prand_vss::VssError;
use thiserror::Error;

/// Failure to produce or open a signed envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("signature verification failed")]
    BadSignature,

    #[error("envelope too large: {size} > {max}")]
    TooLarge { size: usize, max: usize },

    #[error("encoding failed: {0}")]
    Encode(String),
}

/// Failure of the byte-stream collaborator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,

    #[error("timed out")]
    Timeout,

    #[error("frame too large: {size} > {max}")]
    FrameTooLarge { size: usize, max: usize },

    #[error("IO error: {0}")]
    Io(String),
}

/// Fatal failure of a server session. Every variant tears the session down.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("authentication failed: {0}")]
    Authentication(#[from] AuthError),

    #[error("commitment violation: {0}")]
    CommitmentViolation(String),

    #[error("malformed deal from dealer {dealer}: {source}")]
    MalformedDeal {
        dealer: usize,
        #[source]
        source: VssError,
    },

    #[error("shape error: {0}")]
    Shape(String),

    #[error("unexpected message: expected {expected}, got {got}")]
    UnexpectedMessage {
        expected: MessageKind,
        got: MessageKind,
    },

    #[error("session is closed")]
    Closed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    /// True for failures that indicate a misbehaving or malicious peer, as
    /// opposed to I/O trouble or a local fault.
    pub fn is_adversarial(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_)
                | Self::CommitmentViolation(_)
                | Self::MalformedDeal { .. }
                | Self::Shape(_)
                | Self::UnexpectedMessage { .. }
        )
    }
}

/// Failure of the client driver or of transcript verification.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid configuration: {0}")]
    Config(#[from] PrandError),

    #[error("expected {expected} replies, got {got}")]
    Shape { expected: usize, got: usize },

    #[error("client session is not awaiting {0}")]
    OutOfOrder(&'static str),

    #[error("envelope: {0}")]
    Envelope(#[from] AuthError),

    #[error("commitment mismatch: {0}")]
    Commitment(String),

    #[error("no deal collected the required {0} valid responses")]
    NoDealers(u32),

    #[error("secret of accepted dealer {dealer} cannot be recovered: {source}")]
    Unrecoverable {
        dealer: usize,
        #[source]
        source: VssError,
    },

    #[error("invalid transcript: {0}")]
    Transcript(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adversarial_classification() {
        assert!(SessionError::CommitmentViolation("x".into()).is_adversarial());
        assert!(SessionError::Authentication(AuthError::BadSignature).is_adversarial());
        assert!(!SessionError::Transport(TransportError::Closed).is_adversarial());
        assert!(!SessionError::Closed.is_adversarial());
        assert!(!SessionError::Internal("x".into()).is_adversarial());
    }

    #[test]
    fn malformed_deal_names_dealer() {
        let err = SessionError::MalformedDeal {
            dealer: 2,
            source: VssError::Malformed("bad".into()),
        };
        assert_eq!(
            err.to_string(),
            "malformed deal from dealer 2: malformed deal: bad"
        );
    }
}
