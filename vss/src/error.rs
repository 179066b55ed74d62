use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VssError {
    #[error("malformed deal: {0}")]
    Malformed(String),

    #[error("deal parameters {found:?} do not match configured {expected:?}")]
    ParamsMismatch {
        expected: prand_types::ThresholdParams,
        found: prand_types::ThresholdParams,
    },

    #[error("expected {expected} insurer keys, got {got}")]
    InsurerCount { expected: usize, got: usize },

    #[error("share index {0} out of range")]
    IndexOutOfRange(u32),

    #[error("caller is not insurer {0} of this deal")]
    NotInsurer(u32),

    #[error("share encryption: {0}")]
    Crypto(#[from] prand_crypto::CryptoError),

    #[error("share {0} does not match the deal commitments")]
    InvalidShare(u32),

    #[error("response signature from insurer {0} is invalid")]
    InvalidResponse(u32),

    #[error("need {need} distinct valid shares, have {have}")]
    InsufficientShares { need: usize, have: usize },

    #[error("serialization: {0}")]
    Serialization(String),
}
