use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("encryption failed")]
    Encryption,

    #[error("decryption failed: authentication check failed")]
    Decryption,

    #[error("invalid plaintext length: {0}")]
    InvalidLength(usize),
}
