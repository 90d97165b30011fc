//! Crypto error types.

use thiserror::Error;

/// Cryptographic operation errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key type or PEM label the codec cannot work with
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Key material could not be parsed
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (malformed or mismatched ciphertext)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Plaintext exceeds what one OAEP block can carry
    #[error("Message too long: max {max} bytes, got {actual}")]
    MessageTooLong {
        /// Largest plaintext accepted by the key
        max: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// PEM encoding of a key failed
    #[error("PEM encoding failed: {0}")]
    PemEncoding(String),
}

/// Result alias for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
