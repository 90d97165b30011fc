//! Error types for the dispatch subsystem
//!
//! `DispatchError` never escapes `send_notification`: each variant is turned
//! into a `Failed` result whose `reason` is the variant's `Display` text.

use thiserror::Error;

/// Per-device and per-group dispatch failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Ciphertext is not valid base64
    #[error("invalid cipher text format: {0}")]
    InvalidCipherText(String),

    /// Descriptor tagged with an algorithm other than the codec's
    #[error("alg not supported")]
    AlgorithmMismatch { got: String, expected: String },

    /// Private-key operation failed
    #[error("service couldn't decrypt the device token")]
    DecryptionFailed(String),

    /// Plaintext did not deserialize into a usable device
    #[error("service couldn't process the device token")]
    MalformedDevicePayload(String),

    /// Message body could not be written to the store
    #[error("failed to save device notification")]
    StorageWrite(String),

    /// Push gateway call failed for the whole group
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Push gateway client errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request never got a response
    #[error("push failed: {0}")]
    Transport(String),

    /// Gateway answered with a non-200 status
    #[error("push failed")]
    Status(u16),

    /// 200 response with a body that is not `{"rejected": [...]}`
    #[error("push failed: invalid gateway response: {0}")]
    Decode(String),
}

/// Message store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend unreachable or command failed
    #[error("store backend error: {0}")]
    Backend(String),

    /// Stored value could not be encoded or decoded
    #[error("store serialization error: {0}")]
    Serialization(String),
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Invalid dispatcher configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("public host must not be empty")]
    EmptyPublicHost,

    #[error("notification TTL must be greater than zero")]
    ZeroTtl,

    #[error("notification TTL is too long")]
    TtlTooLong,

    #[error("msgtype must not be empty")]
    EmptyMsgType,
}

/// Invalid inbound dispatch request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("message is empty")]
    EmptyMessage,

    #[error("no devices to notify")]
    NoDevices,
}

pub type GatewayResult<T> = Result<T, GatewayError>;
pub type StoreResult<T> = Result<T, StoreError>;
