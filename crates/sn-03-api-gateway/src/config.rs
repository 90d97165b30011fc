//! API configuration.

use sn_01_dispatch::MAX_TTL;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Header the trusted authentication proxy puts the verified identity in.
pub const DEFAULT_SUBSCRIBER_HEADER: &str = "x-subscriber-id";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Listen address
    pub bind_address: SocketAddr,
    /// Period of `ping` frames on the live stream
    pub heartbeat_interval: Duration,
    /// TTL applied when a read receipt rewrites a notification
    pub notification_ttl: Duration,
    pub subscriber_header: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8085)),
            heartbeat_interval: Duration::from_secs(30),
            notification_ttl: Duration::from_secs(72 * 60 * 60),
            subscriber_header: DEFAULT_SUBSCRIBER_HEADER.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiConfigError {
    #[error("heartbeat interval must be non-zero")]
    ZeroHeartbeat,
    #[error("notification ttl must be non-zero")]
    ZeroTtl,
    #[error("notification ttl is too long")]
    TtlTooLong,
    #[error("subscriber header must not be empty")]
    EmptySubscriberHeader,
}

impl ApiConfig {
    pub fn validate(&self) -> Result<(), ApiConfigError> {
        if self.heartbeat_interval.is_zero() {
            return Err(ApiConfigError::ZeroHeartbeat);
        }
        if self.notification_ttl.is_zero() {
            return Err(ApiConfigError::ZeroTtl);
        }
        if self.notification_ttl > MAX_TTL {
            return Err(ApiConfigError::TtlTooLong);
        }
        if self.subscriber_header.is_empty() {
            return Err(ApiConfigError::EmptySubscriberHeader);
        }
        Ok(())
    }
}
