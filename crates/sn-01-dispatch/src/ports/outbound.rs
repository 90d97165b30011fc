//! Driven Ports (SPI - Outbound Dependencies)
//!
//! Both ports are shared by every concurrent dispatch call; implementations
//! handle their own synchronization.

use crate::domain::PushDevice;
use crate::error::{GatewayResult, StoreResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Content envelope sent to the push gateway.
///
/// The relay never forwards the message itself, only where to fetch it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushContent {
    pub body: NotificationEnvelope,
    pub msgtype: String,
}

/// `{id, url}` pointer to a stored message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEnvelope {
    pub id: String,
    pub url: String,
}

/// Outbound push gateway.
///
/// One call is at most one attempt: implementations must not retry
/// internally, retries belong to an injected transport.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Push `content` to `devices`; returns the push keys the gateway rejected.
    async fn send_push(
        &self,
        devices: &[PushDevice],
        content: &PushContent,
    ) -> GatewayResult<Vec<String>>;
}

/// TTL key-value store holding opaque bytes.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// `Ok(None)` when the key is missing or expired; `Err` only when the
    /// store itself failed.
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write `value`, replacing any previous value and restarting the TTL.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> StoreResult<()>;

    async fn delete(&self, keys: &[String]) -> StoreResult<()>;

    /// Every live value whose key starts with `prefix`, as `(values, keys)`
    /// with matching positions. Must iterate incrementally rather than block
    /// the store with a full keyspace scan. No match is `Ok` with two empty
    /// vectors.
    async fn get_all_by_prefix(&self, prefix: &str) -> StoreResult<(Vec<Vec<u8>>, Vec<String>)>;
}
