//! Driving Ports (API - Inbound)

use crate::domain::{DispatchRequest, DispatchResult};
use async_trait::async_trait;

/// Primary dispatch API.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Decrypt, group, store and deliver a notification.
    ///
    /// Never fails as a whole: every problem becomes a `Failed` entry.
    /// Returns exactly one result per input descriptor, in input order.
    async fn send_notification(&self, request: &DispatchRequest) -> Vec<DispatchResult>;
}
