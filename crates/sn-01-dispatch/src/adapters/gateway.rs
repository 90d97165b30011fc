//! Push Gateway Adapter
//!
//! Implements `GatewayClient` against the Matrix push gateway API
//! (`POST /_matrix/push/v1/notify`).

use crate::domain::PushDevice;
use crate::error::{GatewayError, GatewayResult};
use crate::ports::outbound::{GatewayClient, PushContent};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Path of the notify endpoint on the gateway host.
pub const NOTIFY_PATH: &str = "/_matrix/push/v1/notify";

#[derive(Serialize)]
struct NotifyRequest<'a> {
    notification: Notification<'a>,
}

#[derive(Serialize)]
struct Notification<'a> {
    devices: &'a [PushDevice],
    content: &'a PushContent,
}

#[derive(Deserialize)]
struct NotifyResponse {
    #[serde(default)]
    rejected: Vec<String>,
}

/// reqwest-backed gateway client.
#[derive(Clone, Debug)]
pub struct HttpGatewayClient {
    client: reqwest::Client,
    url: String,
}

impl HttpGatewayClient {
    /// Wrap an existing client; `gateway_host` may carry a trailing slash.
    pub fn new(client: reqwest::Client, gateway_host: &str) -> Self {
        Self {
            client,
            url: format!("{}{}", gateway_host.trim_end_matches('/'), NOTIFY_PATH),
        }
    }

    /// Build a client with a per-request timeout.
    pub fn with_timeout(gateway_host: &str, timeout: Duration) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self::new(client, gateway_host))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl GatewayClient for HttpGatewayClient {
    async fn send_push(
        &self,
        devices: &[PushDevice],
        content: &PushContent,
    ) -> GatewayResult<Vec<String>> {
        let body = NotifyRequest {
            notification: Notification { devices, content },
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(status = status.as_u16(), url = %self.url, "Push gateway refused notification");
            return Err(GatewayError::Status(status.as_u16()));
        }

        let parsed: NotifyResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        debug!(
            devices = devices.len(),
            rejected = parsed.rejected.len(),
            "Push gateway accepted notification"
        );

        Ok(parsed.rejected)
    }
}

/// Recorded `send_push` call.
#[derive(Clone, Debug)]
pub struct PushCall {
    pub devices: Vec<PushDevice>,
    pub content: PushContent,
}

/// In-memory mock adapter for testing.
///
/// Rejects every push key listed in `rejected`. Fails every call while
/// `fail_with_status` is set, or only the n-th call after `fail_nth_call`.
#[derive(Default)]
pub struct MockGatewayClient {
    calls: RwLock<Vec<PushCall>>,
    rejected: RwLock<Vec<String>>,
    fail_with_status: RwLock<Option<u16>>,
    /// Fail only the n-th call (1-based) with 503, 0 = disabled
    fail_nth_call: AtomicUsize,
}

impl MockGatewayClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(keys: &[&str]) -> Self {
        let mock = Self::default();
        *mock.rejected.write() = keys.iter().map(|k| k.to_string()).collect();
        mock
    }

    pub fn fail_with_status(&self, status: Option<u16>) {
        *self.fail_with_status.write() = status;
    }

    pub fn fail_nth_call(&self, n: usize) {
        self.fail_nth_call.store(n, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<PushCall> {
        self.calls.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().len()
    }
}

#[async_trait]
impl GatewayClient for MockGatewayClient {
    async fn send_push(
        &self,
        devices: &[PushDevice],
        content: &PushContent,
    ) -> GatewayResult<Vec<String>> {
        let attempt = {
            let mut calls = self.calls.write();
            calls.push(PushCall {
                devices: devices.to_vec(),
                content: content.clone(),
            });
            calls.len()
        };

        if let Some(status) = *self.fail_with_status.read() {
            return Err(GatewayError::Status(status));
        }
        if self.fail_nth_call.load(Ordering::SeqCst) == attempt {
            return Err(GatewayError::Status(503));
        }

        let rejected = self.rejected.read();
        Ok(devices
            .iter()
            .filter(|d| rejected.contains(&d.pushkey))
            .map(|d| d.pushkey.clone())
            .collect())
    }
}
