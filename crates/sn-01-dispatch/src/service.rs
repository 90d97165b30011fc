//! Dispatch Service - Core business logic
//!
//! ## Pipeline
//!
//! ```text
//! descriptors ──decode──→ devices ──group by correlation key──→ groups
//!      │ (per device,                                              │
//!      │  failures isolated)                     for each group, in order:
//!      ↓                                           store body (TTL)
//!   Failed                                         push {id, url} to gateway
//!                                                        │
//!                              merge rejected keys ←─────┘
//!                                      │
//!                         Success / Rejected / Failed per input
//! ```
//!
//! Groups run strictly one after another inside a single call. A storage
//! write is not rolled back when the gateway call for the same group fails:
//! the message stays retrievable until its TTL expires.

use crate::domain::{
    new_dispatch_id, retrieval_url, storage_key, Device, DispatchRequest, DispatchResult,
    EncryptedDeviceDescriptor, StoredNotification,
};
use crate::error::{ConfigError, DispatchError, GatewayError};
use crate::ports::inbound::NotificationApi;
use crate::ports::outbound::{GatewayClient, MessageStore, NotificationEnvelope, PushContent};
use async_trait::async_trait;
use base64::prelude::*;
use shared_crypto::AsymmetricCodec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info_span, warn, Span};

/// Default lifetime of a stored notification.
pub const DEFAULT_TTL: Duration = Duration::from_secs(72 * 60 * 60);

/// Longest accepted lifetime: its milliseconds must fit a signed 64-bit
/// expiry, which is what Redis takes.
pub const MAX_TTL: Duration = Duration::from_millis(i64::MAX as u64);

/// Default `msgtype` of the gateway content envelope.
pub const DEFAULT_MSGTYPE: &str = "application/json";

/// Dispatcher configuration
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Base URL clients fetch stored messages from
    pub public_host: String,
    /// Lifetime of stored messages
    pub ttl: Duration,
    /// `msgtype` sent to the push gateway
    pub msgtype: String,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            public_host: "http://localhost:8085".to_string(),
            ttl: DEFAULT_TTL,
            msgtype: DEFAULT_MSGTYPE.to_string(),
        }
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.public_host.trim().is_empty() {
            return Err(ConfigError::EmptyPublicHost);
        }
        if self.ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }
        if self.ttl > MAX_TTL {
            return Err(ConfigError::TtlTooLong);
        }
        if self.msgtype.is_empty() {
            return Err(ConfigError::EmptyMsgType);
        }
        Ok(())
    }
}

/// Devices sharing one correlation key, with their input positions.
struct DeviceGroup {
    correlation_key: String,
    members: Vec<(usize, Device)>,
}

/// Notification dispatcher.
///
/// Generic over the codec, store and gateway so tests can inject mocks.
pub struct NotificationDispatcher<C, S, G>
where
    C: AsymmetricCodec,
    S: MessageStore,
    G: GatewayClient,
{
    codec: Arc<C>,
    store: Arc<S>,
    gateway: Arc<G>,
    config: DispatcherConfig,
    span: Span,
}

impl<C, S, G> NotificationDispatcher<C, S, G>
where
    C: AsymmetricCodec,
    S: MessageStore,
    G: GatewayClient,
{
    pub fn new(codec: Arc<C>, store: Arc<S>, gateway: Arc<G>, config: DispatcherConfig) -> Self {
        Self {
            codec,
            store,
            gateway,
            config,
            span: info_span!("dispatcher"),
        }
    }

    /// Parent every event of this dispatcher under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Run the full pipeline. See the module docs.
    pub async fn send_notification(&self, request: &DispatchRequest) -> Vec<DispatchResult> {
        let descriptors = request.devices();
        let mut outcomes: Vec<Option<DispatchResult>> = vec![None; descriptors.len()];

        let mut groups: Vec<DeviceGroup> = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();

        for (position, descriptor) in descriptors.iter().enumerate() {
            match self.decode_device(descriptor) {
                Ok(device) => {
                    let key = device.correlation_key().to_string();
                    let slot = *group_index.entry(key.clone()).or_insert_with(|| {
                        groups.push(DeviceGroup {
                            correlation_key: key,
                            members: Vec::new(),
                        });
                        groups.len() - 1
                    });
                    groups[slot].members.push((position, device));
                }
                Err(err) => {
                    debug!(parent: &self.span, position, error = %err, "Device descriptor rejected");
                    outcomes[position] = Some(DispatchResult::failed(descriptor.clone(), err.to_string()));
                }
            }
        }

        if groups.is_empty() {
            debug!(parent: &self.span, devices = descriptors.len(), "No decodable devices, nothing dispatched");
            return outcomes.into_iter().flatten().collect();
        }

        let mut rejected: HashSet<String> = HashSet::new();
        for group in &groups {
            match self.deliver_group(request, group).await {
                Ok(keys) => rejected.extend(keys),
                Err(err) => {
                    let reason = err.to_string();
                    for (position, _) in &group.members {
                        outcomes[*position] =
                            Some(DispatchResult::failed(descriptors[*position].clone(), reason.clone()));
                    }
                }
            }
        }

        for group in groups {
            for (position, device) in group.members {
                if outcomes[position].is_some() {
                    continue;
                }
                let descriptor = descriptors[position].clone();
                outcomes[position] = Some(if rejected.contains(&device.pushkey) {
                    DispatchResult::rejected(descriptor)
                } else {
                    DispatchResult::success(descriptor)
                });
            }
        }

        outcomes.into_iter().flatten().collect()
    }

    /// Decode one descriptor: base64, algorithm check, decrypt, deserialize.
    fn decode_device(&self, descriptor: &EncryptedDeviceDescriptor) -> Result<Device, DispatchError> {
        let ciphertext = BASE64_STANDARD
            .decode(descriptor.ciphertext.as_bytes())
            .map_err(|e| DispatchError::InvalidCipherText(e.to_string()))?;

        if descriptor.alg != self.codec.alg() {
            return Err(DispatchError::AlgorithmMismatch {
                got: descriptor.alg.clone(),
                expected: self.codec.alg().to_string(),
            });
        }

        let plaintext = self
            .codec
            .decrypt(&ciphertext)
            .map_err(|e| DispatchError::DecryptionFailed(e.to_string()))?;

        let device: Device = serde_json::from_slice(&plaintext)
            .map_err(|e| DispatchError::MalformedDevicePayload(e.to_string()))?;

        if device.pushkey.is_empty() {
            return Err(DispatchError::MalformedDevicePayload("empty pushkey".into()));
        }
        Ok(device)
    }

    /// Store the message for one group and push it. Returns rejected keys.
    async fn deliver_group(
        &self,
        request: &DispatchRequest,
        group: &DeviceGroup,
    ) -> Result<Vec<String>, DispatchError> {
        let dispatch_id = new_dispatch_id();
        let key = storage_key(&group.correlation_key, &dispatch_id);

        let bytes = StoredNotification::new(request.message.clone())
            .to_bytes()
            .map_err(|e| DispatchError::StorageWrite(e.to_string()))?;

        if let Err(err) = self.store.set(&key, bytes, self.config.ttl).await {
            error!(
                parent: &self.span,
                storage_key = %key,
                group_size = group.members.len(),
                error = %err,
                "Failed to store notification"
            );
            return Err(DispatchError::StorageWrite(err.to_string()));
        }

        let content = PushContent {
            body: NotificationEnvelope {
                url: retrieval_url(&self.config.public_host, &key),
                id: key.clone(),
            },
            msgtype: self.config.msgtype.clone(),
        };
        let devices: Vec<_> = group.members.iter().map(|(_, d)| d.to_push_device()).collect();

        self.gateway
            .send_push(&devices, &content)
            .await
            .map_err(|err: GatewayError| {
                warn!(
                    parent: &self.span,
                    storage_key = %key,
                    group_size = devices.len(),
                    error = %err,
                    "Push gateway call failed"
                );
                DispatchError::Gateway(err)
            })
    }
}

#[async_trait]
impl<C, S, G> NotificationApi for NotificationDispatcher<C, S, G>
where
    C: AsymmetricCodec,
    S: MessageStore,
    G: GatewayClient,
{
    async fn send_notification(&self, request: &DispatchRequest) -> Vec<DispatchResult> {
        NotificationDispatcher::send_notification(self, request).await
    }
}
