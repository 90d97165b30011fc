//! SN-01 Dispatch - Decrypt, group, store and deliver signed notifications.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        DISPATCH (sn-01)                              │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  DispatchRequest { message, metadata.devices[] }                     │
//! │         │                                                            │
//! │  ┌──────┴───────────────┐                                            │
//! │  │   AsymmetricCodec    │  base64 → alg check → decrypt → Device      │
//! │  └──────┬───────────────┘                                            │
//! │         │ group by unique_id (first-seen order)                      │
//! │  ┌──────┴───────────────┐      ┌───────────────────────┐             │
//! │  │    MessageStore      │◄─────┤ body + read metadata  │  TTL        │
//! │  └──────┬───────────────┘      └───────────────────────┘             │
//! │         │ {id, url}                                                  │
//! │  ┌──────┴───────────────┐                                            │
//! │  │    GatewayClient     │  POST /_matrix/push/v1/notify              │
//! │  └──────┬───────────────┘                                            │
//! │         │ rejected push keys                                         │
//! │  Vec<DispatchResult>  (one per input, input order)                   │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The push gateway never sees the message. It gets a pointer (`id`, `url`)
//! and the device fetches the body from the relay.
//!
//! # Usage
//!
//! ```ignore
//! use sn_01_dispatch::{DispatcherConfig, NotificationDispatcher, RedisMessageStore};
//!
//! let store = RedisMessageStore::connect("redis://127.0.0.1:6379").await?;
//! let gateway = HttpGatewayClient::with_timeout("https://push.example", timeout)?;
//! let dispatcher = NotificationDispatcher::new(codec, store.into(), gateway.into(), config);
//! let results = dispatcher.send_notification(&request).await;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use adapters::{
    HttpGatewayClient, InMemoryMessageStore, MockGatewayClient, MockMessageStore,
    RedisMessageStore,
};
pub use domain::{
    Device, DispatchRequest, DispatchResult, EncryptedDeviceDescriptor, NotificationMetadata,
    NotificationStatus, PushDevice, StoredNotification, StoredValue,
};
pub use error::{ConfigError, DispatchError, GatewayError, RequestError, StoreError};
pub use ports::{GatewayClient, MessageStore, NotificationApi, NotificationEnvelope, PushContent};
pub use service::{
    DispatcherConfig, NotificationDispatcher, DEFAULT_MSGTYPE, DEFAULT_TTL, MAX_TTL,
};
