//! SN-03 API Gateway - HTTP surface of the notification relay.
//!
//! # Routes
//!
//! ```text
//! GET  /status                          liveness
//! POST /api/v1/                         dispatch a notification
//! GET  /api/v1/public                   relay public key (PEM)
//! GET  /api/v1/:id                      stored message body
//! GET  /api/v2/notifications/:id        stored envelope {body, metadata}
//! GET  /api/v2/notifications            all envelopes of the caller      [identity]
//! POST /api/v2/notifications/:id/ack    mark read                        [identity]
//! GET  /api/v2/subscribe                live event stream (SSE)          [identity]
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                     API GATEWAY (sn-03)                        │
//! ├────────────────────────────────────────────────────────────────┤
//! │  SubscriberLayer (Authenticator → SubscriberId extension)      │
//! │         │                                                      │
//! │  handlers ──→ NotificationApi   (sn-01 dispatcher)             │
//! │           ──→ MessageStore      (read, list, ack)              │
//! │           ──→ SubscriptionBroker (sn-02) ──→ stream task ──→ SSE│
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let state = AppState::new(dispatcher, store, broker, public_key_pem, config);
//! let router = build_router(state.clone(), Arc::new(TrustedHeaderAuthenticator::new("x-subscriber-id")?));
//! serve(listener, router, state, shutdown_signal()).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod sse;
pub mod stream;

pub use auth::{Authenticator, SubscriberId, SubscriberLayer, TrustedHeaderAuthenticator};
pub use config::{ApiConfig, ApiConfigError, DEFAULT_SUBSCRIBER_HEADER};
pub use error::{ApiError, ApiResult};
pub use router::{build_router, AppState};
pub use server::serve;
pub use sse::{event_frame, CLOSE_FRAME, MARSHAL_ERROR_FRAME, PING_FRAME};
