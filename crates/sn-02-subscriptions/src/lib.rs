//! SN-02 Subscriptions - Live delivery broker.
//!
//! Keeps, per subscriber identity, the set of open live channels and fans
//! payloads out to them. Purely in-memory: nothing survives a restart.
//!
//! # Guarantees
//!
//! - `notify` never blocks. A channel whose single slot is still occupied
//!   loses the payload (at-most-once, best effort).
//! - A channel is closed exactly once, by `unsubscribe`; the broker never
//!   evicts on its own.
//! - Subscribers with no open channel are removed from the map.
//!
//! # Usage
//!
//! ```ignore
//! use sn_02_subscriptions::{NotificationPayload, SubscriptionBroker};
//!
//! let broker = SubscriptionBroker::new(max_per_user);
//! let mut sub = broker.subscribe("did:example:123")?;
//! broker.notify("did:example:123", &NotificationPayload::new("1"));
//! let next = sub.recv().await;
//! broker.unsubscribe("did:example:123", sub.id());
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod broker;
pub mod error;
pub mod payload;

pub use broker::{Subscription, SubscriptionBroker, SubscriptionId};
pub use error::{SubscribeError, SubscribeResult};
pub use payload::NotificationPayload;
