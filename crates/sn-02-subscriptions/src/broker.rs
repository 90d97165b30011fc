//! Subscription broker
//!
//! ```text
//! subscriber id ──→ [ (id 1, tx) , (id 4, tx) , ... ]     one RwLock
//!
//! subscribe    write lock   append a fresh channel (capacity 1)
//! unsubscribe  write lock   drop the exact sender, remove empty entries
//! notify       read lock    try_send to each channel, drop when full
//! ```
//!
//! Dropping the sender is what closes a channel, and that only happens under
//! the write lock, so `notify` can never send on a closed channel.

use crate::error::{SubscribeError, SubscribeResult};
use crate::payload::NotificationPayload;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info_span, warn, Span};

/// Identifies one channel instance of a subscriber.
pub type SubscriptionId = u64;

/// Buffer of each live channel. One slot: a payload the consumer has not
/// picked up yet makes the next one drop.
const CHANNEL_CAPACITY: usize = 1;

/// Receiving end of one live channel.
///
/// `recv` yields `None` once the channel was unsubscribed.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    subscriber: String,
    receiver: mpsc::Receiver<NotificationPayload>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn subscriber(&self) -> &str {
        &self.subscriber
    }

    pub async fn recv(&mut self) -> Option<NotificationPayload> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<NotificationPayload> {
        self.receiver.try_recv().ok()
    }
}

struct Channel {
    id: SubscriptionId,
    sender: mpsc::Sender<NotificationPayload>,
}

/// In-memory fan-out registry keyed by subscriber identity.
pub struct SubscriptionBroker {
    subscribers: RwLock<HashMap<String, Vec<Channel>>>,
    next_id: AtomicU64,
    /// 0 = unlimited
    max_per_subscriber: usize,
    span: Span,
}

impl SubscriptionBroker {
    pub fn new(max_per_subscriber: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            max_per_subscriber,
            span: info_span!("subscription_broker"),
        }
    }

    /// Parent every event of this broker under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn max_per_subscriber(&self) -> usize {
        self.max_per_subscriber
    }

    /// Open a new channel for `subscriber`.
    ///
    /// The limit check runs against the count *before* appending and uses a
    /// strict comparison: with `max = m`, the `(m + 2)`-th open channel is the
    /// first one refused.
    pub fn subscribe(&self, subscriber: &str) -> SubscribeResult<Subscription> {
        let mut subscribers = self.subscribers.write();

        let current = subscribers.get(subscriber).map_or(0, Vec::len);
        if self.max_per_subscriber > 0 && current > self.max_per_subscriber {
            debug!(
                parent: &self.span,
                subscriber_id = %subscriber,
                open = current,
                max = self.max_per_subscriber,
                "Subscription refused"
            );
            return Err(SubscribeError::MaxSubscriptionsReached {
                subscriber: subscriber.to_string(),
                max: self.max_per_subscriber,
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        subscribers
            .entry(subscriber.to_string())
            .or_default()
            .push(Channel { id, sender });

        debug!(parent: &self.span, subscriber_id = %subscriber, subscription_id = id, "Subscribed");

        Ok(Subscription {
            id,
            subscriber: subscriber.to_string(),
            receiver,
        })
    }

    /// Close and remove one channel. Unknown subscribers and ids are ignored.
    ///
    /// Returns whether a channel was removed.
    pub fn unsubscribe(&self, subscriber: &str, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();

        let Some(channels) = subscribers.get_mut(subscriber) else {
            return false;
        };

        let removed = match channels.iter().position(|c| c.id == id) {
            // Dropping the sender closes the channel.
            Some(index) => {
                channels.remove(index);
                true
            }
            None => false,
        };

        if channels.is_empty() {
            subscribers.remove(subscriber);
        }

        if removed {
            debug!(parent: &self.span, subscriber_id = %subscriber, subscription_id = id, "Unsubscribed");
        }
        removed
    }

    /// Best-effort, non-blocking fan-out to every open channel of `subscriber`.
    ///
    /// Returns the number of channels the payload was handed to.
    pub fn notify(&self, subscriber: &str, payload: &NotificationPayload) -> usize {
        let subscribers = self.subscribers.read();

        let Some(channels) = subscribers.get(subscriber) else {
            return 0;
        };

        let mut delivered = 0;
        for channel in channels {
            match channel.sender.try_send(payload.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        parent: &self.span,
                        subscriber_id = %subscriber,
                        subscription_id = channel.id,
                        "Notification dropped: channel is full"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(
                        parent: &self.span,
                        subscriber_id = %subscriber,
                        subscription_id = channel.id,
                        "Notification dropped: receiver gone"
                    );
                }
            }
        }
        delivered
    }

    /// Open channels of `subscriber`.
    pub fn subscription_count(&self, subscriber: &str) -> usize {
        self.subscribers.read().get(subscriber).map_or(0, Vec::len)
    }

    /// Subscribers with at least one open channel.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for SubscriptionBroker {
    fn default() -> Self {
        Self::new(0)
    }
}
