//! Live stream loop.
//!
//! ```text
//! handler ──subscribe──→ Subscription ──spawn──→ stream task ──frames──→ body channel ──→ client
//!                                                    │
//!          select: payload | heartbeat | client gone | server shutdown
//! ```
//!
//! The task owns the subscription. An `UnsubscribeGuard` releases it exactly
//! once whichever way the task ends.

use crate::sse::{event_frame, CLOSE_FRAME, PING_FRAME};
use axum::body::Body;
use sn_02_subscriptions::{Subscription, SubscriptionBroker, SubscriptionId};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

/// Frames buffered between the stream task and the HTTP body.
const BODY_BUFFER: usize = 16;

struct UnsubscribeGuard {
    broker: Arc<SubscriptionBroker>,
    subscriber: String,
    id: SubscriptionId,
}

impl Drop for UnsubscribeGuard {
    fn drop(&mut self) {
        self.broker.unsubscribe(&self.subscriber, self.id);
    }
}

/// Spawn the stream task for `subscription` and return the response body it
/// feeds.
pub fn open_stream(
    broker: Arc<SubscriptionBroker>,
    subscription: Subscription,
    heartbeat: Duration,
    shutdown: watch::Receiver<bool>,
) -> Body {
    let (tx, rx) = mpsc::channel(BODY_BUFFER);
    tokio::spawn(run_stream(broker, subscription, heartbeat, shutdown, tx));
    Body::from_stream(ReceiverStream::new(rx))
}

async fn run_stream(
    broker: Arc<SubscriptionBroker>,
    mut subscription: Subscription,
    heartbeat: Duration,
    mut shutdown: watch::Receiver<bool>,
    tx: mpsc::Sender<Result<String, Infallible>>,
) {
    let subscriber = subscription.subscriber().to_string();
    let _guard = UnsubscribeGuard {
        broker,
        subscriber: subscriber.clone(),
        id: subscription.id(),
    };

    let mut ticker = tokio::time::interval(heartbeat);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    ticker.tick().await;

    let reason = loop {
        tokio::select! {
            next = subscription.recv() => match next {
                Some(payload) => {
                    if tx.send(Ok(event_frame(&payload))).await.is_err() {
                        break "client disconnected";
                    }
                }
                None => {
                    let _ = tx.send(Ok(CLOSE_FRAME.to_string())).await;
                    break "unsubscribed";
                }
            },
            _ = ticker.tick() => {
                if tx.send(Ok(PING_FRAME.to_string())).await.is_err() {
                    break "client disconnected";
                }
                debug!(subscriber_id = %subscriber, "Heartbeat sent");
            }
            _ = tx.closed() => break "client disconnected",
            _ = shutdown_requested(&mut shutdown) => break "server shutdown",
        }
    };

    info!(subscriber_id = %subscriber, reason, "connection closed");
}

/// Resolves once shutdown is signalled or the signal source is gone.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}
