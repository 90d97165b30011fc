use crate::auth::{Authenticator, SubscriberLayer};
use crate::config::ApiConfig;
use crate::handlers;
use axum::routing::{get, post};
use axum::Router;
use sn_01_dispatch::{MessageStore, NotificationApi};
use sn_02_subscriptions::SubscriptionBroker;
use std::sync::Arc;
use tokio::sync::watch;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<dyn NotificationApi>,
    pub store: Arc<dyn MessageStore>,
    pub broker: Arc<SubscriptionBroker>,
    /// SPKI PEM served to senders
    pub public_key_pem: Arc<str>,
    pub config: Arc<ApiConfig>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(
        dispatcher: Arc<dyn NotificationApi>,
        store: Arc<dyn MessageStore>,
        broker: Arc<SubscriptionBroker>,
        public_key_pem: impl Into<Arc<str>>,
        config: ApiConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            dispatcher,
            store,
            broker,
            public_key_pem: public_key_pem.into(),
            config: Arc::new(config),
            shutdown: Arc::new(shutdown),
        }
    }

    /// Ask every open live stream to end.
    pub fn trigger_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub(crate) fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }
}

/// Build the relay's HTTP router.
pub fn build_router(state: AppState, authenticator: Arc<dyn Authenticator>) -> Router {
    Router::new()
        .route("/status", get(handlers::status))
        .route("/api/v1/", post(handlers::send_notification))
        .route("/api/v1/public", get(handlers::public_key))
        .route("/api/v1/:id", get(handlers::get_notification))
        .route("/api/v2/notifications", get(handlers::list_notifications))
        .route("/api/v2/notifications/:id", get(handlers::get_notification_v2))
        .route("/api/v2/notifications/:id/ack", post(handlers::ack_notification))
        .route("/api/v2/subscribe", get(handlers::subscribe))
        .layer(SubscriberLayer::new(authenticator))
        .with_state(state)
}
