//! # Relay Runtime
//!
//! Wires the relay's subsystems together and runs the HTTP server.
//!
//! ```text
//! RelayConfig ──→ RsaOaepCodec ─┐
//!             ──→ Redis store  ─┼─→ NotificationDispatcher ─┐
//!             ──→ Gateway      ─┘                           ├─→ AppState ─→ Router ─→ serve
//!             ──→ SubscriptionBroker ───────────────────────┘
//! ```
//!
//! Startup order: configuration, logging, private key, message store (with a
//! health check), gateway client, dispatcher, broker, router, listener. Any
//! failure before the listener is bound aborts startup.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;

pub use config::{ConfigError, KeySource, RelayConfig};

use anyhow::{Context, Result};
use relay_telemetry::component_span;
use shared_crypto::RsaOaepCodec;
use sn_01_dispatch::{HttpGatewayClient, NotificationDispatcher, RedisMessageStore};
use sn_02_subscriptions::SubscriptionBroker;
use sn_03_api_gateway::{build_router, AppState, TrustedHeaderAuthenticator};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Concrete dispatcher used in production.
pub type RelayDispatcher = NotificationDispatcher<RsaOaepCodec, RedisMessageStore, HttpGatewayClient>;

/// A fully wired relay, ready to serve.
pub struct RelayRuntime {
    config: RelayConfig,
    state: AppState,
    router: axum::Router,
}

impl RelayRuntime {
    /// Build every subsystem from `config`.
    pub async fn build(config: RelayConfig) -> Result<Self> {
        let pem = config
            .private_key
            .read_pem()
            .with_context(|| format!("Failed to read private key from {:?}", config.private_key))?;
        let codec = Arc::new(RsaOaepCodec::from_pem(&pem).context("Failed to load private key")?);
        let public_key_pem = codec
            .public_key_pem()
            .context("Failed to derive public key")?;
        info!(max_plaintext = codec.max_plaintext_len(), "Private key loaded");

        let store = Arc::new(
            RedisMessageStore::connect(&config.redis.connection_url())
                .await
                .context("Failed to connect to Redis")?,
        );
        store.ping().await.context("Redis health check failed")?;

        let gateway = Arc::new(
            HttpGatewayClient::with_timeout(&config.gateway.host, config.gateway.timeout)
                .context("Failed to build gateway client")?,
        );
        info!(gateway = %gateway.url(), "Gateway client ready");

        let dispatcher_config = config.dispatcher_config();
        dispatcher_config
            .validate()
            .context("Invalid dispatcher configuration")?;
        let dispatcher: RelayDispatcher =
            NotificationDispatcher::new(codec, store.clone(), gateway, dispatcher_config)
                .with_span(component_span!("notification_dispatcher"));

        let broker = Arc::new(
            SubscriptionBroker::new(config.max_subscriptions_per_user).with_span(component_span!(
                "subscription_broker",
                max_per_user = config.max_subscriptions_per_user
            )),
        );

        let api_config = config.api_config();
        api_config.validate().context("Invalid API configuration")?;
        let authenticator = Arc::new(
            TrustedHeaderAuthenticator::new(&api_config.subscriber_header)
                .context("Invalid subscriber header name")?,
        );

        let state = AppState::new(
            Arc::new(dispatcher),
            store,
            broker,
            public_key_pem,
            api_config,
        );
        let router = build_router(state.clone(), authenticator);

        Ok(Self {
            config,
            state,
            router,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Bind the listener and serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.config.server.bind_address();
        let listener = TcpListener::bind(address)
            .await
            .with_context(|| format!("Failed to bind {address}"))?;

        info!(
            public_host = %self.config.server.address(),
            "Relay accepting connections"
        );

        sn_03_api_gateway::serve(listener, self.router, self.state, shutdown)
            .await
            .context("HTTP server failed")
    }
}
