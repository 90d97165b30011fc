//! Subscriber identity.
//!
//! Verification itself happens upstream. An `Authenticator` only maps request
//! headers to an already verified identity, and `SubscriberLayer` attaches
//! that identity to the request before routing. Handlers that need it take a
//! `SubscriberId` argument and get a 400 when it is absent.

use crate::error::ApiError;
use async_trait::async_trait;
use axum::extract::{FromRequestParts, Request};
use axum::http::header::{HeaderName, InvalidHeaderName};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::trace;

/// Verified, non-empty subscriber identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(String);

impl SubscriberId {
    /// `None` for an empty or blank identity.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return None;
        }
        Some(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for SubscriberId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SubscriberId>()
            .cloned()
            .ok_or_else(|| ApiError::bad_request("no subscriber id in context"))
    }
}

/// Resolves the identity of a request, if it carries one.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, headers: &HeaderMap) -> Option<SubscriberId>;
}

/// Trusts a header set by a verifying reverse proxy.
#[derive(Clone, Debug)]
pub struct TrustedHeaderAuthenticator {
    header: HeaderName,
}

impl TrustedHeaderAuthenticator {
    pub fn new(header: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            header: HeaderName::from_bytes(header.as_bytes())?,
        })
    }
}

impl Authenticator for TrustedHeaderAuthenticator {
    fn authenticate(&self, headers: &HeaderMap) -> Option<SubscriberId> {
        let value = headers.get(&self.header)?.to_str().ok()?;
        SubscriberId::new(value.trim())
    }
}

/// Layer attaching the `SubscriberId` to request extensions.
#[derive(Clone)]
pub struct SubscriberLayer {
    authenticator: Arc<dyn Authenticator>,
}

impl SubscriberLayer {
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self { authenticator }
    }
}

impl<S> Layer<S> for SubscriberLayer {
    type Service = SubscriberService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SubscriberService {
            inner,
            authenticator: Arc::clone(&self.authenticator),
        }
    }
}

#[derive(Clone)]
pub struct SubscriberService<S> {
    inner: S,
    authenticator: Arc<dyn Authenticator>,
}

impl<S> Service<Request> for SubscriberService<S>
where
    S: Service<Request>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        // Never trust an identity the client put in extensions itself.
        req.extensions_mut().remove::<SubscriberId>();

        if let Some(subscriber) = self.authenticator.authenticate(req.headers()) {
            trace!(subscriber_id = %subscriber, "Request identity attached");
            req.extensions_mut().insert(subscriber);
        }
        self.inner.call(req)
    }
}
