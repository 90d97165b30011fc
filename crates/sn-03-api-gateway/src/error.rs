//! HTTP-facing error type.
//!
//! Every error leaves the server as `{"error": "<code>", "message": "<text>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use sn_01_dispatch::StoreError;
use sn_02_subscriptions::SubscribeError;
use thiserror::Error;
use tracing::error;

/// API error, mapped to a status code by `status()`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The connection cannot carry a live stream
    #[error("streaming unsupported")]
    StreamingUnsupported,

    #[error("maximum number of open subscriptions reached")]
    MaxSubscriptionsReached(#[from] SubscribeError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::StreamingUnsupported | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MaxSubscriptionsReached(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StreamingUnsupported => "streaming_unsupported",
            Self::MaxSubscriptionsReached(_) => "max_subscriptions_reached",
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        error!(error = %err, "Message store failure");
        Self::Internal(format!("message store failure: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
