//! Route handlers.

use crate::auth::SubscriberId;
use crate::error::{ApiError, ApiResult};
use crate::router::AppState;
use crate::stream::open_stream;
use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::json;
use sn_01_dispatch::domain::subscriber_prefix;
use sn_01_dispatch::{DispatchRequest, DispatchResult, NotificationMetadata, StoredValue};
use tracing::{debug, info, warn};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// One entry of the per-subscriber listing.
#[derive(Serialize)]
pub struct ListedNotification {
    pub id: String,
    pub body: Box<RawValue>,
    pub metadata: NotificationMetadata,
}

pub async fn status() -> Json<serde_json::Value> {
    Json(json!({"status": "up and running"}))
}

pub async fn public_key(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "application/x-pem-file")],
        state.public_key_pem.to_string(),
    )
        .into_response()
}

/// Parse by hand so every malformed body is a plain 400.
pub async fn send_notification(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Vec<DispatchResult>>> {
    let request: DispatchRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("can't bind request: {e}")))?;
    request
        .validate()
        .map_err(|e| ApiError::bad_request(format!("invalid request: {e}")))?;

    let results = state.dispatcher.send_notification(&request).await;
    info!(devices = results.len(), "Notification dispatched");
    Ok(Json(results))
}

/// Legacy fetch: the message body only.
pub async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let value = load(&state, &id).await?;
    Ok(raw_json(value.body().get().to_string()))
}

/// Full envelope; legacy entries come back with default metadata.
pub async fn get_notification_v2(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let notification = load(&state, &id).await?.into_notification();
    let bytes = notification.to_bytes()?;
    Ok(raw_json(bytes))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    subscriber: SubscriberId,
) -> ApiResult<Json<Vec<ListedNotification>>> {
    let prefix = subscriber_prefix(subscriber.as_str());
    let (values, keys) = state.store.get_all_by_prefix(&prefix).await?;

    if values.is_empty() && keys.is_empty() {
        return Err(ApiError::not_found("notifications not found"));
    }
    if values.len() != keys.len() {
        warn!(
            subscriber_id = %subscriber,
            values = values.len(),
            keys = keys.len(),
            "Store returned misaligned prefix scan"
        );
        return Err(ApiError::internal("invalid cache state"));
    }

    let mut listed = Vec::with_capacity(keys.len());
    for (id, bytes) in keys.into_iter().zip(values) {
        let notification = StoredValue::decode(&bytes)?.into_notification();
        listed.push(ListedNotification {
            id,
            body: notification.body,
            metadata: notification.metadata,
        });
    }

    debug!(subscriber_id = %subscriber, count = listed.len(), "Listed notifications");
    Ok(Json(listed))
}

/// Mark read and rewrite; the TTL starts over. Only the subscriber's own
/// keys can be acknowledged; any other key reads as absent.
pub async fn ack_notification(
    State(state): State<AppState>,
    subscriber: SubscriberId,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    if !id.starts_with(&subscriber_prefix(subscriber.as_str())) {
        debug!(subscriber_id = %subscriber, storage_key = %id, "Ack of foreign key refused");
        return Err(ApiError::not_found("notification not found"));
    }

    let mut notification = load(&state, &id).await?.into_notification();
    notification.mark_read(Utc::now());

    state
        .store
        .set(&id, notification.to_bytes()?, state.config.notification_ttl)
        .await?;

    debug!(storage_key = %id, "Notification marked read");
    Ok(Json(json!({"success": true})))
}

pub async fn subscribe(
    State(state): State<AppState>,
    subscriber: SubscriberId,
) -> ApiResult<Response> {
    let subscription = state.broker.subscribe(subscriber.as_str()).map_err(|e| {
        warn!(subscriber_id = %subscriber, error = %e, "Subscription refused");
        ApiError::from(e)
    })?;

    info!(subscriber_id = %subscriber, subscription_id = subscription.id(), "Live stream opened");

    let body = open_stream(
        state.broker.clone(),
        subscription,
        state.config.heartbeat_interval,
        state.shutdown_signal(),
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(body)
        .map_err(|_| ApiError::StreamingUnsupported)
}

async fn load(state: &AppState, id: &str) -> ApiResult<StoredValue> {
    let bytes = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("notification not found"))?;
    Ok(StoredValue::decode(&bytes)?)
}

fn raw_json(body: impl Into<Body>) -> Response {
    ([(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body.into()).into_response()
}
