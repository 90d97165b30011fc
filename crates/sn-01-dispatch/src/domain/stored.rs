//! Stored notification envelope.
//!
//! Values in the message store are opaque bytes. Two encodings exist:
//!
//! ```text
//! envelope: {"body": <message JSON>, "metadata": {"is_read": false, "read_at": null}}
//! legacy:   <message JSON>                       (written before metadata existed)
//! ```
//!
//! `StoredValue::decode` tells them apart once, at the edge, so handlers never
//! inspect untyped values.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Read state of a stored notification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMetadata {
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
}

/// Message body plus read state, as written by the dispatcher.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredNotification {
    pub body: Box<RawValue>,
    pub metadata: NotificationMetadata,
}

impl StoredNotification {
    /// Fresh, unread notification.
    pub fn new(body: Box<RawValue>) -> Self {
        Self {
            body,
            metadata: NotificationMetadata::default(),
        }
    }

    pub fn mark_read(&mut self, now: DateTime<Utc>) {
        self.metadata.is_read = true;
        self.metadata.read_at = Some(now);
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// A value read back from the store.
#[derive(Clone, Debug)]
pub enum StoredValue {
    Envelope(StoredNotification),
    /// Raw message JSON without metadata
    Legacy(Box<RawValue>),
}

impl StoredValue {
    /// Classify raw store bytes.
    ///
    /// # Errors
    ///
    /// `Serialization` when the bytes are neither an envelope nor JSON at all.
    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        if let Ok(envelope) = serde_json::from_slice::<StoredNotification>(bytes) {
            return Ok(StoredValue::Envelope(envelope));
        }
        let raw = serde_json::from_slice::<Box<RawValue>>(bytes)?;
        Ok(StoredValue::Legacy(raw))
    }

    /// The message body only.
    pub fn body(&self) -> &RawValue {
        match self {
            StoredValue::Envelope(n) => &n.body,
            StoredValue::Legacy(raw) => raw,
        }
    }

    /// Upgrade to an envelope; legacy values get default (unread) metadata.
    pub fn into_notification(self) -> StoredNotification {
        match self {
            StoredValue::Envelope(n) => n,
            StoredValue::Legacy(raw) => StoredNotification::new(raw),
        }
    }
}
