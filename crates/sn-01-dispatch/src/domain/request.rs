//! Inbound dispatch request.

use super::device::EncryptedDeviceDescriptor;
use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Notification to relay to one or more devices.
///
/// `message` is opaque JSON: it is stored and served back byte-for-byte and
/// never interpreted by the relay.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub message: Box<RawValue>,
    pub metadata: PushMetadata,
}

/// Delivery metadata of a dispatch request.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PushMetadata {
    #[serde(default)]
    pub devices: Vec<EncryptedDeviceDescriptor>,
}

impl DispatchRequest {
    pub fn new(message: Box<RawValue>, devices: Vec<EncryptedDeviceDescriptor>) -> Self {
        Self {
            message,
            metadata: PushMetadata { devices },
        }
    }

    /// Reject requests with nothing to deliver.
    pub fn validate(&self) -> Result<(), RequestError> {
        if is_empty_message(&self.message) {
            return Err(RequestError::EmptyMessage);
        }
        if self.metadata.devices.is_empty() {
            return Err(RequestError::NoDevices);
        }
        Ok(())
    }

    pub fn devices(&self) -> &[EncryptedDeviceDescriptor] {
        &self.metadata.devices
    }
}

fn is_empty_message(message: &RawValue) -> bool {
    matches!(message.get().trim(), "" | "null" | "\"\"" | "{}" | "[]")
}
