//! Per-device dispatch outcome.

use super::device::EncryptedDeviceDescriptor;
use serde::{Deserialize, Serialize};

/// Delivery status of one device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Accepted by the push gateway
    Success,
    /// Gateway reported the push key as rejected
    Rejected,
    /// Never reached the gateway, or the gateway call failed
    Failed,
}

/// Outcome for one input descriptor.
///
/// `device` is always the descriptor the caller sent, never the decrypted
/// device.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResult {
    pub device: EncryptedDeviceDescriptor,
    pub status: NotificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DispatchResult {
    pub fn success(device: EncryptedDeviceDescriptor) -> Self {
        Self {
            device,
            status: NotificationStatus::Success,
            reason: None,
        }
    }

    pub fn rejected(device: EncryptedDeviceDescriptor) -> Self {
        Self {
            device,
            status: NotificationStatus::Rejected,
            reason: None,
        }
    }

    pub fn failed(device: EncryptedDeviceDescriptor, reason: impl Into<String>) -> Self {
        Self {
            device,
            status: NotificationStatus::Failed,
            reason: Some(reason.into()),
        }
    }
}
