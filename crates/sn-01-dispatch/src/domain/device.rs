//! Device identities, encrypted and decrypted.

use serde::{Deserialize, Serialize};

/// Sender-supplied, opaque device identity.
///
/// `ciphertext` is base64 of the codec output; `alg` must match the codec's
/// algorithm identifier before any decryption is attempted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedDeviceDescriptor {
    pub ciphertext: String,
    pub alg: String,
}

/// Decrypted device identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub app_id: String,
    pub pushkey: String,
    /// Correlation key; absent means the device is ungrouped.
    #[serde(
        default,
        alias = "uniqueID",
        alias = "uniqueId",
        skip_serializing_if = "Option::is_none"
    )]
    pub unique_id: Option<String>,
}

impl Device {
    /// Grouping key: `unique_id` if present and non-empty, else `""`.
    pub fn correlation_key(&self) -> &str {
        self.unique_id.as_deref().unwrap_or_default()
    }

    /// The part of the device the push gateway gets to see.
    pub fn to_push_device(&self) -> PushDevice {
        PushDevice {
            app_id: self.app_id.clone(),
            pushkey: self.pushkey.clone(),
        }
    }
}

/// Device entry in a push gateway request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushDevice {
    pub app_id: String,
    pub pushkey: String,
}
