//! Domain types for the dispatch subsystem.

pub mod device;
pub mod keys;
pub mod request;
pub mod result;
pub mod stored;

pub use device::{Device, EncryptedDeviceDescriptor, PushDevice};
pub use keys::{new_dispatch_id, retrieval_url, storage_key, subscriber_prefix, KEY_SEPARATOR};
pub use request::{DispatchRequest, PushMetadata};
pub use result::{DispatchResult, NotificationStatus};
pub use stored::{NotificationMetadata, StoredNotification, StoredValue};
