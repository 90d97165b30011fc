//! Storage keys and retrieval URLs.
//!
//! ```text
//! ungrouped: {dispatch_id}
//! grouped:   {correlation_key}+{dispatch_id}
//! url:       {public_host}/api/v1/{storage_key}
//! ```

use uuid::Uuid;

pub const KEY_SEPARATOR: char = '+';

/// Fresh random dispatch identifier.
pub fn new_dispatch_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn storage_key(correlation_key: &str, dispatch_id: &str) -> String {
    if correlation_key.is_empty() {
        dispatch_id.to_string()
    } else {
        format!("{correlation_key}{KEY_SEPARATOR}{dispatch_id}")
    }
}

/// Prefix matching every grouped key of one subscriber, and nothing else.
pub fn subscriber_prefix(subscriber_id: &str) -> String {
    format!("{subscriber_id}{KEY_SEPARATOR}")
}

pub fn retrieval_url(public_host: &str, storage_key: &str) -> String {
    format!("{}/api/v1/{}", public_host.trim_end_matches('/'), storage_key)
}
