//! Live event payload.

use serde::{Deserialize, Serialize};

/// Event pushed to every open channel of one subscriber.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl NotificationPayload {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let bare = NotificationPayload::new("1");
        assert_eq!(serde_json::to_string(&bare).unwrap(), r#"{"id":"1"}"#);

        let full = NotificationPayload::new("2").with_data(json!({"url": "https://relay/api/v1/2"}));
        assert_eq!(
            serde_json::to_value(&full).unwrap(),
            json!({"id": "2", "data": {"url": "https://relay/api/v1/2"}})
        );
    }
}
