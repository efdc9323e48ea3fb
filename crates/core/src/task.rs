//! Task records as returned by the backend's task listing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{InnerId, TaskId};

/// A backend task. Only the fields this service reads are typed; the
/// associative payload is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub inner_id: Option<InnerId>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Map<String, Value>,
    /// Embedded prior annotation result groups, either a list or a
    /// JSON-encoded string of one.
    #[serde(default)]
    pub annotations_results: Option<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Task {
    fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn query(&self) -> Option<&str> {
        self.data_str("query")
    }

    pub fn item_name(&self) -> Option<&str> {
        self.data_str("IT_NAME")
    }

    pub fn image_url(&self) -> Option<&str> {
        self.data_str("image_url")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_minimal_task() {
        let task: Task = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.inner_id, None);
        assert!(task.data.is_empty());
        assert_eq!(task.query(), None);
    }

    #[test]
    fn null_data_is_treated_as_empty() {
        let task: Task = serde_json::from_value(json!({"id": 7, "data": null})).unwrap();
        assert!(task.data.is_empty());
    }

    #[test]
    fn payload_accessors_read_data_fields() {
        let task: Task = serde_json::from_value(json!({
            "id": 1,
            "inner_id": 42,
            "data": {"query": "red shoes", "IT_NAME": "Sneaker", "image_url": "http://img/1.jpg", "extra": 3},
            "ignored_field": true
        }))
        .unwrap();
        assert_eq!(task.inner_id, Some(42));
        assert_eq!(task.query(), Some("red shoes"));
        assert_eq!(task.item_name(), Some("Sneaker"));
        assert_eq!(task.image_url(), Some("http://img/1.jpg"));
    }
}
