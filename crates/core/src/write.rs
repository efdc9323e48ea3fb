//! Per-item annotation write results.
//!
//! A write is validated first and stops as `RejectedLocally` if that fails,
//! so local rejections never reach the network. Writes report a structured [`WriteOutcome`] instead of
//! failing, so batch callers can continue past individual failures.

use serde::Serialize;
use serde_json::Value;

use crate::judgment::Judgment;
use crate::types::TaskId;

/// Lead time attached to batch-created annotations, in seconds.
pub const BATCH_LEAD_TIME_SECS: f64 = 5.0;

/// Raw judgment to write, validated by the backend client before sending.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRequest {
    pub rating: String,
    pub relation: String,
    pub lead_time: f64,
}

impl WriteRequest {
    pub fn new(rating: impl Into<String>, relation: impl Into<String>, lead_time: f64) -> Self {
        Self {
            rating: rating.into(),
            relation: relation.into(),
            lead_time,
        }
    }

    /// Check the target task id and the judgment before anything is sent.
    /// The error is the message reported for a local rejection.
    pub fn validate(&self, task_id: TaskId) -> Result<Judgment, String> {
        if task_id <= 0 {
            return Err(format!("task_id must be a positive integer, got {task_id}"));
        }
        Judgment::parse(&self.rating, &self.relation).map_err(|e| e.to_string())
    }
}

/// Terminal result of one annotation write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The backend accepted the write; carries its response body.
    Succeeded(Value),
    /// Bad rating, relation or task id; nothing was sent.
    RejectedLocally(String),
    /// The backend answered with a non-2xx status.
    UpstreamRejected {
        status: u16,
        url: String,
        detail: Value,
    },
    /// The request never got a response (connect error, timeout, ...).
    TransportFailed(String),
}

impl WriteOutcome {
    /// Human-readable failure message, `None` on success.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Self::Succeeded(_) => None,
            Self::RejectedLocally(msg) => Some(msg.clone()),
            Self::UpstreamRejected { status, detail, .. } => {
                let detail = match detail {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some(format!("annotation rejected {status} {detail}"))
            }
            Self::TransportFailed(msg) => Some(format!("HTTP error: {msg}")),
        }
    }
}

/// One failed item in a batch response, serialized as
/// `[task_id, false, message]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedWrite {
    pub task_id: TaskId,
    pub message: String,
}

impl Serialize for FailedWrite {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.task_id, false, &self.message).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_messages() {
        assert_eq!(WriteOutcome::Succeeded(json!({"id": 1})).failure_message(), None);

        let rejected = WriteOutcome::UpstreamRejected {
            status: 400,
            url: "http://backend/api/tasks/1/annotations/".into(),
            detail: json!("bad result"),
        };
        assert_eq!(
            rejected.failure_message().unwrap(),
            "annotation rejected 400 bad result"
        );

        let json_detail = WriteOutcome::UpstreamRejected {
            status: 404,
            url: String::new(),
            detail: json!({"detail": "Not found."}),
        };
        assert!(json_detail
            .failure_message()
            .unwrap()
            .contains(r#"{"detail":"Not found."}"#));
    }

    #[test]
    fn validate_rejects_before_sending() {
        let ok = WriteRequest::new("3", "irrelevant", BATCH_LEAD_TIME_SECS);
        let judgment = ok.validate(10).unwrap();
        assert_eq!(judgment.relation.code(), "I");

        assert!(ok.validate(0).unwrap_err().contains("task_id"));
        assert!(ok.validate(-4).is_err());
        assert!(WriteRequest::new("5", "E", 0.0)
            .validate(1)
            .unwrap_err()
            .contains("rating"));
        assert!(WriteRequest::new("1", "Q", 0.0)
            .validate(1)
            .unwrap_err()
            .contains("relation"));
    }

    #[test]
    fn failed_write_serializes_as_triple() {
        let failed = FailedWrite {
            task_id: 12,
            message: "rating must be one of".into(),
        };
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!([12, false, "rating must be one of"])
        );
    }
}
