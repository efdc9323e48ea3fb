//! Annotation result blocks, the backend's shape for one labeled field.
//!
//! A judgment is written as two blocks (rating, relation), each naming the
//! form field it answers (`from_name`), the annotated field (`to_name`), the
//! `"choices"` type tag, the `"manual"` origin, and a single-element choice
//! array.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::judgment::Judgment;
use crate::types::{format_backend_timestamp, Timestamp};

/// Form field answered by the rating block.
pub const RATING_FIELD: &str = "rating";
/// Form field answered by the relation block.
pub const RELATION_FIELD: &str = "relation";
/// Object field both blocks annotate.
pub const TARGET_FIELD: &str = "query";

const BLOCK_TYPE: &str = "choices";
const BLOCK_ORIGIN: &str = "manual";
const BLOCK_ID_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceValue {
    pub choices: Vec<String>,
}

/// One labeled field's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub from_name: String,
    pub to_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub origin: String,
    pub value: ChoiceValue,
}

impl ResultBlock {
    fn choice(from_name: &str, choice: &str) -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(BLOCK_ID_LEN);
        Self {
            id: Some(id),
            from_name: from_name.to_string(),
            to_name: TARGET_FIELD.to_string(),
            kind: BLOCK_TYPE.to_string(),
            origin: BLOCK_ORIGIN.to_string(),
            value: ChoiceValue {
                choices: vec![choice.to_string()],
            },
        }
    }
}

/// Build the two result blocks for a judgment: rating first, then relation.
pub fn build_result_blocks(judgment: &Judgment) -> [ResultBlock; 2] {
    [
        ResultBlock::choice(RATING_FIELD, judgment.rating.as_str()),
        ResultBlock::choice(RELATION_FIELD, judgment.relation.code()),
    ]
}

/// Body of an annotation create or patch request.
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationPayload {
    pub lead_time: f64,
    pub started_at: String,
    pub result: [ResultBlock; 2],
}

impl AnnotationPayload {
    pub fn new(judgment: &Judgment, lead_time: f64, started_at: Timestamp) -> Self {
        Self {
            lead_time,
            started_at: format_backend_timestamp(started_at),
            result: build_result_blocks(judgment),
        }
    }
}

/// Rating and relation choices recovered from a task's embedded history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PriorChoices {
    pub rating: Option<String>,
    pub relation: Option<String>,
}

/// Extract the prior rating/relation from a task's `annotations_results`.
///
/// The field may be a JSON-encoded string or a list; only its first group
/// (itself a list of result blocks) is read. Malformed input yields empty
/// choices rather than an error.
pub fn extract_prior_choices(annotations_results: Option<&Value>) -> PriorChoices {
    let decoded;
    let list = match annotations_results {
        Some(Value::String(raw)) => {
            decoded = serde_json::from_str::<Value>(raw).unwrap_or(Value::Null);
            decoded.as_array()
        }
        Some(Value::Array(items)) => Some(items),
        _ => None,
    };

    let mut out = PriorChoices::default();
    let Some(first_group) = list.and_then(|l| l.first()).and_then(Value::as_array) else {
        return out;
    };

    for block in first_group.iter().filter_map(Value::as_object) {
        let first_choice = || {
            block
                .get("value")
                .and_then(|v| v.get("choices"))
                .and_then(Value::as_array)
                .and_then(|c| c.first())
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        match block.get("from_name").and_then(Value::as_str) {
            Some(RATING_FIELD) => out.rating = first_choice(),
            Some(RELATION_FIELD) => out.relation = first_choice(),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn judgment() -> Judgment {
        Judgment::parse("3", "irrelevant").unwrap()
    }

    #[test]
    fn blocks_have_fixed_shape() {
        let [rating, relation] = build_result_blocks(&judgment());

        assert_eq!(rating.from_name, "rating");
        assert_eq!(rating.to_name, "query");
        assert_eq!(rating.kind, "choices");
        assert_eq!(rating.origin, "manual");
        assert_eq!(rating.value.choices, vec!["3".to_string()]);

        assert_eq!(relation.from_name, "relation");
        assert_eq!(relation.value.choices, vec!["I".to_string()]);
    }

    #[test]
    fn block_ids_are_short_hex() {
        let [rating, relation] = build_result_blocks(&judgment());
        let id = rating.id.unwrap();
        assert_eq!(id.len(), 10);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(Some(id), relation.id);
    }

    #[test]
    fn payload_serializes_type_tag_and_timestamp() {
        let ts = chrono::Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let payload = AnnotationPayload::new(&judgment(), 5.0, ts);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["lead_time"], 5.0);
        assert_eq!(json["started_at"], "2025-01-02T03:04:05.000Z");
        assert_eq!(json["result"][0]["type"], "choices");
        assert_eq!(json["result"][1]["value"]["choices"], json!(["I"]));
    }

    #[test]
    fn prior_choices_from_nested_list() {
        let raw = json!([[
            {"from_name": "rating", "value": {"choices": ["2"]}},
            {"from_name": "relation", "value": {"choices": ["C"]}}
        ]]);
        let choices = extract_prior_choices(Some(&raw));
        assert_eq!(choices.rating.as_deref(), Some("2"));
        assert_eq!(choices.relation.as_deref(), Some("C"));
    }

    #[test]
    fn prior_choices_from_encoded_string() {
        let raw = json!(r#"[[{"from_name": "relation", "value": {"choices": ["E"]}}]]"#);
        let choices = extract_prior_choices(Some(&raw));
        assert_eq!(choices.rating, None);
        assert_eq!(choices.relation.as_deref(), Some("E"));
    }

    #[test]
    fn prior_choices_tolerate_malformed_input() {
        assert_eq!(extract_prior_choices(None), PriorChoices::default());
        assert_eq!(
            extract_prior_choices(Some(&json!("not json"))),
            PriorChoices::default()
        );
        assert_eq!(
            extract_prior_choices(Some(&json!([{"from_name": "rating"}]))),
            PriorChoices::default()
        );
        let empty_choices = json!([[{"from_name": "rating", "value": {"choices": []}}, 7]]);
        assert_eq!(
            extract_prior_choices(Some(&empty_choices)),
            PriorChoices::default()
        );
    }
}
