//! REST client for the annotation backend.
//!
//! Wraps token refresh, task listing, the "next task" action, project
//! metadata and annotation create/patch/lookup using [`reqwest`]. Every call
//! carries its own timeout; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::{json, Value};

use reviewdesk_core::pagination::QueueAnchor;
use reviewdesk_core::result_block::AnnotationPayload;
use reviewdesk_core::task::Task;
use reviewdesk_core::types::{AnnotationId, InnerId, TaskId};
use reviewdesk_core::write::{WriteOutcome, WriteRequest};

use crate::backend::{AccessToken, AnnotationBackend};
use crate::config::BackendConfig;
use crate::error::BackendError;

/// Timeout for the token refresh call.
const TOKEN_TIMEOUT: Duration = Duration::from_secs(15);
/// Timeout for task listing and cursor lookups.
const READ_TIMEOUT: Duration = Duration::from_secs(20);
/// Timeout for annotation writes and annotation lookups.
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest non-JSON error body echoed back to callers.
const MAX_TEXT_DETAIL: usize = 800;

/// HTTP client for one backend project.
pub struct BackendApi {
    client: reqwest::Client,
    config: BackendConfig,
}

/// Body of an annotation patch: the payload plus the fields the backend
/// expects to be reset on an update.
#[derive(Serialize)]
struct PatchBody<'a> {
    #[serde(flatten)]
    payload: &'a AnnotationPayload,
    draft_id: i64,
    parent_prediction: Option<i64>,
    parent_annotation: Option<i64>,
}

impl BackendApi {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        resolve_endpoint(&self.config.base_url, path)
    }

    async fn get_json(
        &self,
        token: &AccessToken,
        url: String,
        query: &[(&str, String)],
        timeout: Duration,
    ) -> Result<Value, BackendError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(token.as_str())
            .query(query)
            .timeout(timeout)
            .send()
            .await?;
        parse_response(response).await
    }

    async fn send_write(&self, request: reqwest::RequestBuilder) -> WriteOutcome {
        let response = match request.timeout(WRITE_TIMEOUT).send().await {
            Ok(response) => response,
            Err(e) => return WriteOutcome::TransportFailed(e.to_string()),
        };

        let status = response.status();
        let url = response.url().to_string();
        let detail = read_detail(response).await;
        if status.is_success() {
            WriteOutcome::Succeeded(detail)
        } else {
            tracing::warn!(status = status.as_u16(), %url, "Backend rejected annotation write");
            WriteOutcome::UpstreamRejected {
                status: status.as_u16(),
                url,
                detail,
            }
        }
    }

    async fn lookup_from_listing(
        &self,
        token: &AccessToken,
        task_id: TaskId,
        project_id: i64,
    ) -> Result<Option<AnnotationId>, BackendError> {
        let listing = self
            .get_json(
                token,
                self.endpoint("annotations/"),
                &[
                    ("taskID", task_id.to_string()),
                    ("project", project_id.to_string()),
                ],
                WRITE_TIMEOUT,
            )
            .await?;
        Ok(annotation_id_from_listing(&listing))
    }

    async fn lookup_from_task_detail(
        &self,
        token: &AccessToken,
        task_id: TaskId,
        project_id: i64,
    ) -> Result<Option<AnnotationId>, BackendError> {
        let detail = self
            .get_json(
                token,
                self.endpoint(&format!("tasks/{task_id}/")),
                &[("project", project_id.to_string())],
                WRITE_TIMEOUT,
            )
            .await?;
        Ok(annotation_id_from_task_detail(&detail))
    }
}

#[async_trait]
impl AnnotationBackend for BackendApi {
    fn project_id(&self) -> i64 {
        self.config.project_id
    }

    async fn refresh_access_token(&self) -> Result<AccessToken, BackendError> {
        let response = self
            .client
            .post(self.endpoint("token/refresh/"))
            .json(&json!({ "refresh": self.config.refresh_token }))
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_body_text(response).await;
            tracing::error!(status = status.as_u16(), "Backend token refresh failed");
            return Err(BackendError::Auth {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        body.get("access")
            .and_then(Value::as_str)
            .map(AccessToken::new)
            .ok_or_else(|| BackendError::Decode("token refresh response has no 'access'".into()))
    }

    async fn list_unannotated_tasks(
        &self,
        token: &AccessToken,
        min_inner_id: InnerId,
        page_size: u32,
    ) -> Result<Vec<Task>, BackendError> {
        let mut query = vec![
            ("project", self.config.project_id.to_string()),
            ("page_size", page_size.to_string()),
            ("page", "1".to_string()),
            ("fields", "task_only".to_string()),
            ("query", build_task_query(min_inner_id).to_string()),
        ];
        if let Some(view_id) = self.config.view_id {
            query.push(("view", view_id.to_string()));
        }

        let body = self
            .get_json(token, self.endpoint("tasks/"), &query, READ_TIMEOUT)
            .await?;
        let tasks = extract_task_list(body)?;
        tracing::debug!(min_inner_id, page_size, count = tasks.len(), "Listed tasks");
        Ok(tasks)
    }

    async fn next_cursor_and_count(
        &self,
        token: &AccessToken,
        project_id: i64,
    ) -> Result<QueueAnchor, BackendError> {
        let response = self
            .client
            .post(self.endpoint("dm/actions/"))
            .bearer_auth(token.as_str())
            .query(&[("id", "next_task".to_string()), ("project", project_id.to_string())])
            .json(&json!({ "project": project_id }))
            .timeout(READ_TIMEOUT)
            .send()
            .await?;
        let next = parse_response(response).await?;
        let inner_id = next
            .get("inner_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| BackendError::Decode("next_task response has no 'inner_id'".into()))?;

        let project = self
            .get_json(
                token,
                self.endpoint(&format!("projects/{project_id}")),
                &[],
                READ_TIMEOUT,
            )
            .await?;
        let annotated_count = project
            .get("num_tasks_with_annotations")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                BackendError::Decode("project response has no 'num_tasks_with_annotations'".into())
            })?;

        Ok(QueueAnchor {
            inner_id,
            annotated_count,
        })
    }

    async fn create_annotation(
        &self,
        token: &AccessToken,
        task_id: TaskId,
        request: &WriteRequest,
    ) -> WriteOutcome {
        let judgment = match request.validate(task_id) {
            Ok(judgment) => judgment,
            Err(message) => return WriteOutcome::RejectedLocally(message),
        };
        let payload = AnnotationPayload::new(&judgment, request.lead_time, chrono::Utc::now());

        let builder = self
            .client
            .post(self.endpoint(&format!("tasks/{task_id}/annotations/")))
            .bearer_auth(token.as_str())
            .json(&payload);
        self.send_write(builder).await
    }

    async fn patch_annotation(
        &self,
        token: &AccessToken,
        annotation_id: AnnotationId,
        task_id: TaskId,
        request: &WriteRequest,
    ) -> WriteOutcome {
        let judgment = match request.validate(task_id) {
            Ok(judgment) => judgment,
            Err(message) => return WriteOutcome::RejectedLocally(message),
        };
        if annotation_id <= 0 {
            return WriteOutcome::RejectedLocally(format!(
                "annotation_id must be a positive integer, got {annotation_id}"
            ));
        }
        let payload = AnnotationPayload::new(&judgment, request.lead_time, chrono::Utc::now());
        let body = PatchBody {
            payload: &payload,
            draft_id: 0,
            parent_prediction: None,
            parent_annotation: None,
        };

        let builder = self
            .client
            .patch(self.endpoint(&format!("annotations/{annotation_id}/")))
            .bearer_auth(token.as_str())
            .query(&[
                ("taskID", task_id.to_string()),
                ("project", self.config.project_id.to_string()),
            ])
            .json(&body);
        self.send_write(builder).await
    }

    async fn find_existing_annotation(
        &self,
        token: &AccessToken,
        task_id: TaskId,
        project_id: i64,
    ) -> Option<AnnotationId> {
        match self.lookup_from_listing(token, task_id, project_id).await {
            Ok(Some(id)) => return Some(id),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(task_id, error = %e, "Annotation listing lookup failed");
            }
        }

        match self.lookup_from_task_detail(token, task_id, project_id).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(task_id, error = %e, "Task detail annotation lookup failed");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request/response helpers
// ---------------------------------------------------------------------------

/// Resolve a backend path against the base URL.
///
/// Absolute `http(s)://` URLs are returned unchanged. Otherwise leading
/// slashes are dropped and `api/` is prefixed when missing.
pub fn resolve_endpoint(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let path = path.trim_start_matches('/');
    let base = base_url.trim_end_matches('/');
    if path.starts_with("api/") {
        format!("{base}/{path}")
    } else {
        format!("{base}/api/{path}")
    }
}

/// Filter/ordering query selecting tasks after `min_inner_id`, ascending.
pub fn build_task_query(min_inner_id: InnerId) -> Value {
    json!({
        "filters": {
            "conjunction": "and",
            "items": [{
                "filter": "filter:tasks:inner_id",
                "operator": "greater",
                "type": "Number",
                "value": min_inner_id,
            }],
        },
        "ordering": ["tasks:inner_id"],
    })
}

/// Accept either a bare task array or an object with a `tasks` field.
pub fn extract_task_list(body: Value) -> Result<Vec<Task>, BackendError> {
    let list = match body {
        Value::Object(mut obj) => obj.remove("tasks").unwrap_or(Value::Array(Vec::new())),
        Value::Null => Value::Array(Vec::new()),
        other => other,
    };
    serde_json::from_value(list).map_err(|e| BackendError::Decode(format!("task list: {e}")))
}

/// Id of the most recently updated annotation in a list of records.
///
/// Records are ordered by (`updated_at` or `created_at` or empty, `id`);
/// the last one wins.
pub fn latest_annotation_id(records: &[Value]) -> Option<AnnotationId> {
    records
        .iter()
        .max_by_key(|r| {
            let stamp = r
                .get("updated_at")
                .and_then(Value::as_str)
                .or_else(|| r.get("created_at").and_then(Value::as_str))
                .unwrap_or("")
                .to_string();
            let id = r.get("id").and_then(Value::as_i64).unwrap_or(0);
            (stamp, id)
        })
        .and_then(|r| r.get("id"))
        .and_then(Value::as_i64)
}

/// The annotation listing returns a bare array or a `results`/`data` page.
pub fn annotation_id_from_listing(body: &Value) -> Option<AnnotationId> {
    let records = match body {
        Value::Array(items) => items,
        Value::Object(obj) => obj
            .get("results")
            .or_else(|| obj.get("data"))
            .and_then(Value::as_array)?,
        _ => return None,
    };
    latest_annotation_id(records)
}

/// Fall back to a task detail's embedded annotations, then its id lists.
pub fn annotation_id_from_task_detail(body: &Value) -> Option<AnnotationId> {
    if let Some(records) = body.get("annotations").and_then(Value::as_array) {
        if !records.is_empty() {
            return latest_annotation_id(records);
        }
    }
    body.get("annotations_ids")
        .or_else(|| body.get("annotation_ids"))
        .and_then(Value::as_array)
        .and_then(|ids| ids.last())
        .and_then(Value::as_i64)
}

/// Ensure the response has a success status code, or turn it into
/// [`BackendError::Upstream`] carrying the status and body text.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = read_body_text(response).await;
        tracing::warn!(status = status.as_u16(), "Backend returned an error status");
        return Err(BackendError::Upstream {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

async fn parse_response(response: reqwest::Response) -> Result<Value, BackendError> {
    let response = ensure_success(response).await?;
    Ok(response.json::<Value>().await?)
}

async fn read_body_text(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string())
}

/// Response body as JSON when the backend says it is JSON, otherwise as
/// (truncated) text. Successful non-JSON bodies are wrapped as `{"raw": …}`.
async fn read_detail(response: reqwest::Response) -> Value {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));
    let success = response.status().is_success();
    let text = read_body_text(response).await;

    if is_json {
        if let Ok(value) = serde_json::from_str::<Value>(&text) {
            return value;
        }
    }
    if success {
        json!({ "raw": text })
    } else {
        Value::String(text.chars().take(MAX_TEXT_DETAIL).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn endpoint_prefixes_api() {
        assert_eq!(
            resolve_endpoint("https://ls.example.com", "tasks/"),
            "https://ls.example.com/api/tasks/"
        );
        assert_eq!(
            resolve_endpoint("https://ls.example.com/", "/annotations/"),
            "https://ls.example.com/api/annotations/"
        );
    }

    #[test]
    fn endpoint_keeps_existing_api_prefix() {
        assert_eq!(
            resolve_endpoint("http://ls:8080", "api/projects/3"),
            "http://ls:8080/api/projects/3"
        );
    }

    #[test]
    fn endpoint_passes_absolute_urls_through() {
        assert_eq!(
            resolve_endpoint("http://ls:8080", "https://other/api/x/"),
            "https://other/api/x/"
        );
    }

    #[test]
    fn task_query_filters_strictly_greater_and_orders_by_inner_id() {
        let query = build_task_query(69);
        let item = &query["filters"]["items"][0];
        assert_eq!(item["filter"], "filter:tasks:inner_id");
        assert_eq!(item["operator"], "greater");
        assert_eq!(item["value"], 69);
        assert_eq!(query["ordering"], json!(["tasks:inner_id"]));
    }

    #[test]
    fn task_list_accepts_both_shapes() {
        let wrapped = json!({"tasks": [{"id": 1}, {"id": 2}], "total": 2});
        assert_eq!(extract_task_list(wrapped).unwrap().len(), 2);

        let bare = json!([{"id": 3, "inner_id": 9}]);
        let tasks = extract_task_list(bare).unwrap();
        assert_eq!(tasks[0].inner_id, Some(9));

        assert!(extract_task_list(json!({"total": 0})).unwrap().is_empty());
        assert!(extract_task_list(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn task_list_rejects_garbage() {
        assert_matches!(
            extract_task_list(json!("nope")),
            Err(BackendError::Decode(_))
        );
    }

    #[test]
    fn latest_annotation_prefers_updated_then_id() {
        let records = vec![
            json!({"id": 4, "created_at": "2025-01-01T00:00:00Z"}),
            json!({"id": 9, "updated_at": "2025-03-01T00:00:00Z"}),
            json!({"id": 2, "updated_at": "2025-02-01T00:00:00Z"}),
        ];
        assert_eq!(latest_annotation_id(&records), Some(9));

        let ties = vec![json!({"id": 5}), json!({"id": 7}), json!({"id": 6})];
        assert_eq!(latest_annotation_id(&ties), Some(7));
        assert_eq!(latest_annotation_id(&[]), None);
    }

    #[test]
    fn listing_shapes() {
        assert_eq!(annotation_id_from_listing(&json!([{"id": 3}])), Some(3));
        assert_eq!(
            annotation_id_from_listing(&json!({"results": [{"id": 8}]})),
            Some(8)
        );
        assert_eq!(
            annotation_id_from_listing(&json!({"data": [{"id": 1}]})),
            Some(1)
        );
        assert_eq!(annotation_id_from_listing(&json!({"results": []})), None);
        assert_eq!(annotation_id_from_listing(&json!("x")), None);
    }

    #[test]
    fn task_detail_fallbacks() {
        assert_eq!(
            annotation_id_from_task_detail(&json!({"annotations": [{"id": 12}]})),
            Some(12)
        );
        assert_eq!(
            annotation_id_from_task_detail(&json!({"annotations": [], "annotations_ids": [3, 4]})),
            Some(4)
        );
        assert_eq!(
            annotation_id_from_task_detail(&json!({"annotation_ids": [21]})),
            Some(21)
        );
        assert_eq!(annotation_id_from_task_detail(&json!({})), None);
    }
}
