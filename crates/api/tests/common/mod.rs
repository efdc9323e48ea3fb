#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use reviewdesk_api::config::ServerConfig;
use reviewdesk_api::router::build_app_router;
use reviewdesk_api::state::AppState;
use reviewdesk_backend::{AccessToken, AnnotationBackend, BackendError};
use reviewdesk_core::pagination::QueueAnchor;
use reviewdesk_core::session::SessionQueues;
use reviewdesk_core::task::Task;
use reviewdesk_core::types::{AnnotationId, InnerId, TaskId};
use reviewdesk_core::write::{WriteOutcome, WriteRequest};

pub const PROJECT_ID: i64 = 7;

/// Build a test `ServerConfig` with safe defaults and small pages.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        queue_total: 4,
        history_page_size: 3,
    }
}

/// One backend call, as seen by [`FakeBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Refresh,
    List { min_inner_id: InnerId, page_size: u32 },
    Anchor { project_id: i64 },
    Create { task_id: TaskId, rating: String, relation: String, lead_time: f64 },
    Patch { annotation_id: AnnotationId, task_id: TaskId, rating: String, relation: String },
    Lookup { task_id: TaskId, project_id: i64 },
}

/// In-memory annotation backend.
///
/// Tasks are a contiguous run of inner ids; the listing honours
/// `min_inner_id` and `page_size` the way the real backend does. Writes
/// validate like the real client and can be scripted to fail per task id.
pub struct FakeBackend {
    pub anchor: QueueAnchor,
    pub tasks: Vec<Task>,
    pub existing: HashMap<TaskId, AnnotationId>,
    pub rejected: HashSet<TaskId>,
    pub unreachable: HashSet<TaskId>,
    pub panicking: HashSet<TaskId>,
    pub refresh_fails: bool,
    /// Latency added to every task listing.
    pub read_delay: Option<Duration>,
    /// Latency added to every create and patch.
    pub write_delay: Option<Duration>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    /// Tasks with inner ids `1..=count`; task id is `inner_id + 1000`.
    pub fn with_tasks(count: i64, anchor: QueueAnchor) -> Self {
        let tasks = (1..=count)
            .map(|inner_id| {
                serde_json::from_value(json!({
                    "id": inner_id + 1000,
                    "inner_id": inner_id,
                    "data": {
                        "query": format!("query {inner_id}"),
                        "IT_NAME": format!("item {inner_id}"),
                        "image_url": format!("https://img.example/{inner_id}.png"),
                    },
                    "annotations_results": json!([[
                        {"from_name": "rating", "value": {"choices": ["2"]}},
                        {"from_name": "relation", "value": {"choices": ["S"]}}
                    ]]).to_string(),
                }))
                .unwrap()
            })
            .collect();
        Self {
            anchor,
            tasks,
            existing: HashMap::new(),
            rejected: HashSet::new(),
            unreachable: HashSet::new(),
            panicking: HashSet::new(),
            refresh_fails: false,
            read_delay: None,
            write_delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Create { .. }))
            .collect()
    }

    async fn pause(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn write(&self, task_id: TaskId, request: &WriteRequest, response: Value) -> WriteOutcome {
        if let Err(msg) = request.validate(task_id) {
            return WriteOutcome::RejectedLocally(msg);
        }
        if self.panicking.contains(&task_id) {
            panic!("fake backend blew up on task {task_id}");
        }
        if self.unreachable.contains(&task_id) {
            return WriteOutcome::TransportFailed("connection refused".into());
        }
        if self.rejected.contains(&task_id) {
            return WriteOutcome::UpstreamRejected {
                status: 409,
                url: format!("http://fake/api/tasks/{task_id}/annotations/"),
                detail: json!({"detail": "task is locked"}),
            };
        }
        WriteOutcome::Succeeded(response)
    }
}

#[async_trait]
impl AnnotationBackend for FakeBackend {
    fn project_id(&self) -> i64 {
        PROJECT_ID
    }

    async fn refresh_access_token(&self) -> Result<AccessToken, BackendError> {
        self.record(Call::Refresh);
        if self.refresh_fails {
            return Err(BackendError::Auth {
                status: 401,
                body: r#"{"detail":"token revoked"}"#.into(),
            });
        }
        Ok(AccessToken::new("fake-access"))
    }

    async fn list_unannotated_tasks(
        &self,
        _token: &AccessToken,
        min_inner_id: InnerId,
        page_size: u32,
    ) -> Result<Vec<Task>, BackendError> {
        self.record(Call::List {
            min_inner_id,
            page_size,
        });
        Self::pause(self.read_delay).await;
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.inner_id.is_some_and(|id| id > min_inner_id))
            .take(page_size as usize)
            .cloned()
            .collect())
    }

    async fn next_cursor_and_count(
        &self,
        _token: &AccessToken,
        project_id: i64,
    ) -> Result<QueueAnchor, BackendError> {
        self.record(Call::Anchor { project_id });
        Ok(self.anchor)
    }

    async fn create_annotation(
        &self,
        _token: &AccessToken,
        task_id: TaskId,
        request: &WriteRequest,
    ) -> WriteOutcome {
        self.record(Call::Create {
            task_id,
            rating: request.rating.clone(),
            relation: request.relation.clone(),
            lead_time: request.lead_time,
        });
        Self::pause(self.write_delay).await;
        self.write(task_id, request, json!({"id": 9000 + task_id, "task": task_id}))
    }

    async fn patch_annotation(
        &self,
        _token: &AccessToken,
        annotation_id: AnnotationId,
        task_id: TaskId,
        request: &WriteRequest,
    ) -> WriteOutcome {
        self.record(Call::Patch {
            annotation_id,
            task_id,
            rating: request.rating.clone(),
            relation: request.relation.clone(),
        });
        Self::pause(self.write_delay).await;
        self.write(task_id, request, json!({"id": annotation_id, "updated": true}))
    }

    async fn find_existing_annotation(
        &self,
        _token: &AccessToken,
        task_id: TaskId,
        project_id: i64,
    ) -> Option<AnnotationId> {
        self.record(Call::Lookup {
            task_id,
            project_id,
        });
        self.existing.get(&task_id).copied()
    }
}

/// Build the full application router around `backend`, returning the
/// session store so tests can inspect it.
pub fn build_test_app(backend: Arc<FakeBackend>) -> (Router, Arc<SessionQueues>) {
    let config = test_config();
    let sessions = Arc::new(SessionQueues::new());
    let state = AppState {
        config: Arc::new(config.clone()),
        backend: backend as Arc<dyn AnnotationBackend>,
        sessions: Arc::clone(&sessions),
    };
    (build_app_router(state, &config), sessions)
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_with_session(app: Router, uri: &str, session: &str) -> Response {
    let request = Request::get(uri)
        .header("x-review-session", session)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_raw(app: Router, uri: &str, body: &str) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response {
    post_raw(app, uri, &body.to_string()).await
}

pub async fn post_json_with_session(
    app: Router,
    uri: &str,
    session: &str,
    body: Value,
) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("x-review-session", session)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn request_json(
    app: Router,
    method: Method,
    uri: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn patch_json(app: Router, uri: &str, body: Value) -> Response {
    request_json(app, Method::PATCH, uri, &[], &body.to_string()).await
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
