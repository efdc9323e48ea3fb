//! Handler for editing the judgment on a single task.
//!
//! Unlike batch writes, an edit first looks for an annotation already on the
//! task and patches it; only when there is none does it create one.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

use reviewdesk_core::judgment::{Rating, Relation};
use reviewdesk_core::types::{AnnotationId, InnerId, TaskId};
use reviewdesk_core::write::{WriteOutcome, WriteRequest};

use crate::body::{lenient_f64, lenient_i64, parse_optional_json, text_field};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header that lets a `POST` stand in for a `PATCH`.
pub const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";

/// Whether the edit created a new annotation or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    Create,
    Patch,
}

/// Validated edit request.
#[derive(Debug, Clone, PartialEq)]
pub struct EditInput {
    pub task_id: TaskId,
    pub inner_id: InnerId,
    pub rating: Rating,
    pub relation: Relation,
    pub lead_time: f64,
}

/// Successful edit, echoing the request alongside the backend's response.
#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub ok: bool,
    pub action: EditAction,
    pub annotation_id: Option<AnnotationId>,
    pub task_id: TaskId,
    pub inner_id: InnerId,
    pub rating: u8,
    pub relation: Relation,
    pub backend_response: Value,
}

/// PATCH /tasks/edit
pub async fn edit_task(State(state): State<AppState>, body: Bytes) -> AppResult<Json<EditResponse>> {
    apply_edit(&state, &body).await.map(Json)
}

/// POST /tasks/edit
///
/// Accepted only with `X-HTTP-Method-Override: PATCH`.
pub async fn edit_task_override(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<EditResponse>> {
    let overridden = headers
        .get(METHOD_OVERRIDE_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("PATCH"));
    if !overridden {
        return Err(only_patch());
    }
    apply_edit(&state, &body).await.map(Json)
}

/// Any other method on /tasks/edit.
pub async fn edit_method_not_allowed() -> AppError {
    only_patch()
}

fn only_patch() -> AppError {
    AppError::MethodNotAllowed("Only PATCH allowed".into())
}

/// Parse and range-check an edit body. Nothing is sent to the backend
/// unless this succeeds.
pub fn parse_edit(body: &[u8]) -> AppResult<EditInput> {
    let value = parse_optional_json(body)?
        .ok_or_else(|| AppError::BadRequest("Empty body".into()))?;

    let invalid_types =
        || AppError::BadRequest("Invalid types for task_id/inner_id/rating/relation".into());
    let object: Map<String, Value> = match value {
        Value::Object(object) => object,
        _ => return Err(invalid_types()),
    };
    let required = |name: &str| -> AppResult<i64> {
        lenient_i64(object.get(name))
            .ok()
            .flatten()
            .ok_or_else(invalid_types)
    };

    let task_id = required("task_id")?;
    if task_id <= 0 {
        return Err(AppError::BadRequest(format!(
            "task_id must be a positive integer, got {task_id}"
        )));
    }
    let inner_id = required("inner_id")?;
    let rating = Rating::from_number(required("rating")?)?;
    let relation = Relation::normalize(&text_field(&object, "relation"))?;
    let lead_time = lenient_f64(object.get("lead_time"))
        .map_err(|_| AppError::BadRequest("lead_time must be a number".into()))?
        .unwrap_or(0.0);

    Ok(EditInput {
        task_id,
        inner_id,
        rating,
        relation,
        lead_time,
    })
}

async fn apply_edit(state: &AppState, body: &[u8]) -> AppResult<EditResponse> {
    let input = parse_edit(body)?;
    let backend = &state.backend;
    let project_id = backend.project_id();

    let token = backend.refresh_access_token().await?;
    let existing = backend
        .find_existing_annotation(&token, input.task_id, project_id)
        .await;

    let request = WriteRequest::new(
        input.rating.as_str(),
        input.relation.code(),
        input.lead_time,
    );
    let (action, outcome) = match existing {
        Some(annotation_id) => (
            EditAction::Patch,
            backend
                .patch_annotation(&token, annotation_id, input.task_id, &request)
                .await,
        ),
        None => (
            EditAction::Create,
            backend
                .create_annotation(&token, input.task_id, &request)
                .await,
        ),
    };

    match outcome {
        WriteOutcome::Succeeded(backend_response) => {
            let annotation_id = backend_response
                .get("id")
                .and_then(Value::as_i64)
                .or(existing);
            tracing::info!(
                task_id = input.task_id,
                ?annotation_id,
                ?action,
                "Task judgment saved",
            );
            Ok(EditResponse {
                ok: true,
                action,
                annotation_id,
                task_id: input.task_id,
                inner_id: input.inner_id,
                rating: input.rating.value(),
                relation: input.relation,
                backend_response,
            })
        }
        WriteOutcome::RejectedLocally(msg) => Err(AppError::BadRequest(msg)),
        WriteOutcome::UpstreamRejected {
            status,
            url,
            detail,
        } => Err(AppError::UpstreamRejected {
            status,
            url,
            detail,
        }),
        WriteOutcome::TransportFailed(msg) => Err(AppError::BadGateway(msg)),
    }
}
