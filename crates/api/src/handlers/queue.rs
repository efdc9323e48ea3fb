//! Handlers for the live review queue.
//!
//! A read lists the next page of unlabeled tasks and remembers their ids in
//! the caller's session slot. A batch write pairs the submitted rows with
//! that slot by position and fans the resulting creates out to the backend.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use reviewdesk_core::pagination::live_window;
use reviewdesk_core::reconcile::{reconcile, BatchRow};
use reviewdesk_core::rows::{build_queue_rows, QueueRow};
use reviewdesk_core::types::TaskId;
use reviewdesk_core::write::FailedWrite;

use crate::engine::dispatcher::WriteDispatcher;
use crate::error::{AppError, AppResult};
use crate::middleware::session::ReviewSession;
use crate::state::AppState;

/// Mode tag echoed in every batch response.
pub const DISPATCH_MODE: &str = "single-parallel";

/* --------------------------------------------------------------------------
   Payloads
   -------------------------------------------------------------------------- */

/// One page of pending tasks.
#[derive(Debug, Serialize)]
pub struct QueuePage {
    pub project_id: i64,
    /// Position of the first row (annotated count + 1).
    pub annotations: i64,
    /// Configured page size.
    pub total: u32,
    pub tasks: Vec<QueueRow>,
}

/// Body of a batch write.
#[derive(Debug, Default, Deserialize)]
pub struct BatchPayload {
    #[serde(default)]
    pub batch: Vec<BatchRow>,
}

/// Aggregated batch result. Failures are reported here, never through the
/// HTTP status.
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    /// `true` only when every dispatched write succeeded.
    pub errno: bool,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<FailedWrite>>,
}

impl BatchResponse {
    fn received(count: usize) -> Self {
        Self {
            errno: true,
            mode: DISPATCH_MODE,
            received: Some(count),
            failed: None,
        }
    }

    fn failed(failed: Vec<FailedWrite>) -> Self {
        Self {
            errno: false,
            mode: DISPATCH_MODE,
            received: None,
            failed: Some(failed),
        }
    }
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// GET /queue
///
/// List the next `queue_total` unlabeled tasks, starting at the backend's
/// cursor, and replace this session's queue with their ids.
pub async fn read_queue(
    session: ReviewSession,
    State(state): State<AppState>,
) -> AppResult<Json<QueuePage>> {
    let backend = &state.backend;
    let project_id = backend.project_id();

    let token = backend.refresh_access_token().await?;
    let anchor = backend.next_cursor_and_count(&token, project_id).await?;
    let window = live_window(anchor, state.config.queue_total);
    let tasks = backend
        .list_unannotated_tasks(&token, window.min_inner_id, window.page_size)
        .await?;

    let task_ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
    let queued = task_ids.len();
    let displaced = state.sessions.replace(session.key(), task_ids).await;
    tracing::debug!(
        session = %session.key(),
        queued,
        replaced = displaced.is_some(),
        cursor = anchor.inner_id,
        "Session queue replaced",
    );

    Ok(Json(QueuePage {
        project_id,
        annotations: anchor.annotated_count + 1,
        total: state.config.queue_total,
        tasks: build_queue_rows(&tasks, anchor.annotated_count),
    }))
}

/// POST /queue
///
/// Reconcile `{ "batch": [...] }` against this session's queue and create one
/// annotation per kept row. The queue is consumed once the body parses, and
/// put back if the token refresh fails before any write is sent.
pub async fn submit_batch(
    session: ReviewSession,
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<BatchResponse>> {
    let payload: BatchPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {e}")))?;

    let queue = state.sessions.take(session.key()).await;
    let reconciliation = reconcile(&queue, &payload.batch);
    tracing::info!(
        session = %session.key(),
        queued = queue.len(),
        submitted = payload.batch.len(),
        cut_index = ?reconciliation.cut_index,
        dispatching = reconciliation.items.len(),
        "Batch reconciled",
    );

    if reconciliation.items.is_empty() {
        return Ok(Json(BatchResponse::received(reconciliation.received)));
    }

    let token = match state.backend.refresh_access_token().await {
        Ok(token) => token,
        Err(e) => {
            let restored = state.sessions.restore(session.key(), queue).await;
            tracing::warn!(
                session = %session.key(),
                restored,
                "Token refresh failed before batch dispatch",
            );
            return Err(e.into());
        }
    };
    let report = WriteDispatcher::new(Arc::clone(&state.backend))
        .dispatch(&token, &reconciliation.items)
        .await;

    if report.all_succeeded() {
        Ok(Json(BatchResponse::received(reconciliation.received)))
    } else {
        Ok(Json(BatchResponse::failed(report.failed)))
    }
}
