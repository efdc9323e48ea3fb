//! Route definitions for the reviewer workflow.

use axum::routing::{get, patch};
use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{edit, history, queue};
use crate::state::AppState;

/// Review routes, merged into `/api/v1`.
///
/// ```text
/// GET    /queue          read_queue
/// POST   /queue          submit_batch
/// GET    /history        history_default
/// POST   /history        history_page
/// PATCH  /tasks/edit     edit_task
/// POST   /tasks/edit     edit_task_override (X-HTTP-Method-Override: PATCH)
/// ```
///
/// `timeout` wraps every route except `POST /queue`. A batch write runs
/// until each dispatched item has an outcome; its writes are bounded by the
/// backend client's per-call timeouts instead.
pub fn router(timeout: TimeoutLayer) -> Router<AppState> {
    Router::new()
        .route(
            "/queue",
            get(queue::read_queue)
                .layer(timeout.clone())
                .post(queue::submit_batch),
        )
        .route(
            "/history",
            get(history::history_default)
                .post(history::history_page)
                .layer(timeout.clone()),
        )
        .route(
            "/tasks/edit",
            patch(edit::edit_task)
                .post(edit::edit_task_override)
                .fallback(edit::edit_method_not_allowed)
                .layer(timeout),
        )
}
