pub mod health;
pub mod review;

use axum::Router;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /queue                 live page (GET), batch write (POST)
/// /history               default history page (GET), page back (POST)
/// /tasks/edit            single-task edit (PATCH, or POST with override)
/// ```
pub fn api_routes(timeout: TimeoutLayer) -> Router<AppState> {
    Router::new().merge(review::router(timeout))
}
