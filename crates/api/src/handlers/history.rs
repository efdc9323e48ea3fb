//! Handlers for browsing already-reviewed tasks.
//!
//! History pages are rebuilt from the backend's forward cursor; the client
//! round-trips the anchors of the page it is looking at to go further back.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

use reviewdesk_backend::AccessToken;
use reviewdesk_core::pagination::{history_window, previous_window, HistoryCursor, PageWindow};
use reviewdesk_core::rows::{build_history_rows, HistoryRow};

use crate::body::{lenient_i64, parse_optional_json};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// One page of history plus the anchors to request the page before it.
#[derive(Debug, Serialize)]
pub struct HistoryPage {
    pub history_datas: Vec<HistoryRow>,
    /// Echo as `current_annotation_num` to go back one page.
    pub annotations: i64,
    /// Echo as `current_inner_id` to go back one page.
    pub inner_id: i64,
}

/// GET /history
///
/// The page immediately before the backend's current cursor.
pub async fn history_default(State(state): State<AppState>) -> AppResult<Json<HistoryPage>> {
    default_page(&state).await.map(Json)
}

/// POST /history
///
/// The page before the anchors in the body. An empty body behaves like
/// `GET /history`.
pub async fn history_page(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<HistoryPage>> {
    let page = match parse_history_cursor(&body)? {
        None => default_page(&state).await?,
        Some(cursor) => {
            let window = previous_window(cursor, state.config.history_page_size);
            tracing::debug!(?cursor, start = window.start_inner_id, "Paging history back");
            load_page(&state, window).await?
        }
    };
    Ok(Json(page))
}

async fn default_page(state: &AppState) -> AppResult<HistoryPage> {
    let backend = &state.backend;
    let token = backend.refresh_access_token().await?;
    let anchor = backend
        .next_cursor_and_count(&token, backend.project_id())
        .await?;
    let window = history_window(anchor, state.config.history_page_size);
    fetch_rows(state, &token, window).await
}

async fn load_page(state: &AppState, window: PageWindow) -> AppResult<HistoryPage> {
    let token = state.backend.refresh_access_token().await?;
    fetch_rows(state, &token, window).await
}

async fn fetch_rows(
    state: &AppState,
    token: &AccessToken,
    window: PageWindow,
) -> AppResult<HistoryPage> {
    let tasks = state
        .backend
        .list_unannotated_tasks(token, window.min_inner_id, window.page_size)
        .await?;
    let cursor = window.cursor();

    Ok(HistoryPage {
        history_datas: build_history_rows(&tasks, &window),
        annotations: cursor.current_annotation_num,
        inner_id: cursor.current_inner_id,
    })
}

/// Read the anchors from a history request body.
///
/// The body may be the object itself or a list whose first element is the
/// object. Missing fields are 0; numeric strings are accepted. Returns
/// `None` for an empty body.
pub fn parse_history_cursor(body: &[u8]) -> AppResult<Option<HistoryCursor>> {
    let Some(value) = parse_optional_json(body)? else {
        return Ok(None);
    };

    let value = match value {
        Value::Array(items) => items
            .into_iter()
            .next()
            .unwrap_or_else(|| Value::Object(Map::new())),
        other => other,
    };
    let Value::Object(object) = value else {
        return Err(AppError::BadRequest(
            "History anchors must be a JSON object".into(),
        ));
    };

    let invalid = || {
        AppError::BadRequest("Invalid fields: current_annotation_num/current_inner_id".into())
    };
    let current_annotation_num = lenient_i64(object.get("current_annotation_num"))
        .map_err(|_| invalid())?
        .unwrap_or(0);
    let current_inner_id = lenient_i64(object.get("current_inner_id"))
        .map_err(|_| invalid())?
        .unwrap_or(0);

    Ok(Some(HistoryCursor {
        current_inner_id,
        current_annotation_num,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn object_and_list_forms() {
        let expected = HistoryCursor {
            current_inner_id: 70,
            current_annotation_num: 70,
        };
        assert_eq!(
            parse_history_cursor(br#"{"current_inner_id": 70, "current_annotation_num": 70}"#)
                .unwrap(),
            Some(expected)
        );
        assert_eq!(
            parse_history_cursor(br#"[{"current_inner_id": "70", "current_annotation_num": "70"}]"#)
                .unwrap(),
            Some(expected)
        );
    }

    #[test]
    fn missing_fields_default_to_zero() {
        assert_eq!(
            parse_history_cursor(br#"{"current_inner_id": 5}"#).unwrap(),
            Some(HistoryCursor {
                current_inner_id: 5,
                current_annotation_num: 0,
            })
        );
        assert_eq!(
            parse_history_cursor(b"[]").unwrap(),
            Some(HistoryCursor::default())
        );
    }

    #[test]
    fn empty_body_means_default_window() {
        assert_eq!(parse_history_cursor(b"").unwrap(), None);
    }

    #[test]
    fn bad_fields_are_rejected() {
        assert_matches!(
            parse_history_cursor(br#"{"current_inner_id": "abc"}"#),
            Err(AppError::BadRequest(_))
        );
        assert_matches!(parse_history_cursor(b"42"), Err(AppError::BadRequest(_)));
        assert_matches!(parse_history_cursor(b"{"), Err(AppError::BadRequest(_)));
    }
}
