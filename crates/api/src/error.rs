use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use reviewdesk_backend::BackendError;
use reviewdesk_core::error::CoreError;
use serde_json::{json, Value};

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`BackendError`] for failures
/// talking to the annotation backend, and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `reviewdesk_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Token refresh or a backend read failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The route exists but not for this method (after overrides).
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// The backend rejected a single-task write; its status is passed through.
    #[error("Backend rejected write ({status}) at {url}")]
    UpstreamRejected {
        status: u16,
        url: String,
        detail: Value,
    },

    /// The backend could not be reached for a single-task write.
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, detail) = match self {
            // --- Pass-through of a backend write rejection ---
            AppError::UpstreamRejected {
                status,
                url,
                detail,
            } => return upstream_rejection(status, url, detail),

            // --- CoreError variants ---
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg, None)
            }

            // --- Backend errors ---
            AppError::Backend(err) => classify_backend_error(&err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            AppError::MethodNotAllowed(msg) => (
                StatusCode::METHOD_NOT_ALLOWED,
                "METHOD_NOT_ALLOWED",
                msg,
                None,
            ),
            AppError::BadGateway(msg) => {
                tracing::error!(error = %msg, "Backend unreachable");
                (
                    StatusCode::BAD_GATEWAY,
                    "BAD_GATEWAY",
                    "request to backend failed".to_string(),
                    Some(json!(msg)),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(detail) = detail {
            body["detail"] = detail;
        }

        (status, axum::Json(body)).into_response()
    }
}

/// Response for a backend write rejection, carrying the backend's own status.
fn upstream_rejection(status: u16, url: String, detail: Value) -> Response {
    tracing::warn!(status, %url, "Backend rejected single-task write");
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
    let body = json!({
        "error": "backend API error",
        "code": "UPSTREAM_REJECTED",
        "status": status.as_u16(),
        "url": url,
        "detail": detail,
    });
    (status, axum::Json(body)).into_response()
}

/// Classify a backend error into an HTTP status, error code, message and
/// debugging detail.
///
/// Upstream status and body are echoed rather than sanitized: they come from
/// the backend, not from this service's internals.
fn classify_backend_error(
    err: &BackendError,
) -> (StatusCode, &'static str, String, Option<Value>) {
    match err {
        BackendError::Auth { status, body } => {
            tracing::error!(status, body = %body, "Backend token refresh failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_ERROR",
                "failed to get access token".to_string(),
                Some(json!({ "status": status, "body": body })),
            )
        }
        BackendError::Upstream { status, body } => {
            tracing::error!(status, body = %body, "Backend API error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UPSTREAM_ERROR",
                format!("Backend API error ({status})"),
                Some(json!({ "status": status, "body": body })),
            )
        }
        BackendError::Decode(msg) => {
            tracing::error!(error = %msg, "Unexpected backend response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "UPSTREAM_ERROR",
                "Unexpected backend response".to_string(),
                Some(json!(msg)),
            )
        }
        BackendError::Request(e) => {
            tracing::error!(error = %e, "Backend request failed");
            (
                StatusCode::BAD_GATEWAY,
                "BAD_GATEWAY",
                "request to backend failed".to_string(),
                Some(json!(e.to_string())),
            )
        }
    }
}
