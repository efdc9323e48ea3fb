//! Session-queue key extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use reviewdesk_core::session::DEFAULT_SESSION;

use crate::error::AppError;

/// Header carrying the reviewer's session key.
pub const SESSION_HEADER: &str = "x-review-session";

/// Longest session key accepted.
pub const MAX_SESSION_KEY_LEN: usize = 128;

/// Key of the session queue a request reads from or writes against.
///
/// Requests without the header (or with a blank one) share
/// [`DEFAULT_SESSION`]:
///
/// ```ignore
/// async fn my_handler(session: ReviewSession) -> AppResult<Json<()>> {
///     tracing::info!(session = %session.key(), "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSession(String);

impl ReviewSession {
    pub fn key(&self) -> &str {
        &self.0
    }

    /// Validate a raw header value. Keys are limited to ASCII letters,
    /// digits, `-`, `_` and `.`.
    pub fn from_header_value(raw: &str) -> Result<Self, AppError> {
        let key = raw.trim();
        if key.is_empty() {
            return Ok(Self::default());
        }
        if key.len() > MAX_SESSION_KEY_LEN {
            return Err(AppError::BadRequest(format!(
                "{SESSION_HEADER} must be at most {MAX_SESSION_KEY_LEN} characters"
            )));
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(AppError::BadRequest(format!(
                "{SESSION_HEADER} may only contain letters, digits, '-', '_' and '.'"
            )));
        }
        Ok(Self(key.to_string()))
    }
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self(DEFAULT_SESSION.to_string())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for ReviewSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(SESSION_HEADER) {
            None => Ok(Self::default()),
            Some(value) => {
                let raw = value.to_str().map_err(|_| {
                    AppError::BadRequest(format!("{SESSION_HEADER} must be visible ASCII"))
                })?;
                Self::from_header_value(raw)
            }
        }
    }
}
