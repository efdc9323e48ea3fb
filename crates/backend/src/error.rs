/// Errors from the annotation backend's read and auth paths.
///
/// Annotation writes do not use this type; they report a
/// [`WriteOutcome`](reviewdesk_core::write::WriteOutcome) instead.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Token refresh returned a non-2xx status. No authenticated call may
    /// follow.
    #[error("Token refresh failed ({status}): {body}")]
    Auth { status: u16, body: String },

    /// The backend returned a non-2xx status on a read.
    #[error("Backend API error ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A 2xx response did not have the expected shape.
    #[error("Unexpected backend response: {0}")]
    Decode(String),
}
