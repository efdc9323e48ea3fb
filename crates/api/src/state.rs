use std::sync::Arc;

use reviewdesk_backend::AnnotationBackend;
use reviewdesk_core::session::SessionQueues;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Annotation backend every read and write goes through.
    pub backend: Arc<dyn AnnotationBackend>,
    /// Task ids captured by the last live read, per review session.
    pub sessions: Arc<SessionQueues>,
}
