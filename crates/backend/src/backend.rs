//! The seam between the review server and the annotation backend.

use async_trait::async_trait;
use reviewdesk_core::pagination::QueueAnchor;
use reviewdesk_core::task::Task;
use reviewdesk_core::types::{AnnotationId, InnerId, TaskId};
use reviewdesk_core::write::{WriteOutcome, WriteRequest};

use crate::error::BackendError;

/// Short-lived bearer token returned by a refresh.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Operations the review server needs from the annotation backend.
///
/// Read operations fail with [`BackendError`]. Writes validate their input
/// first and always return a [`WriteOutcome`], so a batch can carry on past
/// individual failures.
#[async_trait]
pub trait AnnotationBackend: Send + Sync {
    /// Project every call is scoped to.
    fn project_id(&self) -> i64;

    /// Exchange the long-lived credential for a bearer token.
    async fn refresh_access_token(&self) -> Result<AccessToken, BackendError>;

    /// Tasks with inner id strictly greater than `min_inner_id`, ascending by
    /// inner id, at most `page_size` of them.
    async fn list_unannotated_tasks(
        &self,
        token: &AccessToken,
        min_inner_id: InnerId,
        page_size: u32,
    ) -> Result<Vec<Task>, BackendError>;

    /// The inner id the backend would serve next and the number of tasks that
    /// carry at least one annotation.
    async fn next_cursor_and_count(
        &self,
        token: &AccessToken,
        project_id: i64,
    ) -> Result<QueueAnchor, BackendError>;

    /// Create a new two-block annotation on `task_id`.
    async fn create_annotation(
        &self,
        token: &AccessToken,
        task_id: TaskId,
        request: &WriteRequest,
    ) -> WriteOutcome;

    /// Replace the result of an existing annotation.
    async fn patch_annotation(
        &self,
        token: &AccessToken,
        annotation_id: AnnotationId,
        task_id: TaskId,
        request: &WriteRequest,
    ) -> WriteOutcome;

    /// Most recently updated annotation on `task_id`, if any. Lookup failures
    /// count as "none".
    async fn find_existing_annotation(
        &self,
        token: &AccessToken,
        task_id: TaskId,
        project_id: i64,
    ) -> Option<AnnotationId>;
}
