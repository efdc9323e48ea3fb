//! Concurrent batch write dispatcher.
//!
//! Every reconciled [`WriteItem`] becomes one `create_annotation` call. At
//! most [`MAX_CONCURRENT_WRITES`] calls are in flight at once; the dispatcher
//! waits for all of them and never cancels siblings on failure. Each spawned
//! write owns one result slot indexed by its batch position, and slots are
//! merged only after the join, so nothing is shared between writers.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use reviewdesk_backend::{AccessToken, AnnotationBackend};
use reviewdesk_core::reconcile::WriteItem;
use reviewdesk_core::write::{FailedWrite, WriteOutcome, WriteRequest, BATCH_LEAD_TIME_SECS};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Upper bound on concurrent annotation writes for one batch.
pub const MAX_CONCURRENT_WRITES: usize = 8;

/// Aggregated result of one batch dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of writes the backend accepted.
    pub succeeded: usize,
    /// One entry per write that did not succeed, in no particular order.
    pub failed: Vec<FailedWrite>,
}

impl DispatchReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }
}

/// What a spawned write hands back: the backend outcome, or the panic text
/// if the write blew up instead of returning.
type SlotResult = Result<WriteOutcome, String>;

/// Fans batch writes out to the annotation backend.
pub struct WriteDispatcher {
    backend: Arc<dyn AnnotationBackend>,
    max_in_flight: usize,
    lead_time: f64,
}

impl WriteDispatcher {
    pub fn new(backend: Arc<dyn AnnotationBackend>) -> Self {
        Self {
            backend,
            max_in_flight: MAX_CONCURRENT_WRITES,
            lead_time: BATCH_LEAD_TIME_SECS,
        }
    }

    /// Override the in-flight bound. Values below 1 are raised to 1.
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Create one annotation per item and wait for every write to finish.
    ///
    /// The report accounts for every item exactly once: a write that panics
    /// or whose task is lost is reported as failed with the panic text.
    pub async fn dispatch(&self, token: &AccessToken, items: &[WriteItem]) -> DispatchReport {
        let semaphore = Arc::new(Semaphore::new(self.max_in_flight));
        let mut writes = JoinSet::new();

        for (index, item) in items.iter().enumerate() {
            let backend = Arc::clone(&self.backend);
            let semaphore = Arc::clone(&semaphore);
            let token = token.clone();
            let task_id = item.task_id;
            let request = WriteRequest::new(&item.rating, &item.relation, self.lead_time);

            writes.spawn(async move {
                // Never closed, so acquiring cannot fail.
                let _permit = semaphore.acquire_owned().await;
                let outcome = AssertUnwindSafe(backend.create_annotation(&token, task_id, &request))
                    .catch_unwind()
                    .await
                    .map_err(panic_message);
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<SlotResult>> = vec![None; items.len()];
        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => tracing::error!(error = %e, "Write task failed to join"),
            }
        }

        let report = merge_slots(items, slots);
        tracing::info!(
            dispatched = items.len(),
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "Batch dispatch finished",
        );
        report
    }
}

/// Fold per-item slots into a report. An empty slot means the write never
/// reported back and is counted as failed.
fn merge_slots(items: &[WriteItem], slots: Vec<Option<SlotResult>>) -> DispatchReport {
    let mut report = DispatchReport::default();

    for (item, slot) in items.iter().zip(slots) {
        let message = match slot {
            Some(Ok(outcome)) => outcome.failure_message(),
            Some(Err(panic)) => Some(panic),
            None => Some("write task did not complete".to_string()),
        };
        match message {
            None => report.succeeded += 1,
            Some(message) => {
                tracing::warn!(task_id = item.task_id, error = %message, "Annotation write failed");
                report.failed.push(FailedWrite {
                    task_id: item.task_id,
                    message,
                });
            }
        }
    }

    report
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "write task panicked".to_string()
    }
}
