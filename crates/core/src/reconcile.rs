//! Batch reconciliation: pair client-submitted row edits with the
//! server-held session queue.
//!
//! The client is trusted for ordering only. Rows are paired with queue
//! entries by position, never by any identifier the row carries, and the
//! batch is cut at the first incomplete row.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::TaskId;

/// Marker in the composite display field meaning the row is unfinished.
pub const INCOMPLETE_SENTINEL: char = '_';

/// One client-submitted row edit.
///
/// `num` is the rating, `aux` the relation, `combo` a composite display field
/// used only to detect incompleteness. Values may arrive as strings or
/// numbers; `null` and missing are treated the same.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    #[serde(default)]
    pub num: Option<Value>,
    #[serde(default)]
    pub aux: Option<Value>,
    #[serde(default)]
    pub combo: Option<Value>,
}

impl BatchRow {
    fn field_text(value: &Option<Value>) -> Option<String> {
        match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }

    pub fn rating(&self) -> Option<String> {
        Self::field_text(&self.num)
    }

    pub fn relation(&self) -> Option<String> {
        Self::field_text(&self.aux)
    }

    /// A row is incomplete when the rating or relation is absent, or the
    /// composite field carries the sentinel.
    pub fn is_incomplete(&self) -> bool {
        self.rating().is_none()
            || self.relation().is_none()
            || Self::field_text(&self.combo)
                .is_some_and(|combo| combo.contains(INCOMPLETE_SENTINEL))
    }
}

/// A write eligible for dispatch. Rating and relation are still raw; they
/// are validated by the backend client before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteItem {
    pub task_id: TaskId,
    pub rating: String,
    pub relation: String,
}

/// Outcome of reconciling a batch against the session queue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Writes to dispatch, in batch order.
    pub items: Vec<WriteItem>,
    /// Index of the first incomplete row, if any.
    pub cut_index: Option<usize>,
    /// Number of batch rows kept after the cut.
    pub received: usize,
}

/// Index of the leftmost incomplete row.
pub fn find_cut_index(batch: &[BatchRow]) -> Option<usize> {
    batch.iter().position(BatchRow::is_incomplete)
}

/// Reconcile a batch against the queue captured at read time.
///
/// Rows `[0, cut)` are kept, where `cut` is the first incomplete row (or the
/// batch length), and each kept row is paired with the queue entry at the
/// same index. The output length is `min(cut, queue.len())`.
pub fn reconcile(queue: &[TaskId], batch: &[BatchRow]) -> Reconciliation {
    let cut_index = find_cut_index(batch);
    let kept = &batch[..cut_index.unwrap_or(batch.len())];

    let items = queue
        .iter()
        .zip(kept)
        .filter_map(|(&task_id, row)| {
            Some(WriteItem {
                task_id,
                rating: row.rating()?,
                relation: row.relation()?,
            })
        })
        .collect();

    Reconciliation {
        items,
        cut_index,
        received: kept.len(),
    }
}
