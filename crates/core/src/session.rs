use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::types::TaskId;

/// Slot used when a request carries no session key.
pub const DEFAULT_SESSION: &str = "default";

/// Ordered task ids captured by the last live read for each session key.
///
/// Each key holds a single slot with last-writer-wins semantics: a second
/// read under the same key replaces the first read's queue, and a later
/// write pairs its rows with the replacement. Requests that share a key
/// (including everyone on [`DEFAULT_SESSION`]) race on the same slot.
/// Nothing here outlives the process.
pub struct SessionQueues {
    slots: RwLock<HashMap<String, Vec<TaskId>>>,
}

impl SessionQueues {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the queue for `key`, returning the queue it displaced.
    pub async fn replace(&self, key: &str, task_ids: Vec<TaskId>) -> Option<Vec<TaskId>> {
        self.slots.write().await.insert(key.to_string(), task_ids)
    }

    /// Remove and return the queue for `key`. An unknown key yields an
    /// empty queue.
    pub async fn take(&self, key: &str) -> Vec<TaskId> {
        self.slots.write().await.remove(key).unwrap_or_default()
    }

    /// Put a taken queue back when its write never reached the backend.
    /// A queue stored by a newer read under the same key is kept; returns
    /// whether `task_ids` was reinstated.
    pub async fn restore(&self, key: &str, task_ids: Vec<TaskId>) -> bool {
        let mut slots = self.slots.write().await;
        if slots.contains_key(key) {
            return false;
        }
        slots.insert(key.to_string(), task_ids);
        true
    }

    /// Copy of the queue for `key` without consuming it.
    pub async fn snapshot(&self, key: &str) -> Vec<TaskId> {
        self.slots
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of session keys currently holding a queue.
    pub async fn session_count(&self) -> usize {
        self.slots.read().await.len()
    }
}

impl Default for SessionQueues {
    fn default() -> Self {
        Self::new()
    }
}
