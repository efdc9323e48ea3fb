//! Display rows built from backend task records.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::pagination::PageWindow;
use crate::result_block::extract_prior_choices;
use crate::task::Task;
use crate::types::{InnerId, TaskId};

/// A pending task on the live review page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueRow {
    /// 1-based position across the whole project (annotated count + 1 for
    /// the first row).
    pub position: i64,
    pub task_id: TaskId,
    pub inner_id: Option<InnerId>,
    pub query: Option<String>,
    #[serde(rename = "IT_NAME")]
    pub item_name: Option<String>,
    pub image_url: Option<String>,
    pub data: Map<String, Value>,
}

/// An already-reviewed task on the history page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryRow {
    pub task_id: TaskId,
    pub inner_id: InnerId,
    pub num_tasks_with_annotations: i64,
    pub query: Option<String>,
    #[serde(rename = "IT_NAME")]
    pub item_name: Option<String>,
    pub image_url: Option<String>,
    pub rating: Option<String>,
    pub relation: Option<String>,
}

pub fn build_queue_rows(tasks: &[Task], annotated_count: i64) -> Vec<QueueRow> {
    tasks
        .iter()
        .zip(annotated_count + 1..)
        .map(|(task, position)| QueueRow {
            position,
            task_id: task.id,
            inner_id: task.inner_id,
            query: task.query().map(str::to_string),
            item_name: task.item_name().map(str::to_string),
            image_url: task.image_url().map(str::to_string),
            data: task.data.clone(),
        })
        .collect()
}

/// Number history rows sequentially from the window start.
///
/// Row `i` gets inner id `start_inner_id + i` and annotation number
/// `start_annotation_num + i + 1`, whatever the task's own inner id is.
pub fn build_history_rows(tasks: &[Task], window: &PageWindow) -> Vec<HistoryRow> {
    tasks
        .iter()
        .zip(0..)
        .map(|(task, offset)| {
            let prior = extract_prior_choices(task.annotations_results.as_ref());
            HistoryRow {
                task_id: task.id,
                inner_id: window.start_inner_id + offset,
                num_tasks_with_annotations: window.start_annotation_num + offset + 1,
                query: task.query().map(str::to_string),
                item_name: task.item_name().map(str::to_string),
                image_url: task.image_url().map(str::to_string),
                rating: prior.rating,
                relation: prior.relation,
            }
        })
        .collect()
}
