//! Page windows over the backend's forward-only task stream.
//!
//! The backend only exposes a "next task" cursor (an inner id) and a running
//! count of annotated tasks; there is no random-access page API. A window is
//! rebuilt by offsetting backwards from an anchor and listing tasks whose
//! inner id is strictly greater than `min_inner_id`.
//!
//! Anchors may come straight from the client, so the offset arithmetic
//! saturates at the `i64` bounds.
//!
//! Historical replay assumes inner ids and annotation counts advance in
//! lockstep over the replayed range. Skipped or deleted tasks on the backend
//! break that assumption and shift rows against their numbering.

use serde::{Deserialize, Serialize};

use crate::types::InnerId;

/// Anchor reported by the backend: the inner id its own workflow would serve
/// next, and how many tasks currently carry at least one annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueAnchor {
    pub inner_id: InnerId,
    pub annotated_count: i64,
}

/// Pagination anchors round-tripped through the client for backward paging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryCursor {
    pub current_inner_id: InnerId,
    pub current_annotation_num: i64,
}

/// A reconstructed page of the task stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Inner id assigned to the first row of the window.
    pub start_inner_id: InnerId,
    /// Annotation count preceding the first row of the window.
    pub start_annotation_num: i64,
    /// Exclusive lower bound passed to the task listing.
    pub min_inner_id: InnerId,
    pub page_size: u32,
}

impl PageWindow {
    fn starting_at(start_inner_id: InnerId, start_annotation_num: i64, page_size: u32) -> Self {
        Self {
            start_inner_id,
            start_annotation_num,
            min_inner_id: start_inner_id.saturating_sub(1),
            page_size,
        }
    }

    /// Anchors the client sends back to page further into the past.
    pub fn cursor(&self) -> HistoryCursor {
        HistoryCursor {
            current_inner_id: self.start_inner_id.saturating_add(1),
            current_annotation_num: self.start_annotation_num.saturating_add(1),
        }
    }
}

/// The next `page_size` unseen tasks, starting at the anchor itself.
pub fn live_window(anchor: QueueAnchor, page_size: u32) -> PageWindow {
    PageWindow::starting_at(anchor.inner_id, anchor.annotated_count, page_size)
}

/// One page back from the backend's current anchor.
pub fn history_window(anchor: QueueAnchor, page_size: u32) -> PageWindow {
    let back = i64::from(page_size);
    PageWindow::starting_at(
        anchor.inner_id.saturating_sub(back),
        anchor.annotated_count.saturating_sub(back),
        page_size,
    )
}

/// One page further back from a cursor the client received earlier.
pub fn previous_window(cursor: HistoryCursor, page_size: u32) -> PageWindow {
    let back = i64::from(page_size) + 1;
    PageWindow::starting_at(
        cursor.current_inner_id.saturating_sub(back),
        cursor.current_annotation_num.saturating_sub(back),
        page_size,
    )
}
