//! Domain logic for the review desk: judgment validation, result blocks,
//! page-window arithmetic, batch reconciliation and the per-session queue
//! store. Performs no network I/O.

pub mod error;
pub mod judgment;
pub mod pagination;
pub mod reconcile;
pub mod result_block;
pub mod rows;
pub mod session;
pub mod task;
pub mod types;
pub mod write;
