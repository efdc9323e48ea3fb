//! Request handlers for the review workflow.
//!
//! Each submodule covers one page of the reviewer UI. Handlers talk to the
//! annotation backend through [`AnnotationBackend`](reviewdesk_backend::AnnotationBackend)
//! and map errors via [`AppError`](crate::error::AppError).

pub mod edit;
pub mod history;
pub mod queue;
