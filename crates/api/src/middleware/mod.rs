//! Request extractors shared by the review handlers.
//!
//! - [`session::ReviewSession`] -- Resolves the session-queue key from the
//!   `x-review-session` header.

pub mod session;
