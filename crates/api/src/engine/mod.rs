//! Batch write engine.
//!
//! - [`dispatcher::WriteDispatcher`] -- Fans reconciled writes out to the
//!   annotation backend with a bounded number in flight.

pub mod dispatcher;
