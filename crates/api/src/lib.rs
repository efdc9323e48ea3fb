//! Review desk API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes, the
//! batch write dispatcher) so integration tests and the binary entrypoint
//! can both access them.

pub mod body;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
