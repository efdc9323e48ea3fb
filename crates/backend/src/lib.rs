//! Annotation backend client.
//!
//! Provides the [`AnnotationBackend`](backend::AnnotationBackend) trait the
//! review server is written against, and [`BackendApi`](api::BackendApi), its
//! HTTP implementation.

pub mod api;
pub mod backend;
pub mod config;
pub mod error;

pub use api::BackendApi;
pub use backend::{AccessToken, AnnotationBackend};
pub use config::BackendConfig;
pub use error::BackendError;
