//! Presentation layer.

/// HTTP server.
pub mod http;

pub use http::{AppState, EdgeProxy, router};
