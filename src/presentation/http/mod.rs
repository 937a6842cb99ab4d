//! HTTP server: the image optimization endpoint, health check and the edge
//! cache in front of the site.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use state::{AppState, EdgeProxy};
