//! Request handlers

mod edge;
mod health;
mod optimize_image;

pub use edge::edge;
pub use health::{HealthResponse, health_check};
pub use optimize_image::{IMAGE_CACHE_CONTROL, optimize_image};
