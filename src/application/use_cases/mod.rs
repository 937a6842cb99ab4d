//! Use case implementations.

mod optimize_image;

pub use optimize_image::{DEFAULT_STORAGE_PREFIX, OptimizeImageUseCase};
