//! Outbound HTTP adapters.

pub mod client;
pub mod supabase_storage;

pub use client::{DEFAULT_TIMEOUT, HttpClient, is_hop_by_hop};
pub use supabase_storage::{SupabaseStorage, UnconfiguredStorage};
