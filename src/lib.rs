//! Inkwell - image optimization proxy and offline asset cache for a
//! bilingual author storefront.
//!
//! This crate provides the server side of the site: an on-the-fly image
//! resizing endpoint, a service-worker style cache in front of the origin,
//! and the persisted cart, bookmark and language state the pages share.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing services and use cases.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the HTTP server.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "inkwell";
