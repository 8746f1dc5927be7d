//! # orgnk_imageresize
//!
//! Deferred image resizing behind signed URLs.
//!
//! Callers ask [`resize::service::ImageResizer`] for the URL of a resized
//! variant. If the variant is already on disk they get its public URL;
//! otherwise the request is cached under a keyed-hash identifier and they
//! get a signed URL instead. The first fetch of that URL runs the resize,
//! publishes the file atomically and redirects to it.
//!
//! ## Example usage (in another crate)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use orgnk_imageresize::cache::memory_store::MemoryTransientStore;
//! use orgnk_imageresize::config::app::AppConfig;
//! use orgnk_imageresize::image::image_rs_processor::ImageRsEngine;
//! use orgnk_imageresize::resize::{services::ResizeServices, source::{ImageSource, SourceResolver}};
//!
//! let cfg = AppConfig::from_env();
//! let services = ResizeServices::build(
//!     &cfg,
//!     SourceResolver::new(&cfg.upload),
//!     Arc::new(MemoryTransientStore::default()),
//!     Arc::new(ImageRsEngine::default()),
//! );
//! let resizer = &services.resizer;
//! let url = resizer.url(&ImageSource::file("2024/05/photo.jpg"), 640, 0, resizer.default_options())?;
//! # Ok::<(), orgnk_imageresize::error::resize::ResizeError>(())
//! ```

// ===============================
// Re-exports of external crates
// ===============================

pub use anyhow;
pub use axum;
pub use chrono;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tower;
pub use tower_http;

// ===============================
// Public modules
// ===============================
pub mod cache;
pub mod config;
pub mod error;
pub mod image;
pub mod resize;
pub mod time;
pub mod web;
