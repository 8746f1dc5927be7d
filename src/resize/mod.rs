//! Deferred resize pipeline.
//!
//! [`service::ImageResizer`] issues URLs, [`handler::DeferredRequestHandler`]
//! serves the first fetch of a signed one.

pub mod config_cache;
pub mod descriptor;
pub mod executor;
pub mod handler;
pub mod resolver;
pub mod service;
pub mod services;
pub mod signer;
pub mod sizes;
pub mod source;
