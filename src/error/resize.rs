//! # Resize Pipeline Errors
//!
//! A single error type shared by every stage of the deferred resize pipeline.
//!
//! External collaborators (raster engine, transient store, attachment lookup)
//! report failures as [`anyhow::Error`]; the pipeline wraps them into the
//! variant describing *where* the failure happened so the HTTP layer can map
//! it to a response without inspecting the cause.
//!
//! # Example
//! ```
//! use orgnk_imageresize::error::resize::ResizeError;
//!
//! let err = ResizeError::ConfigNotFound;
//! assert_eq!(err.to_string(), "resize link expired");
//! ```

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors raised by the deferred resize pipeline.
#[derive(Debug, Error)]
pub enum ResizeError {
    /// The identifier/URL pair failed the format or MAC check.
    ///
    /// Deliberately carries no detail about which check failed.
    #[error("invalid signature")]
    InvalidSignature,

    /// The cached descriptor is absent or expired.
    #[error("resize link expired")]
    ConfigNotFound,

    /// The resized-assets directory could not be created.
    #[error("failed to create directory {path:?}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The raster engine failed to open, transform, or save the image.
    #[error("resize failed")]
    ResizeFailed(#[source] anyhow::Error),

    /// The source image does not exist on disk.
    #[error("source image not found: {0:?}")]
    SourceNotFound(PathBuf),

    /// The source path is not valid UTF-8 and cannot be part of a variant identity.
    #[error("source path is not valid UTF-8: {0:?}")]
    InvalidSourcePath(PathBuf),

    /// Neither the options nor the source file name give a supported extension.
    #[error("unsupported image extension: {0:?}")]
    UnsupportedExtension(String),

    /// A remote reference named a disk that is not configured.
    #[error("unknown disk: {0}")]
    UnknownDisk(String),

    /// The host's attachment lookup failed.
    #[error("source lookup failed")]
    SourceLookup(#[source] anyhow::Error),

    /// A named size is not present in the registry.
    #[error("unknown image size: {0}")]
    UnknownSize(String),

    /// The transient store failed, or a cached entry could not be (de)serialized.
    #[error("config cache error")]
    Cache(#[source] anyhow::Error),

    /// Staging or publishing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ResizeError {
    /// HTTP status used when this error reaches the deferred endpoint.
    pub fn status(&self) -> StatusCode {
        match self {
            ResizeError::InvalidSignature => StatusCode::NOT_FOUND,
            ResizeError::ConfigNotFound => StatusCode::GONE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ResizeError {
    fn into_response(self) -> Response {
        match self {
            ResizeError::InvalidSignature => StatusCode::NOT_FOUND.into_response(),
            ResizeError::ConfigNotFound => {
                (StatusCode::GONE, "resize link expired").into_response()
            }
            other => (other.status(), "image could not be generated").into_response(),
        }
    }
}
