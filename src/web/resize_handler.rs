//! # Deferred Resize Endpoint
//!
//! `GET /{prefix}/{identifier}/{*target}` where `target` is the
//! percent-encoded canonical URL of the variant.
//!
//! ## Returns
//! - `302 Found` with `Location` set to the canonical URL
//! - `404 Not Found` (empty body) if the identifier does not match the URL
//! - `410 Gone` if the cached request expired
//! - `500 Internal Server Error` if the image could not be generated
//!
//! ## Example
//! ```rust,ignore
//! use axum::{Router, routing::get, Extension};
//! use std::sync::Arc;
//!
//! let app = Router::new()
//!     .route("/orgnk-imageresize/{identifier}/{*target}", get(resize_handler))
//!     .layer(Extension(Arc::new(handler)));
//! ```

use std::sync::Arc;

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use tracing::error;

use crate::resize::handler::DeferredRequestHandler;

pub async fn resize_handler(
    Extension(handler): Extension<Arc<DeferredRequestHandler>>,
    Path((identifier, target)): Path<(String, String)>,
) -> Response {
    // image work blocks
    let joined =
        tokio::task::spawn_blocking(move || handler.handle(&identifier, &target)).await;

    match joined {
        Ok(Ok(location)) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Ok(Err(e)) => e.into_response(),
        Err(e) => {
            error!(error = %e, "resize task panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
