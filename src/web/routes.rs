//! # Router
//!
//! - `GET /{route_prefix}/{identifier}/{*target}`: deferred resize endpoint
//! - `/resized-uploads/*`: materialized variants, when `serve_resized` is on
//! - anything else: empty 404

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::services::ServeDir;

use crate::config::{resize::ResizeConfig, resize::RESIZED_URL_SEGMENT, web::HttpConfig};
use crate::resize::handler::DeferredRequestHandler;
use crate::web::{fallback::not_found, resize_handler::resize_handler};

pub fn router(
    handler: Arc<DeferredRequestHandler>,
    resize: &ResizeConfig,
    http: &HttpConfig,
) -> Router {
    let mut app = Router::new().route(
        &format!("/{}/{{identifier}}/{{*target}}", resize.route_prefix),
        get(resize_handler),
    );
    if http.serve_resized {
        app = app.nest_service(
            &format!("/{RESIZED_URL_SEGMENT}"),
            ServeDir::new(&resize.resized_dir),
        );
    }
    app.fallback(not_found).layer(Extension(handler))
}
