use axum::{http::StatusCode, response::IntoResponse};

/// Final fallback of the router: an empty `404 Not Found`, identical to a
/// rejected signature.
pub async fn not_found() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
