pub mod fallback;
pub mod resize_handler;
pub mod routes;
