pub mod app;
pub mod env;
pub mod resize;
pub mod signing;
pub mod upload;
pub mod web;
