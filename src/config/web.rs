//! # HTTP Configuration
//!
//! | Variable | Description | Default |
//! |-----------|-------------|----------|
//! | `HTTP_BIND` | Listen address of the server | `127.0.0.1:8080` |
//! | `SERVE_RESIZED` | Serve the resized directory from this process | `true` |
//!
//! Turn `SERVE_RESIZED` off when a front web server already maps
//! `/resized-uploads/` onto the directory.
//!
//! # Example
//! ```rust
//! use orgnk_imageresize::config::web::HttpConfig;
//!
//! let cfg = HttpConfig::from_env_with(|_| None);
//! assert_eq!(cfg.bind, "127.0.0.1:8080");
//! assert!(cfg.serve_resized);
//! ```

use std::env;

use crate::config::env::read_flag_from;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

#[derive(Clone, Debug, PartialEq)]
pub struct HttpConfig {
    pub bind: String,
    pub serve_resized: bool,
}

impl HttpConfig {
    pub fn from_env() -> Self {
        Self::from_env_with(|k| env::var(k).ok())
    }

    pub fn from_env_with<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind = get("HTTP_BIND")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND.into());
        Self {
            bind,
            serve_resized: read_flag_from(&get, "SERVE_RESIZED", true),
        }
    }
}
