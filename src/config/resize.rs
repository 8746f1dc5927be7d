//! # Resize Configuration
//!
//! Locations and policies of the deferred resize pipeline.
//!
//! | Variable | Description | Default |
//! |-----------|-------------|----------|
//! | `CONTENT_BASE_URL` | Public base URL of the content directory | `http://127.0.0.1:8080` |
//! | `SITE_URL` | Public base URL the deferred route is mounted on | `CONTENT_BASE_URL` |
//! | `RESIZE_ROUTE_PREFIX` | First path segment of signed URLs | `orgnk-imageresize` |
//! | `RESIZED_DIR` | Directory holding materialized variants | `./content/resized-uploads` |
//! | `SCRATCH_DIR` | Directory for per-invocation scratch files | system temp dir |
//! | `RESIZE_CACHE_TTL_SECS` | Lifetime of a cached descriptor | `86400` |
//! | `RESIZE_MAX_FAILURES` | Failed attempts before a link is dropped | `3` |
//! | `RESIZE_DEFAULT_QUALITY` | Quality used when callers do not set one | `90` |
//!
//! # Example
//! ```rust
//! use orgnk_imageresize::config::resize::ResizeConfig;
//!
//! let cfg = ResizeConfig::from_env_with(|k| match k {
//!     "CONTENT_BASE_URL" => Some("https://cdn.example.com/".into()),
//!     _ => None,
//! });
//! assert_eq!(cfg.content_base_url, "https://cdn.example.com");
//! assert_eq!(cfg.route_prefix, "orgnk-imageresize");
//! ```

use std::{env, path::PathBuf, time::Duration};

use crate::resize::descriptor::DEFAULT_QUALITY;

/// URL segment under which materialized variants are published.
pub const RESIZED_URL_SEGMENT: &str = "resized-uploads";

/// Default first path segment of signed URLs.
pub const DEFAULT_ROUTE_PREFIX: &str = "orgnk-imageresize";

#[derive(Clone, Debug, PartialEq)]
pub struct ResizeConfig {
    /// Public base URL of the content directory, without trailing slash.
    pub content_base_url: String,
    /// Public base URL the deferred route is served from, without trailing slash.
    pub site_url: String,
    pub route_prefix: String,
    pub resized_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub cache_ttl: Duration,
    pub max_failures: u32,
    pub default_quality: u8,
}

impl ResizeConfig {
    pub fn from_env() -> Self {
        Self::from_env_with(|k| env::var(k).ok())
    }

    pub fn from_env_with<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let parse_u64 = |k: &str, default: u64| {
            read(k).and_then(|v| v.parse::<u64>().ok()).unwrap_or(default)
        };

        let content_base_url = read("CONTENT_BASE_URL")
            .unwrap_or_else(|| "http://127.0.0.1:8080".into())
            .trim_end_matches('/')
            .to_string();
        let site_url = read("SITE_URL")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| content_base_url.clone());
        let route_prefix = read("RESIZE_ROUTE_PREFIX")
            .map(|s| s.trim_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ROUTE_PREFIX.into());

        Self {
            content_base_url,
            site_url,
            route_prefix,
            resized_dir: read("RESIZED_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./content").join(RESIZED_URL_SEGMENT)),
            scratch_dir: read("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(env::temp_dir),
            cache_ttl: Duration::from_secs(parse_u64("RESIZE_CACHE_TTL_SECS", 86_400)),
            max_failures: read("RESIZE_MAX_FAILURES")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(3),
            default_quality: read("RESIZE_DEFAULT_QUALITY")
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(DEFAULT_QUALITY)
                .min(100),
        }
    }

    /// Public URL prefix of materialized variants.
    pub fn resized_base_url(&self) -> String {
        format!("{}/{}", self.content_base_url, RESIZED_URL_SEGMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_missing() {
        let cfg = ResizeConfig::from_env_with(|_| None);
        assert_eq!(cfg.content_base_url, "http://127.0.0.1:8080");
        assert_eq!(cfg.site_url, cfg.content_base_url);
        assert_eq!(cfg.route_prefix, DEFAULT_ROUTE_PREFIX);
        assert_eq!(cfg.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(cfg.max_failures, 3);
        assert_eq!(cfg.default_quality, 90);
        assert_eq!(cfg.scratch_dir, env::temp_dir());
        assert!(cfg.resized_dir.ends_with(RESIZED_URL_SEGMENT));
    }

    #[test]
    fn respects_values_and_trims_slashes() {
        let mut fake = HashMap::<String, String>::new();
        fake.insert("CONTENT_BASE_URL".into(), "https://cdn.example.com/content/".into());
        fake.insert("SITE_URL".into(), "https://www.example.com/".into());
        fake.insert("RESIZE_ROUTE_PREFIX".into(), "/img/".into());
        fake.insert("RESIZED_DIR".into(), "/srv/resized".into());
        fake.insert("SCRATCH_DIR".into(), "/srv/tmp".into());
        fake.insert("RESIZE_CACHE_TTL_SECS".into(), "60".into());
        fake.insert("RESIZE_MAX_FAILURES".into(), "5".into());
        fake.insert("RESIZE_DEFAULT_QUALITY".into(), "75".into());

        let cfg = ResizeConfig::from_env_with(|k| fake.get(k).cloned());
        assert_eq!(cfg.content_base_url, "https://cdn.example.com/content");
        assert_eq!(cfg.site_url, "https://www.example.com");
        assert_eq!(cfg.route_prefix, "img");
        assert_eq!(cfg.resized_dir, PathBuf::from("/srv/resized"));
        assert_eq!(cfg.scratch_dir, PathBuf::from("/srv/tmp"));
        assert_eq!(cfg.cache_ttl, Duration::from_secs(60));
        assert_eq!(cfg.max_failures, 5);
        assert_eq!(cfg.default_quality, 75);
        assert_eq!(
            cfg.resized_base_url(),
            "https://cdn.example.com/content/resized-uploads"
        );
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let cfg = ResizeConfig::from_env_with(|k| match k {
            "RESIZE_CACHE_TTL_SECS" => Some("soon".into()),
            "RESIZE_DEFAULT_QUALITY" => Some("300".into()),
            _ => None,
        });
        assert_eq!(cfg.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(cfg.default_quality, 90);
    }

    #[test]
    fn out_of_range_max_failures_falls_back_instead_of_wrapping() {
        let cfg = ResizeConfig::from_env_with(|k| {
            (k == "RESIZE_MAX_FAILURES").then(|| "4294967296".to_string())
        });
        assert_eq!(cfg.max_failures, 3);

        let cfg =
            ResizeConfig::from_env_with(|k| (k == "RESIZE_MAX_FAILURES").then(|| "0".to_string()));
        assert_eq!(cfg.max_failures, 0);
    }
}
