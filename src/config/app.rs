//! # Application Configuration Loader
//!
//! Gathers every configuration section of the resize service.
//!
//! Automatically loads `.env` files for non-production environments.
//! It checks for a custom `DOTENV_FILE` path first, then falls back to
//! `.env.{APP_ENV}` or `.env`.
//!
//! # Environment Variables
//! | Variable | Description | Default |
//! |-----------|-------------|----------|
//! | `APP_ENV` | Current environment (`development`, `production`, etc.) | `"development"` |
//! | `DOTENV_FILE` | Optional path to a custom dotenv file | *none* |
//!
//! Section variables are listed on [`SigningConfig`], [`ResizeConfig`],
//! [`UploadConfig`], [`HttpConfig`] and [`SizeRegistry`].
//!
//! # Example
//! ```rust,no_run
//! use orgnk_imageresize::config::app::AppConfig;
//!
//! let cfg = AppConfig::from_env();
//! if cfg.signing.is_ephemeral() {
//!     eprintln!("signed URLs will not survive a restart");
//! }
//! ```

use std::env;

use crate::config::{
    resize::ResizeConfig, signing::SigningConfig, upload::UploadConfig, web::HttpConfig,
};
use crate::resize::sizes::SizeRegistry;

/// Top-level application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub signing: SigningConfig,
    pub resize: ResizeConfig,
    pub upload: UploadConfig,
    pub http: HttpConfig,
    /// Named sizes from `IMAGE_SIZES`.
    pub sizes: SizeRegistry,
}

impl AppConfig {
    /// Loads dotenv files (outside production), then every section.
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        if app_env != "production" {
            if let Ok(path) = env::var("DOTENV_FILE") {
                let _ = dotenvy::from_filename(path);
            } else {
                let candidate = format!(".env.{}", app_env);
                dotenvy::from_filename(&candidate)
                    .or_else(|_| dotenvy::dotenv())
                    .ok();
            }
        }

        AppConfig {
            signing: SigningConfig::from_env(),
            resize: ResizeConfig::from_env(),
            upload: UploadConfig::from_env(),
            http: HttpConfig::from_env(),
            sizes: SizeRegistry::from_env(),
        }
    }
}
