//! # Upload Configuration
//!
//! Where source images live.
//!
//! - `UPLOADS_ROOT`: base directory relative file paths resolve against
//!   (default `./content/uploads`)
//! - `UPLOAD_DISKS`: named storage roots for remote references, as
//!   `name=path` pairs separated by commas (e.g. `public=/srv/public,media=/mnt/media`)
//!
//! # Example
//! ```rust
//! use orgnk_imageresize::config::upload::UploadConfig;
//! use std::path::PathBuf;
//!
//! let cfg = UploadConfig::from_env_with(|k| match k {
//!     "UPLOAD_DISKS" => Some("public=/srv/public".into()),
//!     _ => None,
//! });
//! assert_eq!(cfg.disks.get("public"), Some(&PathBuf::from("/srv/public")));
//! ```
use std::{collections::HashMap, env, path::PathBuf};

/// Configuration for source directories.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadConfig {
    /// Root directory relative source paths are resolved against.
    pub root: PathBuf,
    /// Named disk roots used by remote references.
    pub disks: HashMap<String, PathBuf>,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self::from_env_with(|k| env::var(k).ok())
    }

    pub fn from_env_with<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = get("UPLOADS_ROOT")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./content/uploads"));

        let disks = get("UPLOAD_DISKS")
            .map(|s| parse_disks(&s))
            .unwrap_or_default();

        Self { root, disks }
    }
}

fn parse_disks(raw: &str) -> HashMap<String, PathBuf> {
    raw.split(',')
        .filter_map(|pair| {
            let (name, path) = pair.split_once('=')?;
            let (name, path) = (name.trim(), path.trim());
            (!name.is_empty() && !path.is_empty()).then(|| (name.to_string(), PathBuf::from(path)))
        })
        .collect()
}
