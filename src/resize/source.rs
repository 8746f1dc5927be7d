//! # Image Sources
//!
//! Callers name the image to resize in one of three ways; each resolves to
//! a local file path through its own procedure.
//!
//! # Example
//! ```
//! use orgnk_imageresize::config::upload::UploadConfig;
//! use orgnk_imageresize::resize::source::{ImageSource, SourceResolver};
//!
//! let resolver = SourceResolver::new(&UploadConfig::from_env_with(|_| None));
//! let path = resolver.resolve(&ImageSource::file("2025/01/a.jpg")).unwrap();
//! assert!(path.ends_with("2025/01/a.jpg"));
//! ```

use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;

use crate::config::upload::UploadConfig;
use crate::error::resize::ResizeError;

/// Where a source image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// A path on the local filesystem; relative paths live under the uploads root.
    FilePath(PathBuf),
    /// A path on a named storage disk.
    RemoteReference { disk: String, path: String },
    /// A media-library attachment looked up by id.
    AttachmentReference { id: u64 },
}

impl ImageSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ImageSource::FilePath(path.into())
    }

    pub fn remote(disk: impl Into<String>, path: impl Into<String>) -> Self {
        ImageSource::RemoteReference {
            disk: disk.into(),
            path: path.into(),
        }
    }

    pub fn attachment(id: u64) -> Self {
        ImageSource::AttachmentReference { id }
    }
}

/// Host hook mapping attachment ids to local files.
pub trait AttachmentLookup: Send + Sync {
    /// `Ok(None)` when no attachment has this id.
    fn local_path(&self, id: u64) -> Result<Option<PathBuf>>;
}

#[derive(Clone)]
pub struct SourceResolver {
    root: PathBuf,
    disks: HashMap<String, PathBuf>,
    attachments: Option<Arc<dyn AttachmentLookup>>,
}

impl SourceResolver {
    pub fn new(cfg: &UploadConfig) -> Self {
        Self {
            root: cfg.root.clone(),
            disks: cfg.disks.clone(),
            attachments: None,
        }
    }

    pub fn with_attachments(mut self, lookup: Arc<dyn AttachmentLookup>) -> Self {
        self.attachments = Some(lookup);
        self
    }

    /// Resolves a source to a local path. Existence is checked by the caller.
    pub fn resolve(&self, source: &ImageSource) -> Result<PathBuf, ResizeError> {
        match source {
            ImageSource::FilePath(path) if path.is_absolute() => Ok(path.clone()),
            ImageSource::FilePath(path) => {
                join_inside(&self.root, path).ok_or_else(|| ResizeError::SourceNotFound(path.clone()))
            }
            ImageSource::RemoteReference { disk, path } => {
                let root = self
                    .disks
                    .get(disk)
                    .ok_or_else(|| ResizeError::UnknownDisk(disk.clone()))?;
                let rel = Path::new(path.trim_start_matches('/'));
                join_inside(root, rel).ok_or_else(|| ResizeError::SourceNotFound(rel.to_path_buf()))
            }
            ImageSource::AttachmentReference { id } => {
                let missing = || ResizeError::SourceNotFound(PathBuf::from(format!("attachment:{id}")));
                let lookup = self.attachments.as_ref().ok_or_else(missing)?;
                lookup
                    .local_path(*id)
                    .map_err(ResizeError::SourceLookup)?
                    .ok_or_else(missing)
            }
        }
    }
}

/// Joins `rel` under `root`, refusing `..` and absolute components.
fn join_inside(root: &Path, rel: &Path) -> Option<PathBuf> {
    let mut out = root.to_path_buf();
    for c in rel.components() {
        match c {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(out)
}
