//! # Resize Descriptor
//!
//! The immutable record describing one resize or crop request: the source
//! file and its modification time, the target box, and the options that
//! influence the output bytes.
//!
//! A descriptor serializes deterministically (fields in declaration order,
//! extra options in key order), which is what makes its identifiers stable
//! across requests and restarts.
//!
//! # Example
//! ```
//! use orgnk_imageresize::resize::descriptor::{Descriptor, Extension, ResizeOptions};
//!
//! let d = Descriptor::new("uploads/a.jpg", 1_700_000_000, 200, 0, ResizeOptions::default()).unwrap();
//! assert_eq!(d.options().extension, Some(Extension::Jpg));
//! assert_eq!(d.height(), 0); // derived from the aspect ratio
//! ```

use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
    time::UNIX_EPOCH,
};

use serde::{Deserialize, Serialize};

use crate::error::resize::ResizeError;

/// Default JPEG quality when neither the caller nor the config sets one.
pub const DEFAULT_QUALITY: u8 = 90;

/// How `resize` fits the source into the target box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Proportional fit, never upscaling.
    #[default]
    Auto,
    /// Fill the exact box and trim the overflow.
    Crop,
}

/// Output formats the pipeline can publish.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extension {
    Jpg,
    Png,
    Gif,
    Webp,
}

impl Extension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Extension::Jpg => "jpg",
            Extension::Png => "png",
            Extension::Gif => "gif",
            Extension::Webp => "webp",
        }
    }

    /// Extension of a file name, if it is one of the supported formats.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for Extension {
    type Err = ResizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Extension::Jpg),
            "png" => Ok(Extension::Png),
            "gif" => Ok(Extension::Gif),
            "webp" => Ok(Extension::Webp),
            _ => Err(ResizeError::UnsupportedExtension(s.to_string())),
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-left corner of a fixed-offset crop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offset {
    pub x: u32,
    pub y: u32,
}

/// Which raster operation materializes the descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    #[default]
    Resize,
    Crop,
}

/// Options that influence the output bytes.
///
/// `extension: None` means "same as the source"; [`Descriptor::new`] fills it in.
/// `offset: None` centres a fixed crop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResizeOptions {
    pub mode: ResizeMode,
    pub offset: Option<Offset>,
    pub sharpen: u32,
    pub interlace: bool,
    pub quality: u8,
    pub extension: Option<Extension>,
    /// Host-specific options. Ordered so serialization stays deterministic.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            mode: ResizeMode::Auto,
            offset: None,
            sharpen: 0,
            interlace: false,
            quality: DEFAULT_QUALITY,
            extension: None,
            extra: BTreeMap::new(),
        }
    }
}

impl ResizeOptions {
    pub fn with_mode(mut self, mode: ResizeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extension = Some(extension);
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.min(100);
        self
    }

    pub fn with_offset(mut self, x: u32, y: u32) -> Self {
        self.offset = Some(Offset { x, y });
        self
    }
}

/// One fully specified resize or crop request.
///
/// Fields are private: once built, a descriptor cannot change, so every
/// identifier derived from it stays valid for its lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Descriptor {
    source_path: PathBuf,
    source_mtime: i64,
    width: u32,
    height: u32,
    #[serde(default)]
    operation: Operation,
    options: ResizeOptions,
}

impl Descriptor {
    /// Builds a resize descriptor, defaulting the output extension to the source's.
    pub fn new(
        source_path: impl Into<PathBuf>,
        source_mtime: i64,
        width: u32,
        height: u32,
        mut options: ResizeOptions,
    ) -> Result<Self, ResizeError> {
        let source_path = source_path.into();
        if source_path.to_str().is_none() {
            return Err(ResizeError::InvalidSourcePath(source_path));
        }
        if options.extension.is_none() {
            let ext = Extension::from_path(&source_path).ok_or_else(|| {
                ResizeError::UnsupportedExtension(source_path.display().to_string())
            })?;
            options.extension = Some(ext);
        }
        options.quality = options.quality.min(100);

        Ok(Self {
            source_path,
            source_mtime,
            width,
            height,
            operation: Operation::Resize,
            options,
        })
    }

    /// Builds a descriptor for an existing file, reading its modification time.
    pub fn for_file(
        source_path: impl Into<PathBuf>,
        width: u32,
        height: u32,
        options: ResizeOptions,
    ) -> Result<Self, ResizeError> {
        let source_path = source_path.into();
        let meta = std::fs::metadata(&source_path)
            .ok()
            .filter(|m| m.is_file())
            .ok_or_else(|| ResizeError::SourceNotFound(source_path.clone()))?;
        let mtime = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        Self::new(source_path, mtime, width, height, options)
    }

    /// Same request, materialized with a fixed-offset crop instead of a resize.
    pub fn into_crop(mut self) -> Self {
        self.operation = Operation::Crop;
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn source_mtime(&self) -> i64 {
        self.source_mtime
    }

    /// Target width; `0` derives it from the aspect ratio.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Target height; `0` derives it from the aspect ratio.
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn options(&self) -> &ResizeOptions {
        &self.options
    }

    /// Output extension. Always set after construction.
    pub fn extension(&self) -> Extension {
        self.options.extension.unwrap_or(Extension::Jpg)
    }

    /// Source file name without its extension, used to name the variant.
    pub fn source_stem(&self) -> String {
        self.source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".into())
    }

    /// Deterministic serialization fed to the signer.
    pub fn canonical_message(&self) -> String {
        // UTF-8 path and string-keyed maps only; serialization cannot fail.
        serde_json::to_string(self).expect("descriptor serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn non_utf8_source_paths_are_rejected() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        for raw in [&b"/up/a\xff.png"[..], &b"/other/a\xfe.png"[..]] {
            let path = PathBuf::from(OsStr::from_bytes(raw));
            let err = Descriptor::new(path, 1, 10, 10, ResizeOptions::default()).unwrap_err();
            assert!(matches!(err, ResizeError::InvalidSourcePath(_)));
        }
    }

    #[test]
    fn distinct_descriptors_have_distinct_messages() {
        let a = Descriptor::new("/up/a.png", 1, 10, 10, ResizeOptions::default()).unwrap();
        let b = Descriptor::new("/other/a.png", 9, 300, 300, ResizeOptions::default()).unwrap();
        assert_ne!(a.canonical_message(), b.canonical_message());
        assert!(!a.canonical_message().is_empty());
    }

    #[test]
    fn extension_defaults_to_source() {
        let d = Descriptor::new("/up/photo.PNG", 1, 10, 10, ResizeOptions::default()).unwrap();
        assert_eq!(d.extension(), Extension::Png);

        let d = Descriptor::new("/up/photo.jpeg", 1, 10, 10, ResizeOptions::default()).unwrap();
        assert_eq!(d.extension(), Extension::Jpg);
    }

    #[test]
    fn explicit_extension_wins() {
        let opts = ResizeOptions::default().with_extension(Extension::Webp);
        let d = Descriptor::new("/up/photo.jpg", 1, 10, 10, opts).unwrap();
        assert_eq!(d.extension(), Extension::Webp);
    }

    #[test]
    fn unsupported_source_extension_without_override_is_rejected() {
        let err = Descriptor::new("/up/doc.tiff", 1, 10, 10, ResizeOptions::default()).unwrap_err();
        assert!(matches!(err, ResizeError::UnsupportedExtension(_)));

        let opts = ResizeOptions::default().with_extension(Extension::Png);
        assert!(Descriptor::new("/up/doc.tiff", 1, 10, 10, opts).is_ok());
    }

    #[test]
    fn quality_is_clamped() {
        let mut opts = ResizeOptions::default();
        opts.quality = 250;
        let d = Descriptor::new("a.jpg", 1, 1, 1, opts).unwrap();
        assert_eq!(d.options().quality, 100);
    }

    #[test]
    fn canonical_message_is_deterministic() {
        let mut a = ResizeOptions::default();
        a.extra.insert("zeta".into(), serde_json::json!(1));
        a.extra.insert("alpha".into(), serde_json::json!("x"));
        let mut b = ResizeOptions::default();
        b.extra.insert("alpha".into(), serde_json::json!("x"));
        b.extra.insert("zeta".into(), serde_json::json!(1));

        let d1 = Descriptor::new("a.jpg", 5, 200, 100, a).unwrap();
        let d2 = Descriptor::new("a.jpg", 5, 200, 100, b).unwrap();
        assert_eq!(d1.canonical_message(), d2.canonical_message());
    }

    #[test]
    fn message_changes_with_mtime_and_operation() {
        let d = Descriptor::new("a.jpg", 5, 200, 100, ResizeOptions::default()).unwrap();
        let newer = Descriptor::new("a.jpg", 6, 200, 100, ResizeOptions::default()).unwrap();
        assert_ne!(d.canonical_message(), newer.canonical_message());
        assert_ne!(d.canonical_message(), d.clone().into_crop().canonical_message());
    }

    #[test]
    fn serde_roundtrip_preserves_descriptor() {
        let opts = ResizeOptions::default()
            .with_mode(ResizeMode::Crop)
            .with_offset(3, 4);
        let d = Descriptor::new("dir/a.gif", 9, 0, 50, opts).unwrap().into_crop();
        let back: Descriptor = serde_json::from_str(&d.canonical_message()).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn for_file_reads_mtime_and_rejects_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pic.png");
        std::fs::write(&path, b"x").unwrap();

        let d = Descriptor::for_file(&path, 10, 0, ResizeOptions::default()).unwrap();
        assert!(d.source_mtime() > 0);
        assert_eq!(d.source_stem(), "pic");

        let err = Descriptor::for_file(dir.path().join("nope.png"), 1, 1, ResizeOptions::default())
            .unwrap_err();
        assert!(matches!(err, ResizeError::SourceNotFound(_)));
    }
}
