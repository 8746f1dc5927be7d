//! # Raster Engine Abstractions
//!
//! The pixel pipeline the resize core drives:
//! `open(path) → resize(w, h, options) → crop(x, y, w, h) → save(path, options)`.
//!
//! This module provides:
//! - [`RasterEngine`]: opens an image file into a mutable handle.
//! - [`RasterImage`]: the handle; transforms in place and saves.
//!
//! Backends (e.g. `image-rs`, libvips bindings) plug in behind these traits so
//! the core never depends on a particular pixel library.
//!
//! # Example
//! ```rust
//! use std::path::Path;
//! use anyhow::Result;
//! use orgnk_imageresize::image::processor::{RasterEngine, RasterImage};
//! use orgnk_imageresize::resize::descriptor::ResizeOptions;
//!
//! struct Noop(u32, u32);
//!
//! impl RasterImage for Noop {
//!     fn dimensions(&self) -> (u32, u32) { (self.0, self.1) }
//!     fn resize(&mut self, w: u32, h: u32, _o: &ResizeOptions) -> Result<()> { self.0 = w; self.1 = h; Ok(()) }
//!     fn crop(&mut self, _x: u32, _y: u32, w: u32, h: u32) -> Result<()> { self.0 = w; self.1 = h; Ok(()) }
//!     fn save(&self, _path: &Path, _o: &ResizeOptions) -> Result<()> { Ok(()) }
//! }
//!
//! struct NoopEngine;
//! impl RasterEngine for NoopEngine {
//!     fn open(&self, _path: &Path) -> Result<Box<dyn RasterImage>> { Ok(Box::new(Noop(10, 10))) }
//! }
//!
//! let mut img = NoopEngine.open(Path::new("x.png")).unwrap();
//! img.resize(4, 2, &ResizeOptions::default()).unwrap();
//! assert_eq!(img.dimensions(), (4, 2));
//! ```

use std::path::Path;

use anyhow::Result;

use crate::resize::descriptor::ResizeOptions;

/// Opens image files into transformable handles.
pub trait RasterEngine: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn RasterImage>>;
}

/// An opened image.
///
/// Width/height of `0` passed to [`RasterImage::resize`] mean "derive from
/// the aspect ratio", never zero pixels.
pub trait RasterImage {
    fn dimensions(&self) -> (u32, u32);

    /// Resizes according to `options.mode` (`auto` fits, `crop` fills).
    fn resize(&mut self, width: u32, height: u32, options: &ResizeOptions) -> Result<()>;

    /// Cuts the `width`×`height` box whose top-left corner is `(x, y)`.
    fn crop(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<()>;

    /// Encodes to `path` using `options.extension` / `quality`.
    fn save(&self, path: &Path, options: &ResizeOptions) -> Result<()>;
}
