//! # Raster Engine Implementation (image-rs)
//!
//! Provides a [`RasterEngine`] implementation using the [`image`] crate.
//!
//! Reads anything `image` can decode and writes **JPEG**, **PNG**, **GIF**
//! and **WebP**.
//!
//! # Resize semantics
//! - `auto`: proportional fit inside the box, never upscaling; a `0`
//!   dimension is derived from the aspect ratio.
//! - `crop`: fills the exact box and trims the centred overflow; falls back
//!   to `auto` when either dimension is `0`.
//! - `sharpen > 0` applies an unsharp mask after scaling.
//!
//! `interlace` is not supported by the encoders used here and is ignored.
//!
//! # Example
//! ```rust,no_run
//! use std::path::Path;
//! use orgnk_imageresize::image::image_rs_processor::ImageRsEngine;
//! use orgnk_imageresize::image::processor::RasterEngine;
//! use orgnk_imageresize::resize::descriptor::ResizeOptions;
//!
//! let engine = ImageRsEngine::default();
//! let mut img = engine.open(Path::new("input.png")).unwrap();
//! img.resize(800, 0, &ResizeOptions::default()).unwrap();
//! img.save(Path::new("resized.png"), &ResizeOptions::default()).unwrap();
//! ```

use std::{
    fs::File,
    io::BufWriter,
    path::Path,
};

use anyhow::{bail, Context, Result};
use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, GenericImageView, ImageFormat,
    ImageReader,
};

use super::processor::{RasterEngine, RasterImage};
use crate::resize::descriptor::{Extension, ResizeMode, ResizeOptions};

/// A [`RasterEngine`] backed by the `image` crate.
#[derive(Clone, Copy, Debug)]
pub struct ImageRsEngine {
    filter: FilterType,
}

impl Default for ImageRsEngine {
    /// Uses [`FilterType::Triangle`] for quality-speed balance.
    fn default() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }
}

impl ImageRsEngine {
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl RasterEngine for ImageRsEngine {
    fn open(&self, path: &Path) -> Result<Box<dyn RasterImage>> {
        let img = ImageReader::open(path)
            .with_context(|| format!("open {path:?}"))?
            .with_guessed_format()
            .context("guess format")?
            .decode()
            .with_context(|| format!("decode {path:?}"))?;
        Ok(Box::new(ImageRsImage {
            img,
            filter: self.filter,
        }))
    }
}

struct ImageRsImage {
    img: DynamicImage,
    filter: FilterType,
}

impl RasterImage for ImageRsImage {
    fn dimensions(&self) -> (u32, u32) {
        self.img.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32, options: &ResizeOptions) -> Result<()> {
        let (src_w, src_h) = self.img.dimensions();

        let resized = if options.mode == ResizeMode::Crop && width > 0 && height > 0 {
            self.img.resize_to_fill(width, height, self.filter)
        } else {
            let (w, h) = fit_dimensions(src_w, src_h, width, height);
            if (w, h) == (src_w, src_h) {
                self.img.clone()
            } else {
                self.img.resize_exact(w, h, self.filter)
            }
        };

        self.img = if options.sharpen > 0 {
            resized.unsharpen(sharpen_sigma(options.sharpen), 0)
        } else {
            resized
        };
        Ok(())
    }

    fn crop(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<()> {
        let (src_w, src_h) = self.img.dimensions();
        let Some((w, h)) = crop_extent(src_w, src_h, x, y, width, height) else {
            bail!("crop origin ({x}, {y}) outside {src_w}x{src_h} image");
        };
        self.img = self.img.crop_imm(x, y, w, h);
        Ok(())
    }

    fn save(&self, path: &Path, options: &ResizeOptions) -> Result<()> {
        let ext = match options.extension {
            Some(ext) => ext,
            None => Extension::from_path(path)
                .with_context(|| format!("no output format for {path:?}"))?,
        };

        let file = File::create(path).with_context(|| format!("create {path:?}"))?;
        let mut out = BufWriter::new(file);

        match ext {
            Extension::Jpg => {
                let rgb = DynamicImage::ImageRgb8(self.img.to_rgb8());
                let enc = JpegEncoder::new_with_quality(&mut out, options.quality.clamp(1, 100));
                rgb.write_with_encoder(enc).context("encode jpeg")?;
            }
            Extension::Png => {
                self.img
                    .write_to(&mut out, ImageFormat::Png)
                    .context("encode png")?;
            }
            Extension::Gif => {
                DynamicImage::ImageRgba8(self.img.to_rgba8())
                    .write_to(&mut out, ImageFormat::Gif)
                    .context("encode gif")?;
            }
            Extension::Webp => {
                DynamicImage::ImageRgba8(self.img.to_rgba8())
                    .write_to(&mut out, ImageFormat::WebP)
                    .context("encode webp")?;
            }
        }

        std::io::Write::flush(&mut out).with_context(|| format!("flush {path:?}"))?;
        Ok(())
    }
}

/// Proportional fit of `src` inside `max`, never upscaling.
///
/// A `0` bound is unconstrained; both `0` keeps the source size.
pub fn fit_dimensions(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (src_w, src_h);
    }
    let sx = if max_w == 0 { f64::INFINITY } else { max_w as f64 / src_w as f64 };
    let sy = if max_h == 0 { f64::INFINITY } else { max_h as f64 / src_h as f64 };
    let scale = sx.min(sy).min(1.0);
    if !scale.is_finite() {
        return (src_w, src_h);
    }
    (
        ((src_w as f64 * scale).round() as u32).max(1),
        ((src_h as f64 * scale).round() as u32).max(1),
    )
}

/// Size of a crop box at `(x, y)`, clamped to the image.
///
/// A `0` dimension takes the remaining extent. `None` if the origin lies outside.
pub fn crop_extent(
    src_w: u32,
    src_h: u32,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Option<(u32, u32)> {
    if x >= src_w || y >= src_h {
        return None;
    }
    let room_w = src_w - x;
    let room_h = src_h - y;
    let w = if width == 0 { room_w } else { width.min(room_w) };
    let h = if height == 0 { room_h } else { height.min(room_h) };
    Some((w, h))
}

fn sharpen_sigma(sharpen: u32) -> f32 {
    0.5 + sharpen.min(100) as f32 / 20.0
}
