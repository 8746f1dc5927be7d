//! # Resize Executor
//!
//! Materializes a [`Descriptor`] at its canonical path.
//!
//! Every invocation stages the source into its own scratch file, runs the
//! raster engine on that file, and publishes it with a rename. The scratch
//! file is a [`NamedTempFile`]: it is removed when dropped, so every early
//! return and propagated error cleans it up, and a successful publish moves
//! it out of the way instead.
//!
//! Concurrent invocations for the same descriptor duplicate the raster work
//! but never corrupt each other: readers only ever see a complete file, and
//! the last rename wins.

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info};

use crate::error::resize::ResizeError;
use crate::image::processor::RasterEngine;
use crate::resize::descriptor::{Descriptor, Offset, Operation};
use crate::resize::resolver::VariantResolver;

const SCRATCH_PREFIX: &str = "orgnk-resize-";

/// What a call actually did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The canonical file already existed; nothing ran.
    AlreadyMaterialized,
    /// The raster engine ran and the result was published.
    Materialized,
}

#[derive(Clone)]
pub struct ResizeExecutor {
    resolver: VariantResolver,
    engine: Arc<dyn RasterEngine>,
    scratch_dir: PathBuf,
}

impl ResizeExecutor {
    pub fn new(
        resolver: VariantResolver,
        engine: Arc<dyn RasterEngine>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            resolver,
            engine,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn resolver(&self) -> &VariantResolver {
        &self.resolver
    }

    /// Proportional or forced resize per `options.mode`.
    pub fn resize(&self, d: &Descriptor) -> Result<Outcome, ResizeError> {
        self.materialize(d, Operation::Resize)
    }

    /// Fixed-offset crop of the target box.
    pub fn crop(&self, d: &Descriptor) -> Result<Outcome, ResizeError> {
        self.materialize(d, Operation::Crop)
    }

    /// Runs whichever operation the descriptor was built for.
    pub fn execute(&self, d: &Descriptor) -> Result<Outcome, ResizeError> {
        self.materialize(d, d.operation())
    }

    fn materialize(&self, d: &Descriptor, op: Operation) -> Result<Outcome, ResizeError> {
        if self.resolver.is_materialized(d) {
            debug!(source = ?d.source_path(), "variant already materialized");
            return Ok(Outcome::AlreadyMaterialized);
        }
        let target = self.resolver.canonical_path(d);

        let scratch = self.stage(d)?;
        self.transform(d, op, scratch.path())
            .map_err(ResizeError::ResizeFailed)?;

        let dir = self.resolver.resized_dir();
        fs::create_dir_all(dir).map_err(|source| ResizeError::DirectoryCreateFailed {
            path: dir.to_path_buf(),
            source,
        })?;

        publish(scratch, &target)?;
        info!(path = ?target, ?op, "materialized variant");
        Ok(Outcome::Materialized)
    }

    /// Copies the source into a scratch file private to this invocation.
    fn stage(&self, d: &Descriptor) -> Result<NamedTempFile, ResizeError> {
        let src = d.source_path();
        let mut reader = File::open(src).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ResizeError::SourceNotFound(src.to_path_buf()),
            _ => ResizeError::Io(e),
        })?;

        fs::create_dir_all(&self.scratch_dir)?;
        let mut scratch = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .suffix(&format!(".{}", d.extension()))
            .tempfile_in(&self.scratch_dir)?;
        io::copy(&mut reader, scratch.as_file_mut())?;
        debug!(scratch = ?scratch.path(), "staged source");
        Ok(scratch)
    }

    fn transform(&self, d: &Descriptor, op: Operation, path: &Path) -> anyhow::Result<()> {
        let opts = d.options();
        let mut img = self.engine.open(path)?;
        match op {
            Operation::Resize => img.resize(d.width(), d.height(), opts)?,
            Operation::Crop => {
                let (src_w, src_h) = img.dimensions();
                let Offset { x, y } = crop_origin(src_w, src_h, d.width(), d.height(), opts.offset);
                img.crop(x, y, d.width(), d.height())?;
            }
        }
        img.save(path, opts)
            .with_context(|| format!("save {path:?}"))
    }
}

/// Top-left corner of a fixed crop; centred when no offset is given.
pub fn crop_origin(src_w: u32, src_h: u32, width: u32, height: u32, offset: Option<Offset>) -> Offset {
    offset.unwrap_or(Offset {
        x: if width == 0 { 0 } else { src_w.saturating_sub(width) / 2 },
        y: if height == 0 { 0 } else { src_h.saturating_sub(height) / 2 },
    })
}

/// Renames the scratch file onto `target`.
///
/// Across filesystems, the bytes are first copied into a second temp file
/// next to `target` so the final step is still a rename.
fn publish(scratch: NamedTempFile, target: &Path) -> Result<(), ResizeError> {
    // Scratch files are created 0600.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        scratch
            .as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))?;
    }
    match scratch.persist(target) {
        Ok(_) => Ok(()),
        Err(err) if err.error.kind() == io::ErrorKind::CrossesDevices => {
            let dir = target.parent().unwrap_or_else(|| Path::new("."));
            let mut local = Builder::new()
                .prefix(&format!(".{SCRATCH_PREFIX}"))
                .tempfile_in(dir)?;
            io::copy(&mut err.file.reopen()?, local.as_file_mut())?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                local
                    .as_file()
                    .set_permissions(fs::Permissions::from_mode(0o644))?;
            }
            local.persist(target).map_err(|e| e.error)?;
            Ok(())
        }
        Err(err) => Err(err.error.into()),
    }
}
