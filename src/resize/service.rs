//! # Image Resizer
//!
//! The entry point templates and other callers use to reference a resized
//! image. Nothing is resized here: if the variant exists its public URL is
//! returned, otherwise the request is cached and a signed URL to the
//! deferred endpoint comes back instead.

use tracing::debug;

use crate::error::resize::ResizeError;
use crate::resize::config_cache::ConfigCache;
use crate::resize::descriptor::{Descriptor, ResizeOptions};
use crate::resize::executor::ResizeExecutor;
use crate::resize::signer::encode_message;
use crate::resize::sizes::SizeRegistry;
use crate::resize::source::{ImageSource, SourceResolver};

#[derive(Clone)]
pub struct ImageResizer {
    sources: SourceResolver,
    sizes: SizeRegistry,
    cache: ConfigCache,
    executor: ResizeExecutor,
    /// `{site_url}/{route_prefix}`, without trailing slash.
    route_base: String,
    default_quality: u8,
}

impl ImageResizer {
    pub fn new(
        sources: SourceResolver,
        sizes: SizeRegistry,
        cache: ConfigCache,
        executor: ResizeExecutor,
        site_url: &str,
        route_prefix: &str,
        default_quality: u8,
    ) -> Self {
        Self {
            sources,
            sizes,
            cache,
            executor,
            route_base: format!(
                "{}/{}",
                site_url.trim_end_matches('/'),
                route_prefix.trim_matches('/')
            ),
            default_quality: default_quality.min(100),
        }
    }

    /// Default options carrying the configured quality.
    pub fn default_options(&self) -> ResizeOptions {
        ResizeOptions::default().with_quality(self.default_quality)
    }

    pub fn sizes(&self) -> &SizeRegistry {
        &self.sizes
    }

    /// Builds the descriptor for a source, reading its modification time.
    pub fn descriptor(
        &self,
        source: &ImageSource,
        width: u32,
        height: u32,
        options: ResizeOptions,
    ) -> Result<Descriptor, ResizeError> {
        let path = self.sources.resolve(source)?;
        Descriptor::for_file(path, width, height, options)
    }

    /// URL of a resized variant: canonical if materialized, signed otherwise.
    pub fn url(
        &self,
        source: &ImageSource,
        width: u32,
        height: u32,
        options: ResizeOptions,
    ) -> Result<String, ResizeError> {
        let d = self.descriptor(source, width, height, options)?;
        self.url_for(&d)
    }

    /// Like [`Self::url`], materialized with a fixed-offset crop.
    pub fn crop_url(
        &self,
        source: &ImageSource,
        width: u32,
        height: u32,
        options: ResizeOptions,
    ) -> Result<String, ResizeError> {
        let d = self.descriptor(source, width, height, options)?.into_crop();
        self.url_for(&d)
    }

    /// URL of a registered size.
    pub fn size_url(&self, source: &ImageSource, size: &str) -> Result<String, ResizeError> {
        let d = self.size_descriptor(source, size)?;
        self.url_for(&d)
    }

    pub fn size_descriptor(&self, source: &ImageSource, size: &str) -> Result<Descriptor, ResizeError> {
        let (spec, options) = self.sizes.resolve(size)?;
        let d = self.descriptor(source, spec.width, spec.height, options)?;
        Ok(if spec.crop { d.into_crop() } else { d })
    }

    pub fn url_for(&self, d: &Descriptor) -> Result<String, ResizeError> {
        let resolver = self.executor.resolver();
        if resolver.is_materialized(d) {
            return Ok(resolver.canonical_url(d));
        }
        let (identifier, _) = self.cache.store(d)?;
        debug!(%identifier, source = ?d.source_path(), "deferred resize url issued");
        Ok(self.signed_url(&identifier, &resolver.canonical_url(d)))
    }

    /// `{site}/{prefix}/{identifier}/{encoded canonical url}`.
    pub fn signed_url(&self, identifier: &str, canonical_url: &str) -> String {
        format!(
            "{}/{}/{}",
            self.route_base,
            identifier,
            encode_message(canonical_url)
        )
    }

    /// Resizes synchronously and returns the canonical URL.
    pub fn materialize_now(&self, d: &Descriptor) -> Result<String, ResizeError> {
        self.executor.execute(d)?;
        Ok(self.executor.resolver().canonical_url(d))
    }
}
