//! # Config Cache
//!
//! Keeps pending [`Descriptor`]s in the transient store between the moment a
//! signed URL is handed out and the first fetch of that URL.
//!
//! Entries live under [`CACHE_PREFIX`] + identifier. Loading does not delete;
//! the deferred handler calls [`ConfigCache::consume`] explicitly once the
//! descriptor has been reconstructed.

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::store::TransientStore;
use crate::error::resize::ResizeError;
use crate::resize::descriptor::Descriptor;
use crate::resize::resolver::VariantResolver;

/// Namespace of every key written by this cache.
pub const CACHE_PREFIX: &str = "orgnk_imageresize_";

/// Value stored per identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedConfig {
    pub descriptor: Descriptor,
    /// Failed materialization attempts so far.
    #[serde(default)]
    pub failures: u32,
}

impl CachedConfig {
    pub fn new(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            failures: 0,
        }
    }
}

#[derive(Clone)]
pub struct ConfigCache {
    store: Arc<dyn TransientStore>,
    resolver: VariantResolver,
    ttl: Duration,
}

impl ConfigCache {
    pub fn new(store: Arc<dyn TransientStore>, resolver: VariantResolver, ttl: Duration) -> Self {
        Self {
            store,
            resolver,
            ttl,
        }
    }

    pub fn key(identifier: &str) -> String {
        format!("{CACHE_PREFIX}{identifier}")
    }

    /// Stores `descriptor` unless its variant is already materialized.
    ///
    /// Returns the identifier and whether anything was written.
    pub fn store(&self, descriptor: &Descriptor) -> Result<(String, bool), ResizeError> {
        let identifier = self.resolver.url_identifier(descriptor);
        if self.resolver.is_materialized(descriptor) {
            return Ok((identifier, false));
        }
        self.put(&identifier, &CachedConfig::new(descriptor.clone()))?;
        debug!(%identifier, "stored resize config");
        Ok((identifier, true))
    }

    /// Writes an entry as-is. Used to re-store after a failed attempt.
    pub fn put(&self, identifier: &str, entry: &CachedConfig) -> Result<(), ResizeError> {
        let value = serde_json::to_string(entry).map_err(|e| ResizeError::Cache(e.into()))?;
        self.store
            .set(&Self::key(identifier), &value, Some(self.ttl))
            .map_err(ResizeError::Cache)
    }

    /// Reads an entry. Absent or expired entries are [`ResizeError::ConfigNotFound`].
    pub fn load(&self, identifier: &str) -> Result<CachedConfig, ResizeError> {
        let raw = self
            .store
            .get(&Self::key(identifier))
            .map_err(ResizeError::Cache)?
            .ok_or(ResizeError::ConfigNotFound)?;
        serde_json::from_str(&raw).map_err(|e| ResizeError::Cache(e.into()))
    }

    pub fn consume(&self, identifier: &str) -> Result<(), ResizeError> {
        self.store
            .delete(&Self::key(identifier))
            .map_err(ResizeError::Cache)?;
        debug!(%identifier, "consumed resize config");
        Ok(())
    }
}
