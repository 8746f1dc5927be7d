//! # Transient Store Abstraction
//!
//! The ephemeral key-value store the host provides (object cache, Redis,
//! in-process map...). Values are opaque strings and may disappear at any
//! time after their TTL.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use orgnk_imageresize::cache::memory_store::MemoryTransientStore;
//! use orgnk_imageresize::cache::store::TransientStore;
//!
//! let store = MemoryTransientStore::default();
//! store.set("k", "v", Some(Duration::from_secs(60))).unwrap();
//! assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
//! store.delete("k").unwrap();
//! assert!(store.get("k").unwrap().is_none());
//! ```

use std::time::Duration;

use anyhow::Result;

/// A generic ephemeral key-value store.
///
/// Implementors decide how expiry is enforced; `ttl: None` means "until
/// evicted".
pub trait TransientStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}
