//! # Deferred Request Handler
//!
//! Serves the first fetch of a signed resize URL:
//!
//! ```text
//! Dispatched → Validated → ConfigLoaded → Resized → Redirected
//!      │            │             │
//!      └─ invalid ──┘             ├─ ConfigNotFound (link expired)
//!         (404, no cache access)  └─ resize error (config re-stored, error raised)
//! ```
//!
//! The identifier is verified against the URL before the cache is touched,
//! so forged requests cost one HMAC and nothing else.
//!
//! The cached config is deleted only after the variant is published.
//! Concurrent fetches of one URL each run the resize and converge on the
//! same file; a worker killed mid-resize leaves the entry for the next fetch.

use tracing::{debug, info, warn};

use crate::error::resize::ResizeError;
use crate::resize::config_cache::{CachedConfig, ConfigCache};
use crate::resize::executor::ResizeExecutor;
use crate::resize::signer::IdentifierSigner;

#[derive(Clone)]
pub struct DeferredRequestHandler {
    signer: IdentifierSigner,
    cache: ConfigCache,
    executor: ResizeExecutor,
    max_failures: u32,
}

impl DeferredRequestHandler {
    /// `max_failures == 0` re-stores after every failure.
    pub fn new(
        signer: IdentifierSigner,
        cache: ConfigCache,
        executor: ResizeExecutor,
        max_failures: u32,
    ) -> Self {
        Self {
            signer,
            cache,
            executor,
            max_failures,
        }
    }

    /// Runs the state machine and returns the URL to redirect to.
    pub fn handle(&self, identifier: &str, encoded_target: &str) -> Result<String, ResizeError> {
        let target_url = self.signer.validate(identifier, encoded_target).inspect_err(|_| {
            debug!("rejected deferred resize request");
        })?;

        // Already served once: the file is on the static path now.
        if self.executor.resolver().is_url_materialized(&target_url) {
            debug!(%identifier, "variant already materialized, redirecting");
            return Ok(target_url);
        }

        let entry = self.cache.load(identifier).inspect_err(|e| {
            if matches!(e, ResizeError::ConfigNotFound) {
                info!(%identifier, "resize config missing or expired");
            }
        })?;

        if let Err(err) = self.executor.execute(&entry.descriptor) {
            warn!(%identifier, error = %err, "deferred resize failed");
            self.record_failure(identifier, entry);
            return Err(err);
        }

        if let Err(e) = self.cache.consume(identifier) {
            warn!(%identifier, error = %e, "could not drop resize config");
        }
        Ok(self.executor.resolver().canonical_url(&entry.descriptor))
    }

    fn record_failure(&self, identifier: &str, mut entry: CachedConfig) {
        entry.failures += 1;
        let result = if self.max_failures > 0 && entry.failures >= self.max_failures {
            warn!(%identifier, failures = entry.failures, "giving up on resize link");
            self.cache.consume(identifier)
        } else {
            self.cache.put(identifier, &entry)
        };
        if let Err(e) = result {
            warn!(%identifier, error = %e, "could not update resize config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory_store::MemoryTransientStore;
    use crate::cache::store::TransientStore;
    use crate::config::resize::ResizeConfig;
    use crate::config::signing::SigningConfig;
    use crate::image::image_rs_processor::ImageRsEngine;
    use crate::image::processor::{RasterEngine, RasterImage};
    use crate::resize::descriptor::{Descriptor, ResizeOptions};
    use crate::resize::resolver::VariantResolver;
    use crate::resize::signer::encode_message;
    use anyhow::bail;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use std::{
        path::{Path, PathBuf},
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    /// Counts every store access.
    struct CountingStore {
        inner: MemoryTransientStore,
        hits: AtomicUsize,
    }

    impl TransientStore for CountingStore {
        fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }
        fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value, ttl)
        }
        fn delete(&self, key: &str) -> anyhow::Result<()> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(key)
        }
    }

    /// Holds every open long enough for requests to overlap.
    struct SlowEngine;
    impl RasterEngine for SlowEngine {
        fn open(&self, path: &Path) -> anyhow::Result<Box<dyn RasterImage>> {
            std::thread::sleep(std::time::Duration::from_millis(300));
            ImageRsEngine::default().open(path)
        }
    }

    struct BrokenEngine;
    impl RasterEngine for BrokenEngine {
        fn open(&self, _path: &Path) -> anyhow::Result<Box<dyn RasterImage>> {
            bail!("engine unavailable")
        }
    }

    struct Setup {
        _dir: tempfile::TempDir,
        store: Arc<CountingStore>,
        cache: ConfigCache,
        resolver: VariantResolver,
        handler: DeferredRequestHandler,
        source: PathBuf,
    }

    fn setup(engine: Arc<dyn RasterEngine>, max_failures: u32) -> Setup {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.png");
        let img: ImageBuffer<Rgba<u8>, _> = ImageBuffer::from_fn(40, 20, |_, _| Rgba([1, 2, 3, 255]));
        img.save_with_format(&source, ImageFormat::Png).unwrap();

        let mut cfg = ResizeConfig::from_env_with(|_| None);
        cfg.content_base_url = "https://cdn.example.com".into();
        cfg.resized_dir = dir.path().join("resized-uploads");
        cfg.scratch_dir = dir.path().join("scratch");

        let signer = IdentifierSigner::new(&SigningConfig::from_secret("handler"));
        let resolver = VariantResolver::new(signer.clone(), &cfg);
        let store = Arc::new(CountingStore {
            inner: MemoryTransientStore::default(),
            hits: AtomicUsize::new(0),
        });
        let cache = ConfigCache::new(store.clone(), resolver.clone(), Duration::from_secs(60));
        let executor = ResizeExecutor::new(resolver.clone(), engine, &cfg.scratch_dir);
        let handler = DeferredRequestHandler::new(signer, cache.clone(), executor, max_failures);

        Setup {
            _dir: dir,
            store,
            cache,
            resolver,
            handler,
            source,
        }
    }

    fn descriptor(s: &Setup) -> Descriptor {
        Descriptor::for_file(&s.source, 20, 0, ResizeOptions::default()).unwrap()
    }

    #[test]
    fn first_fetch_materializes_and_redirects_then_repeats_still_redirect() {
        let s = setup(Arc::new(ImageRsEngine::default()), 3);
        let d = descriptor(&s);
        let (id, written) = s.cache.store(&d).unwrap();
        assert!(written);
        let url = s.resolver.canonical_url(&d);

        let redirect = s.handler.handle(&id, &encode_message(&url)).unwrap();
        assert_eq!(redirect, url);
        assert!(s.resolver.is_materialized(&d));
        assert!(matches!(s.cache.load(&id), Err(ResizeError::ConfigNotFound)));

        // config is gone, but the file is there
        assert_eq!(s.handler.handle(&id, &encode_message(&url)).unwrap(), url);
    }

    #[test]
    fn overlapping_fetches_of_one_url_both_redirect() {
        let s = setup(Arc::new(SlowEngine), 3);
        let d = descriptor(&s);
        let (id, _) = s.cache.store(&d).unwrap();
        let url = s.resolver.canonical_url(&d);
        let enc = encode_message(&url);

        let (first, second) = std::thread::scope(|scope| {
            let first = scope.spawn(|| s.handler.handle(&id, &enc));
            std::thread::sleep(std::time::Duration::from_millis(100));
            let second = s.handler.handle(&id, &enc);
            (first.join().unwrap(), second)
        });

        assert_eq!(first.unwrap(), url);
        assert_eq!(second.unwrap(), url);
        assert!(s.resolver.is_materialized(&d));
        assert!(matches!(s.cache.load(&id), Err(ResizeError::ConfigNotFound)));
    }

    #[test]
    fn config_survives_until_resize_succeeds() {
        let s = setup(Arc::new(BrokenEngine), 0);
        let d = descriptor(&s);
        let (id, _) = s.cache.store(&d).unwrap();
        let enc = encode_message(&s.resolver.canonical_url(&d));

        assert!(s.handler.handle(&id, &enc).is_err());
        // a fresh handler with a working engine picks the same entry up
        let executor = ResizeExecutor::new(
            s.resolver.clone(),
            Arc::new(ImageRsEngine::default()),
            s.source.parent().unwrap().join("scratch"),
        );
        let retry = DeferredRequestHandler::new(
            s.resolver.signer().clone(),
            s.cache.clone(),
            executor,
            0,
        );
        assert_eq!(retry.handle(&id, &enc).unwrap(), s.resolver.canonical_url(&d));
        assert!(matches!(s.cache.load(&id), Err(ResizeError::ConfigNotFound)));
    }

    #[test]
    fn tampered_identifier_is_rejected_without_cache_access() {
        let s = setup(Arc::new(ImageRsEngine::default()), 3);
        let d = descriptor(&s);
        let (id, _) = s.cache.store(&d).unwrap();
        let url = s.resolver.canonical_url(&d);
        let before = s.store.hits.load(Ordering::SeqCst);

        let mut tampered = id.clone().into_bytes();
        tampered[0] = if tampered[0] == b'a' { b'b' } else { b'a' };
        let tampered = String::from_utf8(tampered).unwrap();

        let err = s.handler.handle(&tampered, &encode_message(&url)).unwrap_err();
        assert!(matches!(err, ResizeError::InvalidSignature));
        assert_eq!(s.store.hits.load(Ordering::SeqCst), before);
        assert!(!s.resolver.is_materialized(&d));
    }

    #[test]
    fn expired_config_is_config_not_found() {
        let s = setup(Arc::new(ImageRsEngine::default()), 3);
        let d = descriptor(&s);
        let (id, _) = s.cache.store(&d).unwrap();
        s.cache.consume(&id).unwrap();

        let url = s.resolver.canonical_url(&d);
        let err = s.handler.handle(&id, &encode_message(&url)).unwrap_err();
        assert!(matches!(err, ResizeError::ConfigNotFound));
    }

    #[test]
    fn failed_resize_restores_config_for_retry() {
        let s = setup(Arc::new(BrokenEngine), 3);
        let d = descriptor(&s);
        let (id, _) = s.cache.store(&d).unwrap();
        let url = s.resolver.canonical_url(&d);

        let err = s.handler.handle(&id, &encode_message(&url)).unwrap_err();
        assert!(matches!(err, ResizeError::ResizeFailed(_)));

        let entry = s.cache.load(&id).unwrap();
        assert_eq!(entry.descriptor, d);
        assert_eq!(entry.failures, 1);
    }

    #[test]
    fn link_is_dropped_after_max_failures() {
        let s = setup(Arc::new(BrokenEngine), 2);
        let d = descriptor(&s);
        let (id, _) = s.cache.store(&d).unwrap();
        let enc = encode_message(&s.resolver.canonical_url(&d));

        assert!(matches!(s.handler.handle(&id, &enc), Err(ResizeError::ResizeFailed(_))));
        assert!(matches!(s.handler.handle(&id, &enc), Err(ResizeError::ResizeFailed(_))));
        assert!(matches!(s.handler.handle(&id, &enc), Err(ResizeError::ConfigNotFound)));
    }

    #[test]
    fn zero_max_failures_keeps_retrying() {
        let s = setup(Arc::new(BrokenEngine), 0);
        let d = descriptor(&s);
        let (id, _) = s.cache.store(&d).unwrap();
        let enc = encode_message(&s.resolver.canonical_url(&d));

        for _ in 0..5 {
            assert!(matches!(s.handler.handle(&id, &enc), Err(ResizeError::ResizeFailed(_))));
        }
        assert_eq!(s.cache.load(&id).unwrap().failures, 5);
    }
}
