//! Wires the pipeline pieces from an [`AppConfig`].
//!
//! Both halves share one signer, one config cache and one executor, so a
//! URL issued by [`ImageResizer`] is always accepted by
//! [`DeferredRequestHandler`] in the same process (or any process with the
//! same secret and store).

use std::sync::Arc;

use crate::cache::store::TransientStore;
use crate::config::app::AppConfig;
use crate::image::processor::RasterEngine;
use crate::resize::{
    config_cache::ConfigCache, executor::ResizeExecutor, handler::DeferredRequestHandler,
    resolver::VariantResolver, service::ImageResizer, signer::IdentifierSigner,
    source::SourceResolver,
};

#[derive(Clone)]
pub struct ResizeServices {
    pub resizer: Arc<ImageResizer>,
    pub handler: Arc<DeferredRequestHandler>,
}

impl ResizeServices {
    pub fn build(
        cfg: &AppConfig,
        sources: SourceResolver,
        store: Arc<dyn TransientStore>,
        engine: Arc<dyn RasterEngine>,
    ) -> Self {
        let signer = IdentifierSigner::new(&cfg.signing);
        let resolver = VariantResolver::new(signer.clone(), &cfg.resize);
        let cache = ConfigCache::new(store, resolver.clone(), cfg.resize.cache_ttl);
        let executor = ResizeExecutor::new(resolver, engine, &cfg.resize.scratch_dir);

        let handler = DeferredRequestHandler::new(
            signer,
            cache.clone(),
            executor.clone(),
            cfg.resize.max_failures,
        );
        let resizer = ImageResizer::new(
            sources,
            cfg.sizes.clone(),
            cache,
            executor,
            &cfg.resize.site_url,
            &cfg.resize.route_prefix,
            cfg.resize.default_quality,
        );

        Self {
            resizer: Arc::new(resizer),
            handler: Arc::new(handler),
        }
    }
}
