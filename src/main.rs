use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orgnk_imageresize::{
    cache::memory_store::MemoryTransientStore,
    config::app::AppConfig,
    image::image_rs_processor::ImageRsEngine,
    resize::{services::ResizeServices, source::SourceResolver},
    web::routes::router,
};

const PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = AppConfig::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("orgnk-imageresize v{}", env!("CARGO_PKG_VERSION"));
    if cfg.signing.is_ephemeral() {
        tracing::warn!("IMAGERESIZE_SECRET not set; signed URLs will not survive a restart");
    }

    let store = Arc::new(MemoryTransientStore::default());
    let services = ResizeServices::build(
        &cfg,
        SourceResolver::new(&cfg.upload),
        store.clone(),
        Arc::new(ImageRsEngine::default()),
    );

    tokio::spawn(async move {
        let mut tick = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tick.tick().await;
            match store.purge_expired() {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "expired resize configs purged"),
                Err(e) => tracing::warn!(error = %e, "purging resize configs failed"),
            }
        }
    });

    let app = router(services.handler, &cfg.resize, &cfg.http);
    let listener = tokio::net::TcpListener::bind(&cfg.http.bind)
        .await
        .with_context(|| format!("failed to bind {}", cfg.http.bind))?;
    tracing::info!(bind = %cfg.http.bind, prefix = %cfg.resize.route_prefix, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
