use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fieldcheck::metrics::{MetricsService, SysinfoSampler};
use fieldcheck::{Config, FieldcheckState, fieldcheck_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        data_url = %cfg.data_url,
        listen_addr = %cfg.listen_addr,
        loglevel = %cfg.loglevel,
        service_role = cfg.service_role_key.is_some(),
        metrics_ttl_secs = cfg.metrics_ttl_secs,
        default_organization_id = %cfg.default_organization_id,
    );
    if cfg.service_role_key.is_none() {
        warn!("no service_role_key configured; admin routes will answer 403");
    }
    if cfg.insecure_cookie {
        warn!("session cookies are issued without the Secure flag");
    }

    let metrics = MetricsService::new(
        cfg.metrics_ttl(),
        Arc::new(mockable::DefaultClock),
        Arc::new(SysinfoSampler::new()),
    );

    let addr = cfg.listen_addr.clone();
    let state = FieldcheckState::new(cfg, metrics)?;
    let app = fieldcheck_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}
