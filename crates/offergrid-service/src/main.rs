use std::env;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use offergrid_core::prewarm::{PrewarmConfig, PrewarmScheduler};
use offergrid_core::{EngineBuilder, EngineConfig};
use offergrid_service::{api, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut builder = EngineBuilder::new().with_config(EngineConfig::from_env());
    // Mock vendors unless explicitly pointed at live feeds.
    if env::var("OFFERGRID_LIVE_VENDORS").is_ok_and(|value| value == "1") {
        builder = builder.with_real_clients();
        tracing::info!("using live vendor transports");
    } else {
        tracing::info!("using mock vendor transports");
    }
    let engine = Arc::new(builder.build());

    let scheduler = PrewarmScheduler::spawn(engine.clone(), PrewarmConfig::default());

    let app = api::router(AppState {
        engine: engine.clone(),
    });

    let bind = env::var("OFFERGRID_BIND").unwrap_or_else(|_| String::from("0.0.0.0:8000"));
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "offergrid service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;
    tracing::info!("offergrid service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to install ctrl-c handler");
    }
}
