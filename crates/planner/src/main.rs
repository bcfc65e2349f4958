use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planner::config::PlannerConfig;
use planner::server::create_router;
use planner::types::AppState;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PlannerConfig::load().context("failed to load configuration")?;
    let address = config.bind_address();
    let state = Arc::new(AppState::new(config).context("failed to build app state")?);

    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = cleanup_state.sessions.cleanup_expired();
            if removed > 0 {
                info!(removed, "Removed expired planning sessions");
            }

            let evicted = cleanup_state.rating_client.cleanup_expired();
            if evicted > 0 {
                info!(evicted, "Evicted stale professor ratings");
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {}", address))?;
    info!("Listening on {}", address);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    info!("Server stopped");
    Ok(())
}
