use anyhow::{Context, Result};
use axum::Router;
use tokio::sync::watch;
use tracing::info;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
}

impl AppState {
    pub fn new(metrics: &Metrics) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
        }
    }
}

pub fn router(settings_config: &SettingsConfig, state: AppState) -> Router {
    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .with_state(state)
}

/// Start the Axum server exposing the metrics route, until `shutdown` flips to true.
pub async fn start(
    settings_config: &SettingsConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let metrics = get_metrics().await;
    metrics.up.set(1);

    if !settings_config.metrics.is_enabled {
        return Ok(());
    }

    let app = router(settings_config, AppState::new(metrics));
    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind metrics server on {}", bind_addr))?;
    info!("metrics served on http://{}{}", bind_addr, settings_config.metrics.path);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    Ok(())
}
