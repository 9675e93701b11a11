use std::sync::Arc;

use anyhow::Result;
use clap::arg;
use clap::command;
use clap::Parser;
use price_loadgen::auth::oauth2::ClientCredentials;
use price_loadgen::cache::token_refresher::{RefreshSchedule, TokenRefresher};
use price_loadgen::data::catalog::Catalog;
use price_loadgen::load::runner::LoadRunner;
use price_loadgen::probe::endpoint::HttpPriceEndpoint;
use price_loadgen::probe::price_probe::{PriceProbe, ProbeSettings, ProbeVariant};
use price_loadgen::server;
use price_loadgen::utils::config_loader;
use price_loadgen::utils::logging;
use price_loadgen::utils::logging::LogLevel;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "price-loadgen.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level.to_owned()).await?;

    // -------------------------------
    // 2. Resolve credentials and data
    // -------------------------------

    let token_source = ClientCredentials::from_config(&service_config.auth)?;
    let block_size = service_config.probes.sku_block.block_size;
    let catalog = Arc::new(Catalog::from_config(&service_config.data, block_size)?);
    let endpoint = Arc::new(HttpPriceEndpoint::from_config(&service_config.target)?);

    // -------------------------------
    // 3. Start token refresher (eager, first fetch runs in background)
    // -------------------------------

    let schedule = RefreshSchedule::from_seconds(service_config.auth.refresh_interval_seconds);
    let refresher = Arc::new(TokenRefresher::start(token_source, schedule));

    // -------------------------------
    // 4. Register probes
    // -------------------------------

    let probes = Arc::new(vec![
        PriceProbe::new(
            ProbeVariant::FullSkus,
            ProbeSettings::from_config(&service_config, service_config.probes.full_skus.enabled)?,
            refresher.clone(),
            endpoint.clone(),
            catalog.clone(),
        ),
        PriceProbe::new(
            ProbeVariant::SkuBlock { block_size },
            ProbeSettings::from_config(&service_config, service_config.probes.sku_block.enabled)?,
            refresher.clone(),
            endpoint.clone(),
            catalog.clone(),
        ),
    ]);

    // -------------------------------
    // 5. Metrics server + shutdown signal
    // -------------------------------

    let (stop_tx, stop_rx) = watch::channel(false);
    let settings = service_config.settings.clone();
    let http_server = tokio::spawn({
        let stop_rx = stop_rx.clone();
        async move { server::server::start(&settings, stop_rx).await }
    });

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("ctrl-c received, stopping load"),
            Err(e) => warn!("failed to listen for ctrl-c: {}", e),
        }
        let _ = stop_tx.send(true);
    });

    // -------------------------------
    // 6. Run virtual users
    // -------------------------------

    info!("Load generator starting...");
    let runner = LoadRunner::from_config(&service_config.load);
    let summary = runner.run(probes, stop_rx).await;
    info!("load summary: {:?}", summary);

    refresher.shutdown().await;
    http_server.abort();
    Ok(())
}
