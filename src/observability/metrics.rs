use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token refresher metrics
    pub token_refresh_total: IntCounterVec,
    pub token_refresh_duration: HistogramVec,
    pub token_issued_at_unix: IntGauge,

    // Probe metrics
    pub probe_requests: IntCounterVec,
    pub probe_duration: HistogramVec,
    pub probe_observations: IntCounterVec,
    pub probe_skipped: IntCounterVec,

    // Load metrics
    pub active_users: IntGauge,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("priceloadgen".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Token refresher
            token_refresh_total: IntCounterVec::new(Opts::new("token_refresh_total", "Token refresh cycles by result"),&["result"],).unwrap(),
            token_refresh_duration: HistogramVec::new(HistogramOpts::new("token_refresh_duration_seconds", "Token fetch duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),&["result"],).unwrap(),
            token_issued_at_unix: IntGauge::new("token_issued_at_unix_seconds", "UNIX time of the last successful token refresh").unwrap(),

            // Probe
            probe_requests: IntCounterVec::new(Opts::new("probe_requests_total", "Price requests by request name and status"),&["request", "status"],).unwrap(),
            probe_duration: HistogramVec::new(HistogramOpts::new("probe_request_duration_seconds", "Price request duration seconds").buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]),&["request"],).unwrap(),
            probe_observations: IntCounterVec::new(Opts::new("probe_observations_total", "Observations by request name and classification"),&["request", "classification"],).unwrap(),
            probe_skipped: IntCounterVec::new(Opts::new("probe_skipped_total", "Probe invocations skipped by reason"),&["request", "reason"],).unwrap(),

            // Load
            active_users: IntGauge::new("active_users", "Running virtual users").unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_refresh_total.clone())).unwrap();
        reg.register(Box::new(metrics.token_refresh_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_issued_at_unix.clone())).unwrap();
        reg.register(Box::new(metrics.probe_requests.clone())).unwrap();
        reg.register(Box::new(metrics.probe_duration.clone())).unwrap();
        reg.register(Box::new(metrics.probe_observations.clone())).unwrap();
        reg.register(Box::new(metrics.probe_skipped.clone())).unwrap();
        reg.register(Box::new(metrics.active_users.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
