use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use http::{HeaderMap, StatusCode};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::service::TargetConfig;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;

static ERROR_MSG: &'static str = "error";

/// One POST issued on behalf of a probe.
#[derive(Debug, Clone)]
pub struct PriceRequest {
    pub path: String,
    pub body: Value,
    pub headers: HeaderMap,
    /// label used only for aggregation / reporting
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct EndpointReply {
    pub status: StatusCode,
    pub body: String,
}

/// Issues price requests. Errors are transport failures; any HTTP status is a reply.
pub trait PriceEndpoint: Send + Sync + 'static {
    fn post(&self, request: PriceRequest) -> impl Future<Output = Result<EndpointReply>> + Send;
}

/// `reqwest`-backed endpoint that aggregates per request name.
#[derive(Debug, Clone)]
pub struct HttpPriceEndpoint {
    host: String,
    client: Client,
}

impl HttpPriceEndpoint {
    pub fn new(host: String, client: Client) -> Self {
        Self { host, client }
    }

    pub fn from_config(cfg: &TargetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .context("failed to build price endpoint HTTP client")?;
        Ok(Self::new(cfg.host.to_owned(), client))
    }
}

impl PriceEndpoint for HttpPriceEndpoint {
    async fn post(&self, request: PriceRequest) -> Result<EndpointReply> {
        let metrics = get_metrics().await;
        let url = format!("{}{}", self.host, request.path);
        let start = get_instant();

        let result = async {
            let response = self
                .client
                .post(&url)
                .headers(request.headers)
                .json(&request.body)
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(EndpointReply { status, body })
        }
        .await;

        metrics.probe_duration.with_label_values(&[request.name.as_str()]).observe(start.elapsed().as_secs_f64());
        match &result {
            Ok(reply) => {
                debug!("{} -> {}", request.name, reply.status);
                metrics.probe_requests.with_label_values(&[request.name.as_str(), reply.status.as_str()]).inc();
            }
            Err(_) => {
                metrics.probe_requests.with_label_values(&[request.name.as_str(), ERROR_MSG]).inc();
            }
        }

        result.with_context(|| format!("POST {} failed", url))
    }
}
