use std::sync::Arc;

use anyhow::{anyhow, Result};
use http::header::AUTHORIZATION;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use rand::Rng;
use tracing::{debug, error, warn};

use crate::cache::token_refresher::TokenRefresher;
use crate::config::service::{PriceFilters, ServiceConfig};
use crate::data::catalog::Catalog;
use crate::helpers::time::{get_instant, seconds_since};
use crate::observability::metrics::get_metrics;
use crate::probe::classification::{classify, is_empty_price_payload};
use crate::probe::endpoint::{PriceEndpoint, PriceRequest};
use crate::probe::observation::Observation;
use crate::probe::query::price_query;
use crate::utils::constants::{REQUEST_NAME_FULL_SKUS, REQUEST_NAME_SKU_BLOCK_PREFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeVariant {
    /// every known SKU in one request
    FullSkus,
    /// one random pre-chunked block of SKUs
    SkuBlock { block_size: usize },
}

impl ProbeVariant {
    pub fn request_name(&self) -> String {
        match self {
            ProbeVariant::FullSkus => REQUEST_NAME_FULL_SKUS.to_owned(),
            ProbeVariant::SkuBlock { block_size } => {
                format!("{} {} SKUs", REQUEST_NAME_SKU_BLOCK_PREFIX, block_size)
            }
        }
    }
}

/// Read-only per-variant settings, fixed at startup.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub enabled: bool,
    pub alert_threshold_seconds: f64,
    pub path: String,
    pub headers: HeaderMap,
    pub filters: PriceFilters,
}

impl ProbeSettings {
    pub fn from_config(cfg: &ServiceConfig, enabled: bool) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in &cfg.target.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| anyhow!("target.headers: invalid header name '{}': {}", key, e))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| anyhow!("target.headers: invalid value for '{}': {}", key, e))?;
            headers.insert(name, value);
        }

        Ok(Self {
            enabled,
            alert_threshold_seconds: cfg.probes.alert_threshold_seconds,
            path: cfg.target.path.to_owned(),
            headers,
            filters: cfg.probes.filters.to_owned(),
        })
    }
}

/// Why an invocation did not issue a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    MissingToken,
    InvalidToken,
    NoData,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::Disabled => "disabled",
            SkipReason::MissingToken => "missing_token",
            SkipReason::InvalidToken => "invalid_token",
            SkipReason::NoData => "no_data",
        }
    }
}

/// Everything chosen before the request goes out.
#[derive(Debug, Clone)]
pub struct PreparedProbe {
    pub skus: Arc<[String]>,
    pub buyer_code: String,
    pub headers: HeaderMap,
}

pub struct PriceProbe<E: PriceEndpoint> {
    variant: ProbeVariant,
    request_name: String,
    settings: ProbeSettings,
    refresher: Arc<TokenRefresher>,
    endpoint: Arc<E>,
    catalog: Arc<Catalog>,
}

impl<E: PriceEndpoint> PriceProbe<E> {
    pub fn new(
        variant: ProbeVariant,
        settings: ProbeSettings,
        refresher: Arc<TokenRefresher>,
        endpoint: Arc<E>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            request_name: variant.request_name(),
            variant,
            settings,
            refresher,
            endpoint,
            catalog,
        }
    }

    pub fn variant(&self) -> ProbeVariant {
        self.variant
    }

    pub fn request_name(&self) -> &str {
        &self.request_name
    }

    /// Run one invocation: `None` when skipped, otherwise the emitted observation.
    pub async fn fetch_price(&self) -> Option<Observation> {
        let prepared = {
            let mut rng = rand::rng();
            self.prepare(&mut rng)
        };

        match prepared {
            Ok(prepared) => {
                let observation = self.execute(prepared).await;
                observation.emit().await;
                Some(observation)
            }
            Err(SkipReason::Disabled) => None,
            Err(reason) => {
                debug!("{} skipped: {}", self.request_name, reason.as_str());
                let metrics = get_metrics().await;
                metrics.probe_skipped.with_label_values(&[self.request_name.as_str(), reason.as_str()]).inc();
                None
            }
        }
    }

    /// Toggle check, token read and random picks. Never touches the network.
    pub fn prepare<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PreparedProbe, SkipReason> {
        if !self.settings.enabled {
            return Err(SkipReason::Disabled);
        }

        let token = self.refresher.token().ok_or(SkipReason::MissingToken)?;

        let skus = match self.variant {
            ProbeVariant::FullSkus => self.catalog.skus(),
            ProbeVariant::SkuBlock { .. } => self.catalog.random_block(rng).ok_or(SkipReason::NoData)?,
        };
        let buyer_code = self.catalog.random_buyer_code(rng).ok_or(SkipReason::NoData)?;

        let mut headers = self.settings.headers.clone();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|_| {
            warn!("cached token is not a valid header value");
            SkipReason::InvalidToken
        })?;
        headers.insert(AUTHORIZATION, bearer);

        Ok(PreparedProbe {
            skus,
            buyer_code,
            headers,
        })
    }

    /// Issue the timed request and classify the reply.
    pub async fn execute(&self, prepared: PreparedProbe) -> Observation {
        let PreparedProbe {
            skus,
            buyer_code,
            headers,
        } = prepared;

        let request = PriceRequest {
            path: self.settings.path.to_owned(),
            body: price_query(&skus, &buyer_code, &self.settings.filters),
            headers,
            name: self.request_name.to_owned(),
        };

        let start = get_instant();
        let reply = self.endpoint.post(request).await;
        let elapsed_seconds = seconds_since(start);

        let (status, empty, note) = match reply {
            Ok(reply) if reply.status == StatusCode::OK => match is_empty_price_payload(&reply.body) {
                Ok(empty) => (Some(reply.status.as_u16()), empty, None),
                Err(e) => {
                    error!("Error parsing response: {}", e);
                    (Some(reply.status.as_u16()), false, Some(format!("unparseable response: {}", e)))
                }
            },
            Ok(reply) => {
                warn!("{} returned status {}", self.request_name, reply.status);
                (Some(reply.status.as_u16()), false, Some(format!("status {}", reply.status)))
            }
            Err(e) => {
                warn!("{} request failed: {:#}", self.request_name, e);
                (None, false, Some(format!("request failed: {:#}", e)))
            }
        };

        Observation {
            label: self.request_name.to_owned(),
            elapsed_seconds,
            buyer_code,
            item_count: skus.len(),
            token_age_seconds: self.refresher.token_age(),
            classification: classify(elapsed_seconds, self.settings.alert_threshold_seconds, empty),
            status,
            note,
        }
    }
}
