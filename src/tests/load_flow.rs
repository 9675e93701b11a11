// This test simulates:
//  - an OAuth2 token endpoint (POST, form body) -> counts issued tokens
//  - the price endpoint (POST, GraphQL JSON) -> records bearer headers and queries
// Then it wires config -> refresher -> probes -> virtual users like the binary does.

#[cfg(test)]
mod test {

use std::sync::{atomic::{AtomicUsize, Ordering}, Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, routing::post, Json};
use http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use serde_json::Value;
use tokio::sync::watch;

use crate::auth::oauth2::ClientCredentials;
use crate::cache::token_refresher::{RefreshSchedule, TokenRefresher};
use crate::config::proc_loader::parse_config;
use crate::config::service::ServiceConfig;
use crate::data::catalog::Catalog;
use crate::load::runner::LoadRunner;
use crate::probe::classification::Classification;
use crate::probe::endpoint::HttpPriceEndpoint;
use crate::probe::price_probe::{PriceProbe, ProbeSettings, ProbeVariant};
use crate::tests::common::{config_yaml, json, spawn_axum, wait_until, JoinHandle, Router};

const PRICED: &str = r#"{"data":{"get_price":{"agregators":{"sales_region_agregator":{"sales_organization_agregator":{}}}}}}"#;
const NO_PRICE: &str = r#"{"data":{"get_price":null}}"#;

#[derive(Clone)]
struct PriceStub {
    calls: Arc<AtomicUsize>,
    bearers: Arc<Mutex<Vec<String>>>,
    queries: Arc<Mutex<Vec<String>>>,
    reply: &'static str,
}

impl PriceStub {
    fn new(reply: &'static str) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            bearers: Arc::new(Mutex::new(Vec::new())),
            queries: Arc::new(Mutex::new(Vec::new())),
            reply,
        }
    }
}

async fn price_handler(
    State(stub): State<PriceStub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    stub.calls.fetch_add(1, Ordering::SeqCst);
    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        stub.bearers.lock().unwrap().push(auth.to_owned());
    }
    if let Some(query) = body["query"].as_str() {
        stub.queries.lock().unwrap().push(query.to_owned());
    }
    (StatusCode::OK, stub.reply.to_owned())
}

async fn spawn_token_server(issued: Arc<AtomicUsize>) -> (JoinHandle<()>, String) {
    let router = Router::new().route("/oauth2/token", post(move || {
        let issued = issued.clone();
        async move {
            let n = issued.fetch_add(1, Ordering::SeqCst) + 1;
            Json(json!({"access_token": format!("tok-{}", n), "token_type": "Bearer", "expires_in": 300}))
        }
    }));
    let (handle, addr) = spawn_axum(router).await;
    (handle, format!("http://{}/oauth2/token", addr))
}

async fn spawn_price_server(stub: PriceStub) -> (JoinHandle<()>, String) {
    let router = Router::new()
        .route("/financial/price", post(price_handler))
        .with_state(stub);
    let (handle, addr) = spawn_axum(router).await;
    (handle, format!("http://{}", addr))
}

struct Harness {
    config: ServiceConfig,
    refresher: Arc<TokenRefresher>,
    catalog: Arc<Catalog>,
    endpoint: Arc<HttpPriceEndpoint>,
}

impl Harness {
    async fn start(token_url: &str, price_host: &str) -> Self {
        let config = parse_config(config_yaml(token_url, price_host)).await.expect("config must be valid");
        let token_source = ClientCredentials::from_config(&config.auth).unwrap();
        let refresher = Arc::new(TokenRefresher::start(
            token_source,
            RefreshSchedule::from_seconds(config.auth.refresh_interval_seconds),
        ));
        let catalog = Arc::new(
            Catalog::from_config(&config.data, config.probes.sku_block.block_size).unwrap(),
        );
        let endpoint = Arc::new(HttpPriceEndpoint::from_config(&config.target).unwrap());
        Self { config, refresher, catalog, endpoint }
    }

    fn probe(&self, variant: ProbeVariant, enabled: bool) -> PriceProbe<HttpPriceEndpoint> {
        PriceProbe::new(
            variant,
            ProbeSettings::from_config(&self.config, enabled).unwrap(),
            self.refresher.clone(),
            self.endpoint.clone(),
            self.catalog.clone(),
        )
    }

    async fn wait_for_token(&self) {
        let refresher = self.refresher.clone();
        assert!(
            wait_until(move || refresher.token().is_some(), Duration::from_secs(5)).await,
            "first token never arrived"
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_skus_probe_uses_refreshed_token() {
    let issued = Arc::new(AtomicUsize::new(0));
    let (token_h, token_url) = spawn_token_server(issued.clone()).await;
    let stub = PriceStub::new(PRICED);
    let (price_h, price_host) = spawn_price_server(stub.clone()).await;

    let harness = Harness::start(&token_url, &price_host).await;
    harness.wait_for_token().await;
    assert_eq!(harness.refresher.token().as_deref(), Some("tok-1"));

    let probe = harness.probe(ProbeVariant::FullSkus, true);
    let observation = probe.fetch_price().await.expect("enabled probe with a token must run");

    assert_eq!(observation.label, "Get price - Full SKUs");
    assert_eq!(observation.classification, Classification::Normal);
    assert_eq!(observation.status, Some(200));
    assert_eq!(observation.item_count, 5);
    assert_eq!(observation.buyer_code, "0007554445");
    assert!(observation.token_age_seconds.is_some());
    assert!(observation.note.is_none());

    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    assert_eq!(*stub.bearers.lock().unwrap(), vec!["Bearer tok-1".to_owned()]);
    let query = stub.queries.lock().unwrap()[0].clone();
    assert!(query.contains("get_price(filters:"));
    assert!(query.contains("buyer_code: \"0007554445\""));
    assert!(query.contains("000000000000031961"));

    // refresh interval is far away, no second token
    assert_eq!(issued.load(Ordering::SeqCst), 1);

    harness.refresher.shutdown().await;
    token_h.abort();
    price_h.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn null_price_data_is_reported_empty() {
    let issued = Arc::new(AtomicUsize::new(0));
    let (token_h, token_url) = spawn_token_server(issued).await;
    let stub = PriceStub::new(NO_PRICE);
    let (price_h, price_host) = spawn_price_server(stub.clone()).await;

    let harness = Harness::start(&token_url, &price_host).await;
    harness.wait_for_token().await;

    let probe = harness.probe(ProbeVariant::SkuBlock { block_size: 2 }, true);
    let observation = probe.fetch_price().await.unwrap();

    assert_eq!(observation.label, "Get price - Block 2 SKUs");
    assert_eq!(observation.classification, Classification::Empty);
    assert!(observation.item_count == 1 || observation.item_count == 2);
    assert!(observation.summary().starts_with("EMPTY: No price data | Get price - Block 2 SKUs"));

    harness.refresher.shutdown().await;
    token_h.abort();
    price_h.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unreachable_token_endpoint_skips_requests() {
    let stub = PriceStub::new(PRICED);
    let (price_h, price_host) = spawn_price_server(stub.clone()).await;

    // nothing listens on port 9 of localhost
    let harness = Harness::start("http://127.0.0.1:9/oauth2/token", &price_host).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let probe = harness.probe(ProbeVariant::FullSkus, true);
    assert!(probe.fetch_price().await.is_none());
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);

    harness.refresher.shutdown().await;
    price_h.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn virtual_users_share_one_token() {
    let issued = Arc::new(AtomicUsize::new(0));
    let (token_h, token_url) = spawn_token_server(issued.clone()).await;
    let stub = PriceStub::new(PRICED);
    let (price_h, price_host) = spawn_price_server(stub.clone()).await;

    let harness = Harness::start(&token_url, &price_host).await;
    harness.wait_for_token().await;

    let probes = Arc::new(vec![
        harness.probe(ProbeVariant::FullSkus, true),
        harness.probe(ProbeVariant::SkuBlock { block_size: 2 }, false),
    ]);
    let (_stop_tx, stop_rx) = watch::channel(false);
    let summary = LoadRunner::from_config(&harness.config.load).run(probes, stop_rx).await;

    assert_eq!(summary.users_started, 2);
    assert!(summary.iterations > 0);

    // disabled block probe never reaches the server
    let calls = stub.calls.load(Ordering::SeqCst);
    assert!(calls > 0 && calls as u64 <= summary.iterations);
    assert!(stub.bearers.lock().unwrap().iter().all(|b| b == "Bearer tok-1"));
    assert_eq!(issued.load(Ordering::SeqCst), 1);

    harness.refresher.shutdown().await;
    token_h.abort();
    price_h.abort();
}
}
