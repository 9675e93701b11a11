// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::Client;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

/// Minimal valid config pointing at local stub servers.
pub fn config_yaml(token_url: &str, target_host: &str) -> String {
    format!(
        r#"
auth:
  token_url: "{token_url}"
  client_id: "loadgen-client"
  client_secret:
    value: "loadgen-secret"
  refresh_interval_seconds: 250
  timeout_ms: 2000

target:
  host: "{target_host}/"
  path: "financial/price"
  timeout_ms: 5000

probes:
  alert_threshold_seconds: 10
  sku_block:
    block_size: 2

data:
  skus: ["000000000000031933", "000000000000031940", "000000000000031947", "000000000000031954", "000000000000031961"]
  buyer_codes: ["0007554445"]

load:
  users: 2
  spawn_rate: 20
  wait_min_ms: 20
  wait_max_ms: 40
  run_time_seconds: 1
"#
    )
}

/// Poll until `check` is true or `timeout` elapses.
pub async fn wait_until<F: Fn() -> bool>(check: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
