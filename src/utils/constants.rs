//! Shared constants and invariants

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 250;
pub const DEFAULT_ALERT_THRESHOLD_SECS: f64 = 10.0;
pub const DEFAULT_SKU_BLOCK_SIZE: usize = 30;
pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_PRICE_TIMEOUT_MS: u64 = 60_000;

pub const DEFAULT_SCOPE: &str = "openid";
pub const DEFAULT_PRICE_PATH: &str = "/financial/price";
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

// Request names used for aggregation
pub const REQUEST_NAME_FULL_SKUS: &str = "Get price - Full SKUs";
pub const REQUEST_NAME_SKU_BLOCK_PREFIX: &str = "Get price - Block";
