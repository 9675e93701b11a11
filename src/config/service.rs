use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

use crate::config::settings::SettingsConfig;
use crate::utils::constants::*;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    pub auth: AuthConfig,
    pub target: TargetConfig,
    #[serde(default)]
    pub probes: ProbesConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

/// ================================
/// Auth - OAuth2 client credentials
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub token_url: String,
    pub client_id: GenericSourceValue,
    pub client_secret: GenericSourceValue,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// fixed period between renewal attempts
    #[serde(default = "default_refresh_interval_seconds")]
    pub refresh_interval_seconds: u64,
    #[serde(default = "default_auth_timeout_ms")]
    pub timeout_ms: u64,
}

/// Secret / value sources
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum GenericSourceValue {
    Plain(String),
    Literal {
        value: String,
    },
    FromEnv {
        from_env: String,
    },
    FromFile {
        path: String,
    },
}

/// ================================
/// Target - price endpoint
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct TargetConfig {
    pub host: String,
    #[serde(default = "default_target_path")]
    pub path: String,
    #[serde(default = "default_target_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_target_headers")]
    pub headers: HashMap<String, String>,
}

/// ================================
/// Probes
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ProbesConfig {
    #[serde(default = "default_alert_threshold_seconds")]
    pub alert_threshold_seconds: f64,
    #[serde(default)]
    pub full_skus: ProbeToggle,
    #[serde(default)]
    pub sku_block: SkuBlockConfig,
    #[serde(default)]
    pub filters: PriceFilters,
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            alert_threshold_seconds: default_alert_threshold_seconds(),
            full_skus: ProbeToggle::default(),
            sku_block: SkuBlockConfig::default(),
            filters: PriceFilters::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProbeToggle {
    #[serde(default = "default_enabled", deserialize_with = "deserialize_flag")]
    pub enabled: bool,
}

impl Default for ProbeToggle {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SkuBlockConfig {
    #[serde(default = "default_enabled", deserialize_with = "deserialize_flag")]
    pub enabled: bool,
    #[serde(default = "default_block_size")]
    pub block_size: usize,
}

impl Default for SkuBlockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_size: default_block_size(),
        }
    }
}

/// Fixed business filters embedded in every price query
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PriceFilters {
    #[serde(default = "default_rounded")]
    pub rounded: u32,
    #[serde(default = "default_payment_code")]
    pub payment_code: String,
    #[serde(default = "default_condition")]
    pub condition: String,
    #[serde(default = "default_distribution_channel_code")]
    pub distribution_channel_code: String,
    #[serde(default = "default_fifo_range")]
    pub fifo_range: Vec<String>,
}

impl Default for PriceFilters {
    fn default() -> Self {
        Self {
            rounded: default_rounded(),
            payment_code: default_payment_code(),
            condition: default_condition(),
            distribution_channel_code: default_distribution_channel_code(),
            fifo_range: default_fifo_range(),
        }
    }
}

/// ================================
/// Data - SKUs & buyers
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    pub skus: DataList,
    pub buyer_codes: DataList,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum DataList {
    Inline(Vec<String>),
    FromFile { path: String },
}

/// ================================
/// Load - virtual users
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoadConfig {
    #[serde(default = "default_users")]
    pub users: usize,
    /// users started per second
    #[serde(default = "default_spawn_rate")]
    pub spawn_rate: f64,
    #[serde(default = "default_wait_min_ms")]
    pub wait_min_ms: u64,
    #[serde(default = "default_wait_max_ms")]
    pub wait_max_ms: u64,
    pub run_time_seconds: Option<u64>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            users: default_users(),
            spawn_rate: default_spawn_rate(),
            wait_min_ms: default_wait_min_ms(),
            wait_max_ms: default_wait_max_ms(),
            run_time_seconds: None,
        }
    }
}

/// Accepts `true`/`false` as well as the `"1"`/`"0"` style used by env toggles.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(i) => Ok(i == 1),
        Flag::Text(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid toggle value '{}', expected 1/0 or true/false",
                other
            ))),
        },
    }
}

fn default_enabled() -> bool {
    true
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_owned()
}

fn default_refresh_interval_seconds() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_auth_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

fn default_target_path() -> String {
    DEFAULT_PRICE_PATH.to_owned()
}

fn default_target_timeout_ms() -> u64 {
    DEFAULT_PRICE_TIMEOUT_MS
}

fn default_target_headers() -> HashMap<String, String> {
    HashMap::from([("Content-Type".to_owned(), "application/json".to_owned())])
}

fn default_alert_threshold_seconds() -> f64 {
    DEFAULT_ALERT_THRESHOLD_SECS
}

fn default_block_size() -> usize {
    DEFAULT_SKU_BLOCK_SIZE
}

fn default_rounded() -> u32 {
    2
}

fn default_payment_code() -> String {
    "R019".to_owned()
}

fn default_condition() -> String {
    "YB2B".to_owned()
}

fn default_distribution_channel_code() -> String {
    "10".to_owned()
}

fn default_fifo_range() -> Vec<String> {
    ["Z100", "Z098", "Z101", "Z102"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_users() -> usize {
    10
}

fn default_spawn_rate() -> f64 {
    1.0
}

fn default_wait_min_ms() -> u64 {
    1000
}

fn default_wait_max_ms() -> u64 {
    5000
}
