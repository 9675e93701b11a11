//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Checks URL shapes, positive intervals and sizes, nonempty data sets,
//!   logging / metrics settings and the virtual-user wait range

use tracing::{error, info, warn};

use crate::config::service::{
    AuthConfig, DataConfig, DataList, GenericSourceValue, LoadConfig, ProbesConfig, ServiceConfig,
    TargetConfig,
};
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_auth(&cfg.auth, &mut errors);
    validate_target(&cfg.target, &mut errors);
    validate_probes(&cfg.probes, &mut errors);
    validate_data(&cfg.data, &mut errors);
    validate_load(&cfg.load, &mut errors);

    if errors.is_empty() {
        info!("config is valid");
        Ok(())
    } else {
        let metrics = get_metrics().await;
        for e in &errors {
            error!("config validation: {}", e);
            metrics.config_validation_errors.inc();
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(logging) = &settings.logging {
        let level = logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' must be one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }

    if settings.metrics.is_enabled {
        if !settings.metrics.path.starts_with('/') {
            errors.push(format!(
                "settings.metrics.path '{}' must start with '/'",
                settings.metrics.path
            ));
        }
        if settings.server.host.trim().is_empty() {
            errors.push("settings.server.host must not be empty".to_string());
        }
        if settings.server.port.parse::<u16>().is_err() {
            errors.push(format!(
                "settings.server.port '{}' is not a valid port",
                settings.server.port
            ));
        }
    }
}

fn validate_auth(auth: &AuthConfig, errors: &mut Vec<String>) {
    validate_url("auth.token_url", &auth.token_url, errors);

    validate_source_value("auth.client_id", &auth.client_id, errors);
    validate_source_value("auth.client_secret", &auth.client_secret, errors);

    if auth.refresh_interval_seconds == 0 {
        errors.push("auth.refresh_interval_seconds must be > 0".to_string());
    }
    if auth.timeout_ms == 0 {
        errors.push("auth.timeout_ms must be > 0".to_string());
    }
}

fn validate_target(target: &TargetConfig, errors: &mut Vec<String>) {
    validate_url("target.host", &target.host, errors);
    if target.timeout_ms == 0 {
        errors.push("target.timeout_ms must be > 0".to_string());
    }
    for key in target.headers.keys() {
        if key.eq_ignore_ascii_case("authorization") {
            errors.push(
                "target.headers must not set 'Authorization'; it is filled from the cached token"
                    .to_string(),
            );
        }
    }
}

fn validate_probes(probes: &ProbesConfig, errors: &mut Vec<String>) {
    if !(probes.alert_threshold_seconds > 0.0) {
        errors.push(format!(
            "probes.alert_threshold_seconds must be > 0, got {}",
            probes.alert_threshold_seconds
        ));
    }
    if probes.sku_block.block_size == 0 {
        errors.push("probes.sku_block.block_size must be > 0".to_string());
    }
    if probes.filters.payment_code.trim().is_empty() {
        errors.push("probes.filters.payment_code must not be empty".to_string());
    }
    if probes.filters.condition.trim().is_empty() {
        errors.push("probes.filters.condition must not be empty".to_string());
    }
    if !probes.full_skus.enabled && !probes.sku_block.enabled {
        warn!("both probe variants are disabled; virtual users will not issue requests");
    }
}

fn validate_data(data: &DataConfig, errors: &mut Vec<String>) {
    validate_data_list("data.skus", &data.skus, errors);
    validate_data_list("data.buyer_codes", &data.buyer_codes, errors);
}

fn validate_load(load: &LoadConfig, errors: &mut Vec<String>) {
    if load.users == 0 {
        errors.push("load.users must be > 0".to_string());
    }
    if !(load.spawn_rate > 0.0) {
        errors.push(format!("load.spawn_rate must be > 0, got {}", load.spawn_rate));
    }
    if load.wait_min_ms > load.wait_max_ms {
        errors.push(format!(
            "load.wait_min_ms ({}) must be <= load.wait_max_ms ({})",
            load.wait_min_ms, load.wait_max_ms
        ));
    }
    if load.run_time_seconds == Some(0) {
        errors.push("load.run_time_seconds must be > 0 when set".to_string());
    }
}

fn validate_url(field: &str, value: &str, errors: &mut Vec<String>) {
    let value = value.trim();
    if value.is_empty() {
        errors.push(format!("{} must not be empty", field));
    } else if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(format!("{} '{}' must start with http:// or https://", field, value));
    }
}

fn validate_source_value(field: &str, value: &GenericSourceValue, errors: &mut Vec<String>) {
    let empty = match value {
        GenericSourceValue::Plain(v) => v.trim().is_empty(),
        GenericSourceValue::Literal { value } => value.trim().is_empty(),
        GenericSourceValue::FromEnv { from_env } => from_env.trim().is_empty(),
        GenericSourceValue::FromFile { path } => path.trim().is_empty(),
    };
    if empty {
        errors.push(format!("{} must not be empty", field));
    }
}

fn validate_data_list(field: &str, list: &DataList, errors: &mut Vec<String>) {
    match list {
        DataList::Inline(values) => {
            if values.is_empty() {
                errors.push(format!("{} must contain at least one value", field));
            }
            if values.iter().any(|v| v.trim().is_empty()) {
                errors.push(format!("{} must not contain empty values", field));
            }
        }
        DataList::FromFile { path } => {
            if path.trim().is_empty() {
                errors.push(format!("{}.path must not be empty", field));
            }
        }
    }
}
