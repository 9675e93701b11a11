use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Normal,
    Slow,
    Empty,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Normal => "normal",
            Classification::Slow => "slow",
            Classification::Empty => "empty",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Empty wins over Slow; Slow needs strictly more than the threshold.
pub fn classify(elapsed_seconds: f64, alert_threshold_seconds: f64, empty: bool) -> Classification {
    if empty {
        Classification::Empty
    } else if elapsed_seconds > alert_threshold_seconds {
        Classification::Slow
    } else {
        Classification::Normal
    }
}

/// Why a 200 body could not be inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadError(pub String);

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inspect a 200 body: `Ok(true)` when `data.get_price` or its `agregators`
/// is missing or blank, `Ok(false)` when price data is present. A body that is
/// not a JSON object, or a non-blank `data` / `get_price` that is not an
/// object, cannot be inspected.
pub fn is_empty_price_payload(body: &str) -> Result<bool, PayloadError> {
    let parsed: Value = serde_json::from_str(body).map_err(|e| PayloadError(e.to_string()))?;

    let root = match parsed {
        Value::Object(root) => root,
        other => return Err(PayloadError(format!("response is not an object: {}", kind(&other)))),
    };

    let data = match root.get("data") {
        None => return Ok(true),
        Some(Value::Object(data)) => data,
        Some(other) => return Err(PayloadError(format!("'data' is not an object: {}", kind(other)))),
    };

    let get_price = match data.get("get_price") {
        None => return Ok(true),
        Some(value) if is_blank(value) => return Ok(true),
        Some(Value::Object(get_price)) => get_price,
        Some(other) => {
            return Err(PayloadError(format!("'data.get_price' is not an object: {}", kind(other))))
        }
    };

    Ok(get_price.get("agregators").map_or(true, is_blank))
}

/// null, false, zero and empty strings or collections carry no price data.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
