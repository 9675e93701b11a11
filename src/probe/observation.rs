use tracing::{info, warn};

use crate::observability::metrics::get_metrics;
use crate::probe::classification::Classification;

/// Outcome of one probe invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub label: String,
    pub elapsed_seconds: f64,
    pub buyer_code: String,
    pub item_count: usize,
    pub token_age_seconds: Option<f64>,
    pub classification: Classification,
    /// HTTP status, `None` when the request never got a reply
    pub status: Option<u16>,
    /// low-severity note: transport error, non-200 status or unparseable body
    pub note: Option<String>,
}

impl Observation {
    pub fn summary(&self) -> String {
        let age = format_token_age(self.token_age_seconds);
        match self.classification {
            Classification::Empty => format!(
                "EMPTY: No price data | {} | buyer_code: {} | SKUs: {} | token_age: {}",
                self.label, self.buyer_code, self.item_count, age
            ),
            Classification::Slow => format!(
                "ALERT: {} reply: {:.3}s | buyer_code: {} | SKUs: {} | token_age: {}",
                self.label, self.elapsed_seconds, self.buyer_code, self.item_count, age
            ),
            Classification::Normal => format!(
                "{} reply: {:.3}s | buyer_code: {} | SKUs: {} | token_age: {}",
                self.label, self.elapsed_seconds, self.buyer_code, self.item_count, age
            ),
        }
    }

    /// Log the observation and count it by classification.
    pub async fn emit(&self) {
        let metrics = get_metrics().await;
        metrics
            .probe_observations
            .with_label_values(&[self.label.as_str(), self.classification.as_str()])
            .inc();

        let summary = self.summary();
        let note = self.note.as_deref().unwrap_or("");
        match self.classification {
            Classification::Normal => info!(
                classification = %self.classification,
                elapsed_seconds = self.elapsed_seconds,
                status = ?self.status,
                note,
                "{}", summary
            ),
            Classification::Slow | Classification::Empty => warn!(
                classification = %self.classification,
                elapsed_seconds = self.elapsed_seconds,
                status = ?self.status,
                note,
                "{}", summary
            ),
        }
    }
}

pub fn format_token_age(age: Option<f64>) -> String {
    age.map(|age| format!("{:.1}s", age))
        .unwrap_or_else(|| "?".to_owned())
}
