use tokio::time::Instant;

use crate::helpers::time::{get_instant, now_i64, seconds_since};

/// One successful refresh: the token and when it was issued.
///
/// Never mutated after construction; the refresher swaps whole snapshots,
/// so a reader always sees a `token` with its own `issued_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedCredential {
    pub token: String,
    pub issued_at: Instant,
    pub issued_at_unix_ts: i64, // UNIX TIMESTAMP
}

impl CachedCredential {
    pub fn new(token: String) -> Self {
        Self {
            token,
            issued_at: get_instant(),
            issued_at_unix_ts: now_i64(),
        }
    }

    /// Seconds since this credential was issued
    pub fn age_seconds(&self) -> f64 {
        seconds_since(self.issued_at)
    }
}
