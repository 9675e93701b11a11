//! Process-wide cached bearer token renewed on a fixed cadence.
//!
//! One background task calls the fetcher, swaps the cached credential on
//! success and logs on failure, then sleeps the full interval either way.
//! Readers only clone an `Arc` under a short read lock, so they never wait
//! on the network.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::auth::fetch::FetchToken;
use crate::cache::credential::CachedCredential;
use crate::helpers::time::{format_unix, get_instant};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::DEFAULT_REFRESH_INTERVAL_SECS;

static SUCCESS_MSG: &'static str = "success";
static ERROR_MSG: &'static str = "error";

type SharedCredential = Arc<RwLock<Option<Arc<CachedCredential>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    /// fixed period between renewal attempts, success or not
    pub interval: Duration,
}

impl RefreshSchedule {
    pub fn from_seconds(interval_seconds: u64) -> Self {
        Self {
            interval: Duration::from_secs(interval_seconds),
        }
    }
}

impl Default for RefreshSchedule {
    fn default() -> Self {
        Self::from_seconds(DEFAULT_REFRESH_INTERVAL_SECS)
    }
}

pub struct TokenRefresher {
    credential: SharedCredential,
    stop_tx: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TokenRefresher {
    /// Spawn the renewal task and return immediately with an empty cache.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F: FetchToken>(fetcher: F, schedule: RefreshSchedule) -> Self {
        let credential: SharedCredential = Arc::new(RwLock::new(None));
        let (stop_tx, stop_rx) = watch::channel(false);

        info!("starting token refresher, interval {:?}", schedule.interval);
        let handle = tokio::spawn(refresh_loop(fetcher, schedule, credential.clone(), stop_rx));

        Self {
            credential,
            stop_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Current `{token, issued_at}` pair, read under a single lock acquisition.
    pub fn snapshot(&self) -> Option<Arc<CachedCredential>> {
        let guard = self.credential.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().cloned()
    }

    pub fn token(&self) -> Option<String> {
        self.snapshot().map(|credential| credential.token.clone())
    }

    /// Seconds since the last successful refresh, `None` before the first one.
    pub fn token_age(&self) -> Option<f64> {
        self.snapshot().map(|credential| credential.age_seconds())
    }

    /// Ask the renewal task to exit; an in-flight fetch is abandoned.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Stop the renewal task and wait for it to finish.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self
            .handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("token refresher task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for TokenRefresher {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn refresh_loop<F: FetchToken>(
    fetcher: F,
    schedule: RefreshSchedule,
    credential: SharedCredential,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = refresh_cycle(&fetcher, &credential) => {}
            _ = stop_rx.wait_for(|stop| *stop) => break,
        }

        debug!("next token refresh in {:?}", schedule.interval);
        tokio::select! {
            _ = tokio::time::sleep(schedule.interval) => {}
            _ = stop_rx.wait_for(|stop| *stop) => break,
        }
    }
    info!("token refresher stopped");
}

/// One fetch-and-cache step. Failures leave the cached credential untouched.
async fn refresh_cycle<F: FetchToken>(fetcher: &F, credential: &SharedCredential) {
    let metrics = get_metrics().await;
    let start = get_instant();

    match fetcher.fetch_token().await {
        Ok(token) => {
            let fresh = CachedCredential::new(token);
            metrics.token_refresh_total.with_label_values(&[SUCCESS_MSG]).inc();
            metrics.token_refresh_duration.with_label_values(&[SUCCESS_MSG]).observe(start.elapsed().as_secs_f64());
            metrics.token_issued_at_unix.set(fresh.issued_at_unix_ts);
            info!("token refreshed at {}", format_unix(fresh.issued_at_unix_ts));
            store(credential, fresh);
        }
        Err(e) => {
            metrics.token_refresh_total.with_label_values(&[ERROR_MSG]).inc();
            metrics.token_refresh_duration.with_label_values(&[ERROR_MSG]).observe(start.elapsed().as_secs_f64());
            warn!("token refresh failed, serving cached token until next cycle: {:#}", e);
        }
    }
}

fn store(credential: &SharedCredential, fresh: CachedCredential) {
    let fresh = Arc::new(fresh);
    let mut guard = credential.write().unwrap_or_else(PoisonError::into_inner);
    *guard = Some(fresh);
}
