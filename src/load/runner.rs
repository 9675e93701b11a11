use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::service::LoadConfig;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::probe::endpoint::PriceEndpoint;
use crate::probe::price_probe::PriceProbe;

/// Something a virtual user invokes on every tick.
pub trait VirtualUserTask: Send + Sync + 'static {
    fn name(&self) -> &str;
    fn run(&self) -> impl Future<Output = ()> + Send;
}

impl<E: PriceEndpoint> VirtualUserTask for PriceProbe<E> {
    fn name(&self) -> &str {
        self.request_name()
    }

    async fn run(&self) {
        let _ = self.fetch_price().await;
    }
}

/// Think time between two tasks of one user, uniform in `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitTime {
    pub min: Duration,
    pub max: Duration,
}

impl WaitTime {
    pub fn between(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let millis = rng.random_range(self.min.as_millis() as u64..=self.max.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub users_started: usize,
    pub iterations: u64,
    pub elapsed_seconds: f64,
}

#[derive(Debug, Clone)]
pub struct LoadRunner {
    pub users: usize,
    pub spawn_rate: f64,
    pub wait: WaitTime,
    pub run_time: Option<Duration>,
}

impl LoadRunner {
    pub fn from_config(cfg: &LoadConfig) -> Self {
        Self {
            users: cfg.users,
            spawn_rate: cfg.spawn_rate,
            wait: WaitTime::between(
                Duration::from_millis(cfg.wait_min_ms),
                Duration::from_millis(cfg.wait_max_ms),
            ),
            run_time: cfg.run_time_seconds.map(Duration::from_secs),
        }
    }

    fn spawn_interval(&self) -> Duration {
        if self.spawn_rate > 0.0 {
            Duration::from_secs_f64(1.0 / self.spawn_rate)
        } else {
            Duration::ZERO
        }
    }

    /// Ramp up users, then run until `run_time` elapses or `stop` flips to true
    /// (a dropped sender counts as a stop). In-flight tasks finish before returning.
    pub async fn run<T: VirtualUserTask>(&self, tasks: Arc<Vec<T>>, mut stop: watch::Receiver<bool>) -> RunSummary {
        let started = get_instant();
        let deadline = self.run_time.map(|run_time| started + run_time);
        let (users_stop_tx, users_stop_rx) = watch::channel(false);
        let mut users = JoinSet::new();

        info!(
            "starting {} virtual users at {}/s over tasks {:?}",
            self.users,
            self.spawn_rate,
            tasks.iter().map(|t| t.name()).collect::<Vec<&str>>()
        );

        let stopped = async {
            match deadline {
                Some(deadline) => tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => info!("run time elapsed"),
                    _ = stop.wait_for(|stop| *stop) => info!("stop requested"),
                },
                None => {
                    let _ = stop.wait_for(|stop| *stop).await;
                    info!("stop requested");
                }
            }
        };
        tokio::pin!(stopped);

        let mut users_started = 0;
        let mut interrupted = false;
        for id in 0..self.users {
            users.spawn(virtual_user(id, tasks.clone(), self.wait, users_stop_rx.clone()));
            users_started += 1;

            if id + 1 < self.users {
                tokio::select! {
                    _ = sleep(self.spawn_interval()) => {}
                    _ = &mut stopped => {
                        interrupted = true;
                        break;
                    }
                }
            }
        }
        info!("{} virtual users started", users_started);

        if !interrupted {
            (&mut stopped).await;
        }
        let _ = users_stop_tx.send(true);

        let mut iterations = 0;
        while let Some(result) = users.join_next().await {
            match result {
                Ok(n) => iterations += n,
                Err(e) => warn!("virtual user ended abnormally: {}", e),
            }
        }

        let summary = RunSummary {
            users_started,
            iterations,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        };
        info!(
            "load run finished: {} users, {} task invocations in {:.1}s",
            summary.users_started, summary.iterations, summary.elapsed_seconds
        );
        summary
    }
}

/// One user: pick a task uniformly, run it to completion, think, repeat.
async fn virtual_user<T: VirtualUserTask>(
    id: usize,
    tasks: Arc<Vec<T>>,
    wait: WaitTime,
    mut stop: watch::Receiver<bool>,
) -> u64 {
    if tasks.is_empty() {
        return 0;
    }

    let metrics = get_metrics().await;
    metrics.active_users.inc();
    debug!("virtual user {} started", id);

    let mut iterations = 0;
    loop {
        let stopped = *stop.borrow();
        if stopped {
            break;
        }
        let (index, pause) = {
            let mut rng = rand::rng();
            (rng.random_range(0..tasks.len()), wait.sample(&mut rng))
        };

        tasks[index].run().await;
        iterations += 1;

        tokio::select! {
            _ = sleep(pause) => {}
            _ = stop.wait_for(|stop| *stop) => break,
        }
    }

    metrics.active_users.dec();
    debug!("virtual user {} stopped after {} tasks", id, iterations);
    iterations
}
