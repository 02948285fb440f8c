//! Stress driver: runs N connection workers against one target until they
//! all stop, then reports.
//!
//! ## Run lifecycle
//! 1. A fresh [`StopSignal`] and [`StressMetrics`] are created for the run.
//! 2. Each worker gets its own blocking thread (`spawn_blocking`), since the
//!    connect and close capabilities block.
//! 3. The run ends when every worker has returned: after a fatal failure,
//!    after external cancellation, or after each worker hit its iteration cap.
//! 4. After a settling delay the final snapshot is logged and returned, or
//!    attached to the fatal cause when there is one.

use crate::engine::capability::Connector;
use crate::engine::signal::{FatalCause, StopSignal};
use crate::engine::worker::{WorkerSummary, WorkerTask};
use crate::error::StressError;
use crate::metrics::{MetricsSnapshot, StressMetrics};
use churn_common::Config;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Everything a run needs besides the connector.
#[derive(Debug, Clone)]
pub struct StressSettings {
    pub worker_count: usize,
    pub target: SocketAddr,
    /// Pause before every attempt, per worker.
    pub pacing: Option<Duration>,
    pub max_iterations: Option<u64>,
    /// Delay between the last worker exiting and the final snapshot.
    pub settle: Duration,
    pub report_interval: Option<Duration>,
}

impl StressSettings {
    pub fn new(worker_count: usize, target: SocketAddr) -> Self {
        Self {
            worker_count,
            target,
            pacing: None,
            max_iterations: None,
            settle: Duration::from_secs(1),
            report_interval: None,
        }
    }
}

impl TryFrom<&Config> for StressSettings {
    type Error = StressError;

    fn try_from(config: &Config) -> Result<Self, Self::Error> {
        let stress = &config.stress;
        let target = resolve_target(&stress.target_address)?;
        let pacing = (stress.sleep_between_attempts_ms > 0)
            .then(|| Duration::from_millis(stress.sleep_between_attempts_ms));
        let report_interval = (config.metrics.report_interval_secs > 0)
            .then(|| Duration::from_secs(config.metrics.report_interval_secs));

        Ok(Self {
            worker_count: stress.worker_count,
            target,
            pacing,
            max_iterations: stress.max_iterations_per_worker,
            settle: Duration::from_millis(stress.settle_millis),
            report_interval,
        })
    }
}

fn resolve_target(address: &str) -> Result<SocketAddr, StressError> {
    let invalid = |reason: String| StressError::InvalidAddress {
        address: address.to_string(),
        reason,
    };
    address
        .to_socket_addrs()
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("resolved to no addresses".to_string()))
}

/// Final outcome of a run.
#[derive(Debug, Clone)]
pub struct StressReport {
    pub snapshot: MetricsSnapshot,
    pub workers: Vec<WorkerSummary>,
    pub total_attempts: u64,
    pub elapsed: Duration,
    pub fatal_cause: Option<FatalCause>,
}

pub struct StressDriver<C: Connector> {
    settings: StressSettings,
    connector: Arc<C>,
    metrics: Arc<StressMetrics>,
    signal: Arc<StopSignal>,
}

impl<C: Connector> StressDriver<C> {
    pub fn new(settings: StressSettings, connector: Arc<C>) -> Self {
        Self {
            settings,
            connector,
            metrics: Arc::new(StressMetrics::new()),
            signal: Arc::new(StopSignal::new()),
        }
    }

    /// Live counters of this run, for scraping while it is in progress.
    pub fn metrics(&self) -> Arc<StressMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn signal(&self) -> Arc<StopSignal> {
        Arc::clone(&self.signal)
    }

    /// Runs until every worker has stopped.
    ///
    /// Cancelling `cancel` raises the stop signal without a cause; the run
    /// then still ends once each worker finishes its in-flight attempt.
    pub async fn run(self, cancel: CancellationToken) -> Result<StressReport, StressError> {
        let settings = &self.settings;
        if settings.worker_count == 0 {
            return Err(StressError::NoWorkers);
        }

        let started = Instant::now();
        let done = CancellationToken::new();
        // Stops the workers and helper tasks even if this future is dropped
        // before the run completes.
        let _guard = RunGuard {
            signal: Arc::clone(&self.signal),
            done: done.clone(),
        };
        info!(
            workers = settings.worker_count,
            target = %settings.target,
            "Stress run starting"
        );

        let watcher = {
            let signal = Arc::clone(&self.signal);
            let done = done.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Cancellation requested, stopping workers");
                        signal.halt();
                    }
                    _ = done.cancelled() => {}
                }
            })
        };

        let reporter = settings.report_interval.map(|every| {
            let metrics = Arc::clone(&self.metrics);
            let done = done.clone();
            tokio::spawn(async move {
                let mut interval =
                    tokio::time::interval_at(tokio::time::Instant::now() + every, every);
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            info!(metrics = %metrics.snapshot(), "Periodic report");
                        }
                        _ = done.cancelled() => break,
                    }
                }
            })
        });

        let handles: Vec<_> = (0..settings.worker_count)
            .map(|id| {
                let task = WorkerTask {
                    id,
                    target: settings.target,
                    pacing: settings.pacing,
                    max_iterations: settings.max_iterations,
                    connector: Arc::clone(&self.connector),
                    metrics: Arc::clone(&self.metrics),
                    signal: Arc::clone(&self.signal),
                };
                tokio::task::spawn_blocking(move || task.run())
            })
            .collect();

        let mut workers = Vec::with_capacity(handles.len());
        let mut panicked = None;
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(summary) => workers.push(summary),
                Err(e) => {
                    error!(worker = id, error = %e, "Worker task failed");
                    self.signal.halt();
                    panicked.get_or_insert(id);
                }
            }
        }

        done.cancel();
        let _ = watcher.await;
        if let Some(reporter) = reporter {
            let _ = reporter.await;
        }

        if !settings.settle.is_zero() {
            tokio::time::sleep(settings.settle).await;
        }

        let snapshot = self.metrics.snapshot();
        info!(metrics = %snapshot, "Final report");

        let report = StressReport {
            total_attempts: workers.iter().map(|w| w.attempts).sum(),
            workers,
            snapshot,
            elapsed: started.elapsed(),
            fatal_cause: self.signal.fatal_cause(),
        };

        if let Some(worker) = panicked {
            return Err(StressError::WorkerPanicked {
                worker,
                report: Box::new(report),
            });
        }
        match report.fatal_cause.clone() {
            Some(cause) => Err(StressError::Fatal {
                cause,
                report: Box::new(report),
            }),
            None => Ok(report),
        }
    }
}

struct RunGuard {
    signal: Arc<StopSignal>,
    done: CancellationToken,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.signal.halt();
        self.done.cancel();
    }
}

/// Runs `connector` from `worker_count` concurrent workers against `target`.
pub async fn run_stress_test<C: Connector>(
    settings: StressSettings,
    connector: Arc<C>,
    cancel: CancellationToken,
) -> Result<StressReport, StressError> {
    StressDriver::new(settings, connector).run(cancel).await
}
