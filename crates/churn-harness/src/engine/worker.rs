use crate::engine::capability::{BoxError, Connector};
use crate::engine::classifier::{classify, FailureKind};
use crate::engine::signal::{FatalCause, StopSignal};
use crate::metrics::StressMetrics;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Result of one connect attempt, consumed within the same iteration.
pub enum ConnectOutcome<H> {
    Opened(H),
    BindFailed,
    Refused,
    Fatal(BoxError),
}

/// Per-worker settings, fixed for the worker's lifetime.
pub struct WorkerTask<C: Connector> {
    pub id: usize,
    pub target: SocketAddr,
    pub pacing: Option<Duration>,
    pub max_iterations: Option<u64>,
    pub connector: Arc<C>,
    pub metrics: Arc<StressMetrics>,
    pub signal: Arc<StopSignal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerSummary {
    pub id: usize,
    pub attempts: u64,
}

impl<C: Connector> WorkerTask<C> {
    /// Connect/close loop. Blocks the calling thread until the stop signal is
    /// observed or the iteration cap is reached.
    pub fn run(self) -> WorkerSummary {
        debug!(worker = self.id, target = %self.target, "Worker started");
        let mut attempts: u64 = 0;

        while !self.signal.is_set() {
            if self.max_iterations.is_some_and(|max| attempts >= max) {
                break;
            }
            if let Some(pause) = self.pacing {
                thread::sleep(pause);
            }

            attempts += 1;
            let outcome = self.open();
            self.release(outcome);
        }

        debug!(worker = self.id, attempts, "Worker exiting");
        WorkerSummary {
            id: self.id,
            attempts,
        }
    }

    fn open(&self) -> ConnectOutcome<C::Handle> {
        match self.connector.connect(&self.target) {
            Ok(handle) => {
                self.metrics.successful_opens.inc();
                self.metrics.requests.mark();
                ConnectOutcome::Opened(handle)
            }
            Err(e) => {
                self.metrics.failed_opens.inc();
                match classify(&*e) {
                    FailureKind::BindFailure => {
                        self.metrics.bind_failures.mark();
                        ConnectOutcome::BindFailed
                    }
                    FailureKind::ConnectionRefused => {
                        self.metrics.connections_refused.mark();
                        ConnectOutcome::Refused
                    }
                    FailureKind::Fatal => ConnectOutcome::Fatal(e),
                }
            }
        }
    }

    /// Closes whatever the attempt opened. Every iteration accounts exactly
    /// one close; an attempt that opened nothing counts as a clean close.
    fn release(&self, outcome: ConnectOutcome<C::Handle>) {
        match outcome {
            ConnectOutcome::Opened(handle) => match self.connector.close(handle) {
                Ok(()) => self.metrics.successful_closes.inc(),
                Err(e) => {
                    self.metrics.failed_closes.inc();
                    warn!(worker = self.id, error = %e, "Failed to close connection");
                }
            },
            ConnectOutcome::BindFailed | ConnectOutcome::Refused => {
                self.metrics.successful_closes.inc();
            }
            ConnectOutcome::Fatal(e) => {
                self.metrics.successful_closes.inc();
                let cause: FatalCause = Arc::from(e);
                if self.signal.trip(Arc::clone(&cause)) {
                    error!(worker = self.id, error = %cause, "Fatal connect failure, stopping all workers");
                } else {
                    debug!(worker = self.id, "Fatal connect failure after stop, cause discarded");
                }
            }
        }
    }
}
