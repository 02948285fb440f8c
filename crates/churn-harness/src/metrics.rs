use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

/// A counter that also reports its mean rate since creation.
#[derive(Clone)]
pub struct Meter {
    counter: IntCounter,
    started: Instant,
}

impl Meter {
    fn new(counter: IntCounter, started: Instant) -> Self {
        Self { counter, started }
    }

    pub fn mark(&self) {
        self.counter.inc();
    }

    pub fn count(&self) -> u64 {
        self.counter.get()
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        let count = self.count();
        let elapsed = self.started.elapsed().as_secs_f64();
        let mean_rate = if elapsed > 0.0 {
            count as f64 / elapsed
        } else {
            0.0
        };
        MeterSnapshot { count, mean_rate }
    }
}

/// Counters for one stress run.
///
/// Every run gets its own registry, so all counts start at zero and only
/// grow. Workers share the sink through an `Arc` and increment lock-free.
#[derive(Clone)]
pub struct StressMetrics {
    registry: Registry,
    started: Instant,
    pub requests: Meter,
    pub bind_failures: Meter,
    pub connections_refused: Meter,
    pub successful_opens: IntCounter,
    pub failed_opens: IntCounter,
    pub successful_closes: IntCounter,
    pub failed_closes: IntCounter,
}

impl StressMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();
        let started = Instant::now();

        let counter = |name: &str, help: &str| {
            let c = IntCounter::with_opts(Opts::new(name, help)).expect("metric can be created");
            let _ = registry.register(Box::new(c.clone()));
            c
        };

        let requests = Meter::new(
            counter(
                "churn_requests_total",
                "Connect attempts that produced an open connection",
            ),
            started,
        );
        let bind_failures = Meter::new(
            counter(
                "churn_bind_failures_total",
                "Connect attempts that failed to allocate a local address or port",
            ),
            started,
        );
        let connections_refused = Meter::new(
            counter(
                "churn_connections_refused_total",
                "Connect attempts refused by the target",
            ),
            started,
        );
        let successful_opens = counter(
            "churn_successful_opens_total",
            "Connections successfully opened",
        );
        let failed_opens = counter(
            "churn_failed_opens_total",
            "Connect attempts that did not open a connection",
        );
        let successful_closes = counter(
            "churn_successful_closes_total",
            "Iterations that released their connection cleanly, including never-opened ones",
        );
        let failed_closes = counter(
            "churn_failed_closes_total",
            "Open connections whose close failed",
        );

        Self {
            registry,
            started,
            requests,
            bind_failures,
            connections_refused,
            successful_opens,
            failed_opens,
            successful_closes,
            failed_closes,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            elapsed: self.started.elapsed(),
            requests: self.requests.snapshot(),
            bind_failures: self.bind_failures.snapshot(),
            connections_refused: self.connections_refused.snapshot(),
            successful_opens: self.successful_opens.get(),
            failed_opens: self.failed_opens.get(),
            successful_closes: self.successful_closes.get(),
            failed_closes: self.failed_closes.get(),
        }
    }

    /// Prometheus text exposition of this run's counters.
    pub fn render(&self) -> String {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            return format!("# Error encoding metrics: {}", e);
        }

        String::from_utf8(buffer).unwrap_or_else(|_| "# Error: Invalid UTF8".to_string())
    }
}

impl Default for StressMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterSnapshot {
    pub count: u64,
    /// Events per second since the run started.
    pub mean_rate: f64,
}

/// Read-only copy of every counter at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub requests: MeterSnapshot,
    pub bind_failures: MeterSnapshot,
    pub connections_refused: MeterSnapshot,
    pub successful_opens: u64,
    pub failed_opens: u64,
    pub successful_closes: u64,
    pub failed_closes: u64,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- Counters ({:.1}s) --", self.elapsed.as_secs_f64())?;
        writeln!(f, "failedCloses       count = {}", self.failed_closes)?;
        writeln!(f, "failedOpens        count = {}", self.failed_opens)?;
        writeln!(f, "successfulCloses   count = {}", self.successful_closes)?;
        writeln!(f, "successfulOpens    count = {}", self.successful_opens)?;
        writeln!(f, "-- Meters --")?;
        for (name, meter) in [
            ("bindFailures", &self.bind_failures),
            ("connectionsRefused", &self.connections_refused),
            ("requests", &self.requests),
        ] {
            writeln!(
                f,
                "{:<18} count = {}  mean rate = {:.2} events/second",
                name, meter.count, meter.mean_rate
            )?;
        }
        Ok(())
    }
}
