use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub stress: StressConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    pub fn from_yaml(data: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(data)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StressConfig {
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    pub target_address: String,
    /// Pause before every attempt. Zero disables pacing.
    #[serde(default)]
    pub sleep_between_attempts_ms: u64,
    /// Stop each worker after this many iterations even without a stop signal.
    #[serde(default)]
    pub max_iterations_per_worker: Option<u64>,
    /// Cancel the run from outside after this long.
    #[serde(default)]
    pub run_duration_secs: Option<u64>,
    #[serde(default = "default_settle_millis")]
    pub settle_millis: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Tcp,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,
    /// Without it a hung connect hangs its worker.
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default = "default_true")]
    pub graceful_shutdown: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Tcp,
            connect_timeout_ms: None,
            graceful_shutdown: true,
        }
    }
}

/// Prometheus scrape endpoint and the periodic console report.
#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
            report_interval_secs: default_report_interval_secs(),
        }
    }
}

fn default_worker_count() -> usize {
    10
}

fn default_settle_millis() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_metrics_port() -> u16 {
    9100
}

fn default_report_interval_secs() -> u64 {
    10
}
