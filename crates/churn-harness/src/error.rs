use crate::engine::driver::StressReport;
use crate::engine::signal::FatalCause;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StressError {
    /// The first fatal connect failure, with the counters at the end of the run.
    #[error("fatal connect failure: {cause}")]
    Fatal {
        #[source]
        cause: FatalCause,
        report: Box<StressReport>,
    },

    #[error("worker {worker} panicked")]
    WorkerPanicked {
        worker: usize,
        report: Box<StressReport>,
    },

    #[error("worker count must be at least 1")]
    NoWorkers,

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("invalid target address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
}

impl StressError {
    /// Counters collected before the run failed, when the run got that far.
    pub fn report(&self) -> Option<&StressReport> {
        match self {
            StressError::Fatal { report, .. } | StressError::WorkerPanicked { report, .. } => {
                Some(report)
            }
            _ => None,
        }
    }
}
