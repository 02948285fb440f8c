pub mod engine;
pub mod error;
pub mod metrics;
pub mod transport;

pub use engine::capability::{BoxError, CapabilityPair, Connector};
pub use engine::classifier::{classify, root_cause, FailureKind};
pub use engine::driver::{run_stress_test, StressDriver, StressReport, StressSettings};
pub use error::StressError;
pub use metrics::{MetricsSnapshot, StressMetrics};
