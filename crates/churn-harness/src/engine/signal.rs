use once_cell::sync::OnceCell;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, cloneable fatal error captured by the stop signal.
pub type FatalCause = Arc<dyn Error + Send + Sync>;

/// Run-wide stop flag plus the first fatal cause.
///
/// The cause slot is single-assignment: the first fatal failure wins and
/// every later one is dropped. The flag can also be raised without a cause
/// when the run is cancelled from outside.
#[derive(Debug, Default)]
pub struct StopSignal {
    dead: AtomicBool,
    cause: OnceCell<FatalCause>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.dead.load(Ordering::Acquire)
    }

    /// Records `cause` if no fatal cause exists yet and raises the flag.
    ///
    /// Returns `true` when this call's cause is the one retained.
    pub fn trip(&self, cause: FatalCause) -> bool {
        let won = self.cause.set(cause).is_ok();
        self.dead.store(true, Ordering::Release);
        won
    }

    /// Raises the flag without recording a cause.
    pub fn halt(&self) {
        self.dead.store(true, Ordering::Release);
    }

    pub fn fatal_cause(&self) -> Option<FatalCause> {
        self.cause.get().cloned()
    }
}
