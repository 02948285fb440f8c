//! Failure classification for connect attempts.
//!
//! A failed attempt is unwrapped to its root cause and sorted into one of
//! three buckets. Only the two expected buckets keep a run going; anything
//! else stops every worker.
//!
//! ## Expected failures
//! - **Bind failure**: the local side could not get a source address or
//!   ephemeral port (`EADDRNOTAVAIL`, `EADDRINUSE`). This is what port
//!   exhaustion looks like under heavy churn.
//! - **Connection refused**: the peer actively rejected the connection
//!   (`ECONNREFUSED`). With nothing listening on the target this is the
//!   steady-state outcome of every attempt.

use std::error::Error;
use std::io;

/// Outcome bucket for a failed connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    BindFailure,
    ConnectionRefused,
    Fatal,
}

impl FailureKind {
    pub fn is_expected(self) -> bool {
        !matches!(self, FailureKind::Fatal)
    }
}

/// Longest chain walked before giving up on finding the end.
const MAX_CHAIN_DEPTH: usize = 64;

/// Follows the `source()` chain to its innermost error.
///
/// Stops at the first node without a source, or at the first node whose
/// source points back into the already visited part of the chain. A node
/// that is its own source is therefore returned as the root.
///
/// Nodes are compared as whole `dyn Error` pointers: a newtype wrapper and
/// its inner error share an address but not a type, so they are distinct.
/// Chains longer than `MAX_CHAIN_DEPTH` stop at the last node reached.
pub fn root_cause<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    let mut visited: Vec<*const (dyn Error + 'static)> = vec![err as *const _];
    let mut current = err;

    while let Some(next) = current.source() {
        let ptr: *const (dyn Error + 'static) = next;
        let seen_before = visited.iter().any(|&seen| std::ptr::eq(seen, ptr));
        if seen_before || visited.len() >= MAX_CHAIN_DEPTH {
            break;
        }
        visited.push(ptr);
        current = next;
    }
    current
}

/// Classifies a connect failure by its root cause.
pub fn classify(err: &(dyn Error + 'static)) -> FailureKind {
    let root = root_cause(err);
    match root.downcast_ref::<io::Error>() {
        Some(io_err) => classify_io(io_err),
        None => FailureKind::Fatal,
    }
}

fn classify_io(err: &io::Error) -> FailureKind {
    match err.kind() {
        io::ErrorKind::AddrNotAvailable | io::ErrorKind::AddrInUse => FailureKind::BindFailure,
        io::ErrorKind::ConnectionRefused => FailureKind::ConnectionRefused,
        _ => FailureKind::Fatal,
    }
}
