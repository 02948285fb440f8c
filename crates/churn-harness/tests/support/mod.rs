#![allow(dead_code)]

use churn_harness::BoxError;
use std::error::Error;
use std::fmt;
use std::io;

/// Error that wraps another one, the way transport libraries wrap OS errors.
#[derive(Debug)]
pub struct Wrapped {
    pub context: &'static str,
    pub inner: BoxError,
}

impl fmt::Display for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.context)
    }
}

impl Error for Wrapped {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.inner)
    }
}

/// Marker error tagged with the attempt that produced it.
#[derive(Debug, PartialEq, Eq)]
pub struct Injected {
    pub attempt: u64,
}

impl fmt::Display for Injected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "injected failure on attempt {}", self.attempt)
    }
}

impl Error for Injected {}

pub fn refused() -> BoxError {
    Box::new(io::Error::new(
        io::ErrorKind::ConnectionRefused,
        "Connection refused",
    ))
}

pub fn bind_failed() -> BoxError {
    Box::new(io::Error::new(
        io::ErrorKind::AddrNotAvailable,
        "Cannot assign requested address",
    ))
}

pub fn wrapped(context: &'static str, inner: BoxError) -> BoxError {
    Box::new(Wrapped { context, inner })
}

pub fn injected(attempt: u64) -> BoxError {
    wrapped("connect failed", Box::new(Injected { attempt }))
}

pub fn close_failed() -> BoxError {
    Box::new(io::Error::new(io::ErrorKind::Other, "close failed"))
}
