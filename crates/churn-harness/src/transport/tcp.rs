use crate::engine::capability::{BoxError, Connector};
use churn_common::TransportConfig;
use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;
use tracing::debug;

/// Plain blocking TCP connect/close.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Option<Duration>,
    graceful_shutdown: bool,
}

impl TcpConnector {
    pub fn new() -> Self {
        Self {
            connect_timeout: None,
            graceful_shutdown: true,
        }
    }

    /// Bounds every connect. Without a timeout a hung connect hangs the worker.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_graceful_shutdown(mut self, enabled: bool) -> Self {
        self.graceful_shutdown = enabled;
        self
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&TransportConfig> for TcpConnector {
    fn from(config: &TransportConfig) -> Self {
        let connector = TcpConnector::new().with_graceful_shutdown(config.graceful_shutdown);
        match config.connect_timeout_ms {
            Some(ms) if ms > 0 => connector.with_connect_timeout(Duration::from_millis(ms)),
            _ => connector,
        }
    }
}

impl Connector for TcpConnector {
    type Handle = TcpStream;

    fn connect(&self, addr: &SocketAddr) -> Result<TcpStream, BoxError> {
        let stream = match self.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };
        Ok(stream)
    }

    fn close(&self, stream: TcpStream) -> Result<(), BoxError> {
        if self.graceful_shutdown {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                // Peer already went away; the descriptor is still released on drop.
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {
                    debug!("Peer closed before shutdown");
                }
                Err(e) => return Err(Box::new(e)),
            }
        }
        drop(stream);
        Ok(())
    }
}
