use std::marker::PhantomData;
use std::net::SocketAddr;

/// Boxed error returned by connect and close capabilities.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The pair of blocking operations a worker drives in every iteration.
///
/// Both calls may block for as long as the underlying transport does. The
/// harness imposes no timeout of its own.
pub trait Connector: Send + Sync + 'static {
    type Handle: Send;

    fn connect(&self, addr: &SocketAddr) -> Result<Self::Handle, BoxError>;

    fn close(&self, handle: Self::Handle) -> Result<(), BoxError>;
}

/// Adapts a separate opener and closer into a [`Connector`].
pub struct CapabilityPair<O, C, H> {
    open: O,
    close: C,
    _handle: PhantomData<fn() -> H>,
}

impl<O, C, H> CapabilityPair<O, C, H>
where
    O: Fn(&SocketAddr) -> Result<H, BoxError>,
    C: Fn(H) -> Result<(), BoxError>,
{
    pub fn new(open: O, close: C) -> Self {
        Self {
            open,
            close,
            _handle: PhantomData,
        }
    }
}

impl<O, C, H> Connector for CapabilityPair<O, C, H>
where
    H: Send + 'static,
    O: Fn(&SocketAddr) -> Result<H, BoxError> + Send + Sync + 'static,
    C: Fn(H) -> Result<(), BoxError> + Send + Sync + 'static,
{
    type Handle = H;

    fn connect(&self, addr: &SocketAddr) -> Result<H, BoxError> {
        (self.open)(addr)
    }

    fn close(&self, handle: H) -> Result<(), BoxError> {
        (self.close)(handle)
    }
}
