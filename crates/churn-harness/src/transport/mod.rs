pub mod tcp;

pub use tcp::TcpConnector;
