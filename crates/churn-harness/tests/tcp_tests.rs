use churn_common::TransportConfig;
use churn_harness::transport::TcpConnector;
use churn_harness::{classify, Connector, FailureKind};
use std::net::TcpListener;
use std::time::Duration;

#[test]
fn connects_and_closes_against_a_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let connector = TcpConnector::new();

    let stream = connector.connect(&addr).unwrap();
    let (_accepted, peer) = listener.accept().unwrap();
    assert_eq!(peer, stream.local_addr().unwrap());

    connector.close(stream).unwrap();
}

#[test]
fn close_after_peer_hung_up_is_clean() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let connector = TcpConnector::new();

    let stream = connector.connect(&addr).unwrap();
    let (accepted, _) = listener.accept().unwrap();
    drop(accepted);
    std::thread::sleep(Duration::from_millis(20));

    assert!(connector.close(stream).is_ok());
}

#[test]
fn closed_port_is_classified_as_refused() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    for connector in [
        TcpConnector::new(),
        TcpConnector::new().with_connect_timeout(Duration::from_secs(2)),
    ] {
        let err = connector.connect(&addr).unwrap_err();
        assert_eq!(classify(&*err), FailureKind::ConnectionRefused);
    }
}

#[test]
fn built_from_transport_config() {
    let config = TransportConfig {
        connect_timeout_ms: Some(250),
        graceful_shutdown: false,
        ..TransportConfig::default()
    };
    let connector = TcpConnector::from(&config);
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let stream = connector.connect(&addr).unwrap();
    assert!(connector.close(stream).is_ok());
}
